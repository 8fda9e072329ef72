use super::format::Tag;
use std::io::{self, Read, Write};

pub trait WriteLeExt: Write {
    fn write_u32_le(&mut self, v: u32) -> io::Result<()> {
        self.write_all(&v.to_le_bytes())
    }

    fn write_tag(&mut self, tag: Tag) -> io::Result<()> {
        self.write_all(&tag.0)
    }

    fn write_words(&mut self, words: &[u32]) -> io::Result<()> {
        for word in words {
            self.write_u32_le(*word)?;
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteLeExt for W {}

pub trait ReadLeExt: Read {
    fn read_u32_le(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_tag(&mut self) -> io::Result<Tag> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(Tag(buf))
    }

    fn read_words(&mut self, count: usize) -> io::Result<Vec<u32>> {
        let mut bytes = vec![0u8; count * 4];
        self.read_exact(&mut bytes)?;

        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Consumes `count` words without buffering them.
    fn skip_words(&mut self, count: u32) -> io::Result<()> {
        let len = count as u64 * 4;
        let mut segment = self.take(len);
        io::copy(&mut segment, &mut io::sink())?;
        if segment.limit() != 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "truncated segment payload",
            ));
        }

        Ok(())
    }
}

impl<R: Read + ?Sized> ReadLeExt for R {}
