//! Boot PROM image loader.

use crate::registers::{MachineRegisters, PROM_SIZE};
use log::{info, warn};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("prom image covers 0o{start:o}..0o{end:o}, past the end of the prom")]
    TooLarge { start: u32, end: u32 },
}

/// Assembles a word stored in PDP-11 byte order (bytes 1, 0, 3, 2).
pub fn pdp_endian(bytes: [u8; 4]) -> u32 {
    [bytes[1], bytes[0], bytes[3], bytes[2]]
        .iter()
        .fold(0, |word, byte| word << 8 | *byte as u32)
}

fn read_pdp<R: Read>(r: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(pdp_endian(buf))
}

fn read_u16_le<R: Read>(r: &mut R) -> std::io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromImage {
    code: u32,
    start: u32,
    entries: Vec<u64>,
}

impl PromImage {
    /// Image of `entries` placed from PROM address `start`.
    pub fn new(code: u32, start: u32, entries: Vec<u64>) -> Result<Self, PromError> {
        let end = start.saturating_add(entries.len().try_into().unwrap_or(u32::MAX));
        if end as usize > PROM_SIZE {
            return Err(PromError::TooLarge { start, end });
        }

        Ok(Self {
            code,
            start,
            entries,
        })
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn entries(&self) -> &[u64] {
        &self.entries
    }

    pub fn load(path: &Path) -> Result<Self, PromError> {
        let image = Self::read_from(&mut BufReader::new(File::open(path)?))?;
        info!(
            "prom {}: code {}, start 0o{:o}, size {}",
            path.display(),
            image.code,
            image.start,
            image.entries.len()
        );

        Ok(image)
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, PromError> {
        let code = read_pdp(r)?;
        let start = read_pdp(r)?;
        let size = read_pdp(r)?;
        let end = start.saturating_add(size);
        if end as usize > PROM_SIZE {
            return Err(PromError::TooLarge { start, end });
        }

        let mut entries = Vec::with_capacity(size as usize);
        for _ in 0..size {
            let mut word = 0u64;
            for _ in 0..4 {
                word = word << 16 | read_u16_le(r)? as u64;
            }
            entries.push(word);
        }

        Self::new(code, start, entries)
    }

    pub fn install(&self, registers: &mut MachineRegisters) {
        let start = self.start as usize;
        match registers.prom.get_mut(start..start + self.entries.len()) {
            Some(slots) => slots.copy_from_slice(&self.entries),
            None => warn!(
                "prom image at 0o{:o} does not fit {} prom words",
                self.start,
                registers.prom.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(code: u32, start: u32, size: u32) -> Vec<u8> {
        let mut bytes = vec![];
        for word in [code, start, size] {
            let b = word.to_be_bytes();
            bytes.extend_from_slice(&[b[1], b[0], b[3], b[2]]);
        }
        bytes
    }

    #[test]
    fn test_pdp_endian() {
        assert_eq!(0x0102_0304, pdp_endian([0x02, 0x01, 0x04, 0x03]));
    }

    #[test]
    fn test_read_image() {
        let mut bytes = header(9, 2, 1);
        for half in [0o1u16, 0o2, 0o3, 0o4] {
            bytes.extend_from_slice(&half.to_le_bytes());
        }
        let image = PromImage::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(9, image.code());
        assert_eq!(&[(1 << 48) | (2 << 32) | (3 << 16) | 4], image.entries());

        let mut registers = MachineRegisters::default();
        image.install(&mut registers);
        assert_eq!(0, registers.read_prom(1));
        assert_eq!(image.entries()[0], registers.read_prom(2));
    }

    #[test]
    fn test_too_large() {
        let err = PromImage::read_from(&mut Cursor::new(header(0, 500, 20))).unwrap_err();
        assert!(matches!(err, PromError::TooLarge { start: 500, end: 520 }));
    }

    #[test]
    fn test_image_must_fit() {
        let err = PromImage::new(0, 510, vec![0; 3]).unwrap_err();
        assert!(matches!(err, PromError::TooLarge { start: 510, end: 513 }));

        let image = PromImage::new(0, 510, vec![7; 2]).unwrap();
        let mut registers = MachineRegisters::default();
        image.install(&mut registers);
        assert_eq!(7, registers.read_prom(511));

        // a shrunk prom store is left alone
        registers.prom.truncate(4);
        image.install(&mut registers);
        assert_eq!(4, registers.prom.len());
    }

    #[test]
    fn test_truncated() {
        let mut bytes = header(0, 0, 2);
        bytes.extend_from_slice(&[0; 8]);
        let err = PromImage::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, PromError::Io(_)));
    }
}
