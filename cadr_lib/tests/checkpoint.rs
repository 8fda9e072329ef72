use cadr_lib::history::{LcRecord, PdlAccess, PdlRecord};
use cadr_lib::memory::{ACCESS_BIT, PAGE_SIZE, WRITE_BIT};
use cadr_lib::{
    CheckpointCodec, CheckpointError, MachineState, RestoreOutcome, A_MEMORY_SIZE,
    INSTRUCTION_MEMORY_SIZE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

const SAVED_PAGES: u32 = 32;
const TOUCHED_PAGES: [u32; 3] = [0, 3, 17];

fn busy_state(seed: u64) -> MachineState {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = MachineState::new(64);

    for pn in TOUCHED_PAGES {
        let page = state.mmu.physical.get_or_create_page(pn).unwrap();
        for offset in 0..PAGE_SIZE as u32 {
            page.write(offset, rng.gen()).unwrap();
        }
    }

    let registers = &mut state.registers;
    for addr in 0..A_MEMORY_SIZE as u32 {
        registers.write_a(addr, rng.gen());
    }
    for addr in 0..INSTRUCTION_MEMORY_SIZE as u32 {
        registers.write_instruction(addr, rng.gen::<u64>() & 0xffff_ffff_ffff);
    }
    for addr in 0..32 {
        registers.write_m(addr, rng.gen());
    }
    registers.set_lc(0o1234567);
    registers.set_md(0o7654321);
    registers.set_vma(0o4000);
    registers.set_pdl_pointer(0o17);
    registers.set_pdl_index(0o23);
    registers.q = 0o55;
    registers.opc = 0o66;
    registers.interrupt_control = 1 << 27;
    registers.spc.push(0o100);
    registers.spc.push(0o200);
    registers.pdl.set(0o17, 0o777);
    state.interrupts.set_status(0o100260);

    for pc in 0..5000 {
        state.history.pc.record(pc);
    }
    state.history.lc.record(LcRecord {
        lc: 0o400,
        instruction: 0,
    });
    state.history.pdl.record(PdlRecord::new(
        PdlAccess::PushByPointer,
        0o42,
        0o17,
        0o777,
        0o400,
    ));

    state.mmu.map.write_l1(5, 3);
    state.mmu.map.write_l2(0o140, ACCESS_BIT | WRITE_BIT | 17);

    state
}

#[test]
fn test_dump_and_restore() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("usim.state");
    let saved = busy_state(7);
    CheckpointCodec::new(SAVED_PAGES).dump(&saved, &path).unwrap();

    let mut restored = MachineState::new(64);
    let mut codec = CheckpointCodec::new(SAVED_PAGES);
    assert_eq!(
        RestoreOutcome::Restored {
            pages: SAVED_PAGES
        },
        codec.restore(&mut restored, &path).unwrap()
    );
    assert!(codec.is_restored());

    for pn in TOUCHED_PAGES {
        assert_eq!(
            saved.mmu.physical.page(pn).unwrap().words(),
            restored.mmu.physical.page(pn).unwrap().words()
        );
    }
    assert!(restored
        .mmu
        .physical
        .page(5)
        .unwrap()
        .words()
        .iter()
        .all(|w| *w == 0));

    let (before, after) = (&saved.registers, &restored.registers);
    assert_eq!(before.amem, after.amem);
    assert_eq!(before.mmem, after.mmem);
    assert_eq!(before.imem, after.imem);
    assert_eq!(before.dmem, after.dmem);
    assert_eq!(before.spc.as_slice(), after.spc.as_slice());
    assert_eq!(before.spc.head(), after.spc.head());
    assert_eq!(before.pdl.as_slice(), after.pdl.as_slice());
    assert_eq!(before.lc(), after.lc());
    assert_eq!(before.md(), after.md());
    assert_eq!(before.vma(), after.vma());
    assert_eq!(before.pdl_pointer(), after.pdl_pointer());
    assert_eq!(before.pdl_index(), after.pdl_index());
    assert_eq!(before.q, after.q);
    assert_eq!(before.opc, after.opc);
    assert_eq!(before.interrupt_control, after.interrupt_control);
    assert_eq!(saved.interrupts, restored.interrupts);
    assert_eq!(saved.mmu.map.l1(), restored.mmu.map.l1());
    assert_eq!(saved.mmu.map.l2(), restored.mmu.map.l2());

    let history = |state: &MachineState| {
        (
            state.history.pc.oldest_first().collect::<Vec<_>>(),
            state.history.lc.oldest_first().collect::<Vec<_>>(),
            state.history.pdl.oldest_first().collect::<Vec<_>>(),
        )
    };
    assert_eq!(history(&saved), history(&restored));
    assert_eq!(4999, restored.history.last_pc());
}

#[test]
fn test_second_restore_is_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("usim.state");
    CheckpointCodec::new(SAVED_PAGES)
        .dump(&busy_state(1), &path)
        .unwrap();

    let mut state = MachineState::new(64);
    let mut codec = CheckpointCodec::new(SAVED_PAGES);
    codec.restore(&mut state, &path).unwrap();
    state.registers.write_a(0, 0o17);

    assert_eq!(
        RestoreOutcome::AlreadyRestored,
        codec.restore(&mut state, &path).unwrap()
    );
    assert_eq!(0o17, state.registers.read_a(0));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let mut codec = CheckpointCodec::new(SAVED_PAGES);
    let err = codec
        .restore(&mut MachineState::new(64), &dir.path().join("nothing"))
        .unwrap_err();

    match err {
        CheckpointError::Io(e) => assert_eq!(std::io::ErrorKind::NotFound, e.kind()),
        other => panic!("unexpected error {}", other),
    }
    assert!(!codec.is_restored());
}
