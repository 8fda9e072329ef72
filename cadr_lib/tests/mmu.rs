use cadr_lib::memory::{FaultKind, MemoryTranslationUnit, ACCESS_BIT, WRITE_BIT};
use cadr_lib::InterruptController;
use proptest::prelude::*;

/// Unit with virtual pages 0..32 mapped one to one through level 1 entry 0.
fn identity_mmu(ram_pages: u32) -> MemoryTranslationUnit {
    let mut mmu = MemoryTranslationUnit::new(ram_pages);
    for page in 0..32 {
        mmu.map.write_l2(page, ACCESS_BIT | WRITE_BIT | page as u32);
    }
    mmu
}

proptest! {
    #[test]
    fn prop_write_then_read(page in 0u32..32, offset in 0u32..256, value in any::<u32>()) {
        let mut mmu = identity_mmu(64);
        let mut interrupts = InterruptController::default();
        let vaddr = (page << 8) | offset;

        mmu.write(vaddr, value, &mut interrupts).unwrap();
        prop_assert_eq!(value, mmu.read(vaddr, &mut interrupts).unwrap());
        prop_assert!(!mmu.faults().page_fault);
    }
}

#[test]
fn test_read_only_page() {
    let mut mmu = identity_mmu(64);
    let mut interrupts = InterruptController::default();
    mmu.write(0o1005, 0o42, &mut interrupts).unwrap();
    mmu.map.write_l2(2, ACCESS_BIT | 2);

    let fault = mmu.write(0o1005, 0o77, &mut interrupts).unwrap_err();
    assert_eq!(FaultKind::Write, fault.kind);
    assert!(mmu.faults().write_fault);
    assert_eq!(0o42, mmu.read(0o1005, &mut interrupts).unwrap());
    assert!(!mmu.faults().write_fault);
}

#[test]
fn test_unmapped_access_leaves_ram_alone() {
    let mut mmu = identity_mmu(64);
    let mut interrupts = InterruptController::default();
    mmu.map.write_l2(3, 3);

    let fault = mmu.write(0o1400, 0o77, &mut interrupts).unwrap_err();
    assert_eq!(FaultKind::Access, fault.kind);
    assert_eq!(3, fault.page);
    assert!(mmu.physical.page(3).is_none());
}

#[test]
fn test_page_past_ram_budget() {
    let mut mmu = identity_mmu(8);
    let mut interrupts = InterruptController::default();

    let fault = mmu.read(0o12000, &mut interrupts).unwrap_err();
    assert_eq!(FaultKind::Capacity, fault.kind);
    assert!(mmu.faults().access_fault);
    assert_eq!(0, mmu.physical.allocated_pages());
}
