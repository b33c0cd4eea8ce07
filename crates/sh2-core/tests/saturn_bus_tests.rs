use std::cell::Cell;
use std::rc::Rc;

use sh2_core::saturn_bus::{BIOS_SIZE, CS0_BASE, LWRAM_BASE};
use sh2_core::{BiosHook, SaturnBus, Sh2Bus, Sh2Config, Sh2Ctx};

mod test_bus;
use test_bus::*;

#[test]
fn test_boot_rom_is_read_only() {
    let mut bus = SaturnBus::new();
    bus.load_bios(&[0x12, 0x34, 0x56, 0x78]);
    assert_eq!(bus.read32(0x0000_0000), 0x1234_5678);
    // 512 KiB mirror inside the first megabyte
    assert_eq!(bus.read16(BIOS_SIZE as u32), 0x1234);

    bus.write32(0x0000_0000, 0);
    assert_eq!(bus.read32(0x0000_0000), 0x1234_5678);

    // write_block can still patch it
    bus.write_block(0x0000_0002, &[0xAB, 0xCD]);
    assert_eq!(bus.read32(0x0000_0000), 0x1234_ABCD);
}

#[test]
fn test_work_ram() {
    let mut bus = SaturnBus::new();
    bus.write32(LWRAM_BASE + 0x100, 0x0102_0304);
    assert_eq!(bus.read8(LWRAM_BASE + 0x103), 0x04);
    // cache-through area
    assert_eq!(bus.read32(0x2000_0000 | (LWRAM_BASE + 0x100)), 0x0102_0304);

    // high work RAM repeats every megabyte
    bus.write16(0x0600_0002, 0xBEEF);
    assert_eq!(bus.read16(0x0610_0002), 0xBEEF);
}

#[test]
fn test_cartridge_window() {
    let mut bus = SaturnBus::new();
    assert_eq!(bus.read8(CS0_BASE), 0xFF);
    assert_eq!(bus.read16(CS0_BASE), 0xFFFF);
    assert_eq!(bus.read32(CS0_BASE), 0xFFFF_FFFF);

    bus.load_cartridge(&[0xCA, 0xFE, 0xBA, 0xBE]);
    assert_eq!(bus.read32(CS0_BASE), 0xCAFE_BABE);
    assert_eq!(bus.fetch16(CS0_BASE + 2), 0xBABE);
    // past the image
    assert_eq!(bus.read16(CS0_BASE + 4), 0xFFFF);

    bus.eject_cartridge();
    assert_eq!(bus.read32(CS0_BASE), 0xFFFF_FFFF);
}

#[test]
fn test_unmapped_accesses() {
    let mut bus = SaturnBus::new();
    assert_eq!(bus.read32(0x0500_0000), 0);
    assert_eq!(bus.fetch16(0x0500_0000), 0xFFFF);

    // only cache areas 0, 1 and 5 reach the region table
    bus.write32(0x0600_0000, 0x1111_1111);
    assert_eq!(bus.read32(0x4600_0000), 0);
    bus.write32(0xC600_0000, 0x2222_2222);
    assert_eq!(bus.read32(0xA600_0000), 0x1111_1111);
}

#[test]
fn test_fetch_from_unmapped_memory_is_illegal() {
    let (mut ctx, mut bus) = setup(&[]);
    set_vector(&mut bus, 4, PROGRAM);
    load_program(&mut bus, PROGRAM, &[NOP]);
    ctx.set_sr(0);
    ctx.regs.pc = 0x0500_0000;

    run_one(&mut ctx, &mut bus);
    assert_eq!(ctx.regs.pc, PROGRAM);
    assert_eq!(bus.read32(STACK - 8), 0x0500_0002);
}

struct ReturnImmediately {
    entry: u32,
    calls: Rc<Cell<u32>>,
}

impl BiosHook for ReturnImmediately {
    fn handle(&mut self, ctx: &mut Sh2Ctx, _bus: &mut dyn Sh2Bus) -> bool {
        if ctx.regs.pc != self.entry {
            return false;
        }
        self.calls.set(self.calls.get() + 1);
        ctx.regs.r[0] = 0x42;
        ctx.regs.pc = ctx.regs.pr;
        true
    }
}

#[test]
fn test_bios_hook() {
    const ENTRY: u32 = PROGRAM + 0x40;

    let config = Sh2Config {
        emulate_bios: true,
        ..Default::default()
    };
    let (mut ctx, mut bus) = setup_with(&[0xB01E, NOP, 0xE107, NOP], config);
    load_program(&mut bus, ENTRY, &[0xFFFD]);

    let calls = Rc::new(Cell::new(0));
    ctx.install_bios_hook(Box::new(ReturnImmediately {
        entry: ENTRY,
        calls: calls.clone(),
    }));

    // bsr ENTRY ; the hook returns straight to PR and mov #7,r1 runs
    run_n(&mut ctx, &mut bus, 2);
    assert_eq!(calls.get(), 1);
    assert_eq!(ctx.regs.r[0], 0x42);
    assert_eq!(ctx.regs.r[1], 7);
    assert_eq!(ctx.regs.pc, PROGRAM + 6);
    // no exception frame was pushed
    assert_eq!(ctx.regs.r[15], STACK);

    // declined calls fall through to the exception
    assert!(ctx.remove_bios_hook().is_some());
    set_vector(&mut bus, 4, PROGRAM);
    ctx.regs.pc = ENTRY;
    ctx.set_sr(0);
    run_one(&mut ctx, &mut bus);
    assert_eq!(ctx.regs.pc, PROGRAM);
    assert_eq!(ctx.regs.r[15], STACK - 8);
}
