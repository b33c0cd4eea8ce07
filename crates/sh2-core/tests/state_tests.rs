use sh2_core::{PendingInterrupt, SH2_REG_COUNT, SH2_REG_PC, SH2_REG_SR, Sh2Ctx, Sh2Error, Sh2Regs};

mod test_bus;
use test_bus::*;

// add/store/load/accumulate loop closed by a bra with a slot
const LOOP: [u16; 7] = [
    0x7001, // add #1,r0
    0x2202, // mov.l r0,@r2
    0x6322, // mov.l @r2,r3
    0x343C, // add r3,r4
    0x4510, // dt r5
    0xAFF9, // bra -7
    0x240A, // xor r0,r4 (slot)
];

fn trace(ctx: &mut Sh2Ctx, bus: &mut sh2_core::SaturnBus, count: usize) -> Vec<(Sh2Regs, u32)> {
    (0..count)
        .map(|_| {
            run_one(ctx, bus);
            (ctx.get_registers(), ctx.cycles)
        })
        .collect()
}

#[test]
fn test_resume_from_snapshot() {
    let (mut ctx, mut bus) = setup(&LOOP);
    ctx.regs.r[2] = DATA;
    ctx.regs.r[5] = 0x1000;

    run_n(&mut ctx, &mut bus, 500);
    ctx.send_interrupt(0x40, 4);
    ctx.ubc.bara = 0x1234_5678;

    let snapshot = ctx.save_state().unwrap();
    let saved_bus = bus.clone();

    let expected = trace(&mut ctx, &mut bus, 1000);

    let mut restored = Sh2Ctx::new(true);
    restored.load_state(&snapshot).unwrap();
    assert!(!restored.is_slave);
    assert_eq!(restored.ubc.bara, 0x1234_5678);
    assert_eq!(
        restored.pending_interrupts(),
        &[PendingInterrupt {
            vector: 0x40,
            level: 4
        }]
    );

    let mut bus = saved_bus;
    let actual = trace(&mut restored, &mut bus, 1000);
    assert_eq!(actual, expected);
}

#[test]
fn test_garbage_state_is_rejected() {
    let mut ctx = Sh2Ctx::new(false);
    ctx.regs.r[7] = 7;
    assert!(matches!(ctx.load_state(&[1, 2, 3]), Err(Sh2Error::State(_))));
    assert_eq!(ctx.regs.r[7], 7);
}

#[test]
fn test_register_index_map() {
    let mut ctx = Sh2Ctx::new(false);
    for i in 0..16 {
        ctx.set_register(i, 0x100 + i as u32).unwrap();
    }
    assert_eq!(ctx.gpr(15), 0x10F);

    ctx.set_register(SH2_REG_PC, 0x0600_4000).unwrap();
    assert_eq!(ctx.pc(), 0x0600_4000);

    ctx.set_register(SH2_REG_SR, 0xFFFF_FFFF).unwrap();
    assert_eq!(ctx.get_register(SH2_REG_SR).unwrap(), 0x3F3);

    assert!(matches!(
        ctx.get_register(SH2_REG_COUNT),
        Err(Sh2Error::InvalidRegister(SH2_REG_COUNT))
    ));
    assert!(ctx.set_register(99, 0).is_err());

    let mut regs = ctx.get_registers();
    regs.sr.set_full(0xFFFF_FFFF);
    regs.mach = 0xAB;
    ctx.set_registers(&regs);
    assert_eq!(ctx.sr(), 0x3F3);
    assert_eq!(ctx.mach(), 0xAB);
}

#[test]
fn test_reset_and_power_on() {
    let (mut ctx, mut bus) = setup(&LOOP);
    ctx.regs.r[2] = DATA;
    ctx.regs.r[5] = 0x10;
    run_n(&mut ctx, &mut bus, 20);
    ctx.send_interrupt(0x40, 4);

    ctx.reset();
    assert_eq!(ctx.regs.r[..15], [0; 15]);
    assert_eq!(ctx.sr(), 0xF0);
    assert_eq!(ctx.cycles, 0);
    assert!(ctx.pending_interrupts().is_empty());

    // PC and SP come from the vector table at VBR (0 after reset)
    let mut boot = vec![0u8; 8];
    boot[..4].copy_from_slice(&PROGRAM.to_be_bytes());
    boot[4..].copy_from_slice(&STACK.to_be_bytes());
    bus.load_bios(&boot);

    ctx.power_on(&mut bus);
    assert_eq!(ctx.pc(), PROGRAM);
    assert_eq!(ctx.regs.r[15], STACK);
}
