// Shared helpers for the integration tests
#![allow(dead_code)]

use sh2_core::{SaturnBus, Sh2Bus, Sh2Config, Sh2Ctx, sh2_run};

pub const PROGRAM: u32 = 0x0600_4000;
pub const STACK: u32 = 0x0601_0000;
pub const VBR: u32 = 0x0600_0000;
pub const DATA: u32 = 0x0600_8000;

/// nop, used as padding after branches
pub const NOP: u16 = 0x0009;

pub fn load_program(bus: &mut SaturnBus, addr: u32, program: &[u16]) {
    let bytes: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();
    bus.write_block(addr, &bytes);
}

pub fn setup_with(program: &[u16], config: Sh2Config) -> (Sh2Ctx, SaturnBus) {
    let mut bus = SaturnBus::new();
    load_program(&mut bus, PROGRAM, program);

    let mut ctx = Sh2Ctx::with_config(false, config);
    ctx.regs.pc = PROGRAM;
    ctx.regs.r[15] = STACK;
    ctx.regs.vbr = VBR;
    (ctx, bus)
}

/// Program at PROGRAM, stack at STACK, vector table at VBR.
pub fn setup(program: &[u16]) -> (Sh2Ctx, SaturnBus) {
    setup_with(program, Sh2Config::default())
}

pub fn setup_instrumented(program: &[u16]) -> (Sh2Ctx, SaturnBus) {
    setup_with(
        program,
        Sh2Config {
            instrumentation: true,
            ..Default::default()
        },
    )
}

pub fn set_vector(bus: &mut SaturnBus, vector: u32, handler: u32) {
    bus.write32(VBR + vector * 4, handler);
}

/// Execute one instruction (and its delay slot), returning the cycles spent.
pub fn run_one(ctx: &mut Sh2Ctx, bus: &mut SaturnBus) -> u32 {
    let before = ctx.cycles;
    sh2_run(ctx, bus, before + 1);
    ctx.cycles - before
}

pub fn run_n(ctx: &mut Sh2Ctx, bus: &mut SaturnBus, count: usize) {
    for _ in 0..count {
        run_one(ctx, bus);
    }
}
