use bitfield::bitfield;
use serde::{Deserialize, Serialize};

pub mod backend_ipr;
pub mod debug;
mod error;
pub mod saturn_bus;
pub mod sh2dec;
pub mod sh2intc;
pub mod sh2mem;
mod state;

pub use debug::{BreakEvent, MemBreakFlags, MemoryBreakpoint, StepMode};
pub use error::Sh2Error;
pub use saturn_bus::SaturnBus;
pub use sh2intc::{MAX_INTERRUPTS, PendingInterrupt, Ubc};
pub use sh2mem::Sh2Bus;

use sh2dec::SH2_OP_PTR;

bitfield! {
    #[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SrStatus(u32);
    impl Debug;

    pub u32, full, set_full: 31, 0;
    pub t, set_t: 0;
    pub s, set_s: 1;
    // bits 2-3 reserved
    pub u32, imask, set_imask: 7, 4;
    pub q, set_q: 8;
    pub m, set_m: 9;
    // bits 10-31 reserved
}

/// Bits of SR that software can change.
pub const SR_WRITE_MASK: u32 = 0x0000_03F3;

pub const SH2_REG_SR: usize = 16;
pub const SH2_REG_GBR: usize = 17;
pub const SH2_REG_VBR: usize = 18;
pub const SH2_REG_MACH: usize = 19;
pub const SH2_REG_MACL: usize = 20;
pub const SH2_REG_PR: usize = 21;
pub const SH2_REG_PC: usize = 22;
pub const SH2_REG_COUNT: usize = 23;

/// Full architectural register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sh2Regs {
    pub r: [u32; 16],
    pub sr: SrStatus,
    pub gbr: u32,
    pub vbr: u32,
    pub mach: u32,
    pub macl: u32,
    pub pr: u32,
    pub pc: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollGranularity {
    /// Once at the start of every `sh2_exec` call.
    #[default]
    Batch,
    /// Before every fetched instruction.
    Instruction,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sh2Config {
    /// Run the debugger loop: code breakpoints, UBC comparators, backtrace,
    /// step-over/out and loop tracking.
    pub instrumentation: bool,
    pub interrupt_polling: PollGranularity,
    /// Offer undecoded opcodes to the installed [`BiosHook`] first.
    pub emulate_bios: bool,
}

/// High level BIOS emulation, consulted when an undecoded opcode is hit
/// and `emulate_bios` is set.
pub trait BiosHook {
    /// Service the BIOS call at the current PC.
    /// Returns false when the PC is not a known entry point.
    fn handle(&mut self, ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus) -> bool;
}

pub struct Sh2Ctx {
    pub regs: Sh2Regs,
    pub ubc: Ubc,
    pub cycles: u32,
    pub is_slave: bool,
    pub is_idle: bool,
    pub is_sleeping: bool,
    /// Last fetched instruction word.
    pub instruction: u16,
    pub config: Sh2Config,

    pub(crate) interrupts: Vec<PendingInterrupt>,
    // address of the slot instruction while a delayed branch runs it
    pub(crate) delay_slot: Option<u32>,
    pub(crate) slot_exception: bool,
    pub(crate) debug: debug::DebugState,
    pub(crate) bios_hook: Option<Box<dyn BiosHook>>,
}

impl Default for Sh2Ctx {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Sh2Ctx {
    pub fn new(is_slave: bool) -> Self {
        let mut regs = Sh2Regs::default();
        regs.sr.set_full(0x0000_00F0);

        Self {
            regs,
            ubc: Ubc::default(),
            cycles: 0,
            is_slave,
            is_idle: false,
            is_sleeping: false,
            instruction: 0,
            config: Sh2Config::default(),

            interrupts: Vec::with_capacity(MAX_INTERRUPTS),
            delay_slot: None,
            slot_exception: false,
            debug: debug::DebugState::default(),
            bios_hook: None,
        }
    }

    pub fn with_config(is_slave: bool, config: Sh2Config) -> Self {
        let mut ctx = Self::new(is_slave);
        ctx.config = config;
        ctx
    }

    /// Log prefix for this core.
    pub fn name(&self) -> &'static str {
        if self.is_slave { "SSH2" } else { "MSH2" }
    }

    pub fn reset(&mut self) {
        // R15 is left alone, power_on reloads it from the vector table
        for r in &mut self.regs.r[..15] {
            *r = 0;
        }
        self.regs.sr.set_full(0x0000_00F0);
        self.regs.gbr = 0;
        self.regs.vbr = 0;
        self.regs.mach = 0;
        self.regs.macl = 0;
        self.regs.pr = 0;

        self.cycles = 0;
        self.is_idle = false;
        self.is_sleeping = false;
        self.delay_slot = None;
        self.slot_exception = false;

        self.interrupts.clear();
        self.ubc = Ubc::default();
        self.debug.reset();

        log::debug!("{}: reset", self.name());
    }

    pub fn power_on(&mut self, bus: &mut dyn Sh2Bus) {
        let vbr = self.regs.vbr;
        self.regs.pc = sh2mem::read_mem32(self, bus, vbr);
        self.regs.r[15] = sh2mem::read_mem32(self, bus, vbr.wrapping_add(4));
        log::info!(
            "{}: power on, PC {:08X} SP {:08X}",
            self.name(),
            self.regs.pc,
            self.regs.r[15]
        );
    }

    pub fn nmi(&mut self) {
        self.send_interrupt(sh2intc::NMI_VECTOR, sh2intc::NMI_LEVEL);
    }

    /// Execute exactly one instruction, together with its delay slot.
    pub fn step(&mut self, bus: &mut dyn Sh2Bus) {
        let pc = self.regs.pc;

        let target = self.cycles.saturating_add(1);
        sh2_run(self, bus, target);

        // PC unchanged: make sure something actually ran
        if self.regs.pc == pc {
            let target = self.cycles.saturating_add(1);
            sh2_run(self, bus, target);
        }
    }

    pub fn install_bios_hook(&mut self, hook: Box<dyn BiosHook>) {
        self.bios_hook = Some(hook);
    }

    pub fn remove_bios_hook(&mut self) -> Option<Box<dyn BiosHook>> {
        self.bios_hook.take()
    }

    pub fn get_registers(&self) -> Sh2Regs {
        self.regs
    }

    pub fn set_registers(&mut self, regs: &Sh2Regs) {
        self.regs = *regs;
        self.regs.sr.set_full(regs.sr.full() & SR_WRITE_MASK);
    }

    pub fn get_register(&self, index: usize) -> Result<u32, Sh2Error> {
        let value = match index {
            0..=15 => self.regs.r[index],
            SH2_REG_SR => self.regs.sr.full(),
            SH2_REG_GBR => self.regs.gbr,
            SH2_REG_VBR => self.regs.vbr,
            SH2_REG_MACH => self.regs.mach,
            SH2_REG_MACL => self.regs.macl,
            SH2_REG_PR => self.regs.pr,
            SH2_REG_PC => self.regs.pc,
            _ => return Err(Sh2Error::InvalidRegister(index)),
        };
        Ok(value)
    }

    pub fn set_register(&mut self, index: usize, value: u32) -> Result<(), Sh2Error> {
        match index {
            0..=15 => self.regs.r[index] = value,
            SH2_REG_SR => self.set_sr(value),
            SH2_REG_GBR => self.regs.gbr = value,
            SH2_REG_VBR => self.regs.vbr = value,
            SH2_REG_MACH => self.regs.mach = value,
            SH2_REG_MACL => self.regs.macl = value,
            SH2_REG_PR => self.regs.pr = value,
            SH2_REG_PC => self.regs.pc = value,
            _ => return Err(Sh2Error::InvalidRegister(index)),
        }
        Ok(())
    }

    pub fn gpr(&self, n: usize) -> u32 {
        self.regs.r[n & 0xF]
    }
    pub fn set_gpr(&mut self, n: usize, value: u32) {
        self.regs.r[n & 0xF] = value;
    }

    pub fn sr(&self) -> u32 {
        self.regs.sr.full()
    }
    pub fn set_sr(&mut self, value: u32) {
        self.regs.sr.set_full(value & SR_WRITE_MASK);
    }

    pub fn gbr(&self) -> u32 {
        self.regs.gbr
    }
    pub fn set_gbr(&mut self, value: u32) {
        self.regs.gbr = value;
    }

    pub fn vbr(&self) -> u32 {
        self.regs.vbr
    }
    pub fn set_vbr(&mut self, value: u32) {
        self.regs.vbr = value;
    }

    pub fn mach(&self) -> u32 {
        self.regs.mach
    }
    pub fn set_mach(&mut self, value: u32) {
        self.regs.mach = value;
    }

    pub fn macl(&self) -> u32 {
        self.regs.macl
    }
    pub fn set_macl(&mut self, value: u32) {
        self.regs.macl = value;
    }

    pub fn pr(&self) -> u32 {
        self.regs.pr
    }
    pub fn set_pr(&mut self, value: u32) {
        self.regs.pr = value;
    }

    pub fn pc(&self) -> u32 {
        self.regs.pc
    }
    pub fn set_pc(&mut self, value: u32) {
        self.regs.pc = value;
    }
}

#[inline(always)]
pub(crate) fn sh2_dispatch(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, opcode: u16) {
    let handler = SH2_OP_PTR[opcode as usize];
    handler(ctx, bus, opcode);
}

/// Run until `cycles` reaches `target`, then rebase the counter so the
/// next slice starts from whatever was overshot.
pub fn sh2_exec(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, target: u32) {
    sh2_run(ctx, bus, target);

    ctx.cycles = ctx.cycles.saturating_sub(target);
}

/// Run until `cycles` reaches `target`. The counter is left as is.
pub fn sh2_run(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, target: u32) {
    if ctx.config.interrupt_polling == PollGranularity::Batch {
        sh2intc::handle_interrupts(ctx, bus);
    }

    if ctx.config.instrumentation {
        sh2_debug_dispatcher(ctx, bus, target);
    } else {
        sh2_ipr_dispatcher(ctx, bus, target);
    }
}

fn sh2_ipr_dispatcher(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, target: u32) {
    let per_instruction = ctx.config.interrupt_polling == PollGranularity::Instruction;

    while ctx.cycles < target {
        if per_instruction {
            sh2intc::handle_interrupts(ctx, bus);
        }

        let opcode = sh2mem::fetch(bus, ctx.regs.pc);
        ctx.instruction = opcode;

        sh2_dispatch(ctx, bus, opcode);

        if ctx.debug.has_pending() {
            debug::after_instruction(ctx, bus);
        }
    }
}

fn sh2_debug_dispatcher(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, target: u32) {
    let per_instruction = ctx.config.interrupt_polling == PollGranularity::Instruction;

    while ctx.cycles < target {
        if per_instruction {
            sh2intc::handle_interrupts(ctx, bus);
        }

        debug::check_code_breakpoints(ctx, bus);

        let ubc_after_fetch = sh2intc::ubc_check(ctx, bus);

        let pc = ctx.regs.pc;
        let opcode = sh2mem::fetch(bus, pc);
        ctx.instruction = opcode;

        debug::on_fetch(ctx, pc, opcode);

        sh2_dispatch(ctx, bus, opcode);

        if let Some(flag) = ubc_after_fetch {
            sh2intc::ubc_interrupt(ctx, bus, flag);
        }

        debug::after_instruction(ctx, bus);
    }
}
