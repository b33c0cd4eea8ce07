// src/debug.rs
//
// Code/memory breakpoints, forced break, step-over/out, backtrace and
// loop tracking. All of it hangs off a single callback per context.

use std::collections::{BTreeMap, HashMap};

use bitflags::bitflags;

use super::{Sh2Ctx, sh2mem::Sh2Bus};
use crate::error::Sh2Error;

pub const MAX_BREAKPOINTS: usize = 10;
pub const MAX_BACKTRACE: usize = 256;
pub const MAX_LOOP_ENTRIES: usize = 4096;

/// Cache areas (address bits 31-29) memory breakpoints can watch.
const WATCHABLE_AREAS: [u32; 3] = [0, 1, 5];

pub type BreakpointCallback = Box<dyn FnMut(&mut Sh2Ctx, &mut dyn Sh2Bus, BreakEvent)>;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MemBreakFlags: u8 {
        const READ8 = 1 << 0;
        const READ16 = 1 << 1;
        const READ32 = 1 << 2;
        const WRITE8 = 1 << 3;
        const WRITE16 = 1 << 4;
        const WRITE32 = 1 << 5;

        const READ = Self::READ8.bits() | Self::READ16.bits() | Self::READ32.bits();
        const WRITE = Self::WRITE8.bits() | Self::WRITE16.bits() | Self::WRITE32.bits();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryBreakpoint {
    pub addr: u32,
    pub flags: MemBreakFlags,
}

/// Why the callback was invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakEvent {
    CodeBreakpoint { pc: u32 },
    /// `access` is the single kind of access that matched.
    MemoryBreakpoint { addr: u32, access: MemBreakFlags },
    Forced { pc: u32 },
    StepOver { pc: u32 },
    StepOut { pc: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepMode {
    Over { depth: u32 },
    /// Fires once the call depth drops below zero and PC reaches PR.
    Out { depth: i32 },
}

struct StepState {
    mode: StepMode,
    callback: BreakpointCallback,
}

#[derive(Default)]
pub(crate) struct DebugState {
    pub(crate) code_breakpoints: Vec<u32>,
    pub(crate) memory_breakpoints: BTreeMap<u32, MemBreakFlags>,
    callback: Option<BreakpointCallback>,
    in_breakpoint: bool,
    force_break: bool,
    step: Option<StepState>,
    backtrace: Vec<u32>,
    loop_tracking: bool,
    loop_hits: HashMap<u32, u32>,
    // raised mid-instruction, delivered once it completes
    pending: Vec<BreakEvent>,
}

impl DebugState {
    pub(crate) fn reset(&mut self) {
        self.step = None;
        self.backtrace.clear();
        self.pending.clear();
        self.force_break = false;
    }

    #[inline(always)]
    pub(crate) fn has_pending(&self) -> bool {
        self.force_break || !self.pending.is_empty()
    }
}

#[inline(always)]
pub fn is_call(opcode: u16) -> bool {
    (opcode & 0xF000) == 0xB000 // bsr
        || (opcode & 0xF0FF) == 0x0003 // bsrf
        || (opcode & 0xF0FF) == 0x400B // jsr
}

const RTE: u16 = 0x002B;

#[inline(always)]
pub fn is_return(opcode: u16) -> bool {
    opcode == 0x000B
}

fn watchable(addr: u32) -> bool {
    WATCHABLE_AREAS.contains(&(addr >> 29))
}

impl Sh2Ctx {
    pub fn add_code_breakpoint(&mut self, addr: u32) -> Result<(), Sh2Error> {
        let name = self.name();
        let bps = &mut self.debug.code_breakpoints;
        if bps.contains(&addr) {
            log::debug!("{}: code breakpoint {:08X} already set", name, addr);
            return Err(Sh2Error::DuplicateBreakpoint(addr));
        }
        if bps.len() >= MAX_BREAKPOINTS {
            log::debug!("{}: code breakpoint table full", name);
            return Err(Sh2Error::BreakpointTableFull);
        }
        bps.push(addr);
        Ok(())
    }

    pub fn del_code_breakpoint(&mut self, addr: u32) -> Result<(), Sh2Error> {
        let bps = &mut self.debug.code_breakpoints;
        let Some(pos) = bps.iter().position(|&a| a == addr) else {
            return Err(Sh2Error::BreakpointNotFound(addr));
        };
        bps.remove(pos);
        Ok(())
    }

    pub fn code_breakpoints(&self) -> &[u32] {
        &self.debug.code_breakpoints
    }

    pub fn clear_code_breakpoints(&mut self) {
        self.debug.code_breakpoints.clear();
    }

    pub fn add_memory_breakpoint(&mut self, addr: u32, flags: MemBreakFlags) -> Result<(), Sh2Error> {
        if flags.is_empty() {
            return Err(Sh2Error::InvalidMemoryBreakpointFlags);
        }
        if !watchable(addr) {
            log::debug!("{}: cannot watch {:08X}", self.name(), addr);
            return Err(Sh2Error::UnsupportedBreakpointAddress(addr));
        }

        let name = self.name();
        let key = addr & 0x0FFF_FFFF;
        let bps = &mut self.debug.memory_breakpoints;
        if bps.contains_key(&key) {
            return Err(Sh2Error::DuplicateBreakpoint(key));
        }
        if bps.len() >= MAX_BREAKPOINTS {
            log::debug!("{}: memory breakpoint table full", name);
            return Err(Sh2Error::BreakpointTableFull);
        }
        bps.insert(key, flags);
        Ok(())
    }

    pub fn del_memory_breakpoint(&mut self, addr: u32) -> Result<(), Sh2Error> {
        let key = addr & 0x0FFF_FFFF;
        match self.debug.memory_breakpoints.remove(&key) {
            Some(_) => Ok(()),
            None => Err(Sh2Error::BreakpointNotFound(addr)),
        }
    }

    pub fn memory_breakpoints(&self) -> Vec<MemoryBreakpoint> {
        self.debug
            .memory_breakpoints
            .iter()
            .map(|(&addr, &flags)| MemoryBreakpoint { addr, flags })
            .collect()
    }

    pub fn clear_memory_breakpoints(&mut self) {
        self.debug.memory_breakpoints.clear();
    }

    pub fn set_breakpoint_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&mut Sh2Ctx, &mut dyn Sh2Bus, BreakEvent) + 'static,
    {
        self.debug.callback = Some(Box::new(callback));
    }

    pub fn clear_breakpoint_callback(&mut self) {
        self.debug.callback = None;
    }

    pub fn in_breakpoint(&self) -> bool {
        self.debug.in_breakpoint
    }

    /// Break after the next instruction completes.
    pub fn request_break(&mut self) {
        self.debug.force_break = true;
    }

    /// Run a call instruction at PC to its return, then invoke `callback`.
    /// Any other instruction is single-stepped and `Ok(false)` returned.
    pub fn step_over<F>(&mut self, bus: &mut dyn Sh2Bus, callback: F) -> Result<bool, Sh2Error>
    where
        F: FnMut(&mut Sh2Ctx, &mut dyn Sh2Bus, BreakEvent) + 'static,
    {
        self.check_step_request()?;

        let opcode = bus.fetch16(self.regs.pc);
        if !is_call(opcode) {
            self.step(bus);
            return Ok(false);
        }

        self.debug.step = Some(StepState {
            mode: StepMode::Over { depth: 0 },
            callback: Box::new(callback),
        });
        Ok(true)
    }

    /// Invoke `callback` once the current function returns to its caller.
    pub fn step_out<F>(&mut self, callback: F) -> Result<(), Sh2Error>
    where
        F: FnMut(&mut Sh2Ctx, &mut dyn Sh2Bus, BreakEvent) + 'static,
    {
        self.check_step_request()?;

        self.debug.step = Some(StepState {
            mode: StepMode::Out { depth: 0 },
            callback: Box::new(callback),
        });
        Ok(())
    }

    fn check_step_request(&self) -> Result<(), Sh2Error> {
        if !self.config.instrumentation {
            return Err(Sh2Error::InstrumentationDisabled);
        }
        if self.debug.step.is_some() {
            log::debug!("{}: step request already armed", self.name());
            return Err(Sh2Error::StepAlreadyArmed);
        }
        Ok(())
    }

    pub fn cancel_step(&mut self) -> bool {
        self.debug.step.take().is_some()
    }

    pub fn armed_step(&self) -> Option<StepMode> {
        self.debug.step.as_ref().map(|s| s.mode)
    }

    /// Call addresses of the frames entered so far, oldest first.
    pub fn backtrace(&self) -> &[u32] {
        &self.debug.backtrace
    }

    pub fn start_loop_tracking(&mut self) {
        self.debug.loop_tracking = true;
    }

    pub fn stop_loop_tracking(&mut self) {
        self.debug.loop_tracking = false;
    }

    pub fn clear_loop_tracking(&mut self) {
        self.debug.loop_hits.clear();
    }

    pub fn loop_tracking_enabled(&self) -> bool {
        self.debug.loop_tracking
    }

    /// (pc, hits), most executed first.
    pub fn loop_hits(&self) -> Vec<(u32, u32)> {
        let mut hits: Vec<(u32, u32)> = self.debug.loop_hits.iter().map(|(&pc, &n)| (pc, n)).collect();
        hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        hits
    }
}

fn track_loop(state: &mut DebugState, pc: u32) {
    if !state.loop_tracking {
        return;
    }
    if let Some(hits) = state.loop_hits.get_mut(&pc) {
        *hits = hits.saturating_add(1);
    } else if state.loop_hits.len() < MAX_LOOP_ENTRIES {
        state.loop_hits.insert(pc, 1);
    }
}

pub(crate) fn check_code_breakpoints(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus) {
    let pc = ctx.regs.pc;
    if ctx.debug.code_breakpoints.contains(&pc) {
        invoke_callback(ctx, bus, BreakEvent::CodeBreakpoint { pc });
    }
}

pub(crate) fn on_fetch(ctx: &mut Sh2Ctx, pc: u32, opcode: u16) {
    let state = &mut ctx.debug;

    track_loop(state, pc);

    if is_call(opcode) {
        if state.backtrace.len() >= MAX_BACKTRACE {
            state.backtrace.remove(0);
        }
        state.backtrace.push(pc);

        match state.step.as_mut().map(|s| &mut s.mode) {
            Some(StepMode::Over { depth }) => *depth += 1,
            Some(StepMode::Out { depth }) => *depth += 1,
            None => {}
        }
    } else if is_return(opcode) {
        state.backtrace.pop();

        match state.step.as_mut().map(|s| &mut s.mode) {
            Some(StepMode::Over { depth }) => *depth = depth.saturating_sub(1),
            Some(StepMode::Out { depth }) => *depth -= 1,
            None => {}
        }
    } else if opcode == RTE {
        if let Some(StepMode::Out { depth }) = state.step.as_mut().map(|s| &mut s.mode) {
            *depth -= 1;
        }
    }
}

pub(crate) fn on_delay_slot(ctx: &mut Sh2Ctx, pc: u32) {
    if !ctx.config.instrumentation {
        return;
    }

    let state = &mut ctx.debug;
    track_loop(state, pc);

    if !state.in_breakpoint && state.code_breakpoints.contains(&pc) {
        state.pending.push(BreakEvent::CodeBreakpoint { pc });
    }
}

pub(crate) fn note_memory_access(ctx: &mut Sh2Ctx, addr: u32, access: MemBreakFlags) {
    if !watchable(addr) {
        return;
    }

    let state = &mut ctx.debug;
    if state.in_breakpoint {
        return;
    }

    let key = addr & 0x0FFF_FFFF;
    if state
        .memory_breakpoints
        .get(&key)
        .is_some_and(|flags| flags.contains(access))
    {
        state.pending.push(BreakEvent::MemoryBreakpoint { addr, access });
    }
}

pub(crate) fn after_instruction(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus) {
    if !ctx.debug.pending.is_empty() {
        let events = std::mem::take(&mut ctx.debug.pending);
        for event in events {
            invoke_callback(ctx, bus, event);
        }
    }

    if ctx.debug.force_break && !ctx.debug.in_breakpoint {
        ctx.debug.force_break = false;
        let pc = ctx.regs.pc;
        invoke_callback(ctx, bus, BreakEvent::Forced { pc });
    }

    check_step(ctx, bus);
}

fn check_step(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus) {
    if ctx.debug.in_breakpoint {
        return;
    }

    let pc = ctx.regs.pc;
    let event = match ctx.debug.step.as_ref().map(|s| s.mode) {
        Some(StepMode::Over { depth: 0 }) => BreakEvent::StepOver { pc },
        Some(StepMode::Out { depth }) if depth < 0 && pc == ctx.regs.pr => BreakEvent::StepOut { pc },
        _ => return,
    };

    let Some(mut state) = ctx.debug.step.take() else {
        return;
    };

    ctx.debug.in_breakpoint = true;
    (state.callback)(ctx, bus, event);
    ctx.debug.in_breakpoint = false;
}

pub(crate) fn invoke_callback(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, event: BreakEvent) {
    if ctx.debug.in_breakpoint {
        return;
    }
    let Some(mut callback) = ctx.debug.callback.take() else {
        return;
    };

    ctx.debug.in_breakpoint = true;
    callback(ctx, bus, event);
    ctx.debug.in_breakpoint = false;

    // keep a callback installed from inside the handler
    if ctx.debug.callback.is_none() {
        ctx.debug.callback = Some(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_and_return_opcodes() {
        assert!(is_call(0xB123)); // bsr
        assert!(is_call(0x0403)); // bsrf r4
        assert!(is_call(0x4E0B)); // jsr @r14
        assert!(!is_call(0x402B)); // jmp @r0
        assert!(!is_call(0xA000)); // bra
        assert!(is_return(0x000B));
        assert!(!is_return(0x002B)); // rte
    }

    #[test]
    fn loop_table_is_bounded() {
        let mut state = DebugState {
            loop_tracking: true,
            ..Default::default()
        };
        for pc in 0..(MAX_LOOP_ENTRIES as u32 + 10) {
            track_loop(&mut state, pc * 2);
        }
        track_loop(&mut state, 0);
        assert_eq!(state.loop_hits.len(), MAX_LOOP_ENTRIES);
        assert_eq!(state.loop_hits.get(&0), Some(&2));
    }

    #[test]
    fn memory_breakpoint_areas() {
        let mut ctx = Sh2Ctx::new(false);
        assert!(ctx.add_memory_breakpoint(0x2600_0000, MemBreakFlags::READ8).is_ok());
        assert!(matches!(
            ctx.add_memory_breakpoint(0xA600_0000, MemBreakFlags::READ8),
            Err(Sh2Error::DuplicateBreakpoint(0x0600_0000))
        ));
        assert!(matches!(
            ctx.add_memory_breakpoint(0x4600_0000, MemBreakFlags::READ8),
            Err(Sh2Error::UnsupportedBreakpointAddress(_))
        ));
        assert!(matches!(
            ctx.add_memory_breakpoint(0x0600_0004, MemBreakFlags::empty()),
            Err(Sh2Error::InvalidMemoryBreakpointFlags)
        ));
        assert_eq!(ctx.memory_breakpoints()[0].addr, 0x0600_0000);
    }
}
