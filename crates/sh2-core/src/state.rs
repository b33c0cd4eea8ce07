use serde::{Deserialize, Serialize};

use super::{Sh2Ctx, Sh2Regs};
use crate::error::Sh2Error;
use crate::sh2intc::{PendingInterrupt, Ubc};

// Debugger state (breakpoints, callbacks, stepping) is not saved.
#[derive(Serialize, Deserialize)]
struct Sh2State {
    regs: Sh2Regs,
    ubc: Ubc,
    interrupts: Vec<PendingInterrupt>,
    cycles: u32,
    is_slave: bool,
    is_idle: bool,
    is_sleeping: bool,
    instruction: u16,
}

impl Sh2Ctx {
    pub fn save_state(&self) -> Result<Vec<u8>, Sh2Error> {
        let state = Sh2State {
            regs: self.regs,
            ubc: self.ubc,
            interrupts: self.interrupts.clone(),
            cycles: self.cycles,
            is_slave: self.is_slave,
            is_idle: self.is_idle,
            is_sleeping: self.is_sleeping,
            instruction: self.instruction,
        };
        Ok(bincode::serialize(&state)?)
    }

    /// Restore a snapshot taken by [`Sh2Ctx::save_state`]. The context is
    /// left untouched when the data does not decode.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), Sh2Error> {
        let state: Sh2State = bincode::deserialize(data)?;

        self.set_registers(&state.regs);
        self.ubc = state.ubc;
        self.set_pending_interrupts(&state.interrupts);
        self.cycles = state.cycles;
        self.is_slave = state.is_slave;
        self.is_idle = state.is_idle;
        self.is_sleeping = state.is_sleeping;
        self.instruction = state.instruction;
        self.delay_slot = None;
        self.slot_exception = false;
        Ok(())
    }
}
