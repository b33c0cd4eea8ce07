use thiserror::Error;

/// Failures reported by the debugger and save-state interfaces.
/// Instruction-level faults never show up here.
#[derive(Debug, Error)]
pub enum Sh2Error {
    #[error("breakpoint table is full")]
    BreakpointTableFull,
    #[error("breakpoint already set at {0:#010x}")]
    DuplicateBreakpoint(u32),
    #[error("no breakpoint at {0:#010x}")]
    BreakpointNotFound(u32),
    #[error("memory breakpoint needs at least one access flag")]
    InvalidMemoryBreakpointFlags,
    #[error("address {0:#010x} cannot be watched")]
    UnsupportedBreakpointAddress(u32),
    #[error("invalid register index {0}")]
    InvalidRegister(usize),
    #[error("a step request is already armed")]
    StepAlreadyArmed,
    #[error("stepping requires instrumentation")]
    InstrumentationDisabled,
    #[error("save-state: {0}")]
    State(#[from] bincode::Error),
}
