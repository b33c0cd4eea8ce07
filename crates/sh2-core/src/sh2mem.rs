use super::Sh2Ctx;
use crate::debug::{self, MemBreakFlags};
use crate::sh2intc::{UBC_WINDOW_END, UBC_WINDOW_START};

/// Everything the CPU core needs from the rest of the machine.
pub trait Sh2Bus {
    fn read8(&mut self, addr: u32) -> u8;
    fn read16(&mut self, addr: u32) -> u16;
    fn read32(&mut self, addr: u32) -> u32;

    fn write8(&mut self, addr: u32, data: u8);
    fn write16(&mut self, addr: u32, data: u16);
    fn write32(&mut self, addr: u32, data: u32);

    /// Instruction fetch. Buses with a separate fetch path (or an invalid
    /// fetch sentinel) override this.
    fn fetch16(&mut self, addr: u32) -> u16 {
        self.read16(addr)
    }
}

#[inline(always)]
fn is_onchip(addr: u32) -> bool {
    addr >= 0xFFFF_FE00
}

#[inline(always)]
fn ubc_offset(addr: u32) -> Option<u32> {
    let offset = addr & 0x1FF;
    if is_onchip(addr) && (UBC_WINDOW_START..=UBC_WINDOW_END).contains(&offset) {
        Some(offset)
    } else {
        None
    }
}

// Data accesses issued by instructions. The on-chip UBC window is served
// from the context, everything else goes to the bus and then through the
// memory breakpoint overlay.
macro_rules! sh2_mem_access {
    ($($bits:literal => $ty:ty),*) => {
        paste::paste! {
            $(
                #[inline(always)]
                pub fn [<read_mem $bits>](ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, addr: u32) -> $ty {
                    if let Some(offset) = ubc_offset(addr) {
                        return ctx.ubc.[<read $bits>](offset);
                    }

                    let data = bus.[<read $bits>](addr);

                    if !ctx.debug.memory_breakpoints.is_empty() {
                        debug::note_memory_access(ctx, addr, MemBreakFlags::[<READ $bits>]);
                    }
                    data
                }

                #[inline(always)]
                pub fn [<write_mem $bits>](ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, addr: u32, data: $ty) {
                    if let Some(offset) = ubc_offset(addr) {
                        ctx.ubc.[<write $bits>](offset, data);
                        return;
                    }

                    bus.[<write $bits>](addr, data);

                    if !ctx.debug.memory_breakpoints.is_empty() {
                        debug::note_memory_access(ctx, addr, MemBreakFlags::[<WRITE $bits>]);
                    }
                }
            )*
        }
    };
}

sh2_mem_access!(8 => u8, 16 => u16, 32 => u32);

#[inline(always)]
pub fn fetch(bus: &mut dyn Sh2Bus, pc: u32) -> u16 {
    bus.fetch16(pc)
}
