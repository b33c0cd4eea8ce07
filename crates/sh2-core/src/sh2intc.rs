// src/sh2intc.rs
//
// Pending interrupt queue, exception frames and the User Break Controller.

use serde::{Deserialize, Serialize};

use super::{Sh2Ctx, sh2mem::Sh2Bus};
use crate::sh2mem::{read_mem32, write_mem32};

pub const MAX_INTERRUPTS: usize = 50;

pub const NMI_VECTOR: u8 = 0x0B;
pub const NMI_LEVEL: u8 = 0x10;

pub const GENERAL_ILLEGAL_VECTOR: u8 = 4;
pub const SLOT_ILLEGAL_VECTOR: u8 = 6;
pub const UBC_VECTOR: u8 = 12;
pub const UBC_LEVEL: u32 = 15;

// BBR bus cycle select
pub const BBR_CPA_CPU: u16 = 0x40;
pub const BBR_IDA_INST: u16 = 0x10;
pub const BBR_RWA_READ: u16 = 0x04;

// BRCR
pub const BRCR_CMFCA: u16 = 0x8000;
pub const BRCR_CMFCB: u16 = 0x0080;
pub const BRCR_PCBA: u16 = 0x0400;
pub const BRCR_PCBB: u16 = 0x0004;

pub const BBR_WRITE_MASK: u16 = 0x00FF;
pub const BRCR_WRITE_MASK: u16 = 0xF4DC;

// Offsets inside the on-chip page (addr & 0x1FF)
pub const UBC_BARA_ADDR: u32 = 0x140;
pub const UBC_BAMRA_ADDR: u32 = 0x144;
pub const UBC_BBRA_ADDR: u32 = 0x148;
pub const UBC_BARB_ADDR: u32 = 0x160;
pub const UBC_BAMRB_ADDR: u32 = 0x164;
pub const UBC_BBRB_ADDR: u32 = 0x168;
pub const UBC_BDRB_ADDR: u32 = 0x170;
pub const UBC_BDMRB_ADDR: u32 = 0x174;
pub const UBC_BRCR_ADDR: u32 = 0x178;

pub const UBC_WINDOW_START: u32 = 0x140;
pub const UBC_WINDOW_END: u32 = 0x17F;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInterrupt {
    pub vector: u8,
    pub level: u8,
}

/// User Break Controller register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ubc {
    pub bara: u32,
    pub bamra: u32,
    pub bbra: u16,
    pub barb: u32,
    pub bamrb: u32,
    pub bbrb: u16,
    pub bdrb: u32,
    pub bdmrb: u32,
    pub brcr: u16,
}

/// Which comparator requested the break. Selects the BRCR flag to set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UbcChannel {
    A,
    B,
}

impl UbcChannel {
    fn condition_flag(self) -> u16 {
        match self {
            UbcChannel::A => BRCR_CMFCA,
            UbcChannel::B => BRCR_CMFCB,
        }
    }
}

impl Ubc {
    // 16-bit registers sit in the upper half of their longword.
    fn longword(&self, offset: u32) -> u32 {
        match offset & !3 {
            UBC_BARA_ADDR => self.bara,
            UBC_BAMRA_ADDR => self.bamra,
            UBC_BBRA_ADDR => (self.bbra as u32) << 16,
            UBC_BARB_ADDR => self.barb,
            UBC_BAMRB_ADDR => self.bamrb,
            UBC_BBRB_ADDR => (self.bbrb as u32) << 16,
            UBC_BDRB_ADDR => self.bdrb,
            UBC_BDMRB_ADDR => self.bdmrb,
            UBC_BRCR_ADDR => (self.brcr as u32) << 16,
            _ => 0,
        }
    }

    fn set_longword(&mut self, offset: u32, data: u32) {
        match offset & !3 {
            UBC_BARA_ADDR => self.bara = data,
            UBC_BAMRA_ADDR => self.bamra = data,
            UBC_BBRA_ADDR => self.bbra = (data >> 16) as u16 & BBR_WRITE_MASK,
            UBC_BARB_ADDR => self.barb = data,
            UBC_BAMRB_ADDR => self.bamrb = data,
            UBC_BBRB_ADDR => self.bbrb = (data >> 16) as u16 & BBR_WRITE_MASK,
            UBC_BDRB_ADDR => self.bdrb = data,
            UBC_BDMRB_ADDR => self.bdmrb = data,
            UBC_BRCR_ADDR => self.brcr = (data >> 16) as u16 & BRCR_WRITE_MASK,
            _ => {}
        }
    }

    pub fn read8(&self, offset: u32) -> u8 {
        let shift = (3 - (offset & 3)) * 8;
        (self.longword(offset) >> shift) as u8
    }

    pub fn read16(&self, offset: u32) -> u16 {
        let shift = (2 - (offset & 2)) * 8;
        (self.longword(offset) >> shift) as u16
    }

    pub fn read32(&self, offset: u32) -> u32 {
        self.longword(offset)
    }

    pub fn write8(&mut self, offset: u32, data: u8) {
        let shift = (3 - (offset & 3)) * 8;
        let old = self.longword(offset) & !(0xFF << shift);
        self.set_longword(offset, old | ((data as u32) << shift));
    }

    pub fn write16(&mut self, offset: u32, data: u16) {
        let shift = (2 - (offset & 2)) * 8;
        let old = self.longword(offset) & !(0xFFFF << shift);
        self.set_longword(offset, old | ((data as u32) << shift));
    }

    pub fn write32(&mut self, offset: u32, data: u32) {
        self.set_longword(offset, data);
    }

    fn armed(bbr: u16) -> bool {
        bbr & (BBR_CPA_CPU | BBR_IDA_INST | BBR_RWA_READ) != 0
    }

    /// Compare `pc` against the armed channels. Channel B is only looked at
    /// when channel A is not armed.
    pub fn matches(&self, pc: u32) -> Option<UbcChannel> {
        if Self::armed(self.bbra) {
            (self.bara == pc & !self.bamra).then_some(UbcChannel::A)
        } else if Self::armed(self.bbrb) {
            (self.barb == pc & !self.bamrb).then_some(UbcChannel::B)
        } else {
            None
        }
    }

    fn breaks_after_fetch(&self, channel: UbcChannel) -> bool {
        match channel {
            UbcChannel::A => self.brcr & BRCR_PCBA != 0,
            UbcChannel::B => self.brcr & BRCR_PCBB != 0,
        }
    }
}

impl Sh2Ctx {
    /// Queue an interrupt. A vector that is already queued is ignored.
    pub fn send_interrupt(&mut self, vector: u8, level: u8) {
        if self.interrupts.iter().any(|i| i.vector == vector) {
            return;
        }

        if self.interrupts.len() >= MAX_INTERRUPTS {
            log::warn!(
                "{}: interrupt queue full, dropping vector {:02X} level {}",
                self.name(),
                vector,
                level
            );
            return;
        }

        // ascending by level, the top entry is the last one
        let pos = self.interrupts.partition_point(|i| i.level <= level);
        self.interrupts.insert(pos, PendingInterrupt { vector, level });
    }

    pub fn pending_interrupts(&self) -> &[PendingInterrupt] {
        &self.interrupts
    }

    pub fn set_pending_interrupts(&mut self, interrupts: &[PendingInterrupt]) {
        self.interrupts.clear();
        for i in interrupts.iter().take(MAX_INTERRUPTS) {
            self.send_interrupt(i.vector, i.level);
        }
    }

    pub fn clear_interrupts(&mut self) {
        self.interrupts.clear();
    }
}

/// Push SR then `return_pc`, set the mask and jump through VBR + vector * 4.
pub(crate) fn enter_exception(
    ctx: &mut Sh2Ctx,
    bus: &mut dyn Sh2Bus,
    vector: u8,
    imask: u32,
    return_pc: u32,
) {
    let sr = ctx.regs.sr.full();
    ctx.regs.r[15] = ctx.regs.r[15].wrapping_sub(4);
    let sp = ctx.regs.r[15];
    write_mem32(ctx, bus, sp, sr);

    ctx.regs.r[15] = ctx.regs.r[15].wrapping_sub(4);
    let sp = ctx.regs.r[15];
    write_mem32(ctx, bus, sp, return_pc);

    ctx.regs.sr.set_imask(imask);

    let vbr = ctx.regs.vbr;
    ctx.regs.pc = read_mem32(ctx, bus, vbr.wrapping_add((vector as u32) << 2));
}

pub(crate) fn handle_interrupts(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus) {
    let Some(&top) = ctx.interrupts.last() else {
        return;
    };

    if (top.level as u32) <= ctx.regs.sr.imask() {
        return;
    }

    // a sleeping CPU resumes after the sleep instruction, as on hardware
    let return_pc = if ctx.is_sleeping {
        ctx.regs.pc.wrapping_add(2)
    } else {
        ctx.regs.pc
    };

    let level = (top.level as u32).min(15);
    enter_exception(ctx, bus, top.vector, level, return_pc);

    log::trace!(
        "{}: interrupt vector {:02X} level {} taken, PC {:08X}",
        ctx.name(),
        top.vector,
        top.level,
        ctx.regs.pc
    );

    ctx.is_idle = false;
    ctx.is_sleeping = false;
    ctx.interrupts.pop();
}

/// Per-fetch UBC comparison. Breaks before the fetch are taken here;
/// the channel is returned when the break has to wait until after the
/// instruction ran.
pub(crate) fn ubc_check(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus) -> Option<UbcChannel> {
    let channel = ctx.ubc.matches(ctx.regs.pc)?;

    if ctx.ubc.breaks_after_fetch(channel) {
        return Some(channel);
    }

    ubc_interrupt(ctx, bus, channel);
    None
}

pub(crate) fn ubc_interrupt(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, channel: UbcChannel) {
    if UBC_LEVEL > ctx.regs.sr.imask() {
        let pc = ctx.regs.pc;
        enter_exception(ctx, bus, UBC_VECTOR, UBC_LEVEL, pc);

        log::debug!(
            "{}: user break channel {:?}, handler {:08X}",
            ctx.name(),
            channel,
            ctx.regs.pc
        );
    }

    ctx.ubc.brcr |= channel.condition_flag();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_stays_sorted_and_unique() {
        let mut ctx = Sh2Ctx::new(false);
        ctx.send_interrupt(0x40, 9);
        ctx.send_interrupt(0x41, 4);
        ctx.send_interrupt(0x42, 12);
        ctx.send_interrupt(0x40, 1);

        let levels: Vec<u8> = ctx.pending_interrupts().iter().map(|i| i.level).collect();
        assert_eq!(levels, vec![4, 9, 12]);
        assert_eq!(ctx.pending_interrupts().last().map(|i| i.vector), Some(0x42));
    }

    #[test]
    fn queue_is_bounded() {
        let mut ctx = Sh2Ctx::new(true);
        for v in 0..=255u8 {
            ctx.send_interrupt(v, v & 0xF);
        }
        assert_eq!(ctx.pending_interrupts().len(), MAX_INTERRUPTS);
    }

    #[test]
    fn ubc_registers_by_size() {
        let mut ubc = Ubc::default();
        ubc.write32(UBC_BARA_ADDR, 0x0600_4000);
        assert_eq!(ubc.read16(UBC_BARA_ADDR), 0x0600);
        assert_eq!(ubc.read16(UBC_BARA_ADDR + 2), 0x4000);
        assert_eq!(ubc.read8(UBC_BARA_ADDR + 1), 0x00);

        ubc.write16(UBC_BBRA_ADDR, 0xFFFF);
        assert_eq!(ubc.bbra, 0x00FF);

        ubc.write16(UBC_BRCR_ADDR, 0xFFFF);
        assert_eq!(ubc.brcr, BRCR_WRITE_MASK);
        assert_eq!(ubc.read32(UBC_BRCR_ADDR), (BRCR_WRITE_MASK as u32) << 16);
    }

    #[test]
    fn channel_b_only_when_a_unarmed() {
        let mut ubc = Ubc {
            barb: 0x1000,
            bbrb: BBR_IDA_INST,
            ..Default::default()
        };
        assert_eq!(ubc.matches(0x1000), Some(UbcChannel::B));

        ubc.bbra = BBR_CPA_CPU;
        ubc.bara = 0x2000;
        assert_eq!(ubc.matches(0x1000), None);
        assert_eq!(ubc.matches(0x2000), Some(UbcChannel::A));
    }

    #[test]
    fn address_mask_ignores_bits() {
        let ubc = Ubc {
            bara: 0x0600_0000,
            bamra: 0x0000_FFFF,
            bbra: BBR_RWA_READ,
            ..Default::default()
        };
        assert_eq!(ubc.matches(0x0600_1234), Some(UbcChannel::A));
        assert_eq!(ubc.matches(0x0601_0000), None);
    }
}
