use super::{SR_WRITE_MASK, Sh2Ctx, SrStatus, sh2_dispatch};
use super::sh2mem::{self, Sh2Bus};
use crate::debug;
use crate::sh2intc::{self, GENERAL_ILLEGAL_VECTOR, SLOT_ILLEGAL_VECTOR};

#[inline(always)]
pub fn sh2_next(ctx: &mut Sh2Ctx, cycles: u32) {
    ctx.regs.pc = ctx.regs.pc.wrapping_add(2);
    ctx.cycles = ctx.cycles.wrapping_add(cycles);
}

/// Run the instruction at `slot_pc` with PC already holding the branch
/// target, then put the target back.
pub fn sh2_delay(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, slot_pc: u32) {
    let target = ctx.regs.pc;

    let opcode = sh2mem::fetch(bus, slot_pc);
    ctx.instruction = opcode;
    debug::on_delay_slot(ctx, slot_pc);

    ctx.delay_slot = Some(slot_pc);
    sh2_dispatch(ctx, bus, opcode);
    ctx.delay_slot = None;

    if ctx.slot_exception {
        // resume in the slot illegal handler
        ctx.slot_exception = false;
    } else {
        ctx.regs.pc = target;
    }
}

#[inline(always)]
pub fn sh2_branch_cond(ctx: &mut Sh2Ctx, taken: bool, target: u32) {
    if taken {
        ctx.regs.pc = target;
        ctx.cycles = ctx.cycles.wrapping_add(3);
    } else {
        sh2_next(ctx, 1);
    }
}

#[inline(always)]
pub fn sh2_branch_cond_delay(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, taken: bool, target: u32) {
    if taken {
        sh2_branch_delay(ctx, bus, target, 2);
    } else {
        sh2_next(ctx, 1);
    }
}

#[inline(always)]
pub fn sh2_branch_delay(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, target: u32, cycles: u32) {
    let pc = ctx.regs.pc;
    ctx.regs.pc = target;
    ctx.cycles = ctx.cycles.wrapping_add(cycles);
    sh2_delay(ctx, bus, pc.wrapping_add(2));
}

#[inline(always)]
pub fn sh2_rte(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus) {
    let pc = ctx.regs.pc;

    let sp = ctx.regs.r[15];
    let target = sh2mem::read_mem32(ctx, bus, sp);
    ctx.regs.r[15] = sp.wrapping_add(4);

    let sp = ctx.regs.r[15];
    let sr = sh2mem::read_mem32(ctx, bus, sp);
    ctx.regs.sr.set_full(sr & SR_WRITE_MASK);
    ctx.regs.r[15] = sp.wrapping_add(4);

    ctx.regs.pc = target;
    ctx.cycles = ctx.cycles.wrapping_add(4);
    sh2_delay(ctx, bus, pc.wrapping_add(2));
}

#[inline(always)]
pub fn sh2_trapa(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, imm: u32) {
    let sr = ctx.regs.sr.full();
    let ret = ctx.regs.pc.wrapping_add(2);

    ctx.regs.r[15] = ctx.regs.r[15].wrapping_sub(4);
    let sp = ctx.regs.r[15];
    sh2mem::write_mem32(ctx, bus, sp, sr);
    ctx.regs.r[15] = ctx.regs.r[15].wrapping_sub(4);
    let sp = ctx.regs.r[15];
    sh2mem::write_mem32(ctx, bus, sp, ret);

    let vbr = ctx.regs.vbr;
    ctx.regs.pc = sh2mem::read_mem32(ctx, bus, vbr.wrapping_add(imm << 2));
    ctx.cycles = ctx.cycles.wrapping_add(8);
}

/// Stays on the sleep instruction until an interrupt wakes the CPU.
#[inline(always)]
pub fn sh2_sleep(ctx: &mut Sh2Ctx) {
    ctx.is_sleeping = true;
    ctx.cycles = ctx.cycles.wrapping_add(3);
}

pub fn sh2_illegal(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, opcode: u16) {
    if ctx.config.emulate_bios {
        if let Some(mut hook) = ctx.bios_hook.take() {
            let handled = hook.handle(ctx, bus);
            if ctx.bios_hook.is_none() {
                ctx.bios_hook = Some(hook);
            }
            if handled {
                log::trace!("{}: BIOS call returned to {:08X}", ctx.name(), ctx.regs.pc);

                // carry on with the instruction the hook returned to
                let opcode = sh2mem::fetch(bus, ctx.regs.pc);
                ctx.instruction = opcode;
                sh2_dispatch(ctx, bus, opcode);
                return;
            }
        }
    }

    let (vector, ret) = match ctx.delay_slot {
        Some(slot_pc) => {
            ctx.slot_exception = true;
            (SLOT_ILLEGAL_VECTOR, slot_pc.wrapping_sub(2))
        }
        None => (GENERAL_ILLEGAL_VECTOR, ctx.regs.pc.wrapping_add(2)),
    };

    log::warn!(
        "{}: illegal instruction {:04X} at {:08X}, vector {}",
        ctx.name(),
        opcode,
        ctx.delay_slot.unwrap_or(ctx.regs.pc),
        vector
    );

    sh2intc::enter_exception(ctx, bus, vector, 15, ret);
    ctx.cycles = ctx.cycles.wrapping_add(1);
}

// memory

#[inline(always)]
pub fn sh2_read_mems8(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, addr: u32) -> u32 {
    sh2mem::read_mem8(ctx, bus, addr) as i8 as i32 as u32
}

#[inline(always)]
pub fn sh2_read_mems16(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, addr: u32) -> u32 {
    sh2mem::read_mem16(ctx, bus, addr) as i16 as i32 as u32
}

#[inline(always)]
pub fn sh2_read_mem32(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, addr: u32) -> u32 {
    sh2mem::read_mem32(ctx, bus, addr)
}

#[inline(always)]
pub fn sh2_write_mem8(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, addr: u32, data: u32) {
    sh2mem::write_mem8(ctx, bus, addr, data as u8);
}

#[inline(always)]
pub fn sh2_write_mem16(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, addr: u32, data: u32) {
    sh2mem::write_mem16(ctx, bus, addr, data as u16);
}

#[inline(always)]
pub fn sh2_write_mem32(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, addr: u32, data: u32) {
    sh2mem::write_mem32(ctx, bus, addr, data);
}

// arithmetic

#[inline(always)]
pub fn sh2_addc(sr: &mut SrStatus, rn: u32, rm: u32) -> u32 {
    let (tmp, c1) = rn.overflowing_add(rm);
    let (res, c2) = tmp.overflowing_add(sr.t() as u32);
    sr.set_t(c1 || c2);
    res
}

#[inline(always)]
pub fn sh2_addv(sr: &mut SrStatus, rn: u32, rm: u32) -> u32 {
    let (res, overflow) = (rn as i32).overflowing_add(rm as i32);
    sr.set_t(overflow);
    res as u32
}

#[inline(always)]
pub fn sh2_subc(sr: &mut SrStatus, rn: u32, rm: u32) -> u32 {
    let (tmp, b1) = rn.overflowing_sub(rm);
    let (res, b2) = tmp.overflowing_sub(sr.t() as u32);
    sr.set_t(b1 || b2);
    res
}

#[inline(always)]
pub fn sh2_subv(sr: &mut SrStatus, rn: u32, rm: u32) -> u32 {
    let (res, overflow) = (rn as i32).overflowing_sub(rm as i32);
    sr.set_t(overflow);
    res as u32
}

#[inline(always)]
pub fn sh2_negc(sr: &mut SrStatus, rm: u32) -> u32 {
    sh2_subc(sr, 0, rm)
}

#[inline(always)]
pub fn sh2_div0s(sr: &mut SrStatus, rn: u32, rm: u32) {
    let q = rn & 0x8000_0000 != 0;
    let m = rm & 0x8000_0000 != 0;
    sr.set_q(q);
    sr.set_m(m);
    sr.set_t(q != m);
}

#[inline(always)]
pub fn sh2_div0u(sr: &mut SrStatus) {
    sr.set_q(false);
    sr.set_m(false);
    sr.set_t(false);
}

/// One step of the non-restoring division. With `aliased` (n == m) the
/// divisor is the already shifted dividend.
pub fn sh2_div1(sr: &mut SrStatus, rn: u32, rm: u32, aliased: bool) -> u32 {
    let old_q = sr.q();
    let q = rn & 0x8000_0000 != 0;

    let shifted = (rn << 1) | sr.t() as u32;
    let divisor = if aliased { shifted } else { rm };

    let (res, carry) = if old_q == sr.m() {
        shifted.overflowing_sub(divisor)
    } else {
        shifted.overflowing_add(divisor)
    };

    let new_q = if sr.m() { q == carry } else { q ^ carry };

    sr.set_q(new_q);
    sr.set_t(new_q == sr.m());
    res
}

#[inline(always)]
pub fn sh2_cmp_str(rn: u32, rm: u32) -> bool {
    (rn ^ rm).to_be_bytes().contains(&0)
}

#[inline(always)]
pub fn sh2_dmuls(rn: u32, rm: u32) -> (u32, u32) {
    let res = (rn as i32 as i64).wrapping_mul(rm as i32 as i64) as u64;
    ((res >> 32) as u32, res as u32)
}

#[inline(always)]
pub fn sh2_dmulu(rn: u32, rm: u32) -> (u32, u32) {
    let res = (rn as u64) * (rm as u64);
    ((res >> 32) as u32, res as u32)
}

/// mac.w accumulate. With S set only MACL changes and saturates at 32 bits.
pub fn sh2_mac_w(s: bool, mach: u32, macl: u32, a: i16, b: i16) -> (u32, u32) {
    let prod = a as i32 * b as i32;

    if s {
        let (sum, overflow) = (macl as i32).overflowing_add(prod);
        let macl = match (overflow, prod < 0) {
            (false, _) => sum as u32,
            (true, false) => 0x7FFF_FFFF,
            (true, true) => 0x8000_0000,
        };
        (mach, macl)
    } else {
        let acc = (((mach as u64) << 32) | macl as u64).wrapping_add(prod as i64 as u64);
        ((acc >> 32) as u32, acc as u32)
    }
}

/// mac.l accumulate. With S set the accumulator is 48 bits wide and
/// saturates.
pub fn sh2_mac_l(s: bool, mach: u32, macl: u32, a: i32, b: i32) -> (u32, u32) {
    let prod = a as i64 * b as i64;

    if s {
        const MAX48: i64 = (1 << 47) - 1;
        const MIN48: i64 = -(1 << 47);

        // sign extend MACH[15:0]:MACL
        let acc = ((((mach as u64) << 32 | macl as u64) << 16) as i64) >> 16;
        let sum = acc + prod;

        if sum < MIN48 {
            (0x0000_8000, 0x0000_0000)
        } else if sum > MAX48 {
            (0x0000_7FFF, 0xFFFF_FFFF)
        } else {
            ((sum >> 32) as u32, sum as u32)
        }
    } else {
        let acc = (((mach as u64) << 32) | macl as u64).wrapping_add(prod as u64);
        ((acc >> 32) as u32, acc as u32)
    }
}

// shifts and rotates, T takes the bit shifted out

#[inline(always)]
pub fn sh2_shll(sr: &mut SrStatus, rn: u32) -> u32 {
    sr.set_t(rn & 0x8000_0000 != 0);
    rn << 1
}

#[inline(always)]
pub fn sh2_shlr(sr: &mut SrStatus, rn: u32) -> u32 {
    sr.set_t(rn & 1 != 0);
    rn >> 1
}

#[inline(always)]
pub fn sh2_shar(sr: &mut SrStatus, rn: u32) -> u32 {
    sr.set_t(rn & 1 != 0);
    ((rn as i32) >> 1) as u32
}

#[inline(always)]
pub fn sh2_rotl(sr: &mut SrStatus, rn: u32) -> u32 {
    sr.set_t(rn & 0x8000_0000 != 0);
    rn.rotate_left(1)
}

#[inline(always)]
pub fn sh2_rotr(sr: &mut SrStatus, rn: u32) -> u32 {
    sr.set_t(rn & 1 != 0);
    rn.rotate_right(1)
}

#[inline(always)]
pub fn sh2_rotcl(sr: &mut SrStatus, rn: u32) -> u32 {
    let res = (rn << 1) | sr.t() as u32;
    sr.set_t(rn & 0x8000_0000 != 0);
    res
}

#[inline(always)]
pub fn sh2_rotcr(sr: &mut SrStatus, rn: u32) -> u32 {
    let res = (rn >> 1) | ((sr.t() as u32) << 31);
    sr.set_t(rn & 1 != 0);
    res
}

#[inline(always)]
pub fn sh2_dt(sr: &mut SrStatus, rn: u32) -> u32 {
    let res = rn.wrapping_sub(1);
    sr.set_t(res == 0);
    res
}

#[inline(always)]
pub fn sh2_swapb(rm: u32) -> u32 {
    (rm & 0xFFFF_0000) | ((rm & 0xFF) << 8) | ((rm >> 8) & 0xFF)
}

#[inline(always)]
pub fn sh2_swapw(rm: u32) -> u32 {
    rm.rotate_left(16)
}

#[inline(always)]
pub fn sh2_xtrct(rn: u32, rm: u32) -> u32 {
    (rn >> 16) | (rm << 16)
}
