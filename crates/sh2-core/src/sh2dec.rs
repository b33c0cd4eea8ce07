// src/sh2dec.rs

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]
#![allow(unused_variables)]

use super::{SR_WRITE_MASK, Sh2Ctx};
use super::sh2mem::Sh2Bus;

pub type OpHandler = fn(&mut Sh2Ctx, &mut dyn Sh2Bus, u16);

#[derive(Copy, Clone)]
pub struct sh2_opcodelistentry {
    pub oph: OpHandler,
    pub handler_name: &'static str,
    pub mask: u16,
    pub key: u16,
    pub diss: &'static str,
}

const fn parse_opcode(pattern: &str) -> (u16, u16) {
    let bytes = pattern.as_bytes();
    let mut i = 1; // skip leading 'i'
    let mut mask: u16 = 0;
    let mut key: u16 = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'0' || c == b'1' {
            mask = (mask << 1) | 1;
            if c == b'1' {
                key = (key << 1) | 1;
            } else {
                key = key << 1;
            }
        } else if c != b'_' {
            // wildcard
            mask = mask << 1;
            key = key << 1;
        }
        i += 1;
    }
    (mask, key)
}

macro_rules! sh2op {
    (
        $( (disas = $diss:literal)
           $name:ident ( $ctx:ident , $bus:ident , $opcode:ident ) { $($body:tt)* }
        )*
    ) => {
        pub(crate) mod exec {
            use super::*;
            $(
                #[allow(non_snake_case)]
                pub(crate) fn $name($ctx: &mut Sh2Ctx, $bus: &mut dyn Sh2Bus, $opcode: u16) {
                    #[allow(unused_imports)]
                    use crate::backend_ipr as backend;
                    { $($body)* }
                }
            )*
        }

        // Opcode descriptor table, the undecoded entry is always last
        pub(crate) const OPCODES: &[sh2_opcodelistentry] = &[
            $(
                {
                    const MASK_KEY: (u16, u16) = parse_opcode(stringify!($name));
                    sh2_opcodelistentry {
                        oph: exec::$name,
                        handler_name: stringify!($name),
                        mask: MASK_KEY.0,
                        key: MASK_KEY.1,
                        diss: $diss,
                    }
                }
            ),*,
            sh2_opcodelistentry {
                oph: i_undecoded,
                handler_name: "undecoded",
                mask: 0x0000,
                key: 0x0000,
                diss: ".word <IMM16>",
            },
        ];
    };
}

#[inline(always)]
fn GetN(str_: u16) -> usize {
    ((str_ >> 8) & 0xF) as usize
}
#[inline(always)]
fn GetM(str_: u16) -> usize {
    ((str_ >> 4) & 0xF) as usize
}
#[inline(always)]
fn GetImm4(str_: u16) -> u32 {
    (str_ & 0xF) as u32
}
#[inline(always)]
fn GetImm8(str_: u16) -> u32 {
    (str_ & 0xFF) as u32
}
#[inline(always)]
fn GetSImm8(str_: u16) -> i32 {
    (str_ & 0xFF) as i8 as i32
}
#[inline(always)]
fn GetImm12(str_: u16) -> u32 {
    (str_ & 0xFFF) as u32
}
#[inline(always)]
fn GetSImm12(str_: u16) -> i32 {
    ((((GetImm12(str_) as u16) << 4) as i16) >> 4) as i32
}

#[inline(always)]
fn data_target_s8(pc: u32, disp8: u32) -> u32 {
    (pc.wrapping_add(4) & 0xFFFF_FFFC).wrapping_add(disp8 << 2)
}
#[inline(always)]
fn branch_target_s8(pc: u32, disp8: i32) -> u32 {
    pc.wrapping_add(4).wrapping_add((disp8 << 1) as u32)
}
#[inline(always)]
fn branch_target_s12(pc: u32, disp12: i32) -> u32 {
    pc.wrapping_add(4).wrapping_add((disp12 << 1) as u32)
}

fn i_undecoded(ctx: &mut Sh2Ctx, bus: &mut dyn Sh2Bus, opcode: u16) {
    crate::backend_ipr::sh2_illegal(ctx, bus, opcode);
}

sh2op! {
    // 0000

    (disas = "stc SR,<REG_N>")
    i0000_nnnn_0000_0010(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] = ctx.regs.sr.full();
        backend::sh2_next(ctx, 1);
    }

    (disas = "stc GBR,<REG_N>")
    i0000_nnnn_0001_0010(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] = ctx.regs.gbr;
        backend::sh2_next(ctx, 1);
    }

    (disas = "stc VBR,<REG_N>")
    i0000_nnnn_0010_0010(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] = ctx.regs.vbr;
        backend::sh2_next(ctx, 1);
    }

    (disas = "bsrf <REG_N>")
    i0000_nnnn_0000_0011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let pc = ctx.regs.pc;
        ctx.regs.pr = pc.wrapping_add(4);
        let target = pc.wrapping_add(ctx.regs.r[n]).wrapping_add(4);
        backend::sh2_branch_delay(ctx, bus, target, 2);
    }

    (disas = "braf <REG_N>")
    i0000_nnnn_0010_0011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let target = ctx.regs.pc.wrapping_add(ctx.regs.r[n]).wrapping_add(4);
        backend::sh2_branch_delay(ctx, bus, target, 2);
    }

    (disas = "mov.b <REG_M>,@(R0,<REG_N>)")
    i0000_nnnn_mmmm_0100(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[n].wrapping_add(ctx.regs.r[0]);
        let data = ctx.regs.r[m];
        backend::sh2_write_mem8(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.w <REG_M>,@(R0,<REG_N>)")
    i0000_nnnn_mmmm_0101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[n].wrapping_add(ctx.regs.r[0]);
        let data = ctx.regs.r[m];
        backend::sh2_write_mem16(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.l <REG_M>,@(R0,<REG_N>)")
    i0000_nnnn_mmmm_0110(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[n].wrapping_add(ctx.regs.r[0]);
        let data = ctx.regs.r[m];
        backend::sh2_write_mem32(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mul.l <REG_M>,<REG_N>")
    i0000_nnnn_mmmm_0111(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.macl = ctx.regs.r[n].wrapping_mul(ctx.regs.r[m]);
        backend::sh2_next(ctx, 2);
    }

    (disas = "clrt")
    i0000_0000_0000_1000(ctx, bus, opcode) {
        ctx.regs.sr.set_t(false);
        backend::sh2_next(ctx, 1);
    }

    (disas = "sett")
    i0000_0000_0001_1000(ctx, bus, opcode) {
        ctx.regs.sr.set_t(true);
        backend::sh2_next(ctx, 1);
    }

    (disas = "clrmac")
    i0000_0000_0010_1000(ctx, bus, opcode) {
        ctx.regs.mach = 0;
        ctx.regs.macl = 0;
        backend::sh2_next(ctx, 1);
    }

    (disas = "nop")
    i0000_0000_0000_1001(ctx, bus, opcode) {
        backend::sh2_next(ctx, 1);
    }

    (disas = "div0u")
    i0000_0000_0001_1001(ctx, bus, opcode) {
        backend::sh2_div0u(&mut ctx.regs.sr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "movt <REG_N>")
    i0000_nnnn_0010_1001(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] = ctx.regs.sr.t() as u32;
        backend::sh2_next(ctx, 1);
    }

    (disas = "sts MACH,<REG_N>")
    i0000_nnnn_0000_1010(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] = ctx.regs.mach;
        backend::sh2_next(ctx, 1);
    }

    (disas = "sts MACL,<REG_N>")
    i0000_nnnn_0001_1010(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] = ctx.regs.macl;
        backend::sh2_next(ctx, 1);
    }

    (disas = "sts PR,<REG_N>")
    i0000_nnnn_0010_1010(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] = ctx.regs.pr;
        backend::sh2_next(ctx, 1);
    }

    (disas = "rts")
    i0000_0000_0000_1011(ctx, bus, opcode) {
        let target = ctx.regs.pr;
        backend::sh2_branch_delay(ctx, bus, target, 2);
    }

    (disas = "sleep")
    i0000_0000_0001_1011(ctx, bus, opcode) {
        backend::sh2_sleep(ctx);
    }

    (disas = "rte")
    i0000_0000_0010_1011(ctx, bus, opcode) {
        backend::sh2_rte(ctx, bus);
    }

    (disas = "mov.b @(R0,<REG_M>),<REG_N>")
    i0000_nnnn_mmmm_1100(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[m].wrapping_add(ctx.regs.r[0]);
        ctx.regs.r[n] = backend::sh2_read_mems8(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.w @(R0,<REG_M>),<REG_N>")
    i0000_nnnn_mmmm_1101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[m].wrapping_add(ctx.regs.r[0]);
        ctx.regs.r[n] = backend::sh2_read_mems16(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.l @(R0,<REG_M>),<REG_N>")
    i0000_nnnn_mmmm_1110(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[m].wrapping_add(ctx.regs.r[0]);
        ctx.regs.r[n] = backend::sh2_read_mem32(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mac.l @<REG_M>+,@<REG_N>+")
    i0000_nnnn_mmmm_1111(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);

        let addr = ctx.regs.r[n];
        let a = backend::sh2_read_mem32(ctx, bus, addr) as i32;
        ctx.regs.r[n] = ctx.regs.r[n].wrapping_add(4);

        let addr = ctx.regs.r[m];
        let b = backend::sh2_read_mem32(ctx, bus, addr) as i32;
        ctx.regs.r[m] = ctx.regs.r[m].wrapping_add(4);

        let s = ctx.regs.sr.s();
        let (mach, macl) = backend::sh2_mac_l(s, ctx.regs.mach, ctx.regs.macl, a, b);
        ctx.regs.mach = mach;
        ctx.regs.macl = macl;
        backend::sh2_next(ctx, 3);
    }

    // 0001

    (disas = "mov.l <REG_M>,@(<disp4dw>,<REG_N>)")
    i0001_nnnn_mmmm_iiii(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[n].wrapping_add(GetImm4(opcode) << 2);
        let data = ctx.regs.r[m];
        backend::sh2_write_mem32(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    // 0010

    (disas = "mov.b <REG_M>,@<REG_N>")
    i0010_nnnn_mmmm_0000(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (addr, data) = (ctx.regs.r[n], ctx.regs.r[m]);
        backend::sh2_write_mem8(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.w <REG_M>,@<REG_N>")
    i0010_nnnn_mmmm_0001(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (addr, data) = (ctx.regs.r[n], ctx.regs.r[m]);
        backend::sh2_write_mem16(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.l <REG_M>,@<REG_N>")
    i0010_nnnn_mmmm_0010(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (addr, data) = (ctx.regs.r[n], ctx.regs.r[m]);
        backend::sh2_write_mem32(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.b <REG_M>,@-<REG_N>")
    i0010_nnnn_mmmm_0100(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[n].wrapping_sub(1);
        let data = ctx.regs.r[m];
        backend::sh2_write_mem8(ctx, bus, addr, data);
        ctx.regs.r[n] = addr;
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.w <REG_M>,@-<REG_N>")
    i0010_nnnn_mmmm_0101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[n].wrapping_sub(2);
        let data = ctx.regs.r[m];
        backend::sh2_write_mem16(ctx, bus, addr, data);
        ctx.regs.r[n] = addr;
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.l <REG_M>,@-<REG_N>")
    i0010_nnnn_mmmm_0110(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[n].wrapping_sub(4);
        let data = ctx.regs.r[m];
        backend::sh2_write_mem32(ctx, bus, addr, data);
        ctx.regs.r[n] = addr;
        backend::sh2_next(ctx, 1);
    }

    (disas = "div0s <REG_M>,<REG_N>")
    i0010_nnnn_mmmm_0111(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (rn, rm) = (ctx.regs.r[n], ctx.regs.r[m]);
        backend::sh2_div0s(&mut ctx.regs.sr, rn, rm);
        backend::sh2_next(ctx, 1);
    }

    (disas = "tst <REG_M>,<REG_N>")
    i0010_nnnn_mmmm_1000(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let t = ctx.regs.r[n] & ctx.regs.r[m] == 0;
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "and <REG_M>,<REG_N>")
    i0010_nnnn_mmmm_1001(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] &= ctx.regs.r[m];
        backend::sh2_next(ctx, 1);
    }

    (disas = "xor <REG_M>,<REG_N>")
    i0010_nnnn_mmmm_1010(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] ^= ctx.regs.r[m];
        backend::sh2_next(ctx, 1);
    }

    (disas = "or <REG_M>,<REG_N>")
    i0010_nnnn_mmmm_1011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] |= ctx.regs.r[m];
        backend::sh2_next(ctx, 1);
    }

    (disas = "cmp/str <REG_M>,<REG_N>")
    i0010_nnnn_mmmm_1100(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let t = backend::sh2_cmp_str(ctx.regs.r[n], ctx.regs.r[m]);
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "xtrct <REG_M>,<REG_N>")
    i0010_nnnn_mmmm_1101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = backend::sh2_xtrct(ctx.regs.r[n], ctx.regs.r[m]);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mulu.w <REG_M>,<REG_N>")
    i0010_nnnn_mmmm_1110(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.macl = (ctx.regs.r[n] & 0xFFFF) * (ctx.regs.r[m] & 0xFFFF);
        backend::sh2_next(ctx, 1);
    }

    (disas = "muls.w <REG_M>,<REG_N>")
    i0010_nnnn_mmmm_1111(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let a = ctx.regs.r[n] as i16 as i32;
        let b = ctx.regs.r[m] as i16 as i32;
        ctx.regs.macl = (a * b) as u32;
        backend::sh2_next(ctx, 1);
    }

    // 0011

    (disas = "cmp/eq <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_0000(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let t = ctx.regs.r[n] == ctx.regs.r[m];
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "cmp/hs <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_0010(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let t = ctx.regs.r[n] >= ctx.regs.r[m];
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "cmp/ge <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_0011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let t = ctx.regs.r[n] as i32 >= ctx.regs.r[m] as i32;
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "div1 <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_0100(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (rn, rm) = (ctx.regs.r[n], ctx.regs.r[m]);
        ctx.regs.r[n] = backend::sh2_div1(&mut ctx.regs.sr, rn, rm, n == m);
        backend::sh2_next(ctx, 1);
    }

    (disas = "dmulu.l <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_0101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (mach, macl) = backend::sh2_dmulu(ctx.regs.r[n], ctx.regs.r[m]);
        ctx.regs.mach = mach;
        ctx.regs.macl = macl;
        backend::sh2_next(ctx, 2);
    }

    (disas = "cmp/hi <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_0110(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let t = ctx.regs.r[n] > ctx.regs.r[m];
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "cmp/gt <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_0111(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let t = ctx.regs.r[n] as i32 > ctx.regs.r[m] as i32;
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "sub <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_1000(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = ctx.regs.r[n].wrapping_sub(ctx.regs.r[m]);
        backend::sh2_next(ctx, 1);
    }

    (disas = "subc <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_1010(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (rn, rm) = (ctx.regs.r[n], ctx.regs.r[m]);
        ctx.regs.r[n] = backend::sh2_subc(&mut ctx.regs.sr, rn, rm);
        backend::sh2_next(ctx, 1);
    }

    (disas = "subv <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_1011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (rn, rm) = (ctx.regs.r[n], ctx.regs.r[m]);
        ctx.regs.r[n] = backend::sh2_subv(&mut ctx.regs.sr, rn, rm);
        backend::sh2_next(ctx, 1);
    }

    (disas = "add <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_1100(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = ctx.regs.r[n].wrapping_add(ctx.regs.r[m]);
        backend::sh2_next(ctx, 1);
    }

    (disas = "dmuls.l <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_1101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (mach, macl) = backend::sh2_dmuls(ctx.regs.r[n], ctx.regs.r[m]);
        ctx.regs.mach = mach;
        ctx.regs.macl = macl;
        backend::sh2_next(ctx, 2);
    }

    (disas = "addc <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_1110(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (rn, rm) = (ctx.regs.r[n], ctx.regs.r[m]);
        ctx.regs.r[n] = backend::sh2_addc(&mut ctx.regs.sr, rn, rm);
        backend::sh2_next(ctx, 1);
    }

    (disas = "addv <REG_M>,<REG_N>")
    i0011_nnnn_mmmm_1111(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let (rn, rm) = (ctx.regs.r[n], ctx.regs.r[m]);
        ctx.regs.r[n] = backend::sh2_addv(&mut ctx.regs.sr, rn, rm);
        backend::sh2_next(ctx, 1);
    }

    // 0100

    (disas = "shll <REG_N>")
    i0100_nnnn_0000_0000(ctx, bus, opcode) {
        let n = GetN(opcode);
        let rn = ctx.regs.r[n];
        ctx.regs.r[n] = backend::sh2_shll(&mut ctx.regs.sr, rn);
        backend::sh2_next(ctx, 1);
    }

    (disas = "dt <REG_N>")
    i0100_nnnn_0001_0000(ctx, bus, opcode) {
        let n = GetN(opcode);
        let rn = ctx.regs.r[n];
        ctx.regs.r[n] = backend::sh2_dt(&mut ctx.regs.sr, rn);
        backend::sh2_next(ctx, 1);
    }

    (disas = "shal <REG_N>")
    i0100_nnnn_0010_0000(ctx, bus, opcode) {
        let n = GetN(opcode);
        let rn = ctx.regs.r[n];
        ctx.regs.r[n] = backend::sh2_shll(&mut ctx.regs.sr, rn);
        backend::sh2_next(ctx, 1);
    }

    (disas = "shlr <REG_N>")
    i0100_nnnn_0000_0001(ctx, bus, opcode) {
        let n = GetN(opcode);
        let rn = ctx.regs.r[n];
        ctx.regs.r[n] = backend::sh2_shlr(&mut ctx.regs.sr, rn);
        backend::sh2_next(ctx, 1);
    }

    (disas = "cmp/pz <REG_N>")
    i0100_nnnn_0001_0001(ctx, bus, opcode) {
        let n = GetN(opcode);
        let t = ctx.regs.r[n] as i32 >= 0;
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "shar <REG_N>")
    i0100_nnnn_0010_0001(ctx, bus, opcode) {
        let n = GetN(opcode);
        let rn = ctx.regs.r[n];
        ctx.regs.r[n] = backend::sh2_shar(&mut ctx.regs.sr, rn);
        backend::sh2_next(ctx, 1);
    }

    (disas = "sts.l MACH,@-<REG_N>")
    i0100_nnnn_0000_0010(ctx, bus, opcode) {
        let n = GetN(opcode);
        let addr = ctx.regs.r[n].wrapping_sub(4);
        let data = ctx.regs.mach;
        ctx.regs.r[n] = addr;
        backend::sh2_write_mem32(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "sts.l MACL,@-<REG_N>")
    i0100_nnnn_0001_0010(ctx, bus, opcode) {
        let n = GetN(opcode);
        let addr = ctx.regs.r[n].wrapping_sub(4);
        let data = ctx.regs.macl;
        ctx.regs.r[n] = addr;
        backend::sh2_write_mem32(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "sts.l PR,@-<REG_N>")
    i0100_nnnn_0010_0010(ctx, bus, opcode) {
        let n = GetN(opcode);
        let addr = ctx.regs.r[n].wrapping_sub(4);
        let data = ctx.regs.pr;
        ctx.regs.r[n] = addr;
        backend::sh2_write_mem32(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "stc.l SR,@-<REG_N>")
    i0100_nnnn_0000_0011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let addr = ctx.regs.r[n].wrapping_sub(4);
        let data = ctx.regs.sr.full();
        ctx.regs.r[n] = addr;
        backend::sh2_write_mem32(ctx, bus, addr, data);
        backend::sh2_next(ctx, 2);
    }

    (disas = "stc.l GBR,@-<REG_N>")
    i0100_nnnn_0001_0011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let addr = ctx.regs.r[n].wrapping_sub(4);
        let data = ctx.regs.gbr;
        ctx.regs.r[n] = addr;
        backend::sh2_write_mem32(ctx, bus, addr, data);
        backend::sh2_next(ctx, 2);
    }

    (disas = "stc.l VBR,@-<REG_N>")
    i0100_nnnn_0010_0011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let addr = ctx.regs.r[n].wrapping_sub(4);
        let data = ctx.regs.vbr;
        ctx.regs.r[n] = addr;
        backend::sh2_write_mem32(ctx, bus, addr, data);
        backend::sh2_next(ctx, 2);
    }

    (disas = "rotl <REG_N>")
    i0100_nnnn_0000_0100(ctx, bus, opcode) {
        let n = GetN(opcode);
        let rn = ctx.regs.r[n];
        ctx.regs.r[n] = backend::sh2_rotl(&mut ctx.regs.sr, rn);
        backend::sh2_next(ctx, 1);
    }

    (disas = "rotcl <REG_N>")
    i0100_nnnn_0010_0100(ctx, bus, opcode) {
        let n = GetN(opcode);
        let rn = ctx.regs.r[n];
        ctx.regs.r[n] = backend::sh2_rotcl(&mut ctx.regs.sr, rn);
        backend::sh2_next(ctx, 1);
    }

    (disas = "rotr <REG_N>")
    i0100_nnnn_0000_0101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let rn = ctx.regs.r[n];
        ctx.regs.r[n] = backend::sh2_rotr(&mut ctx.regs.sr, rn);
        backend::sh2_next(ctx, 1);
    }

    (disas = "cmp/pl <REG_N>")
    i0100_nnnn_0001_0101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let t = ctx.regs.r[n] as i32 > 0;
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "rotcr <REG_N>")
    i0100_nnnn_0010_0101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let rn = ctx.regs.r[n];
        ctx.regs.r[n] = backend::sh2_rotcr(&mut ctx.regs.sr, rn);
        backend::sh2_next(ctx, 1);
    }

    (disas = "lds.l @<REG_N>+,MACH")
    i0100_mmmm_0000_0110(ctx, bus, opcode) {
        let m = GetN(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.mach = backend::sh2_read_mem32(ctx, bus, addr);
        ctx.regs.r[m] = addr.wrapping_add(4);
        backend::sh2_next(ctx, 1);
    }

    (disas = "lds.l @<REG_N>+,MACL")
    i0100_mmmm_0001_0110(ctx, bus, opcode) {
        let m = GetN(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.macl = backend::sh2_read_mem32(ctx, bus, addr);
        ctx.regs.r[m] = addr.wrapping_add(4);
        backend::sh2_next(ctx, 1);
    }

    (disas = "lds.l @<REG_N>+,PR")
    i0100_mmmm_0010_0110(ctx, bus, opcode) {
        let m = GetN(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.pr = backend::sh2_read_mem32(ctx, bus, addr);
        ctx.regs.r[m] = addr.wrapping_add(4);
        backend::sh2_next(ctx, 1);
    }

    (disas = "ldc.l @<REG_N>+,SR")
    i0100_mmmm_0000_0111(ctx, bus, opcode) {
        let m = GetN(opcode);
        let addr = ctx.regs.r[m];
        let sr = backend::sh2_read_mem32(ctx, bus, addr);
        ctx.regs.sr.set_full(sr & SR_WRITE_MASK);
        ctx.regs.r[m] = addr.wrapping_add(4);
        backend::sh2_next(ctx, 3);
    }

    (disas = "ldc.l @<REG_N>+,GBR")
    i0100_mmmm_0001_0111(ctx, bus, opcode) {
        let m = GetN(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.gbr = backend::sh2_read_mem32(ctx, bus, addr);
        ctx.regs.r[m] = addr.wrapping_add(4);
        backend::sh2_next(ctx, 3);
    }

    (disas = "ldc.l @<REG_N>+,VBR")
    i0100_mmmm_0010_0111(ctx, bus, opcode) {
        let m = GetN(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.vbr = backend::sh2_read_mem32(ctx, bus, addr);
        ctx.regs.r[m] = addr.wrapping_add(4);
        backend::sh2_next(ctx, 3);
    }

    (disas = "shll2 <REG_N>")
    i0100_nnnn_0000_1000(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] <<= 2;
        backend::sh2_next(ctx, 1);
    }

    (disas = "shll8 <REG_N>")
    i0100_nnnn_0001_1000(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] <<= 8;
        backend::sh2_next(ctx, 1);
    }

    (disas = "shll16 <REG_N>")
    i0100_nnnn_0010_1000(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] <<= 16;
        backend::sh2_next(ctx, 1);
    }

    (disas = "shlr2 <REG_N>")
    i0100_nnnn_0000_1001(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] >>= 2;
        backend::sh2_next(ctx, 1);
    }

    (disas = "shlr8 <REG_N>")
    i0100_nnnn_0001_1001(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] >>= 8;
        backend::sh2_next(ctx, 1);
    }

    (disas = "shlr16 <REG_N>")
    i0100_nnnn_0010_1001(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] >>= 16;
        backend::sh2_next(ctx, 1);
    }

    (disas = "lds <REG_N>,MACH")
    i0100_mmmm_0000_1010(ctx, bus, opcode) {
        let m = GetN(opcode);
        ctx.regs.mach = ctx.regs.r[m];
        backend::sh2_next(ctx, 1);
    }

    (disas = "lds <REG_N>,MACL")
    i0100_mmmm_0001_1010(ctx, bus, opcode) {
        let m = GetN(opcode);
        ctx.regs.macl = ctx.regs.r[m];
        backend::sh2_next(ctx, 1);
    }

    (disas = "lds <REG_N>,PR")
    i0100_mmmm_0010_1010(ctx, bus, opcode) {
        let m = GetN(opcode);
        ctx.regs.pr = ctx.regs.r[m];
        backend::sh2_next(ctx, 1);
    }

    (disas = "jsr @<REG_N>")
    i0100_mmmm_0000_1011(ctx, bus, opcode) {
        let m = GetN(opcode);
        let target = ctx.regs.r[m];
        ctx.regs.pr = ctx.regs.pc.wrapping_add(4);
        backend::sh2_branch_delay(ctx, bus, target, 2);
    }

    (disas = "tas.b @<REG_N>")
    i0100_nnnn_0001_1011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let addr = ctx.regs.r[n];
        let data = backend::sh2_read_mems8(ctx, bus, addr) & 0xFF;
        ctx.regs.sr.set_t(data == 0);
        backend::sh2_write_mem8(ctx, bus, addr, data | 0x80);
        backend::sh2_next(ctx, 4);
    }

    (disas = "jmp @<REG_N>")
    i0100_mmmm_0010_1011(ctx, bus, opcode) {
        let m = GetN(opcode);
        let target = ctx.regs.r[m];
        backend::sh2_branch_delay(ctx, bus, target, 2);
    }

    (disas = "ldc <REG_N>,SR")
    i0100_mmmm_0000_1110(ctx, bus, opcode) {
        let m = GetN(opcode);
        let sr = ctx.regs.r[m] & SR_WRITE_MASK;
        ctx.regs.sr.set_full(sr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "ldc <REG_N>,GBR")
    i0100_mmmm_0001_1110(ctx, bus, opcode) {
        let m = GetN(opcode);
        ctx.regs.gbr = ctx.regs.r[m];
        backend::sh2_next(ctx, 1);
    }

    (disas = "ldc <REG_N>,VBR")
    i0100_mmmm_0010_1110(ctx, bus, opcode) {
        let m = GetN(opcode);
        ctx.regs.vbr = ctx.regs.r[m];
        backend::sh2_next(ctx, 1);
    }

    (disas = "mac.w @<REG_M>+,@<REG_N>+")
    i0100_nnnn_mmmm_1111(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);

        let addr = ctx.regs.r[n];
        let a = backend::sh2_read_mems16(ctx, bus, addr) as i16;
        ctx.regs.r[n] = ctx.regs.r[n].wrapping_add(2);

        let addr = ctx.regs.r[m];
        let b = backend::sh2_read_mems16(ctx, bus, addr) as i16;
        ctx.regs.r[m] = ctx.regs.r[m].wrapping_add(2);

        let s = ctx.regs.sr.s();
        let (mach, macl) = backend::sh2_mac_w(s, ctx.regs.mach, ctx.regs.macl, a, b);
        ctx.regs.mach = mach;
        ctx.regs.macl = macl;
        backend::sh2_next(ctx, 3);
    }

    // 0101

    (disas = "mov.l @(<disp4dw>,<REG_M>),<REG_N>")
    i0101_nnnn_mmmm_iiii(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[m].wrapping_add(GetImm4(opcode) << 2);
        ctx.regs.r[n] = backend::sh2_read_mem32(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    // 0110

    (disas = "mov.b @<REG_M>,<REG_N>")
    i0110_nnnn_mmmm_0000(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.r[n] = backend::sh2_read_mems8(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.w @<REG_M>,<REG_N>")
    i0110_nnnn_mmmm_0001(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.r[n] = backend::sh2_read_mems16(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.l @<REG_M>,<REG_N>")
    i0110_nnnn_mmmm_0010(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.r[n] = backend::sh2_read_mem32(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov <REG_M>,<REG_N>")
    i0110_nnnn_mmmm_0011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = ctx.regs.r[m];
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.b @<REG_M>+,<REG_N>")
    i0110_nnnn_mmmm_0100(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.r[n] = backend::sh2_read_mems8(ctx, bus, addr);
        if n != m {
            ctx.regs.r[m] = addr.wrapping_add(1);
        }
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.w @<REG_M>+,<REG_N>")
    i0110_nnnn_mmmm_0101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.r[n] = backend::sh2_read_mems16(ctx, bus, addr);
        if n != m {
            ctx.regs.r[m] = addr.wrapping_add(2);
        }
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.l @<REG_M>+,<REG_N>")
    i0110_nnnn_mmmm_0110(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let addr = ctx.regs.r[m];
        ctx.regs.r[n] = backend::sh2_read_mem32(ctx, bus, addr);
        if n != m {
            ctx.regs.r[m] = addr.wrapping_add(4);
        }
        backend::sh2_next(ctx, 1);
    }

    (disas = "not <REG_M>,<REG_N>")
    i0110_nnnn_mmmm_0111(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = !ctx.regs.r[m];
        backend::sh2_next(ctx, 1);
    }

    (disas = "swap.b <REG_M>,<REG_N>")
    i0110_nnnn_mmmm_1000(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = backend::sh2_swapb(ctx.regs.r[m]);
        backend::sh2_next(ctx, 1);
    }

    (disas = "swap.w <REG_M>,<REG_N>")
    i0110_nnnn_mmmm_1001(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = backend::sh2_swapw(ctx.regs.r[m]);
        backend::sh2_next(ctx, 1);
    }

    (disas = "negc <REG_M>,<REG_N>")
    i0110_nnnn_mmmm_1010(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        let rm = ctx.regs.r[m];
        ctx.regs.r[n] = backend::sh2_negc(&mut ctx.regs.sr, rm);
        backend::sh2_next(ctx, 1);
    }

    (disas = "neg <REG_M>,<REG_N>")
    i0110_nnnn_mmmm_1011(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = ctx.regs.r[m].wrapping_neg();
        backend::sh2_next(ctx, 1);
    }

    (disas = "extu.b <REG_M>,<REG_N>")
    i0110_nnnn_mmmm_1100(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = ctx.regs.r[m] & 0xFF;
        backend::sh2_next(ctx, 1);
    }

    (disas = "extu.w <REG_M>,<REG_N>")
    i0110_nnnn_mmmm_1101(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = ctx.regs.r[m] & 0xFFFF;
        backend::sh2_next(ctx, 1);
    }

    (disas = "exts.b <REG_M>,<REG_N>")
    i0110_nnnn_mmmm_1110(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = ctx.regs.r[m] as i8 as i32 as u32;
        backend::sh2_next(ctx, 1);
    }

    (disas = "exts.w <REG_M>,<REG_N>")
    i0110_nnnn_mmmm_1111(ctx, bus, opcode) {
        let n = GetN(opcode);
        let m = GetM(opcode);
        ctx.regs.r[n] = ctx.regs.r[m] as i16 as i32 as u32;
        backend::sh2_next(ctx, 1);
    }

    // 0111

    (disas = "add #<simm8>,<REG_N>")
    i0111_nnnn_iiii_iiii(ctx, bus, opcode) {
        let n = GetN(opcode);
        let imm = GetSImm8(opcode) as u32;
        ctx.regs.r[n] = ctx.regs.r[n].wrapping_add(imm);
        backend::sh2_next(ctx, 1);
    }

    // 1000

    (disas = "mov.b R0,@(<disp4b>,<REG_M>)")
    i1000_0000_nnnn_iiii(ctx, bus, opcode) {
        let n = GetM(opcode);
        let addr = ctx.regs.r[n].wrapping_add(GetImm4(opcode));
        let data = ctx.regs.r[0];
        backend::sh2_write_mem8(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.w R0,@(<disp4w>,<REG_M>)")
    i1000_0001_nnnn_iiii(ctx, bus, opcode) {
        let n = GetM(opcode);
        let addr = ctx.regs.r[n].wrapping_add(GetImm4(opcode) << 1);
        let data = ctx.regs.r[0];
        backend::sh2_write_mem16(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.b @(<disp4b>,<REG_M>),R0")
    i1000_0100_mmmm_iiii(ctx, bus, opcode) {
        let m = GetM(opcode);
        let addr = ctx.regs.r[m].wrapping_add(GetImm4(opcode));
        ctx.regs.r[0] = backend::sh2_read_mems8(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.w @(<disp4w>,<REG_M>),R0")
    i1000_0101_mmmm_iiii(ctx, bus, opcode) {
        let m = GetM(opcode);
        let addr = ctx.regs.r[m].wrapping_add(GetImm4(opcode) << 1);
        ctx.regs.r[0] = backend::sh2_read_mems16(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "cmp/eq #<simm8hex>,R0")
    i1000_1000_iiii_iiii(ctx, bus, opcode) {
        let imm = GetSImm8(opcode) as u32;
        let t = ctx.regs.r[0] == imm;
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "bt <bdisp8>")
    i1000_1001_iiii_iiii(ctx, bus, opcode) {
        let target = branch_target_s8(ctx.regs.pc, GetSImm8(opcode));
        let taken = ctx.regs.sr.t();
        backend::sh2_branch_cond(ctx, taken, target);
    }

    (disas = "bf <bdisp8>")
    i1000_1011_iiii_iiii(ctx, bus, opcode) {
        let target = branch_target_s8(ctx.regs.pc, GetSImm8(opcode));
        let taken = !ctx.regs.sr.t();
        backend::sh2_branch_cond(ctx, taken, target);
    }

    (disas = "bt/s <bdisp8>")
    i1000_1101_iiii_iiii(ctx, bus, opcode) {
        let target = branch_target_s8(ctx.regs.pc, GetSImm8(opcode));
        let taken = ctx.regs.sr.t();
        backend::sh2_branch_cond_delay(ctx, bus, taken, target);
    }

    (disas = "bf/s <bdisp8>")
    i1000_1111_iiii_iiii(ctx, bus, opcode) {
        let target = branch_target_s8(ctx.regs.pc, GetSImm8(opcode));
        let taken = !ctx.regs.sr.t();
        backend::sh2_branch_cond_delay(ctx, bus, taken, target);
    }

    // 1001

    (disas = "mov.w @(<PCdisp8w>),<REG_N>")
    i1001_nnnn_iiii_iiii(ctx, bus, opcode) {
        let n = GetN(opcode);
        let addr = ctx.regs.pc.wrapping_add(GetImm8(opcode) << 1).wrapping_add(4);
        ctx.regs.r[n] = backend::sh2_read_mems16(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    // 1010, 1011

    (disas = "bra <bdisp12>")
    i1010_iiii_iiii_iiii(ctx, bus, opcode) {
        let target = branch_target_s12(ctx.regs.pc, GetSImm12(opcode));
        backend::sh2_branch_delay(ctx, bus, target, 2);
    }

    (disas = "bsr <bdisp12>")
    i1011_iiii_iiii_iiii(ctx, bus, opcode) {
        let target = branch_target_s12(ctx.regs.pc, GetSImm12(opcode));
        ctx.regs.pr = ctx.regs.pc.wrapping_add(4);
        backend::sh2_branch_delay(ctx, bus, target, 2);
    }

    // 1100

    (disas = "mov.b R0,@(<GBRdisp8b>)")
    i1100_0000_iiii_iiii(ctx, bus, opcode) {
        let addr = ctx.regs.gbr.wrapping_add(GetImm8(opcode));
        let data = ctx.regs.r[0];
        backend::sh2_write_mem8(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.w R0,@(<GBRdisp8w>)")
    i1100_0001_iiii_iiii(ctx, bus, opcode) {
        let addr = ctx.regs.gbr.wrapping_add(GetImm8(opcode) << 1);
        let data = ctx.regs.r[0];
        backend::sh2_write_mem16(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.l R0,@(<GBRdisp8dw>)")
    i1100_0010_iiii_iiii(ctx, bus, opcode) {
        let addr = ctx.regs.gbr.wrapping_add(GetImm8(opcode) << 2);
        let data = ctx.regs.r[0];
        backend::sh2_write_mem32(ctx, bus, addr, data);
        backend::sh2_next(ctx, 1);
    }

    (disas = "trapa #<imm8>")
    i1100_0011_iiii_iiii(ctx, bus, opcode) {
        backend::sh2_trapa(ctx, bus, GetImm8(opcode));
    }

    (disas = "mov.b @(<GBRdisp8b>),R0")
    i1100_0100_iiii_iiii(ctx, bus, opcode) {
        let addr = ctx.regs.gbr.wrapping_add(GetImm8(opcode));
        ctx.regs.r[0] = backend::sh2_read_mems8(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.w @(<GBRdisp8w>),R0")
    i1100_0101_iiii_iiii(ctx, bus, opcode) {
        let addr = ctx.regs.gbr.wrapping_add(GetImm8(opcode) << 1);
        ctx.regs.r[0] = backend::sh2_read_mems16(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov.l @(<GBRdisp8dw>),R0")
    i1100_0110_iiii_iiii(ctx, bus, opcode) {
        let addr = ctx.regs.gbr.wrapping_add(GetImm8(opcode) << 2);
        ctx.regs.r[0] = backend::sh2_read_mem32(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mova @(<PCdisp8d>),R0")
    i1100_0111_iiii_iiii(ctx, bus, opcode) {
        ctx.regs.r[0] = data_target_s8(ctx.regs.pc, GetImm8(opcode));
        backend::sh2_next(ctx, 1);
    }

    (disas = "tst #<imm8>,R0")
    i1100_1000_iiii_iiii(ctx, bus, opcode) {
        let t = ctx.regs.r[0] & GetImm8(opcode) == 0;
        ctx.regs.sr.set_t(t);
        backend::sh2_next(ctx, 1);
    }

    (disas = "and #<imm8>,R0")
    i1100_1001_iiii_iiii(ctx, bus, opcode) {
        ctx.regs.r[0] &= GetImm8(opcode);
        backend::sh2_next(ctx, 1);
    }

    (disas = "xor #<imm8>,R0")
    i1100_1010_iiii_iiii(ctx, bus, opcode) {
        ctx.regs.r[0] ^= GetImm8(opcode);
        backend::sh2_next(ctx, 1);
    }

    (disas = "or #<imm8>,R0")
    i1100_1011_iiii_iiii(ctx, bus, opcode) {
        ctx.regs.r[0] |= GetImm8(opcode);
        backend::sh2_next(ctx, 1);
    }

    (disas = "tst.b #<imm8>,@(R0,GBR)")
    i1100_1100_iiii_iiii(ctx, bus, opcode) {
        let addr = ctx.regs.gbr.wrapping_add(ctx.regs.r[0]);
        let data = backend::sh2_read_mems8(ctx, bus, addr);
        ctx.regs.sr.set_t(data & GetImm8(opcode) == 0);
        backend::sh2_next(ctx, 3);
    }

    (disas = "and.b #<imm8>,@(R0,GBR)")
    i1100_1101_iiii_iiii(ctx, bus, opcode) {
        let addr = ctx.regs.gbr.wrapping_add(ctx.regs.r[0]);
        let data = backend::sh2_read_mems8(ctx, bus, addr);
        backend::sh2_write_mem8(ctx, bus, addr, data & GetImm8(opcode));
        backend::sh2_next(ctx, 3);
    }

    (disas = "xor.b #<imm8>,@(R0,GBR)")
    i1100_1110_iiii_iiii(ctx, bus, opcode) {
        let addr = ctx.regs.gbr.wrapping_add(ctx.regs.r[0]);
        let data = backend::sh2_read_mems8(ctx, bus, addr);
        backend::sh2_write_mem8(ctx, bus, addr, data ^ GetImm8(opcode));
        backend::sh2_next(ctx, 3);
    }

    (disas = "or.b #<imm8>,@(R0,GBR)")
    i1100_1111_iiii_iiii(ctx, bus, opcode) {
        let addr = ctx.regs.gbr.wrapping_add(ctx.regs.r[0]);
        let data = backend::sh2_read_mems8(ctx, bus, addr);
        backend::sh2_write_mem8(ctx, bus, addr, data | GetImm8(opcode));
        backend::sh2_next(ctx, 3);
    }

    // 1101, 1110

    (disas = "mov.l @(<PCdisp8d>),<REG_N>")
    i1101_nnnn_iiii_iiii(ctx, bus, opcode) {
        let n = GetN(opcode);
        let addr = data_target_s8(ctx.regs.pc, GetImm8(opcode));
        ctx.regs.r[n] = backend::sh2_read_mem32(ctx, bus, addr);
        backend::sh2_next(ctx, 1);
    }

    (disas = "mov #<simm8hex>,<REG_N>")
    i1110_nnnn_iiii_iiii(ctx, bus, opcode) {
        let n = GetN(opcode);
        ctx.regs.r[n] = GetSImm8(opcode) as u32;
        backend::sh2_next(ctx, 1);
    }
}

const UNDECODED: u8 = u8::MAX;

pub const fn build_opcode_tables(
    opcodes: &[sh2_opcodelistentry],
) -> ([OpHandler; 0x10000], [u8; 0x10000]) {
    // The undecoded entry is always the last element of OPCODES
    let sentinel = opcodes[opcodes.len() - 1];
    assert!(opcodes.len() - 1 < UNDECODED as usize);

    let mut ptrs: [OpHandler; 0x10000] = [sentinel.oph; 0x10000];
    let mut descs: [u8; 0x10000] = [UNDECODED; 0x10000];

    let mut i = 0;
    while i < opcodes.len() - 1 {
        let op = opcodes[i];

        // operand fields are a single contiguous run of don't-care bits
        let wild = !op.mask;
        let shft = if wild == 0 { 0 } else { wild.trailing_zeros() };
        let count = 1u32 << wild.count_ones();
        assert!(((wild >> shft) as u32) == count - 1);

        let mut j = 0;
        while j < count {
            let idx = (op.key as u32 | (j << shft)) as usize;
            assert!(descs[idx] == UNDECODED); // overlapping patterns
            ptrs[idx] = op.oph;
            descs[idx] = i as u8;
            j += 1;
        }

        i += 1;
    }

    (ptrs, descs)
}

const SH2_OP_TABLES: ([OpHandler; 0x10000], [u8; 0x10000]) = build_opcode_tables(OPCODES);

pub(crate) static SH2_OP_PTR: [OpHandler; 0x10000] = SH2_OP_TABLES.0;
static SH2_OP_DESC: [u8; 0x10000] = SH2_OP_TABLES.1;

fn descriptor(opcode: u16) -> &'static sh2_opcodelistentry {
    match SH2_OP_DESC[opcode as usize] {
        UNDECODED => &OPCODES[OPCODES.len() - 1],
        idx => &OPCODES[idx as usize],
    }
}

pub fn is_decoded(opcode: u16) -> bool {
    SH2_OP_DESC[opcode as usize] != UNDECODED
}

/// Pattern name of the handler `opcode` dispatches to, e.g. `i0110_nnnn_mmmm_0011`.
pub fn handler_name(opcode: u16) -> &'static str {
    descriptor(opcode).handler_name
}

pub fn format_disas(pc: u32, opcode: u16) -> String {
    let mut out = descriptor(opcode).diss.to_string();

    // ---------------- General-purpose registers ----------------
    if out.contains("<REG_N>") {
        let n = (opcode >> 8) & 0xF;
        out = out.replace("<REG_N>", &format!("r{}", n));
    }
    if out.contains("<REG_M>") {
        let m = (opcode >> 4) & 0xF;
        out = out.replace("<REG_M>", &format!("r{}", m));
    }

    // ---------------- Immediates ----------------
    if out.contains("<imm8>") {
        let imm = opcode & 0xFF;
        out = out.replace("<imm8>", &format!("{:#x}", imm));
    }
    if out.contains("<simm8>") {
        let imm = (opcode & 0xFF) as i8;
        out = out.replace("<simm8>", &format!("{}", imm));
    }
    if out.contains("<simm8hex>") {
        let imm = (opcode & 0xFF) as i8 as i32;
        let text = if imm < 0 {
            format!("-{:#x}", -imm)
        } else {
            format!("{:#x}", imm)
        };
        out = out.replace("<simm8hex>", &text);
    }
    if out.contains("<IMM16>") {
        out = out.replace("<IMM16>", &format!("0x{:04X}", opcode));
    }

    // ---------------- Branch targets ----------------
    if out.contains("<bdisp8>") {
        let target = branch_target_s8(pc, GetSImm8(opcode));
        out = out.replace("<bdisp8>", &format!("{:#010x}", target));
    }
    if out.contains("<bdisp12>") {
        let target = branch_target_s12(pc, GetSImm12(opcode));
        out = out.replace("<bdisp12>", &format!("{:#010x}", target));
    }

    // 4-bit disps
    if out.contains("<disp4b>") {
        let d = opcode & 0xF;
        out = out.replace("<disp4b>", &format!("{:#x}", d));
    }
    if out.contains("<disp4w>") {
        let d = (opcode & 0xF) << 1;
        out = out.replace("<disp4w>", &format!("{:#x}", d));
    }
    if out.contains("<disp4dw>") {
        let d = (opcode & 0xF) << 2;
        out = out.replace("<disp4dw>", &format!("{:#x}", d));
    }

    // PC relative, shown as the resolved address
    if out.contains("<PCdisp8d>") {
        let addr = data_target_s8(pc, GetImm8(opcode));
        out = out.replace("<PCdisp8d>", &format!("{:#010x}", addr));
    }
    if out.contains("<PCdisp8w>") {
        let addr = pc.wrapping_add(GetImm8(opcode) << 1).wrapping_add(4);
        out = out.replace("<PCdisp8w>", &format!("{:#010x}", addr));
    }

    // GBR disps
    if out.contains("<GBRdisp8b>") {
        let d = opcode & 0xFF;
        out = out.replace("<GBRdisp8b>", &format!("{:#x},GBR", d));
    }
    if out.contains("<GBRdisp8w>") {
        let d = (opcode & 0xFF) << 1;
        out = out.replace("<GBRdisp8w>", &format!("{:#x},GBR", d));
    }
    if out.contains("<GBRdisp8dw>") {
        let d = (opcode & 0xFF) << 2;
        out = out.replace("<GBRdisp8dw>", &format!("{:#x},GBR", d));
    }

    out
}
