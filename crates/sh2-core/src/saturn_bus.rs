// src/saturn_bus.rs
//
// Minimal Saturn address map for the SH-2 side: boot ROM, low/high work
// RAM and the CS0 cartridge window. Everything is big-endian.

use super::sh2mem::Sh2Bus;

pub const BIOS_SIZE: usize = 0x8_0000;
pub const LWRAM_SIZE: usize = 0x10_0000;
pub const HWRAM_SIZE: usize = 0x10_0000;
pub const CS0_SIZE: usize = 0x200_0000;

pub const BIOS_BASE: u32 = 0x0000_0000;
pub const LWRAM_BASE: u32 = 0x0020_0000;
pub const CS0_BASE: u32 = 0x0200_0000;
pub const HWRAM_BASE: u32 = 0x0600_0000;

const INVALID_FETCH: u16 = 0xFFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Region {
    Bios,
    LowRam,
    Cs0,
    HighRam,
    Unmapped,
}

// Keyed on (addr >> 20) & 0xFF
const fn build_region_table() -> [Region; 256] {
    let mut table = [Region::Unmapped; 256];
    table[0x00] = Region::Bios;
    table[0x02] = Region::LowRam;
    table[0x20] = Region::Cs0;
    let mut i = 0x60;
    while i <= 0x6F {
        table[i] = Region::HighRam;
        i += 1;
    }
    table
}

const REGIONS: [Region; 256] = build_region_table();

#[derive(Clone)]
pub struct SaturnBus {
    pub bios: Vec<u8>,
    pub lwram: Vec<u8>,
    pub hwram: Vec<u8>,
    /// Cartridge image, empty when no cartridge is inserted.
    pub cs0: Vec<u8>,
}

impl Default for SaturnBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SaturnBus {
    pub fn new() -> Self {
        Self {
            bios: vec![0; BIOS_SIZE],
            lwram: vec![0; LWRAM_SIZE],
            hwram: vec![0; HWRAM_SIZE],
            cs0: Vec::new(),
        }
    }

    pub fn load_bios(&mut self, data: &[u8]) {
        let len = data.len().min(BIOS_SIZE);
        self.bios[..len].copy_from_slice(&data[..len]);
        if data.len() > BIOS_SIZE {
            log::warn!("boot ROM image is {} bytes, truncated to {}", data.len(), BIOS_SIZE);
        }
    }

    pub fn load_cartridge(&mut self, data: &[u8]) {
        let len = data.len().min(CS0_SIZE);
        self.cs0 = data[..len].to_vec();
    }

    pub fn eject_cartridge(&mut self) {
        self.cs0.clear();
    }

    /// Copy `data` to `addr` through the region table. Bytes that land in
    /// an unmapped or read-only region are dropped.
    pub fn write_block(&mut self, addr: u32, data: &[u8]) {
        for (i, &b) in data.iter().enumerate() {
            let a = addr.wrapping_add(i as u32);
            if region_of(a) == Region::Bios {
                self.bios[(a & 0x7_FFFF) as usize] = b;
            } else {
                self.write8(a, b);
            }
        }
    }

    fn map(&self, addr: u32) -> Option<(&[u8], usize)> {
        let addr = addr & 0x1FFF_FFFF;
        match REGIONS[((addr >> 20) & 0xFF) as usize] {
            Region::Bios => Some((self.bios.as_slice(), (addr & 0x7_FFFF) as usize)),
            Region::LowRam => Some((self.lwram.as_slice(), (addr & 0xF_FFFF) as usize)),
            Region::HighRam => Some((self.hwram.as_slice(), (addr & 0xF_FFFF) as usize)),
            Region::Cs0 => {
                let offset = (addr & 0x1FF_FFFF) as usize;
                (offset < self.cs0.len()).then_some((self.cs0.as_slice(), offset))
            }
            Region::Unmapped => None,
        }
    }

    fn map_mut(&mut self, addr: u32) -> Option<(&mut [u8], usize)> {
        let addr = addr & 0x1FFF_FFFF;
        match REGIONS[((addr >> 20) & 0xFF) as usize] {
            Region::LowRam => Some((self.lwram.as_mut_slice(), (addr & 0xF_FFFF) as usize)),
            Region::HighRam => Some((self.hwram.as_mut_slice(), (addr & 0xF_FFFF) as usize)),
            // ROM and cartridge image are read-only from the CPU side
            Region::Bios | Region::Cs0 | Region::Unmapped => None,
        }
    }

    fn read_be<const N: usize>(&self, addr: u32) -> Option<[u8; N]> {
        let (mem, offset) = self.map(addr)?;
        let bytes = mem.get(offset..offset + N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Some(out)
    }

    fn write_be<const N: usize>(&mut self, addr: u32, data: [u8; N]) -> bool {
        let Some((mem, offset)) = self.map_mut(addr) else {
            return false;
        };
        match mem.get_mut(offset..offset + N) {
            Some(dst) => {
                dst.copy_from_slice(&data);
                true
            }
            None => false,
        }
    }
}

#[inline(always)]
fn region_of(addr: u32) -> Region {
    REGIONS[((addr >> 20) & 0xFF) as usize]
}

// Cache areas 0, 1 and 5 reach the external bus.
#[inline(always)]
fn external(addr: u32) -> bool {
    matches!(addr >> 29, 0 | 1 | 5)
}

macro_rules! saturn_access {
    ($($read:ident, $write:ident, $ty:ty, $n:literal, $absent:expr);*) => {
        $(
            fn $read(&mut self, addr: u32) -> $ty {
                if !external(addr) {
                    log::trace!("unmapped read{} {:08X}", $n * 8, addr);
                    return 0;
                }
                match self.read_be::<$n>(addr) {
                    Some(bytes) => <$ty>::from_be_bytes(bytes),
                    None if region_of(addr) == Region::Cs0 => $absent,
                    None => {
                        log::trace!("unmapped read{} {:08X}", $n * 8, addr);
                        0
                    }
                }
            }

            fn $write(&mut self, addr: u32, data: $ty) {
                if !external(addr) || !self.write_be::<$n>(addr, data.to_be_bytes()) {
                    log::trace!("ignored write{} {:08X} = {:X}", $n * 8, addr, data);
                }
            }
        )*
    };
}

impl Sh2Bus for SaturnBus {
    saturn_access!(
        read8, write8, u8, 1, 0xFF;
        read16, write16, u16, 2, 0xFFFF;
        read32, write32, u32, 4, 0xFFFF_FFFF
    );

    fn fetch16(&mut self, addr: u32) -> u16 {
        if !external(addr) {
            return INVALID_FETCH;
        }
        match self.read_be::<2>(addr) {
            Some(bytes) => u16::from_be_bytes(bytes),
            None => INVALID_FETCH,
        }
    }
}
