//! Raw register access for the GIC distributor and the GICv2 CPU interface.

use core::ptr::{read_volatile, write_volatile};

/// 32-bit register access relative to a block's base address.
///
/// Offsets are byte offsets and always 4-byte aligned.
pub trait RegisterAccess {
    fn read(&self, offset: usize) -> u32;
    fn write(&self, offset: usize, value: u32);
}

/// Memory-mapped register block.
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// # Safety
    ///
    /// `base` must be the mapped virtual address of a register block that
    /// stays mapped, device-typed, for the lifetime of the returned value.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    pub const fn base(&self) -> usize {
        self.base
    }
}

impl RegisterAccess for Mmio {
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: the constructor's contract covers every offset of the block.
        unsafe { read_volatile(self.base.wrapping_add(offset) as *const u32) }
    }

    fn write(&self, offset: usize, value: u32) {
        // SAFETY: see `read`.
        unsafe { write_volatile(self.base.wrapping_add(offset) as *mut u32, value) }
    }
}

/// GICv2 CPU interface (GICC) register offsets.
pub mod gicc {
    pub const CTLR: usize = 0x000;
    pub const PMR: usize = 0x004;
    /// Interrupt acknowledge. Reading it marks the returned interrupt active.
    pub const IAR: usize = 0x00C;
    pub const EOIR: usize = 0x010;
}

/// Distributor (GICD) register offsets.
pub mod gicd {
    pub const CTLR: usize = 0x000;
    pub const TYPER: usize = 0x004;
    pub const ISENABLER: usize = 0x100;
    pub const ICENABLER: usize = 0x180;
    pub const IPRIORITYR: usize = 0x400;
    pub const ITARGETSR: usize = 0x800;
    pub const ICFGR: usize = 0xC00;
    /// GICv2 only. GICv3 raises SGIs through `ICC_SGI1R_EL1`.
    pub const SGIR: usize = 0xF00;
}

bitflags! {
    /// `GICD_CTLR` enable bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DistCtlr: u32 {
        const ENABLE_GRP0 = 1 << 0;
        const ENABLE_GRP1_NS = 1 << 1;
        /// Affinity routing for non-secure state (GICv3).
        const ARE_NS = 1 << 4;
    }
}

bitflags! {
    /// `GICC_CTLR` enable bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CpuCtlr: u32 {
        const ENABLE_GRP0 = 1 << 0;
        const ENABLE_GRP1 = 1 << 1;
    }
}

/// Register offset and bit for a one-bit-per-interrupt bank such as
/// `GICD_ISENABLERn`.
pub(crate) const fn bit_reg(bank: usize, irq: u32) -> (usize, u32) {
    (
        bank.wrapping_add((irq as usize / 32).wrapping_mul(4)),
        1u32.wrapping_shl(irq % 32),
    )
}

/// Register offset and bit shift for a one-byte-per-interrupt bank such as
/// `GICD_IPRIORITYRn`.
pub(crate) const fn byte_reg(bank: usize, irq: u32) -> (usize, u32) {
    (
        bank.wrapping_add((irq as usize / 4).wrapping_mul(4)),
        (irq % 4).wrapping_mul(8),
    )
}

/// Register offset and bit shift for a two-bits-per-interrupt bank such as
/// `GICD_ICFGRn`.
pub(crate) const fn field_reg(bank: usize, irq: u32) -> (usize, u32) {
    (
        bank.wrapping_add((irq as usize / 16).wrapping_mul(4)),
        (irq % 16).wrapping_mul(2),
    )
}

/// `byte` in all four lanes of a byte-per-interrupt register.
pub(crate) const fn replicate(byte: u8) -> u32 {
    u32::from_le_bytes([byte; 4])
}
