//! CPU interface acknowledge/complete protocols.
//!
//! A GIC generation is a type implementing [`HardwareProtocol`]. The platform
//! picks one at build time, so the dispatcher is monomorphised for it and
//! never branches on the generation.

use core::fmt;

use crate::regs::{DistCtlr, RegisterAccess};

pub mod gicv2;
pub mod gicv3;

/// Identifier of one interrupt line, as reported by the CPU interface.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InterruptId(u32);

impl InterruptId {
    /// Returned by the acknowledge read when nothing is pending for this CPU.
    pub const SPURIOUS: Self = Self::new(1023);
    /// First shared peripheral interrupt. Lower ids are banked per CPU.
    pub const FIRST_SPI: Self = Self::new(32);

    pub const fn new(inner: u32) -> Self {
        Self(inner)
    }
    pub const fn get(self) -> u32 {
        self.0
    }
    /// Vector table index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
    pub const fn is_sgi(self) -> bool {
        self.0 < 16
    }
    pub const fn is_spi(self) -> bool {
        self.0 >= Self::FIRST_SPI.0 && self.0 < 1020
    }
}

impl fmt::Debug for InterruptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[irq #{}]", self.0)
    }
}
impl fmt::Display for InterruptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The result of one acknowledge read.
///
/// Keeps the value exactly as the hardware returned it next to the decoded id,
/// because completing on GICv2 needs the untouched bit pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawAck {
    raw: u32,
    id: InterruptId,
}

impl RawAck {
    pub const fn new(raw: u32, id: InterruptId) -> Self {
        Self { raw, id }
    }
    pub const fn raw(self) -> u32 {
        self.raw
    }
    pub const fn id(self) -> InterruptId {
        self.id
    }
}

/// Destination of a software generated interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SgiTarget {
    /// One bit per CPU interface. GICv2 has 8 CPU interfaces. GICv3 treats
    /// the mask as an `Aff0` target list covering the 16 cores of the
    /// sender's cluster and range. Bits beyond
    /// [`HardwareProtocol::TARGET_LIST`] are rejected.
    List(u16),
    /// Every CPU except the one sending.
    AllOthers,
    /// Only the sending CPU.
    SelfOnly,
}

/// Per-generation access to the CPU interface.
pub trait HardwareProtocol {
    /// `GICD_CTLR` bits that turn the distributor on.
    const DIST_ENABLE: DistCtlr;
    /// Whether SPIs are routed through `GICD_ITARGETSR` (GICv2) rather than
    /// affinity routing.
    const ITARGETS_ROUTING: bool;
    /// Whether SGI/PPI configuration lives in the distributor. Under GICv3
    /// affinity routing it moves to the redistributor.
    const BANKED_IN_DISTRIBUTOR: bool;
    /// Bits an [`SgiTarget::List`] mask may use.
    const TARGET_LIST: u16;

    fn init_cpu_interface(&self);

    /// Reads the highest priority pending interrupt and marks it active.
    ///
    /// Has side effects on the controller: call exactly once per interrupt.
    fn identify(&self) -> RawAck;

    /// Signals end of interrupt for an acknowledge obtained from
    /// [`identify`](Self::identify).
    fn complete(&self, ack: RawAck);

    fn send_sgi<D: RegisterAccess>(&self, dist: &D, sgi: u8, target: SgiTarget);
}
