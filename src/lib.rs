//! # ARM Generic Interrupt Controller dispatch core
//!
//! Identifies the interrupt a GIC is signalling, runs the handler registered
//! for it, and completes the interrupt with the controller. The CPU interface
//! generation (memory-mapped GICv2 or system-register GICv3) is chosen when the
//! crate is built, through `config.toml`:
//!
//! ```toml
//! [arch]
//! gic = "v3"
//! ```
//!
//! The dispatcher does not save or restore processor context. The trap entry
//! code must do that before calling [`Gic::dispatch`] and after it returns.
//!
//! ```ignore
//! static UART_RX: UartRx = UartRx::new();
//!
//! let mut gic: PlatformGic = Gic::new(protocol, unsafe { Mmio::new(GICD_BASE) });
//! gic.init();
//! gic.connect(InterruptId::new(59), &UART_RX)?;
//! gic.set_priority_trigger_type(InterruptId::new(59), 0xA0, Trigger::Level)?;
//! gic.enable(InterruptId::new(59))?;
//!
//! // From the IRQ vector, with context saved:
//! irqchip::dispatch(&gic);
//! ```

#![allow(clippy::new_without_default)]
// Strict safety enforcement
#![deny(clippy::not_unsafe_ptr_arg_deref)]
#![deny(clippy::cast_ptr_alignment)]
#![deny(clippy::indexing_slicing)]
#![deny(clippy::arithmetic_side_effects)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::indexing_slicing,
        clippy::arithmetic_side_effects
    )
)]
#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate bitflags;

pub mod config {
    //! Values fixed at build time from `config.toml`.
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}

pub mod controller;
pub mod error;
pub mod protocol;
pub mod regs;
pub mod vector;

#[cfg(test)]
mod tests;

pub use controller::{dispatch, Gic, Trigger};
pub use error::{IrqError, Result};
pub use protocol::{HardwareProtocol, InterruptId, RawAck, SgiTarget};
pub use regs::{Mmio, RegisterAccess};
pub use vector::{InterruptHandler, VectorTable, VectorTableEntry};

#[cfg(gic = "v2")]
pub use protocol::gicv2::GicV2 as PlatformProtocol;
#[cfg(all(gic = "v3", target_arch = "aarch64"))]
pub use protocol::gicv3::GicV3 as PlatformProtocol;

/// The controller type for the generation selected in `config.toml`.
#[cfg(gic = "v2")]
pub type PlatformGic<'a> = Gic<'a, PlatformProtocol<Mmio>, Mmio>;
/// The controller type for the generation selected in `config.toml`.
#[cfg(all(gic = "v3", target_arch = "aarch64"))]
pub type PlatformGic<'a> = Gic<'a, PlatformProtocol<protocol::gicv3::CpuSysRegs>, Mmio>;
