//! Errors from controller configuration.
//!
//! Nothing on the dispatch path returns these: spurious and unregistered
//! interrupts are resolved inside [`Gic::dispatch`](crate::Gic::dispatch).

use core::fmt;

use crate::protocol::InterruptId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IrqError {
    /// Beyond the vector table or the lines the distributor implements.
    OutOfRange(InterruptId),
    /// The vector table slot already holds a handler.
    AlreadyRegistered(InterruptId),
    /// SGI/PPI that this generation configures in the redistributor.
    NotInDistributor(InterruptId),
    /// SGI numbers are 0-15.
    InvalidSgi(u8),
    /// SGI target list names CPU interfaces this generation cannot address.
    InvalidTarget(u16),
    /// [`Gic::init`](crate::Gic::init) has not run yet.
    NotReady,
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(id) => write!(f, "interrupt {id} out of range"),
            Self::AlreadyRegistered(id) => write!(f, "handler already registered for interrupt {id}"),
            Self::NotInDistributor(id) => {
                write!(f, "interrupt {id} is configured through the redistributor")
            }
            Self::InvalidSgi(sgi) => write!(f, "SGI {sgi} outside range 0-15"),
            Self::InvalidTarget(mask) => write!(f, "SGI target list {mask:#x} not addressable"),
            Self::NotReady => write!(f, "interrupt controller not initialized"),
        }
    }
}

impl core::error::Error for IrqError {}

pub type Result<T, E = IrqError> = core::result::Result<T, E>;
