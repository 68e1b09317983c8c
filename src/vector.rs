//! Vector table: one handler slot per interrupt id.

use core::fmt;

use crate::error::{IrqError, Result};
use crate::protocol::InterruptId;

/// Something to run when an interrupt fires.
///
/// The handler is its own context: whatever state it needs it carries, and it
/// stays owned by whoever registered it. Runs in interrupt context, so it must
/// not block. A panic inside a handler is not caught and skips completion.
pub trait InterruptHandler: Sync {
    fn handle(&self);
}

impl<F: Fn() + Sync> InterruptHandler for F {
    fn handle(&self) {
        self()
    }
}

/// A single vector table slot.
#[derive(Clone, Copy)]
pub struct VectorTableEntry<'a> {
    handler: Option<&'a dyn InterruptHandler>,
}

impl<'a> VectorTableEntry<'a> {
    pub const EMPTY: Self = Self { handler: None };

    pub const fn new(handler: &'a dyn InterruptHandler) -> Self {
        Self {
            handler: Some(handler),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.handler.is_some()
    }

    /// Runs the handler, if any. Returns whether one ran.
    #[inline]
    pub fn invoke(&self) -> bool {
        match self.handler {
            Some(handler) => {
                handler.handle();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for VectorTableEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorTableEntry")
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Fixed table of `N` slots indexed by [`InterruptId`].
///
/// Mutation needs `&mut self`, so a slot can never be rewritten while a
/// dispatch holds the table.
pub struct VectorTable<'a, const N: usize> {
    entries: [VectorTableEntry<'a>; N],
}

impl<'a, const N: usize> VectorTable<'a, N> {
    pub const fn new() -> Self {
        Self {
            entries: [VectorTableEntry::EMPTY; N],
        }
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// `None` when `id` is beyond the table.
    #[inline]
    pub fn get(&self, id: InterruptId) -> Option<&VectorTableEntry<'a>> {
        self.entries.get(id.index())
    }

    pub fn register(&mut self, id: InterruptId, handler: &'a dyn InterruptHandler) -> Result<()> {
        let entry = self
            .entries
            .get_mut(id.index())
            .ok_or(IrqError::OutOfRange(id))?;
        if entry.is_registered() {
            return Err(IrqError::AlreadyRegistered(id));
        }
        *entry = VectorTableEntry::new(handler);
        Ok(())
    }

    /// Clears the slot. Clearing an empty slot is fine.
    pub fn unregister(&mut self, id: InterruptId) -> Result<()> {
        let entry = self
            .entries
            .get_mut(id.index())
            .ok_or(IrqError::OutOfRange(id))?;
        *entry = VectorTableEntry::EMPTY;
        Ok(())
    }

    /// Ids that currently have a handler.
    pub fn registered(&self) -> impl Iterator<Item = InterruptId> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_registered())
            .map(|(i, _)| InterruptId::new(i as u32))
    }
}

impl<const N: usize> fmt::Debug for VectorTable<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.registered()).finish()
    }
}
