//! # Generic Interrupt Controller instance
//!
//! [`Gic`] ties a CPU interface protocol, the distributor registers and a
//! vector table together. [`Gic::dispatch`] is the interrupt entry; everything
//! else is configuration done outside interrupt context.

use log::{info, trace};
use spin::Mutex;

use crate::config::{DEFAULT_PRIORITY, MAX_INTERRUPTS};
use crate::error::{IrqError, Result};
use crate::protocol::{HardwareProtocol, InterruptId, SgiTarget};
use crate::regs::{bit_reg, byte_reg, field_reg, gicd, replicate, RegisterAccess};
use crate::vector::{InterruptHandler, VectorTable};

/// Ids 1020-1023 are reserved by every GIC generation.
const ARCH_MAX_LINES: u32 = 1020;

/// Every implemented priority level keeps at least these bits.
const PRIORITY_MASK: u8 = 0xF8;

/// `GICD_ITARGETSR` byte for CPU interface 0.
const CPU0_TARGET: u8 = 0x01;

/// Signal sensitivity, as programmed into `GICD_ICFGR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Trigger {
    Level = 0b00,
    Edge = 0b10,
}

/// One interrupt controller.
///
/// `N` is the vector table size; ids at or above it are treated as spurious.
#[derive(Debug)]
pub struct Gic<'a, P, D, const N: usize = MAX_INTERRUPTS> {
    protocol: P,
    dist: D,
    table: VectorTable<'a, N>,
    /// Serializes read-modify-write of shared distributor words.
    dist_lock: Mutex<()>,
    lines: u32,
    ready: bool,
}

impl<'a, P: HardwareProtocol, D: RegisterAccess, const N: usize> Gic<'a, P, D, N> {
    pub const fn new(protocol: P, dist: D) -> Self {
        Self {
            protocol,
            dist,
            table: VectorTable::new(),
            dist_lock: Mutex::new(()),
            lines: 0,
            ready: false,
        }
    }

    /// Brings up the distributor and this core's CPU interface, then marks
    /// the controller ready for [`dispatch`](Self::dispatch).
    ///
    /// Every implemented SPI comes out disabled, level-sensitive, at the
    /// configured default priority and (GICv2) routed to CPU 0, including
    /// SPIs the vector table is too small to hold.
    pub fn init(&mut self) {
        self.init_distributor();
        self.protocol.init_cpu_interface();
        self.ready = true;
    }

    fn init_distributor(&mut self) {
        let dist = &self.dist;
        dist.write(gicd::CTLR, 0);

        // ITLinesNumber
        let typer = dist.read(gicd::TYPER);
        let implemented = (typer & 0x1f).wrapping_add(1).wrapping_mul(32);
        let configured = implemented.min(ARCH_MAX_LINES);
        let lines = configured.min(u32::try_from(N).unwrap_or(u32::MAX));
        info!(
            "gic: {} lines implemented, {} dispatchable",
            implemented, lines
        );

        for irq in (32..configured).step_by(16) {
            dist.write(field_reg(gicd::ICFGR, irq).0, 0);
        }
        for irq in (32..configured).step_by(4) {
            dist.write(byte_reg(gicd::IPRIORITYR, irq).0, replicate(DEFAULT_PRIORITY));
            if P::ITARGETS_ROUTING {
                dist.write(byte_reg(gicd::ITARGETSR, irq).0, replicate(CPU0_TARGET));
            }
        }
        for irq in (32..configured).step_by(32) {
            dist.write(bit_reg(gicd::ICENABLER, irq).0, u32::MAX);
        }

        dist.write(gicd::CTLR, P::DIST_ENABLE.bits());
        self.lines = lines;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Lines both implemented by the distributor and covered by the vector
    /// table. Zero until [`init`](Self::init).
    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    pub fn distributor(&self) -> &D {
        &self.dist
    }

    pub fn vector_table(&self) -> &VectorTable<'a, N> {
        &self.table
    }

    /// Registers `handler` for `id`. Allowed before [`init`](Self::init).
    pub fn connect(&mut self, id: InterruptId, handler: &'a dyn InterruptHandler) -> Result<()> {
        self.table.register(id, handler)
    }

    pub fn disconnect(&mut self, id: InterruptId) -> Result<()> {
        self.table.unregister(id)
    }

    /// Checks that `id` can be configured through the distributor.
    fn configurable(&self, id: InterruptId) -> Result<()> {
        if !self.ready {
            return Err(IrqError::NotReady);
        }
        if id.get() >= self.lines {
            return Err(IrqError::OutOfRange(id));
        }
        if !P::BANKED_IN_DISTRIBUTOR && id < InterruptId::FIRST_SPI {
            return Err(IrqError::NotInDistributor(id));
        }
        Ok(())
    }

    pub fn enable(&self, id: InterruptId) -> Result<()> {
        self.configurable(id)?;
        let (reg, bit) = bit_reg(gicd::ISENABLER, id.get());
        self.dist.write(reg, bit);
        Ok(())
    }

    pub fn disable(&self, id: InterruptId) -> Result<()> {
        self.configurable(id)?;
        let (reg, bit) = bit_reg(gicd::ICENABLER, id.get());
        self.dist.write(reg, bit);
        Ok(())
    }

    /// Sets the priority (lower is more urgent) and trigger of `id`.
    ///
    /// Only the top five priority bits are kept. The trigger of an SGI is
    /// fixed by hardware and the write is ignored.
    pub fn set_priority_trigger_type(
        &self,
        id: InterruptId,
        priority: u8,
        trigger: Trigger,
    ) -> Result<()> {
        self.configurable(id)?;
        let _guard = self.dist_lock.lock();

        let (prio_reg, shift) = byte_reg(gicd::IPRIORITYR, id.get());
        let word = self.dist.read(prio_reg) & !0xFFu32.wrapping_shl(shift);
        let prio = u32::from(priority & PRIORITY_MASK).wrapping_shl(shift);
        self.dist.write(prio_reg, word | prio);

        let (cfg_reg, shift) = field_reg(gicd::ICFGR, id.get());
        let word = self.dist.read(cfg_reg) & !0b11u32.wrapping_shl(shift);
        let cfg = (trigger as u32).wrapping_shl(shift);
        self.dist.write(cfg_reg, word | cfg);
        Ok(())
    }

    pub fn send_sgi(&self, sgi: u8, target: SgiTarget) -> Result<()> {
        if !InterruptId::new(u32::from(sgi)).is_sgi() {
            return Err(IrqError::InvalidSgi(sgi));
        }
        if let SgiTarget::List(mask) = target {
            if mask & !P::TARGET_LIST != 0 {
                return Err(IrqError::InvalidTarget(mask));
            }
        }
        self.protocol.send_sgi(&self.dist, sgi, target);
        Ok(())
    }

    /// Services one interrupt. Called from the IRQ vector with processor
    /// context already saved.
    ///
    /// Acknowledges exactly once, runs the handler registered for the
    /// acknowledged id if there is one, then completes exactly once. Spurious
    /// ids and empty slots still get completed: an active interrupt that is
    /// never completed blocks every interrupt of equal or lower priority.
    ///
    /// # Panics
    ///
    /// If the controller was never [`init`](Self::init)ialized. That is a
    /// caller bug, and with `panic = "abort"` it halts the core.
    pub fn dispatch(&self) {
        assert!(self.ready, "dispatch on an uninitialized interrupt controller");

        let ack = self.protocol.identify();
        let id = ack.id();

        match self.table.get(id) {
            Some(entry) => {
                if !entry.invoke() {
                    trace!("gic: no handler for {}", id);
                }
            }
            None => trace!("gic: spurious {} ({:#x})", id, ack.raw()),
        }

        self.protocol.complete(ack);
    }
}

/// Free-function form of [`Gic::dispatch`] for trap entry code.
#[inline]
pub fn dispatch<P: HardwareProtocol, D: RegisterAccess, const N: usize>(gic: &Gic<'_, P, D, N>) {
    gic.dispatch()
}
