//! Host-side fakes of the GIC register blocks.
//!
//! Every fake is a cheap handle onto shared state, so a test can keep one
//! clone to inspect while the controller owns another.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use crate::protocol::gicv3::SystemRegisters;
use crate::protocol::InterruptId;
use crate::regs::{gicc, gicd, RegisterAccess};


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Read(usize, u32),
    Write(usize, u32),
}

#[derive(Debug, Default)]
struct RegState {
    values: BTreeMap<usize, u32>,
    acks: VecDeque<u32>,
    log: Vec<Access>,
}

/// A register block backed by a map.
///
/// When built with [`cpu_interface`](Self::cpu_interface), reads of
/// `GICC_IAR` pop the next queued acknowledge value, and read as spurious
/// once the queue is empty.
#[derive(Clone, Debug, Default)]
pub struct FakeRegs {
    state: Arc<Mutex<RegState>>,
    ack_offset: Option<usize>,
}

impl FakeRegs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cpu_interface() -> Self {
        Self {
            ack_offset: Some(gicc::IAR),
            ..Self::default()
        }
    }

    pub fn distributor(typer: u32) -> Self {
        let regs = Self::new();
        regs.set(gicd::TYPER, typer);
        regs
    }

    pub fn queue_ack(&self, raw: u32) {
        self.state.lock().unwrap().acks.push_back(raw);
    }

    /// Sets a register without logging the access.
    pub fn set(&self, offset: usize, value: u32) {
        self.state.lock().unwrap().values.insert(offset, value);
    }

    pub fn value(&self, offset: usize) -> u32 {
        self.state
            .lock()
            .unwrap()
            .values
            .get(&offset)
            .copied()
            .unwrap_or(0)
    }

    pub fn log(&self) -> Vec<Access> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.lock().unwrap().log.clear();
    }

    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.log()
            .into_iter()
            .filter_map(|access| match access {
                Access::Write(o, value) if o == offset => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn reads_of(&self, offset: usize) -> usize {
        self.log()
            .iter()
            .filter(|access| matches!(access, Access::Read(o, _) if *o == offset))
            .count()
    }
}

impl RegisterAccess for FakeRegs {
    fn read(&self, offset: usize) -> u32 {
        let mut state = self.state.lock().unwrap();
        let value = if Some(offset) == self.ack_offset {
            state
                .acks
                .pop_front()
                .unwrap_or(InterruptId::SPURIOUS.get())
        } else {
            state.values.get(&offset).copied().unwrap_or(0)
        };
        state.log.push(Access::Read(offset, value));
        value
    }

    fn write(&self, offset: usize, value: u32) {
        let mut state = self.state.lock().unwrap();
        state.values.insert(offset, value);
        state.log.push(Access::Write(offset, value));
    }
}

#[derive(Debug, Default)]
struct SysState {
    acks: VecDeque<u64>,
    ack_reads: usize,
    eois: Vec<u64>,
    sgis: Vec<u64>,
    init: Vec<(&'static str, u64)>,
}

/// GICv3 `ICC_*` registers of one fake core.
#[derive(Clone, Debug, Default)]
pub struct FakeSysRegs {
    state: Arc<Mutex<SysState>>,
    mpidr: u64,
}

impl FakeSysRegs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mpidr(mpidr: u64) -> Self {
        Self {
            mpidr,
            ..Self::default()
        }
    }

    pub fn queue_ack(&self, raw: u64) {
        self.state.lock().unwrap().acks.push_back(raw);
    }

    pub fn ack_reads(&self) -> usize {
        self.state.lock().unwrap().ack_reads
    }

    pub fn eoi_writes(&self) -> Vec<u64> {
        self.state.lock().unwrap().eois.clone()
    }

    pub fn sgi_writes(&self) -> Vec<u64> {
        self.state.lock().unwrap().sgis.clone()
    }

    pub fn init_writes(&self) -> Vec<(&'static str, u64)> {
        self.state.lock().unwrap().init.clone()
    }

    fn record_init(&self, reg: &'static str, value: u64) {
        self.state.lock().unwrap().init.push((reg, value));
    }
}

impl SystemRegisters for FakeSysRegs {
    fn read_iar1(&self) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.ack_reads += 1;
        state
            .acks
            .pop_front()
            .unwrap_or(u64::from(InterruptId::SPURIOUS.get()))
    }

    fn write_eoir1(&self, value: u64) {
        self.state.lock().unwrap().eois.push(value);
    }

    fn write_sgi1r(&self, value: u64) {
        self.state.lock().unwrap().sgis.push(value);
    }

    fn read_mpidr(&self) -> u64 {
        self.mpidr
    }

    fn write_sre(&self, value: u64) {
        self.record_init("sre", value);
    }

    fn write_ctlr(&self, value: u64) {
        self.record_init("ctlr", value);
    }

    fn write_pmr(&self, value: u64) {
        self.record_init("pmr", value);
    }

    fn write_igrpen1(&self, value: u64) {
        self.record_init("igrpen1", value);
    }
}
