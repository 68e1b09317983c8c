//! # GICv3 system-register CPU interface
//!
//! The acknowledge is a read of `ICC_IAR1_EL1`, completion a write of the
//! interrupt id to `ICC_EOIR1_EL1`. SGIs go through `ICC_SGI1R_EL1`.

use bitfield::bitfield;

use super::{HardwareProtocol, InterruptId, RawAck, SgiTarget};
use crate::regs::{DistCtlr, RegisterAccess};

/// `ICC_IAR1_EL1.INTID` is 24 bits wide.
pub const INTID_MASK: u64 = 0xFF_FFFF;

bitfield! {
    /// Affinity fields of `MPIDR_EL1`.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Mpidr(u64);
    impl Debug;
    u64;
    pub aff0, _: 7, 0;
    pub aff1, _: 15, 8;
    pub aff2, _: 23, 16;
    pub aff3, _: 39, 32;
}

bitfield! {
    /// Layout of `ICC_SGI1R_EL1`.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Sgi1r(u64);
    impl Debug;
    u64;
    pub aff3, set_aff3: 55, 48;
    /// Range selector: `TargetList` bit n means `Aff0 = RS * 16 + n`.
    pub rs, set_rs: 47, 44;
    /// Interrupt routing mode, 1 = every PE but the sender.
    pub irm, set_irm: 40, 40;
    pub aff2, set_aff2: 39, 32;
    pub intid, set_intid: 27, 24;
    pub aff1, set_aff1: 23, 16;
    pub target_list, set_target_list: 15, 0;
}

impl Sgi1r {
    /// Addresses the sender's own cluster and `Aff0` range.
    fn set_cluster_of(&mut self, mpidr: Mpidr) {
        self.set_aff3(mpidr.aff3());
        self.set_aff2(mpidr.aff2());
        self.set_aff1(mpidr.aff1());
        self.set_rs(mpidr.aff0() / 16);
    }
}

/// The `ICC_*` registers the dispatcher and bring-up code touch.
pub trait SystemRegisters {
    /// `ICC_IAR1_EL1`. Reading acknowledges the interrupt.
    fn read_iar1(&self) -> u64;
    /// `ICC_EOIR1_EL1`
    fn write_eoir1(&self, value: u64);
    /// `ICC_SGI1R_EL1`
    fn write_sgi1r(&self, value: u64);
    /// `MPIDR_EL1`
    fn read_mpidr(&self) -> u64;
    /// `ICC_SRE_EL1`
    fn write_sre(&self, value: u64);
    /// `ICC_CTLR_EL1`
    fn write_ctlr(&self, value: u64);
    /// `ICC_PMR_EL1`
    fn write_pmr(&self, value: u64);
    /// `ICC_IGRPEN1_EL1`
    fn write_igrpen1(&self, value: u64);
}

#[derive(Debug)]
pub struct GicV3<S> {
    sys: S,
}

impl<S: SystemRegisters> GicV3<S> {
    pub const fn new(sys: S) -> Self {
        Self { sys }
    }

    pub fn system_registers(&self) -> &S {
        &self.sys
    }
}

impl<S: SystemRegisters> HardwareProtocol for GicV3<S> {
    const DIST_ENABLE: DistCtlr = DistCtlr::ARE_NS.union(DistCtlr::ENABLE_GRP1_NS);
    const ITARGETS_ROUTING: bool = false;
    const BANKED_IN_DISTRIBUTOR: bool = false;
    const TARGET_LIST: u16 = 0xFFFF;

    fn init_cpu_interface(&self) {
        // Enable system register access
        self.sys.write_sre(1);
        // EOI both drops priority and deactivates
        self.sys.write_ctlr(0);
        // Enable non-secure group 1
        self.sys.write_igrpen1(1);
        // Let every priority through
        self.sys.write_pmr(0xFF);
    }

    fn identify(&self) -> RawAck {
        let iar = self.sys.read_iar1();
        RawAck::new(iar as u32, InterruptId::new((iar & INTID_MASK) as u32))
    }

    fn complete(&self, ack: RawAck) {
        self.sys.write_eoir1(u64::from(ack.id().get()));
    }

    fn send_sgi<D: RegisterAccess>(&self, _dist: &D, sgi: u8, target: SgiTarget) {
        let mut sgi1r = Sgi1r::default();
        sgi1r.set_intid(u64::from(sgi));
        match target {
            SgiTarget::AllOthers => sgi1r.set_irm(1),
            SgiTarget::List(mask) => {
                sgi1r.set_cluster_of(Mpidr(self.sys.read_mpidr()));
                sgi1r.set_target_list(u64::from(mask));
            }
            SgiTarget::SelfOnly => {
                let mpidr = Mpidr(self.sys.read_mpidr());
                sgi1r.set_cluster_of(mpidr);
                sgi1r.set_target_list(1u64.wrapping_shl((mpidr.aff0() % 16) as u32));
            }
        }
        self.sys.write_sgi1r(sgi1r.0);
    }
}

/// The executing core's own `ICC_*` registers.
#[cfg(target_arch = "aarch64")]
#[derive(Debug, Default)]
pub struct CpuSysRegs;

#[cfg(target_arch = "aarch64")]
mod cpu {
    use core::arch::asm;

    use super::{CpuSysRegs, SystemRegisters};

    impl SystemRegisters for CpuSysRegs {
        fn read_iar1(&self) -> u64 {
            let irq: u64;
            unsafe { asm!("mrs {}, icc_iar1_el1", out(reg) irq) };
            irq
        }

        fn write_eoir1(&self, value: u64) {
            unsafe { asm!("msr icc_eoir1_el1, {}", in(reg) value) };
        }

        fn write_sgi1r(&self, value: u64) {
            unsafe { asm!("msr icc_sgi1r_el1, {}", "isb", in(reg) value) };
        }

        fn read_mpidr(&self) -> u64 {
            let mpidr: u64;
            unsafe { asm!("mrs {}, mpidr_el1", out(reg) mpidr) };
            mpidr
        }

        fn write_sre(&self, value: u64) {
            unsafe { asm!("msr icc_sre_el1, {}", "isb", in(reg) value) };
        }

        fn write_ctlr(&self, value: u64) {
            unsafe { asm!("msr icc_ctlr_el1, {}", in(reg) value) };
        }

        fn write_pmr(&self, value: u64) {
            unsafe { asm!("msr icc_pmr_el1, {}", in(reg) value) };
        }

        fn write_igrpen1(&self, value: u64) {
            unsafe { asm!("msr icc_igrpen1_el1, {}", "isb", in(reg) value) };
        }
    }
}
