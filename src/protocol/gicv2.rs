//! # GICv2 memory-mapped CPU interface
//!
//! The legacy protocol: the acknowledge is a read of `GICC_IAR`, completion a
//! write of the same value to `GICC_EOIR`.

use bitfield::bitfield;

use super::{HardwareProtocol, InterruptId, RawAck, SgiTarget};
use crate::regs::{gicc, gicd, CpuCtlr, DistCtlr, RegisterAccess};

bitfield! {
    /// Layout of `GICC_IAR`, and of `GICC_EOIR` which mirrors it.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct Iar(u32);
    impl Debug;
    u32;
    pub interrupt_id, _: 9, 0;
    /// Requesting CPU, meaningful for SGIs only.
    pub cpu_id, _: 12, 10;
}

bitfield! {
    /// Layout of `GICD_SGIR`.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    pub struct Sgir(u32);
    impl Debug;
    u32;
    /// 0 = target list, 1 = all but self, 2 = self only.
    pub target_list_filter, set_target_list_filter: 25, 24;
    pub cpu_target_list, set_cpu_target_list: 23, 16;
    pub sgi_id, set_sgi_id: 3, 0;
}

/// Lowest priority value the mask lets through. Top 4 bits, so it works
/// whether the implementation has 16 or 256 levels.
const PRIORITY_MASK: u32 = 0xF0;

#[derive(Debug)]
pub struct GicV2<R> {
    cpu: R,
}

impl<R: RegisterAccess> GicV2<R> {
    /// `cpu` addresses the GICC block of the core that will take interrupts.
    pub const fn new(cpu: R) -> Self {
        Self { cpu }
    }

    pub fn cpu_interface(&self) -> &R {
        &self.cpu
    }
}

impl<R: RegisterAccess> HardwareProtocol for GicV2<R> {
    const DIST_ENABLE: DistCtlr = DistCtlr::ENABLE_GRP0;
    const ITARGETS_ROUTING: bool = true;
    const BANKED_IN_DISTRIBUTOR: bool = true;
    const TARGET_LIST: u16 = 0xFF;

    fn init_cpu_interface(&self) {
        self.cpu.write(gicc::PMR, PRIORITY_MASK);
        self.cpu.write(gicc::CTLR, CpuCtlr::ENABLE_GRP0.bits());
    }

    fn identify(&self) -> RawAck {
        let iar = Iar(self.cpu.read(gicc::IAR));
        RawAck::new(iar.0, InterruptId::new(iar.interrupt_id()))
    }

    fn complete(&self, ack: RawAck) {
        // Some revisions only deassert when the CPU source bits come back too.
        self.cpu.write(gicc::EOIR, ack.raw());
    }

    fn send_sgi<D: RegisterAccess>(&self, dist: &D, sgi: u8, target: SgiTarget) {
        let mut sgir = Sgir::default();
        match target {
            SgiTarget::List(mask) => sgir.set_cpu_target_list(u32::from(mask)),
            SgiTarget::AllOthers => sgir.set_target_list_filter(1),
            SgiTarget::SelfOnly => sgir.set_target_list_filter(2),
        }
        sgir.set_sgi_id(u32::from(sgi));
        dist.write(gicd::SGIR, sgir.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::FakeRegs;

    #[test]
    fn test_iar_fields() {
        let iar = Iar(0x0000_0C05);
        assert_eq!(iar.interrupt_id(), 5);
        assert_eq!(iar.cpu_id(), 3);

        let spurious = Iar(0x3FF);
        assert_eq!(spurious.interrupt_id(), 1023);
    }

    #[test]
    fn test_identify_masks_but_keeps_raw() {
        let cpu = FakeRegs::cpu_interface();
        // SGI 5 raised by CPU 5
        cpu.queue_ack(0x1405);
        // Bit 9 is part of INTID
        cpu.queue_ack(0x205);
        let gic = GicV2::new(cpu.clone());

        let ack = gic.identify();
        assert_eq!(ack.id(), InterruptId::new(5));
        assert_eq!(ack.raw(), 0x1405);
        assert_eq!(Iar(ack.raw()).cpu_id(), 5);
        assert_eq!(cpu.reads_of(gicc::IAR), 1);

        assert_eq!(gic.identify().id(), InterruptId::new(0x205));
    }

    #[test]
    fn test_complete_writes_raw_value() {
        let cpu = FakeRegs::cpu_interface();
        let gic = GicV2::new(cpu.clone());

        gic.complete(RawAck::new(0x1C2A, InterruptId::new(0x2A)));
        assert_eq!(cpu.writes_to(gicc::EOIR), [0x1C2A]);
    }

    #[test]
    fn test_init_cpu_interface() {
        let cpu = FakeRegs::cpu_interface();
        GicV2::new(cpu.clone()).init_cpu_interface();

        assert_eq!(cpu.value(gicc::PMR), 0xF0);
        assert_eq!(cpu.value(gicc::CTLR), 1);
    }

    #[test]
    fn test_send_sgi_encoding() {
        let dist = FakeRegs::new();
        let gic = GicV2::new(FakeRegs::cpu_interface());

        gic.send_sgi(&dist, 3, SgiTarget::List(0b0110));
        gic.send_sgi(&dist, 1, SgiTarget::AllOthers);
        gic.send_sgi(&dist, 15, SgiTarget::SelfOnly);

        assert_eq!(
            dist.writes_to(gicd::SGIR),
            [0x0006_0003, 0x0100_0001, 0x0200_000F]
        );
    }

    #[test]
    fn test_sgir_fields() {
        let mut sgir = Sgir::default();
        sgir.set_target_list_filter(2);
        sgir.set_cpu_target_list(0x81);
        sgir.set_sgi_id(9);
        assert_eq!(sgir.0, 0x0281_0009);
    }
}
