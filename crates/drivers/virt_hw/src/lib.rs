//! 宿主机上的模拟硬件：一个时钟、若干磁盘、若干终端
//!
//! 时间不会自己流动。时钟只在调用 [`Machine::tick`] 时前进，磁盘和终端发送则在请求下发时
//! 立即完成并排队一个中断。于是内核在宿主机上的运行完全是确定性的。

mod clock;
mod disk;
mod line;
mod term;

use std::future::Future;

use defines::{
    config::{CLOCK_TICK_US, DISK_SECTOR_SIZE, DISK_TRACKS, DISK_TRACK_SIZE, DISK_UNITS, TERM_UNITS},
    error::{
        errno::{EINVAL, ENXIO},
        KResult,
    },
};
use hal::{DeviceBus, DeviceClass, DeviceRequest, DeviceStatus, DiskGeometry};

pub use self::{
    clock::SimClock,
    disk::{DiskOp, SimDisk},
    term::SimTerm,
};

#[derive(Clone, Debug)]
pub struct MachineConfig {
    /// 时钟的初始读数，测试回绕时有用
    pub clock_start_us: u32,
    pub clock_step_us: u32,
    pub disks: Vec<DiskGeometry>,
    pub terms: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            clock_start_us: 0,
            clock_step_us: CLOCK_TICK_US,
            disks: vec![
                DiskGeometry {
                    sector_size: DISK_SECTOR_SIZE,
                    sectors_per_track: DISK_TRACK_SIZE,
                    tracks: DISK_TRACKS,
                };
                DISK_UNITS
            ],
            terms: TERM_UNITS,
        }
    }
}

pub struct Machine {
    clock: SimClock,
    disks: Vec<SimDisk>,
    terms: Vec<SimTerm>,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        Self {
            clock: SimClock::new(config.clock_start_us, config.clock_step_us),
            disks: config.disks.into_iter().map(SimDisk::new).collect(),
            terms: (0..config.terms).map(|_| SimTerm::new()).collect(),
        }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// # Panics
    ///
    /// 单元号不存在时 panic
    pub fn disk(&self, unit: usize) -> &SimDisk {
        &self.disks[unit]
    }

    /// # Panics
    ///
    /// 单元号不存在时 panic
    pub fn term(&self, unit: usize) -> &SimTerm {
        &self.terms[unit]
    }

    pub fn disk_units(&self) -> usize {
        self.disks.len()
    }

    pub fn term_units(&self) -> usize {
        self.terms.len()
    }

    /// 推进一个时钟周期
    pub fn tick(&self) -> u32 {
        self.clock.tick()
    }

    /// 还没有被驱动取走的中断总数
    pub fn pending_interrupts(&self) -> usize {
        self.clock.line.pending()
            + self.disks.iter().map(|d| d.line.pending()).sum::<usize>()
            + self.terms.iter().map(|t| t.line.pending()).sum::<usize>()
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl DeviceBus for Machine {
    fn device_output(
        &self,
        class: DeviceClass,
        unit: usize,
        request: DeviceRequest<'_>,
    ) -> KResult<()> {
        match class {
            DeviceClass::Clock => Err(EINVAL),
            DeviceClass::Disk => self.disks.get(unit).ok_or(ENXIO)?.output(request),
            DeviceClass::Term => {
                let term = self.terms.get(unit).ok_or(ENXIO)?;
                match request {
                    DeviceRequest::TermControl(ctrl) => {
                        term.control(ctrl);
                        Ok(())
                    }
                    _ => Err(EINVAL),
                }
            }
        }
    }

    fn wait_device(
        &self,
        class: DeviceClass,
        unit: usize,
    ) -> impl Future<Output = KResult<DeviceStatus>> + Send + '_ {
        async move {
            match class {
                DeviceClass::Clock => {
                    if unit != 0 {
                        return Err(ENXIO);
                    }
                    Ok(DeviceStatus(self.clock.line.next().await))
                }
                DeviceClass::Disk => {
                    let disk = self.disks.get(unit).ok_or(ENXIO)?;
                    Ok(disk.line.next().await)
                }
                DeviceClass::Term => {
                    let term = self.terms.get(unit).ok_or(ENXIO)?;
                    let event = term.line.next().await;
                    Ok(term.status_of(event))
                }
            }
        }
    }
}
