use std::collections::BTreeSet;

use defines::error::{errno::EINVAL, KResult};
use hal::{DeviceRequest, DeviceStatus, DiskGeometry};
use klocks::SpinMutex;

use crate::line::InterruptLine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiskOp {
    Seek { track: usize },
    Read { track: usize, sector: usize },
    Write { track: usize, sector: usize },
    Geometry,
}

/// 一个模拟磁盘单元：按磁道/扇区组织的内存存储，外加操作日志与故障注入
pub struct SimDisk {
    geometry: DiskGeometry,
    state: SpinMutex<DiskState>,
    pub(crate) line: InterruptLine<DeviceStatus>,
}

struct DiskState {
    head: usize,
    storage: Vec<u8>,
    ops: Vec<DiskOp>,
    faults: BTreeSet<(usize, usize)>,
}

impl SimDisk {
    pub(crate) fn new(geometry: DiskGeometry) -> Self {
        Self {
            geometry,
            state: SpinMutex::new(DiskState {
                head: 0,
                storage: vec![0; geometry.track_bytes() * geometry.tracks],
                ops: Vec::new(),
                faults: BTreeSet::new(),
            }),
            line: InterruptLine::new(),
        }
    }

    pub fn geometry(&self) -> DiskGeometry {
        self.geometry
    }

    /// 当前磁头所在磁道
    pub fn head(&self) -> usize {
        self.state.lock().head
    }

    /// 到目前为止收到的所有操作，按顺序
    pub fn ops(&self) -> Vec<DiskOp> {
        self.state.lock().ops.clone()
    }

    /// 只看读写操作落在哪个 (track, sector)
    pub fn transfers(&self) -> Vec<(usize, usize)> {
        self.state
            .lock()
            .ops
            .iter()
            .filter_map(|op| match *op {
                DiskOp::Read { track, sector } | DiskOp::Write { track, sector } => {
                    Some((track, sector))
                }
                DiskOp::Seek { .. } | DiskOp::Geometry => None,
            })
            .collect()
    }

    pub fn clear_ops(&self) {
        self.state.lock().ops.clear();
    }

    /// 此后对该扇区的读写都以 `ERROR` 完成
    pub fn inject_fault(&self, track: usize, sector: usize) {
        self.state.lock().faults.insert((track, sector));
    }

    /// 扣住完成中断，模拟一个还在进行中的操作
    pub fn hold_completions(&self) {
        self.line.set_held(true);
    }

    /// 放行被扣住的完成中断
    pub fn release_completions(&self) {
        self.line.set_held(false);
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// 绕过设备协议直接读存储，测试用来检查写入结果
    pub fn peek(&self, track: usize, sector: usize) -> Vec<u8> {
        let range = self.sector_range(track, sector);
        self.state.lock().storage[range].to_vec()
    }

    /// 绕过设备协议直接写存储。`data` 超过扇区大小的部分被忽略
    pub fn poke(&self, track: usize, sector: usize, data: &[u8]) {
        let range = self.sector_range(track, sector);
        let len = data.len().min(range.len());
        self.state.lock().storage[range.start..range.start + len].copy_from_slice(&data[..len]);
    }

    fn sector_range(&self, track: usize, sector: usize) -> core::ops::Range<usize> {
        assert!(
            track < self.geometry.tracks && sector < self.geometry.sectors_per_track,
            "({track}, {sector}) is outside the disk"
        );
        let start = (track * self.geometry.sectors_per_track + sector) * self.geometry.sector_size;
        start..start + self.geometry.sector_size
    }

    pub(crate) fn output(&self, request: DeviceRequest<'_>) -> KResult<()> {
        let status = {
            let mut state = self.state.lock();
            match request {
                DeviceRequest::Seek { track } => {
                    state.ops.push(DiskOp::Seek { track });
                    if track < self.geometry.tracks {
                        state.head = track;
                        DeviceStatus::READY
                    } else {
                        DeviceStatus::ERROR
                    }
                }
                DeviceRequest::ReadSector { sector, buf } => {
                    let track = state.head;
                    state.ops.push(DiskOp::Read { track, sector });
                    if self.transfer_fails(&state, track, sector, buf.len()) {
                        DeviceStatus::ERROR
                    } else {
                        let range = self.sector_range(track, sector);
                        let len = range.len();
                        buf[..len].copy_from_slice(&state.storage[range]);
                        DeviceStatus::READY
                    }
                }
                DeviceRequest::WriteSector { sector, buf } => {
                    let track = state.head;
                    state.ops.push(DiskOp::Write { track, sector });
                    if self.transfer_fails(&state, track, sector, buf.len()) {
                        DeviceStatus::ERROR
                    } else {
                        let range = self.sector_range(track, sector);
                        let len = range.len();
                        state.storage[range].copy_from_slice(&buf[..len]);
                        DeviceStatus::READY
                    }
                }
                DeviceRequest::Geometry { out } => {
                    state.ops.push(DiskOp::Geometry);
                    *out = self.geometry;
                    DeviceStatus::READY
                }
                DeviceRequest::TermControl(_) => return Err(EINVAL),
            }
        };
        self.line.raise(DeviceStatus(status));
        Ok(())
    }

    fn transfer_fails(&self, state: &DiskState, track: usize, sector: usize, len: usize) -> bool {
        sector >= self.geometry.sectors_per_track
            || len < self.geometry.sector_size
            || state.faults.contains(&(track, sector))
    }
}
