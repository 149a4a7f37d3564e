//! 磁盘调度
//!
//! 每个磁盘单元一个工作任务。请求者校验参数后把请求插进该单元的有序队列，
//! `signal` 一次信号量，然后阻塞在自己的信箱上；工作任务每被唤醒一次就按轮转游标取出一个请求，
//! 逐扇区完成传输，再把结果投递回请求者。

mod queue;
mod request;

use alloc::{vec, vec::Vec};

use defines::error::{errno, KResult};
use hal::{DeviceBus, DeviceClass, DeviceRequest, DeviceStatus, DiskGeometry};
use klocks::{Once, Semaphore, SpinMutex};
use triomphe::Arc;

use self::queue::DiskQueue;
pub use self::request::DiskOp;
use self::request::{validate, DiskRequest};
use crate::{
    task::{Reply, TaskId},
    Kernel,
};

pub(crate) struct DiskUnit {
    queue: SpinMutex<DiskQueue>,
    /// 每个排队中的请求对应一个许可
    pending: Semaphore,
    /// 驱动启动时探测并缓存
    geometry: Once<DiskGeometry>,
}

impl DiskUnit {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            queue: SpinMutex::new(DiskQueue::new(capacity)),
            pending: Semaphore::new(0),
            geometry: Once::new(),
        }
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.lock().len()
    }
}

impl<H: DeviceBus> Kernel<H> {
    /// 从 (track, first) 开始读 `sectors` 个扇区到 `buf`。
    ///
    /// 参数不合法返回 `EINVAL`；设备出错时返回出错的状态字，`buf` 中只有出错之前的扇区有效
    pub async fn disk_read(
        &self,
        task: TaskId,
        unit: usize,
        track: usize,
        first: usize,
        sectors: usize,
        buf: &mut [u8],
    ) -> KResult<DeviceStatus> {
        let geometry = self.admissible(unit, track, first, sectors, buf.len())?;
        let len = sectors * geometry.sector_size;
        let request = DiskRequest {
            op: DiskOp::Read,
            track,
            first,
            sectors,
            data: vec![0; len],
        };
        let (status, data) = self.submit(task, unit, request).await?;
        buf[..len].copy_from_slice(&data);
        Ok(status)
    }

    /// 把 `buf` 开头的 `sectors` 个扇区写到 (track, first) 开始的位置
    pub async fn disk_write(
        &self,
        task: TaskId,
        unit: usize,
        track: usize,
        first: usize,
        sectors: usize,
        buf: &[u8],
    ) -> KResult<DeviceStatus> {
        let geometry = self.admissible(unit, track, first, sectors, buf.len())?;
        let request = DiskRequest {
            op: DiskOp::Write,
            track,
            first,
            sectors,
            data: buf[..sectors * geometry.sector_size].to_vec(),
        };
        let (status, _) = self.submit(task, unit, request).await?;
        Ok(status)
    }

    /// 磁盘单元的几何参数
    pub fn disk_size(&self, unit: usize) -> KResult<DiskGeometry> {
        self.disks
            .get(unit)
            .and_then(|disk| disk.geometry.get())
            .copied()
            .ok_or(errno::EINVAL)
    }

    fn admissible(
        &self,
        unit: usize,
        track: usize,
        first: usize,
        sectors: usize,
        buf_len: usize,
    ) -> KResult<DiskGeometry> {
        let geometry = self.disk_size(unit)?;
        validate(&geometry, track, first, sectors, buf_len)?;
        Ok(geometry)
    }

    async fn submit(
        &self,
        task: TaskId,
        unit: usize,
        request: DiskRequest,
    ) -> KResult<(DeviceStatus, Vec<u8>)> {
        if !self.tasks.is_live(task) {
            return Err(errno::ESRCH);
        }
        let disk = &self.disks[unit];
        trace!("task {task} queues {request:?} on disk {unit}");
        disk.queue.lock().insert(task, request);
        disk.pending.signal();

        // 被强行终止时，还没被取走的请求连同它的许可一起撤掉
        let queued = scopeguard::guard((), |()| {
            if disk.queue.lock().remove(task).is_some() {
                disk.pending.try_acquire();
                debug!("task {task} withdrew its request from disk {unit}");
            }
        });
        let reply = self.tasks.wait(task).await;
        scopeguard::ScopeGuard::into_inner(queued);
        match reply {
            Reply::Disk { status, data } => Ok((status, data)),
            other => panic!("disk requester {task} got {other:?}"),
        }
    }
}

/// 一个磁盘单元的驱动：探测几何参数，然后循环服务请求
pub(crate) async fn disk_driver<H: DeviceBus>(kernel: Arc<Kernel<H>>, unit: usize) -> KResult<()> {
    let disk = &kernel.disks[unit];
    match probe_geometry(&kernel.bus, unit).await {
        Ok(geometry) => {
            info!(
                "{} tracks x {} sectors x {} bytes",
                geometry.tracks, geometry.sectors_per_track, geometry.sector_size
            );
            disk.geometry.call_once(|| geometry);
        }
        Err(err) => warn!("failed to probe geometry: {err}"),
    }
    kernel.running.signal();

    let Some(&geometry) = disk.geometry.get() else {
        return Err(errno::ENXIO);
    };
    let mut head = None;
    loop {
        disk.pending.acquire().await;
        let Some((owner, mut request)) = disk.queue.lock().dequeue() else {
            panic!("disk {unit} woke up with an empty queue");
        };
        trace!("serve {request:?} for task {owner}");
        let status = serve(&kernel.bus, unit, &geometry, &mut head, &mut request).await;
        if status.is_error() {
            warn!("{request:?} of task {owner} failed with {status:?}");
        }
        kernel.tasks.post(
            owner,
            Reply::Disk {
                status,
                data: request.data,
            },
        );
    }
}

async fn probe_geometry<H: DeviceBus>(bus: &H, unit: usize) -> KResult<DiskGeometry> {
    let mut geometry = DiskGeometry::default();
    bus.device_output(
        DeviceClass::Disk,
        unit,
        DeviceRequest::Geometry { out: &mut geometry },
    )?;
    let status = bus.wait_device(DeviceClass::Disk, unit).await?;
    if status.is_error() || geometry.sectors_per_track == 0 {
        return Err(errno::EIO);
    }
    Ok(geometry)
}

/// 逐扇区传输。遇到出错的状态就放弃剩下的扇区
async fn serve<H: DeviceBus>(
    bus: &H,
    unit: usize,
    geometry: &DiskGeometry,
    head: &mut Option<usize>,
    request: &mut DiskRequest,
) -> DeviceStatus {
    let size = geometry.sector_size;
    for index in 0..request.sectors {
        let (track, sector) = request.locate(index, geometry.sectors_per_track);
        if *head != Some(track) {
            let status = operate(bus, unit, DeviceRequest::Seek { track }).await;
            if status.is_error() {
                *head = None;
                return status;
            }
            *head = Some(track);
        }
        let buf = &mut request.data[index * size..(index + 1) * size];
        let op = match request.op {
            DiskOp::Read => DeviceRequest::ReadSector { sector, buf },
            DiskOp::Write => DeviceRequest::WriteSector { sector, buf },
        };
        let status = operate(bus, unit, op).await;
        if status.is_error() {
            return status;
        }
    }
    // 一个扇区都不传时也把磁头移到起始磁道
    if request.sectors == 0 && *head != Some(request.track) {
        let status = operate(bus, unit, DeviceRequest::Seek { track: request.track }).await;
        if status.is_error() {
            *head = None;
            return status;
        }
        *head = Some(request.track);
    }
    DeviceStatus(DeviceStatus::READY)
}

/// 下发一个请求并等待完成。总线本身报错也当作设备出错
async fn operate<H: DeviceBus>(bus: &H, unit: usize, request: DeviceRequest<'_>) -> DeviceStatus {
    let name = request.name();
    if let Err(err) = bus.device_output(DeviceClass::Disk, unit, request) {
        error!("{name} rejected by the bus: {err}");
        return DeviceStatus(DeviceStatus::ERROR);
    }
    match bus.wait_device(DeviceClass::Disk, unit).await {
        Ok(status) => status,
        Err(err) => {
            error!("waiting for {name} failed: {err}");
            DeviceStatus(DeviceStatus::ERROR)
        }
    }
}
