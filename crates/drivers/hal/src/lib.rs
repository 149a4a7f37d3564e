//! 驱动层与“硬件”之间的唯一接口
//!
//! 真正的设备（或者测试里的模拟设备）实现 [`DeviceBus`]。驱动通过
//! [`DeviceBus::device_output`] 下发请求，通过 [`DeviceBus::wait_device`] 等待该设备的下一次中断。

#![cfg_attr(not(test), no_std)]

mod device;

use core::future::Future;

use defines::error::KResult;

pub use self::device::{
    DeviceClass, DeviceRequest, DeviceStatus, DiskGeometry, TermControl,
};

pub trait DeviceBus: Send + Sync + 'static {
    /// 向某个设备单元下发一个请求。
    ///
    /// 带输出缓冲区的请求（读扇区、查询几何参数）在返回时缓冲区就已经填好，
    /// 但设备仍然会在稍后产生一次完成中断，驱动需要 `wait_device` 拿到其状态。
    fn device_output(
        &self,
        class: DeviceClass,
        unit: usize,
        request: DeviceRequest<'_>,
    ) -> KResult<()>;

    /// 等待该设备单元的下一次中断，返回中断时的设备状态。
    ///
    /// 时钟的状态是当前时间（微秒）；磁盘是最后一次请求的完成状态；
    /// 终端则把收发两个方向的状态和收到的字符打包在一起，见 [`DeviceStatus`]。
    fn wait_device(
        &self,
        class: DeviceClass,
        unit: usize,
    ) -> impl Future<Output = KResult<DeviceStatus>> + Send + '_;
}
