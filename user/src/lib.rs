//! 用户侧的系统调用库，以及几个跑在模拟硬件上的演示程序

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
pub mod console;
pub mod programs;
mod syscall;

use core::fmt;

use defines::syscall::{name, DISKREAD, DISKSIZE, DISKWRITE, SLEEP, TERMREAD, TERMWRITE};
use hal::{DeviceBus, DeviceStatus, DiskGeometry};
use kernel::UserCtx;

pub use self::{
    console::{STDIN, STDOUT},
    syscall::*,
};

/// 系统调用只报告失败，不报告原因
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SysError {
    pub number: usize,
}

impl fmt::Display for SysError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed", name(self.number))
    }
}

pub type SysResult<T> = Result<T, SysError>;

fn check(number: usize, ret: isize) -> SysResult<usize> {
    usize::try_from(ret).map_err(|_| SysError { number })
}

pub async fn sleep<H: DeviceBus>(ctx: &UserCtx<H>, seconds: isize) -> SysResult<()> {
    check(SLEEP, sys_sleep(ctx, seconds).await).map(drop)
}

/// 读一行。行比 `buf` 长时只拿到前面一段，剩下的被丢弃
pub async fn term_read<H: DeviceBus>(ctx: &UserCtx<H>, unit: usize, buf: &mut [u8]) -> SysResult<usize> {
    check(TERMREAD, sys_term_read(ctx, buf, unit).await)
}

pub async fn term_write<H: DeviceBus>(ctx: &UserCtx<H>, unit: usize, buf: &[u8]) -> SysResult<usize> {
    check(TERMWRITE, sys_term_write(ctx, buf, unit).await)
}

/// 从 `(track, first)` 开始连续读 `sectors` 个扇区，跨磁道时自动换道
pub async fn disk_read<H: DeviceBus>(
    ctx: &UserCtx<H>,
    unit: usize,
    track: usize,
    first: usize,
    sectors: usize,
    buf: &mut [u8],
) -> SysResult<DeviceStatus> {
    let ret = sys_disk_io(ctx, DISKREAD, buf, [sectors, track, first, unit]).await;
    check(DISKREAD, ret).map(|status| DeviceStatus(status as u32))
}

pub async fn disk_write<H: DeviceBus>(
    ctx: &UserCtx<H>,
    unit: usize,
    track: usize,
    first: usize,
    sectors: usize,
    buf: &[u8],
) -> SysResult<DeviceStatus> {
    let mut data = buf.to_vec();
    let ret = sys_disk_io(ctx, DISKWRITE, &mut data, [sectors, track, first, unit]).await;
    check(DISKWRITE, ret).map(|status| DeviceStatus(status as u32))
}

pub async fn disk_size<H: DeviceBus>(ctx: &UserCtx<H>, unit: usize) -> SysResult<DiskGeometry> {
    let mut size = [0; 3];
    check(DISKSIZE, sys_disk_size(ctx, unit, &mut size).await)?;
    let [sector_size, sectors_per_track, tracks] = size;
    Ok(DiskGeometry {
        sector_size,
        sectors_per_track,
        tracks,
    })
}
