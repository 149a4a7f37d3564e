//! 跨磁道写入一段花样再读回来比对

use alloc::{vec, vec::Vec};

use hal::DeviceBus;
use kernel::UserCtx;

use crate::{disk_read, disk_size, disk_write, SysResult};

const UNIT: usize = 0;

pub async fn main<H: DeviceBus>(ctx: UserCtx<H>) -> i32 {
    match check(&ctx).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => -1,
    }
}

async fn check<H: DeviceBus>(ctx: &UserCtx<H>) -> SysResult<bool> {
    let geometry = disk_size(ctx, UNIT).await?;
    // 最后一个扇区加下一个磁道的第一个扇区
    let (track, first) = (0, geometry.sectors_per_track - 1);
    let pattern: Vec<u8> = (0..2 * geometry.sector_size).map(|i| (i % 251) as u8).collect();

    let status = disk_write(ctx, UNIT, track, first, 2, &pattern).await?;
    if status.is_error() {
        println!(ctx, "disk {UNIT}: write failed, {status:?}").await?;
        return Ok(false);
    }
    let mut back = vec![0; pattern.len()];
    let status = disk_read(ctx, UNIT, track, first, 2, &mut back).await?;
    if status.is_error() || back != pattern {
        println!(ctx, "disk {UNIT}: read back failed, {status:?}").await?;
        return Ok(false);
    }

    println!(
        ctx,
        "disk {UNIT}: {}B x {} x {}, check ok",
        geometry.sector_size,
        geometry.sectors_per_track,
        geometry.tracks
    )
    .await?;
    Ok(true)
}
