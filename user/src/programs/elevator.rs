//! 一批子任务同时读随机位置的扇区，打印出的顺序就是磁盘调度的顺序

use alloc::{vec, vec::Vec};

use fastrand::Rng;
use hal::DeviceBus;
use kernel::{Kernel, UserCtx};

use crate::{disk_read, disk_size};

pub(super) const READERS: usize = 8;
const SEED: u64 = 0x5eed;
const UNIT: usize = 0;

pub async fn main<H: DeviceBus>(ctx: UserCtx<H>) -> i32 {
    let Ok(geometry) = disk_size(&ctx, UNIT).await else {
        return -1;
    };
    let mut rng = Rng::with_seed(SEED);
    let mut readers = Vec::with_capacity(READERS);
    for _ in 0..READERS {
        let track = rng.usize(..geometry.tracks);
        let sector = rng.usize(..geometry.sectors_per_track);
        let sector_size = geometry.sector_size;
        let reader = Kernel::spawn_user(ctx.kernel(), "reader", move |ctx| async move {
            let mut buf = vec![0; sector_size];
            let status = disk_read(&ctx, UNIT, track, sector, 1, &mut buf).await?;
            println!(&ctx, "read ({track}, {sector}): {status:?}").await
        });
        match reader {
            Ok(reader) => readers.push(reader),
            Err(_) => return -1,
        }
    }

    for reader in readers {
        if reader.await.is_err() {
            return 1;
        }
    }
    match println!(&ctx, "elevator done").await {
        Ok(()) => 0,
        Err(_) => -1,
    }
}
