//! 父任务拉起几个睡眠时长不同的子任务，子任务按醒来的先后打印

use alloc::vec::Vec;

use hal::DeviceBus;
use kernel::{Kernel, UserCtx};

use crate::sleep;

const NAPS: [isize; 3] = [3, 1, 2];

pub async fn main<H: DeviceBus>(ctx: UserCtx<H>) -> i32 {
    let mut children = Vec::with_capacity(NAPS.len());
    for (i, seconds) in NAPS.into_iter().enumerate() {
        let child = Kernel::spawn_user(ctx.kernel(), "sleeper", move |ctx| async move {
            sleep(&ctx, seconds).await?;
            println!(&ctx, "child {i} slept {seconds}s").await
        });
        match child {
            Ok(child) => children.push(child),
            Err(_) => return -1,
        }
    }

    let mut failed = 0;
    for child in children {
        if child.await.is_err() {
            failed += 1;
        }
    }
    if failed > 0 {
        return 1;
    }
    match println!(&ctx, "all {} children woke", NAPS.len()).await {
        Ok(()) => 0,
        Err(_) => -1,
    }
}
