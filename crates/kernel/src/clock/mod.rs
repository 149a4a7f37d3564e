//! 时钟驱动与睡眠
//!
//! 时钟驱动每次中断扫描一遍睡眠队列。条目在第一次被扫描到时记录起点，
//! 此后累计经过的微秒数，够了就出队并唤醒对应任务。

mod sleep_queue;

use common::constant::MICRO_PER_SEC;
use defines::error::{errno, KResult};
use hal::{DeviceBus, DeviceClass};
use klocks::SpinMutex;
use triomphe::Arc;

use self::sleep_queue::SleepQueue;
use crate::{
    task::{Reply, TaskId},
    Kernel,
};

pub(crate) struct Clock {
    /// 只有时钟驱动和 `sleep` 会修改，且都不跨挂起点。锁只是为了 `Sync`
    sleepers: SpinMutex<SleepQueue>,
}

impl Clock {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            sleepers: SpinMutex::new(SleepQueue::new(capacity)),
        }
    }

    pub(crate) fn sleepers(&self) -> usize {
        self.sleepers.lock().len()
    }
}

impl<H: DeviceBus> Kernel<H> {
    /// 阻塞 `task` 至少 `seconds` 秒。
    ///
    /// 以睡眠开始后的第一次时钟中断为起点计时，经过的时间达到要求后的第一次中断时醒来
    pub async fn sleep(&self, task: TaskId, seconds: i64) -> KResult<()> {
        let Ok(seconds) = u64::try_from(seconds) else {
            return Err(errno::EINVAL);
        };
        if !self.tasks.is_live(task) {
            return Err(errno::ESRCH);
        }
        let duration_us = seconds.saturating_mul(MICRO_PER_SEC);
        self.clock.sleepers.lock().push(task, duration_us);
        trace!("task {task} sleeps for {seconds}s");

        // 被强行终止时把自己从队列里摘掉
        let asleep = scopeguard::guard((), |()| {
            if self.clock.sleepers.lock().remove(task) {
                debug!("task {task} left the sleep queue early");
            }
        });
        let reply = self.tasks.wait(task).await;
        scopeguard::ScopeGuard::into_inner(asleep);
        match reply {
            Reply::Woken => Ok(()),
            other => panic!("sleeping task {task} got {other:?}"),
        }
    }
}

pub(crate) async fn clock_driver<H: DeviceBus>(kernel: Arc<Kernel<H>>) -> KResult<()> {
    kernel.running.signal();
    info!("clock driver running");
    loop {
        let status = kernel.bus.wait_device(DeviceClass::Clock, 0).await?;
        let woken = kernel
            .clock
            .sleepers
            .lock()
            .expire(status.raw(), |task| kernel.tasks.is_live(task));
        for task in woken {
            trace!("wake task {task}");
            kernel.tasks.post(task, Reply::Woken);
        }
    }
}
