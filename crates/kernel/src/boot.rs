//! 启动与收尾：拉起所有驱动，运行第一个用户任务，结束后终止驱动

use alloc::vec::Vec;
use core::future::Future;

use async_task::Task;
use defines::error::KResult;
use hal::DeviceBus;
use kernel_tracer::{Instrument, Span};
use triomphe::Arc;

use crate::{clock, disk, task::UserCtx, term, Kernel};

/// 正在运行的驱动任务。`zap` 之后它们全部被取消
pub struct Drivers {
    tasks: Vec<Task<KResult<()>>>,
}

impl Drivers {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// 终止所有驱动，并等待它们真正停下
    pub async fn zap(self) {
        for driver in self.tasks.into_iter().rev() {
            if let Some(Err(err)) = driver.cancel().await {
                warn!("driver had exited with {err}");
            }
        }
        info!("all drivers stopped");
    }
}

impl<H: DeviceBus> Kernel<H> {
    /// 依次拉起时钟、各磁盘、各终端的驱动。每拉起一个都等它报告就绪
    pub async fn start_drivers(kernel: &Arc<Self>) -> Drivers {
        let mut tasks = Vec::new();

        tasks.push(kernel.spawn_driver(clock::clock_driver(Arc::clone(kernel)), info_span!("clock")));
        kernel.running.acquire().await;

        for unit in 0..kernel.disks.len() {
            tasks.push(kernel.spawn_driver(
                disk::disk_driver(Arc::clone(kernel), unit),
                info_span!("disk", unit = unit),
            ));
            kernel.running.acquire().await;
        }

        for unit in 0..kernel.terms.len() {
            tasks.push(kernel.spawn_driver(
                term::term_driver(Arc::clone(kernel), unit),
                info_span!("term", unit = unit),
            ));
            kernel.running.acquire().await;
            tasks.push(kernel.spawn_driver(
                term::term_writer(Arc::clone(kernel), unit),
                info_span!("term_writer", unit = unit),
            ));
            kernel.running.acquire().await;
        }

        info!("{} drivers running", tasks.len());
        Drivers { tasks }
    }

    /// 启动内核：拉起驱动，以 `main` 作为第一个用户任务运行，它结束后终止所有驱动。
    ///
    /// 返回的任务在 `main` 结束、驱动全部停下后完成
    pub fn boot<F, Fut>(kernel: &Arc<Self>, main: F) -> Task<KResult<Fut::Output>>
    where
        F: FnOnce(UserCtx<H>) -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let booting = Arc::clone(kernel);
        kernel.executor.spawn(
            async move {
                let drivers = Kernel::start_drivers(&booting).await;
                let result = match Kernel::spawn_user(&booting, "main", main) {
                    Ok(user) => Ok(user.await),
                    Err(err) => {
                        error!("failed to spawn the first user task: {err}");
                        Err(err)
                    }
                };
                drivers.zap().await;
                result
            }
            .instrument(info_span!("boot")),
        )
    }

    fn spawn_driver<Fut>(&self, driver: Fut, span: Span) -> Task<KResult<()>>
    where
        Fut: Future<Output = KResult<()>> + Send + 'static,
    {
        self.executor.spawn(
            async move {
                let result = driver.await;
                if let Err(err) = &result {
                    error!("driver exited: {err}");
                }
                result
            }
            .instrument(span),
        )
    }
}
