//! 任务表与用户任务
//!
//! 每个用户任务在任务表中占一个槽，槽里是它的私有信箱 ([`klocks::Gate`])。
//! 驱动完成请求后把 [`Reply`] 投递到请求者的信箱，请求者从信箱醒来。

mod table;

use alloc::vec::Vec;
use core::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use async_task::Task;
use defines::error::KResult;
use hal::{DeviceBus, DeviceStatus};
use kernel_tracer::Instrument;
use triomphe::Arc;

pub use self::table::TaskTable;
use crate::Kernel;

/// 任务句柄：槽位下标加上代数。槽位被回收复用后，旧句柄的代数就对不上了
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    slot: usize,
    generation: u32,
}

impl TaskId {
    pub fn slot(self) -> usize {
        self.slot
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.slot, self.generation)
    }
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({self})")
    }
}

/// 驱动投递给请求者的结果
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    /// 睡眠结束
    Woken,
    /// 磁盘请求完成。读请求的数据在 `data` 里
    Disk { status: DeviceStatus, data: Vec<u8> },
    /// 终端一行写完
    Written(KResult<usize>),
}

/// 用户任务拿到的上下文：自己的句柄，以及发起系统调用的入口
pub struct UserCtx<H: DeviceBus> {
    kernel: Arc<Kernel<H>>,
    id: TaskId,
}

impl<H: DeviceBus> UserCtx<H> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kernel(&self) -> &Arc<Kernel<H>> {
        &self.kernel
    }
}

/// 用户任务的句柄。可以 `.await` 拿到结果，也可以 `zap` 强行终止
pub struct UserTask<T> {
    id: TaskId,
    task: Task<T>,
}

impl<T> UserTask<T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// 强行终止。任务挂在睡眠队列或磁盘队列里的请求会被一并摘除。
    ///
    /// 任务已经结束时返回它的结果
    pub async fn zap(self) -> Option<T> {
        self.task.cancel().await
    }
}

impl<T> Future for UserTask<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        Pin::new(&mut self.task).poll(cx)
    }
}

impl<H: DeviceBus> Kernel<H> {
    /// 创建一个用户任务。任务结束（或被终止）时槽位自动归还
    pub fn spawn_user<F, Fut>(kernel: &Arc<Self>, name: &'static str, main: F) -> KResult<UserTask<Fut::Output>>
    where
        F: FnOnce(UserCtx<H>) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let id = kernel.tasks.admit()?;
        let ctx = UserCtx {
            kernel: Arc::clone(kernel),
            id,
        };
        let user = main(ctx);
        let owner = Arc::clone(kernel);
        let span = info_span!("user", name = name, task = id.slot());
        let task = kernel.executor.spawn(
            async move {
                let _slot = scopeguard::guard(owner, |owner| owner.tasks.release(id));
                user.await
            }
            .instrument(span),
        );
        debug!("spawn user task {name} as {id}");
        Ok(UserTask { id, task })
    }
}
