//! 单核、协作式的任务执行器
//!
//! 所有驱动任务、用户任务都挂在同一个 [`Executor`] 上。任务被唤醒时进入就绪队列，
//! [`Executor::run_until_idle`] 按 FIFO 顺序逐个 poll，直到没有就绪任务为止。
//! 什么时候“推进硬件时间”由调用者决定，这样整个内核在宿主机上也是确定性的。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod yield_now;

#[macro_use]
extern crate kernel_tracer;

use alloc::sync::Arc;
use core::future::Future;

use async_task::{Runnable, Task};
use defines::config::TASK_LIMIT;
use heapless::mpmc::MpMcQueue;

pub use self::yield_now::yield_now;

/// NOTE: 目前的实现中，并发的就绪任务量是有硬上限 (`TASK_LIMIT`) 的，超过会直接 panic
struct TaskQueue {
    queue: MpMcQueue<Runnable, TASK_LIMIT>,
}

impl TaskQueue {
    fn new() -> Self {
        Self {
            queue: MpMcQueue::new(),
        }
    }

    fn push_task(&self, runnable: Runnable) {
        if self.queue.enqueue(runnable).is_err() {
            panic!("Out of task limit");
        }
    }

    fn fetch_task(&self) -> Option<Runnable> {
        self.queue.dequeue()
    }
}

#[derive(Clone)]
pub struct Executor {
    ready: Arc<TaskQueue>,
}

impl Executor {
    pub fn new() -> Self {
        Self {
            ready: Arc::new(TaskQueue::new()),
        }
    }

    /// 创建任务并立即放入就绪队列。返回的 [`Task`] 被 drop 时任务会被取消
    pub fn spawn<F>(&self, future: F) -> Task<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (runnable, task) = self.spawn_raw(future);
        runnable.schedule();
        task
    }

    /// 只创建，不调度。调用者自己决定何时 `schedule`
    pub fn spawn_raw<F>(&self, future: F) -> (Runnable, Task<F::Output>)
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let ready = Arc::clone(&self.ready);
        async_task::spawn(future, move |runnable| {
            ready.push_task(runnable);
        })
    }

    /// 一直运行就绪任务，直到就绪队列为空。返回本次运行的任务数
    pub fn run_until_idle(&self) -> usize {
        let mut polled = 0;
        while let Some(task) = self.ready.fetch_task() {
            trace!("Schedule task");
            task.run();
            polled += 1;
        }
        polled
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{yield_now, Executor};

    #[test]
    fn spawned_tasks_run_in_fifo_order() {
        let ex = Executor::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let tasks: Vec<_> = (0..3)
            .map(|i| {
                let order = Arc::clone(&order);
                ex.spawn(async move {
                    order.lock().unwrap().push(i);
                    yield_now().await;
                    order.lock().unwrap().push(i + 10);
                })
            })
            .collect();
        ex.run_until_idle();
        assert_eq!(*order.lock().unwrap(), [0, 1, 2, 10, 11, 12]);
        assert!(tasks.iter().all(|task| task.is_finished()));
    }

    #[test]
    fn dropped_task_is_cancelled() {
        let ex = Executor::new();
        let hits = Arc::new(Mutex::new(0));
        let task = {
            let hits = Arc::clone(&hits);
            ex.spawn(async move {
                *hits.lock().unwrap() += 1;
            })
        };
        drop(task);
        assert_eq!(ex.run_until_idle(), 1);
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[test]
    fn output_is_available_after_idle() {
        let ex = Executor::new();
        let task = ex.spawn(async { 6 * 7 });
        ex.run_until_idle();
        assert_eq!(smol::block_on(task), 42);
    }
}
