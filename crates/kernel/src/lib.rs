//! 教学内核的设备驱动层：时钟、磁盘、终端
//!
//! 整个驱动层的状态都在一个 [`Kernel`] 里，由所有驱动任务和用户任务通过 `triomphe::Arc` 共享。
//! 硬件由实现了 [`hal::DeviceBus`] 的一方提供。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
extern crate kernel_tracer;

mod boot;
mod clock;
mod disk;
pub mod syscall;
pub mod task;
mod term;
pub mod tracer;

#[cfg(test)]
mod tests;

use alloc::boxed::Box;

use defines::config::{DISK_UNITS, MAX_TASKS, TERM_UNITS};
use executor::Executor;
use hal::DeviceBus;
use klocks::Semaphore;
use triomphe::Arc;

pub use self::{
    boot::Drivers,
    disk::DiskOp,
    task::{Reply, TaskId, TaskTable, UserCtx, UserTask},
};
use self::{clock::Clock, disk::DiskUnit, term::TermUnit};

pub struct Kernel<H: DeviceBus> {
    bus: H,
    executor: Executor,
    tasks: TaskTable,
    clock: Clock,
    disks: Box<[DiskUnit]>,
    terms: Box<[TermUnit]>,
    /// 驱动启动握手：每个驱动就绪后 `signal` 一次
    running: Semaphore,
}

impl<H: DeviceBus> Kernel<H> {
    pub fn new(bus: H) -> Arc<Self> {
        Self::with_units(bus, DISK_UNITS, TERM_UNITS)
    }

    pub fn with_units(bus: H, disk_units: usize, term_units: usize) -> Arc<Self> {
        Arc::new(Self {
            bus,
            executor: Executor::new(),
            tasks: TaskTable::with_capacity(MAX_TASKS),
            clock: Clock::new(MAX_TASKS),
            disks: (0..disk_units).map(|_| DiskUnit::new(MAX_TASKS)).collect(),
            terms: (0..term_units).map(|_| TermUnit::new()).collect(),
            running: Semaphore::new(0),
        })
    }

    pub fn bus(&self) -> &H {
        &self.bus
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn tasks(&self) -> &TaskTable {
        &self.tasks
    }

    pub fn disk_units(&self) -> usize {
        self.disks.len()
    }

    pub fn term_units(&self) -> usize {
        self.terms.len()
    }

    /// 运行所有就绪的任务直到没有任务可运行
    pub fn run_until_idle(&self) -> usize {
        self.executor.run_until_idle()
    }

    /// 睡眠队列中的任务数
    pub fn sleepers(&self) -> usize {
        self.clock.sleepers()
    }

    /// 某个磁盘单元排队中（尚未开始服务）的请求数
    pub fn disk_queued(&self, unit: usize) -> usize {
        self.disks.get(unit).map_or(0, DiskUnit::queued)
    }

    /// 某个终端单元预读缓冲中的完整行数
    pub fn term_lines(&self, unit: usize) -> usize {
        self.terms.get(unit).map_or(0, TermUnit::buffered_lines)
    }
}
