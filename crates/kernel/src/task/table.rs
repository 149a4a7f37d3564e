use alloc::{boxed::Box, vec::Vec};
use core::sync::atomic::{AtomicU32, Ordering};

use defines::{
    config::MAX_TASKS,
    error::{errno, KResult},
};
use idallocator::RecycleAllocator;
use klocks::{Gate, SpinMutex};

use super::{Reply, TaskId};

/// 每个任务槽一个私有信箱。下标就是 [`TaskId::slot`]
struct TaskSlot {
    generation: AtomicU32,
    gate: Gate<Reply>,
}

pub struct TaskTable {
    ids: SpinMutex<RecycleAllocator>,
    slots: Box<[TaskSlot]>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::with_capacity(MAX_TASKS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let slots: Vec<TaskSlot> = (0..capacity)
            .map(|_| TaskSlot {
                generation: AtomicU32::new(0),
                gate: Gate::new(),
            })
            .collect();
        Self {
            ids: SpinMutex::new(RecycleAllocator::new(capacity)),
            slots: slots.into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn live_tasks(&self) -> usize {
        self.ids.lock().in_use()
    }

    /// 分配一个任务槽。槽位用尽时返回 `EAGAIN`
    pub fn admit(&self) -> KResult<TaskId> {
        let slot = self.ids.lock().alloc().ok_or(errno::EAGAIN)?;
        let entry = &self.slots[slot];
        if let Some(stale) = entry.gate.reset() {
            warn!("slot {slot} still held a reply {stale:?} on admission");
        }
        Ok(TaskId {
            slot,
            generation: entry.generation.load(Ordering::Acquire),
        })
    }

    /// 释放任务槽。之后所有投递给这个 id 的回复都会被丢弃
    pub fn release(&self, id: TaskId) {
        if !self.is_live(id) {
            warn!("release of stale task {id}");
            return;
        }
        let entry = &self.slots[id.slot];
        entry.generation.fetch_add(1, Ordering::AcqRel);
        entry.gate.reset();
        self.ids.lock().dealloc(id.slot);
    }

    pub fn is_live(&self, id: TaskId) -> bool {
        self.slots
            .get(id.slot)
            .is_some_and(|entry| entry.generation.load(Ordering::Acquire) == id.generation)
    }

    /// 唤醒阻塞在自己信箱上的任务。目标已经不存在时返回 `false`，回复被丢弃
    pub fn post(&self, id: TaskId, reply: Reply) -> bool {
        if !self.is_live(id) {
            debug!("discard {reply:?} for stale task {id}");
            return false;
        }
        if let Some(old) = self.slots[id.slot].gate.post(reply) {
            // 每个任务同时至多一个未完成的请求
            panic!("task {id} got a second reply while {old:?} was unclaimed");
        }
        true
    }

    /// 阻塞直到有人调用 `post`
    pub async fn wait(&self, id: TaskId) -> Reply {
        self.slots[id.slot].gate.wait().await
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}
