//! 单槽的“私有信箱”。每个任务有且只有一个，用来阻塞自己、等别人把结果投递进来

use event_listener::{listener, Event};

use crate::SpinMutex;

pub struct Gate<T> {
    slot: SpinMutex<Option<T>>,
    posted: Event,
}

impl<T> Gate<T> {
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            slot: SpinMutex::new(None),
            posted: Event::new(),
        }
    }

    /// 投递一个值并唤醒等待者。返回被覆盖掉的旧值（正常情况下应当是 `None`）
    pub fn post(&self, value: T) -> Option<T> {
        let old = self.slot.lock().replace(value);
        self.posted.notify(1);
        old
    }

    /// 清空信箱，返回残留的值。任务槽被复用前要调用
    pub fn reset(&self) -> Option<T> {
        self.slot.lock().take()
    }

    pub fn try_take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    pub async fn wait(&self) -> T {
        loop {
            if let Some(value) = self.try_take() {
                return value;
            }
            listener!(self.posted => listener);
            if let Some(value) = self.try_take() {
                return value;
            }
            listener.await;
        }
    }
}

impl<T> Default for Gate<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Gate;

    #[test]
    fn post_before_wait() {
        let gate = Gate::new();
        assert_eq!(gate.post(7), None);
        assert_eq!(smol::block_on(gate.wait()), 7);
        assert_eq!(gate.try_take(), None);
    }

    #[test]
    fn wait_then_post() {
        let gate = Arc::new(Gate::new());
        let ex = smol::LocalExecutor::new();
        let waiter = {
            let gate = Arc::clone(&gate);
            ex.spawn(async move { gate.wait().await })
        };
        while ex.try_tick() {}
        assert!(!waiter.is_finished());

        gate.post("done");
        while ex.try_tick() {}
        assert_eq!(smol::block_on(waiter), "done");
    }

    #[test]
    fn reset_discards_stale_value() {
        let gate = Gate::new();
        gate.post(1);
        assert_eq!(gate.reset(), Some(1));
        assert_eq!(gate.try_take(), None);
    }
}
