//! 基于 `event_listener` 的计数信号量
//!
//! 驱动的空闲等待、启动握手、终端逐字符发送的完成通知都靠它。
//! 每次 `signal` 恰好放行一个 `acquire`。

use core::sync::atomic::{AtomicUsize, Ordering};

use event_listener::{listener, Event, IntoNotification};

pub struct Semaphore {
    permits: AtomicUsize,
    signals: Event,
}

impl Semaphore {
    #[inline(always)]
    pub const fn new(permits: usize) -> Self {
        Self {
            permits: AtomicUsize::new(permits),
            signals: Event::new(),
        }
    }

    /// 当前剩余的许可数。与 `SpinMutex::is_locked` 一样只能当作参考
    #[inline(always)]
    pub fn permits(&self) -> usize {
        self.permits.load(Ordering::Acquire)
    }

    /// 归还一个许可，并唤醒一个尚未被通知过的等待者
    pub fn signal(&self) {
        self.permits.fetch_add(1, Ordering::AcqRel);
        self.signals.notify(1.additional());
    }

    /// 不阻塞地拿走一个许可
    pub fn try_acquire(&self) -> bool {
        self.permits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |permits| {
                permits.checked_sub(1)
            })
            .is_ok()
    }

    pub async fn acquire(&self) {
        if self.try_acquire() {
            return;
        }
        self.acquire_slow().await;
    }

    #[cold]
    async fn acquire_slow(&self) {
        loop {
            listener!(self.signals => listener);
            // 建立监听期间可能已经有人 signal 了
            if self.try_acquire() {
                return;
            }
            listener.await;
            if self.try_acquire() {
                return;
            }
        }
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new(0)
    }
}
