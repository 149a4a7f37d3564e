use std::sync::atomic::{AtomicU32, Ordering};

use crate::line::InterruptLine;

/// 手动推进的时钟。每次 `tick` 时间前进固定步长并产生一次中断，中断状态就是当前时间（微秒）
pub struct SimClock {
    now_us: AtomicU32,
    step_us: u32,
    pub(crate) line: InterruptLine<u32>,
}

impl SimClock {
    pub(crate) fn new(start_us: u32, step_us: u32) -> Self {
        Self {
            now_us: AtomicU32::new(start_us),
            step_us,
            line: InterruptLine::new(),
        }
    }

    pub fn now_us(&self) -> u32 {
        self.now_us.load(Ordering::Acquire)
    }

    pub fn step_us(&self) -> u32 {
        self.step_us
    }

    /// 时间前进一步，返回新的时间。计数器按 32 位回绕
    pub fn tick(&self) -> u32 {
        let now = self
            .now_us
            .fetch_add(self.step_us, Ordering::AcqRel)
            .wrapping_add(self.step_us);
        self.line.raise(now);
        now
    }
}
