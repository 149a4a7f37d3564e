use std::{
    collections::VecDeque,
    future::Future,
    pin::Pin,
    task::{Context, Poll, Waker},
};

use klocks::SpinMutex;

/// 一根中断线：设备把中断事件排队，驱动一次取走一个
pub(crate) struct InterruptLine<E> {
    inner: SpinMutex<LineState<E>>,
}

struct LineState<E> {
    pending: VecDeque<E>,
    waker: Option<Waker>,
    /// 扣住的中断先排队，不投递
    held: bool,
}

impl<E> InterruptLine<E> {
    pub(crate) fn new() -> Self {
        Self {
            inner: SpinMutex::new(LineState {
                pending: VecDeque::new(),
                waker: None,
                held: false,
            }),
        }
    }

    pub(crate) fn raise(&self, event: E) {
        let waker = {
            let mut state = self.inner.lock();
            state.pending.push_back(event);
            if state.held {
                None
            } else {
                state.waker.take()
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    pub(crate) fn set_held(&self, held: bool) {
        let waker = {
            let mut state = self.inner.lock();
            state.held = held;
            if held || state.pending.is_empty() {
                None
            } else {
                state.waker.take()
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub(crate) fn next(&self) -> NextInterrupt<'_, E> {
        NextInterrupt { line: self }
    }
}

pub(crate) struct NextInterrupt<'a, E> {
    line: &'a InterruptLine<E>,
}

impl<E> Future for NextInterrupt<'_, E> {
    type Output = E;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<E> {
        let mut state = self.line.inner.lock();
        let next = if state.held {
            None
        } else {
            state.pending.pop_front()
        };
        match next {
            Some(event) => Poll::Ready(event),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
