use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use pin_project::pin_project;

use crate::span::Span;

/// 让 future 每次被 poll 时都处在某个 span 中。驱动任务靠它在日志里带上设备和单元号
pub trait Instrument: Future + Sized {
    fn instrument(self, span: Span) -> Instrumented<Self> {
        Instrumented { inner: self, span }
    }
}

impl<T: Future> Instrument for T {}

#[must_use = "futures do nothing unless you `.await` or poll them"]
#[pin_project]
pub struct Instrumented<F: Future + Sized> {
    #[pin]
    inner: F,
    span: Span,
}

impl<T: Future> Future for Instrumented<T> {
    type Output = T::Output;

    #[inline]
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let project = self.project();
        let _enter = project.span.enter();
        project.inner.poll(cx)
    }
}
