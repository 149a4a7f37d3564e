//! 内核日志与 span 的门面
//!
//! 本 crate 只负责宏、等级过滤和 span 的生命周期；具体怎么输出、span 存在哪里由
//! 实现了 [`Tracer`] 的一方在启动时通过 [`init`] 注册。未注册时日志直接丢弃。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
mod macros;
mod level;
mod record;
mod span;

pub use level::{max_level, set_max_level, Level, LevelFilter, CLOG};
pub use record::Record;
pub use span::{instrument::Instrument, loggable::Loggable, Span, SpanAttr, SpanId};

use spin::Once;

pub trait Tracer: Sync {
    fn log_to_console(&self, record: &Record<'_>);
    fn new_span(&self, span_attr: SpanAttr) -> SpanId;
    fn enter(&self, span_id: &SpanId);
    fn exit(&self, span_id: &SpanId);
    fn drop_span(&self, span_id: SpanId);
}

pub static KERNEL_TRACER: Once<&'static dyn Tracer> = Once::new();

/// 注册全局的 tracer。只有第一次调用生效
pub fn init(tracer: &'static dyn Tracer) {
    KERNEL_TRACER.call_once(|| tracer);
}

#[inline]
#[doc(hidden)]
pub fn log_impl(level: Level, args: core::fmt::Arguments<'_>) {
    if level > max_level() {
        return;
    }
    if let Some(tracer) = KERNEL_TRACER.get() {
        tracer.log_to_console(&Record::new(level, args));
    }
}
