//! `kernel_tracer` 的具体实现：span 存在 slab 里，日志连同 span 栈一起写到控制台

use alloc::{string::String, vec::Vec};
use core::{fmt::Write, num::NonZeroU32};

use anstyle::{AnsiColor, Reset, Style};
use kernel_tracer::{Level, Record, SpanAttr, SpanId, Tracer};
use klocks::{Once, SpinMutex};
use slab::Slab;

/// 日志的最终去处。每次调用写入完整的一行（不含换行符）
pub trait Console: Sync {
    fn write_line(&self, line: &str);
}

static KERNEL_TRACER_IMPL: Once<KernelTracerImpl> = Once::new();

/// 注册全局的 tracer。只有第一次调用生效
pub fn init(console: &'static dyn Console, colored: bool) {
    let tracer = KERNEL_TRACER_IMPL.call_once(|| KernelTracerImpl::new(console, colored));
    kernel_tracer::init(tracer);
}

struct KernelTracerImpl {
    slab: SpinMutex<Slab<SpanAttr>>,
    // 执行器是单队列协作式的，poll 之间不会交错，一个栈就够了
    span_stack: SpinMutex<Vec<SpanId>>,
    console: &'static dyn Console,
    colored: bool,
}

impl KernelTracerImpl {
    fn new(console: &'static dyn Console, colored: bool) -> Self {
        Self {
            slab: SpinMutex::new(Slab::with_capacity(64)),
            span_stack: SpinMutex::new(Vec::with_capacity(8)),
            console,
            colored,
        }
    }

    fn write_log(&self, writer: &mut impl Write, record: &Record<'_>) -> core::fmt::Result {
        // 开头部分，即日志级别，如 `[ INFO]`
        if self.colored {
            let color = match record.level() {
                Level::Error => AnsiColor::Red,
                Level::Warn => AnsiColor::BrightYellow,
                Level::Info => AnsiColor::Blue,
                Level::Debug => AnsiColor::Green,
                Level::Trace => AnsiColor::BrightBlack,
            };
            write!(
                writer,
                "{}[{:>5}]{}",
                color.render_fg(),
                record.level(),
                Reset.render()
            )?;
        } else {
            write!(writer, "[{:>5}]", record.level())?;
        }

        // Span 栈部分
        let mut has_span = false;
        {
            let slab = self.slab.lock();
            let stack = self.span_stack.lock();

            const SPAN_NAME_COLOR: Style = AnsiColor::White.on_default().bold();

            for id in stack.iter() {
                let Some(span_attr) = slab.get(id.as_slab_index()) else {
                    continue;
                };
                has_span = true;
                if self.colored {
                    write!(
                        writer,
                        "-{}{}{}",
                        SPAN_NAME_COLOR.render(),
                        span_attr.name(),
                        Reset.render()
                    )?;
                } else {
                    write!(writer, "-{}", span_attr.name())?;
                }
                if let Some(kvs) = span_attr.kvs() {
                    write!(writer, "{{{kvs}}}")?;
                }
            }
        }
        if has_span {
            write!(writer, ": ")?;
        } else {
            write!(writer, " ")?;
        }

        // 日志信息部分
        write!(writer, "{}", record.args())
    }
}

impl Tracer for KernelTracerImpl {
    fn log_to_console(&self, record: &Record<'_>) {
        let mut line = String::new();
        if self.write_log(&mut line, record).is_ok() {
            self.console.write_line(&line);
        }
    }

    fn new_span(&self, span_attr: SpanAttr) -> SpanId {
        let index = self.slab.lock().insert(span_attr);
        SpanId::from_non_zero_u32(NonZeroU32::MIN.saturating_add(index as u32))
    }

    fn enter(&self, span_id: &SpanId) {
        self.span_stack.lock().push(span_id.clone());
    }

    fn exit(&self, span_id: &SpanId) {
        let _span_id = self.span_stack.lock().pop();
        // 维持一个栈结构，因此退出的 id 应当与进入的 id 保持一致
        debug_assert_eq!(_span_id.as_ref(), Some(span_id));
    }

    fn drop_span(&self, span_id: SpanId) {
        self.slab.lock().try_remove(span_id.as_slab_index());
    }
}
