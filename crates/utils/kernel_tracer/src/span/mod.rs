pub mod instrument;

pub mod loggable;

use core::{fmt::Write, marker::PhantomData, num::NonZeroU32};

use compact_str::CompactString;

use crate::{Level, KERNEL_TRACER};

use self::loggable::Loggable;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpanId(NonZeroU32);

impl SpanId {
    pub fn from_non_zero_u32(id: NonZeroU32) -> Self {
        Self(id)
    }

    pub fn to_u32(&self) -> u32 {
        self.0.get()
    }

    pub fn as_slab_index(&self) -> usize {
        self.0.get() as usize - 1
    }
}

pub struct Span {
    id: Option<SpanId>,
}

impl Span {
    /// 创建一个新的 span。但只是将其注册，而没有实际实际启用。
    ///
    /// 调用 `entered()` 以进入该 span。没有注册 tracer 时得到的是一个空 span
    pub fn new<'a>(
        level: Level,
        name: &'static str,
        kvs: Option<&'a [(&'static str, &'a dyn Loggable)]>,
    ) -> Self {
        let Some(tracer) = KERNEL_TRACER.get() else {
            return Self::disabled();
        };
        let kvs = kvs.map(|kvs| {
            let mut kvs_str = CompactString::new("");
            for (i, (key, value)) in kvs.iter().enumerate() {
                if i > 0 {
                    kvs_str.push(' ');
                }
                let _ = write!(kvs_str, "{key}=");
                value.log(&mut kvs_str);
            }
            kvs_str
        });

        let id = tracer.new_span(SpanAttr { name, level, kvs });
        Span { id: Some(id) }
    }

    pub fn disabled() -> Self {
        Self { id: None }
    }

    pub(crate) fn enter(&self) -> RefEnterGuard<'_> {
        if let (Some(id), Some(tracer)) = (&self.id, KERNEL_TRACER.get()) {
            tracer.enter(id);
        }
        RefEnterGuard {
            span: self,
            _not_send: PhantomData,
        }
    }

    pub fn entered(self) -> OwnedEnterGuard {
        if let (Some(id), Some(tracer)) = (&self.id, KERNEL_TRACER.get()) {
            tracer.enter(id);
        }
        OwnedEnterGuard {
            span: self,
            _not_send: PhantomData,
        }
    }
}

impl Drop for Span {
    #[inline]
    fn drop(&mut self) {
        if let (Some(id), Some(tracer)) = (self.id.take(), KERNEL_TRACER.get()) {
            tracer.drop_span(id);
        }
    }
}

#[must_use = "once a span has been entered, it should be exited"]
pub struct RefEnterGuard<'a> {
    span: &'a Span,
    _not_send: PhantomData<*const ()>,
}

impl Drop for RefEnterGuard<'_> {
    fn drop(&mut self) {
        if let (Some(id), Some(tracer)) = (&self.span.id, KERNEL_TRACER.get()) {
            tracer.exit(id);
        }
    }
}

#[must_use = "once a span has been entered, it should be exited"]
pub struct OwnedEnterGuard {
    span: Span,
    _not_send: PhantomData<*const ()>,
}

impl Drop for OwnedEnterGuard {
    fn drop(&mut self) {
        if let (Some(id), Some(tracer)) = (&self.span.id, KERNEL_TRACER.get()) {
            tracer.exit(id);
        }
    }
}

pub struct SpanAttr {
    name: &'static str,
    level: Level,
    kvs: Option<CompactString>,
}

impl SpanAttr {
    pub fn new(level: Level, name: &'static str, kvs: Option<&str>) -> Self {
        Self {
            name,
            level,
            kvs: kvs.map(CompactString::from),
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kvs(&self) -> Option<&str> {
        self.kvs.as_deref()
    }
}
