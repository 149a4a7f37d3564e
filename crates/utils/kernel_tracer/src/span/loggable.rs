use alloc::{string::String, vec::Vec};
use core::fmt::{Display, Write};

use compact_str::CompactString;

/// 可用于 span 宏键值对中值的类型
pub trait Loggable {
    fn log(&self, writer: &mut CompactString);
}

// 不直接 impl<T: Display> Loggable for T，否则没法再给上游类型单独实现
trait PlainDisplay: Display {}

macro_rules! plain_display_impl {
    ($($t:tt)*) => ($(
        impl PlainDisplay for $t {}
    )*);
}

plain_display_impl!(u8 u16 u32 u64 usize i8 i16 i32 i64 isize bool str char String CompactString);

impl<T: PlainDisplay + ?Sized> PlainDisplay for &T {}

impl<T: PlainDisplay + ?Sized> Loggable for T {
    fn log(&self, writer: &mut CompactString) {
        let _ = write!(writer, "{self}");
    }
}

impl<T: PlainDisplay> Loggable for [T] {
    fn log(&self, writer: &mut CompactString) {
        writer.push('[');
        for (i, t) in self.iter().enumerate() {
            if i > 0 {
                writer.push_str(", ");
            }
            let _ = write!(writer, "{t}");
        }
        writer.push(']');
    }
}

impl<T: PlainDisplay> Loggable for Vec<T> {
    fn log(&self, writer: &mut CompactString) {
        self.as_slice().log(writer);
    }
}
