//! 往终端打印格式化文本
//!
//! 终端一次最多写 `MAXLINE` 个字符，长文本按行切开，过长的行再按 `MAXLINE` 切开。

use alloc::string::String;

use defines::config::MAXLINE;
use hal::DeviceBus;
use kernel::UserCtx;

use crate::{term_write, SysResult};

pub const STDIN: usize = 0;
pub const STDOUT: usize = 0;

#[doc(hidden)]
pub use alloc::format;

pub async fn write_text<H: DeviceBus>(ctx: &UserCtx<H>, unit: usize, text: String) -> SysResult<()> {
    for line in text.as_bytes().split_inclusive(|&ch| ch == b'\n') {
        for chunk in line.chunks(MAXLINE) {
            term_write(ctx, unit, chunk).await?;
        }
    }
    Ok(())
}

/// 格式化后写到指定终端，返回一个 future
#[macro_export]
macro_rules! print_to {
    ($ctx:expr, $unit:expr, $($arg:tt)*) => {
        $crate::console::write_text($ctx, $unit, $crate::console::format!($($arg)*))
    };
}

#[macro_export]
macro_rules! println {
    ($ctx:expr) => {
        $crate::print_to!($ctx, $crate::console::STDOUT, "\n")
    };
    ($ctx:expr, $($arg:tt)*) => {
        $crate::print_to!($ctx, $crate::console::STDOUT, "{}\n", format_args!($($arg)*))
    };
}
