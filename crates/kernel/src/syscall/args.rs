use core::fmt;

use defines::error::{errno, KResult};

/// 一次系统调用的参数记录。`buf` 是调用者的数据缓冲区，其余参数按调用号解释
pub struct SysArgs<'a> {
    pub number: usize,
    pub buf: &'a mut [u8],
    pub arg1: isize,
    pub arg2: isize,
    pub arg3: isize,
    pub arg4: isize,
    pub arg5: isize,
}

impl<'a> SysArgs<'a> {
    pub fn new(number: usize, buf: &'a mut [u8]) -> Self {
        Self {
            number,
            buf,
            arg1: 0,
            arg2: 0,
            arg3: 0,
            arg4: 0,
            arg5: 0,
        }
    }

    /// 没有数据缓冲区的调用用这个
    pub fn bare(number: usize) -> SysArgs<'static> {
        SysArgs::new(number, &mut [])
    }
}

impl fmt::Debug for SysArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[buf: {}B, {}, {}, {}, {}, {}]",
            self.buf.len(),
            self.arg1,
            self.arg2,
            self.arg3,
            self.arg4,
            self.arg5
        )
    }
}

/// 负数一律视为非法参数
pub(crate) fn arg_usize(arg: isize) -> KResult<usize> {
    usize::try_from(arg).ok().ok_or(errno::EINVAL)
}
