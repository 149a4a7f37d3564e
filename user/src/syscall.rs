//! 原始的系统调用封装。返回值沿用系统调用表的约定，出错一律是 -1

use defines::syscall::*;
use hal::DeviceBus;
use kernel::{syscall::SysArgs, UserCtx};

async fn syscall<H: DeviceBus>(ctx: &UserCtx<H>, args: &mut SysArgs<'_>) -> isize {
    ctx.syscall(args).await;
    args.arg4
}

pub async fn sys_term_read<H: DeviceBus>(ctx: &UserCtx<H>, buf: &mut [u8], unit: usize) -> isize {
    let size = buf.len() as isize;
    let mut args = SysArgs::new(TERMREAD, buf);
    args.arg2 = size;
    args.arg3 = unit as isize;
    match syscall(ctx, &mut args).await {
        0 => args.arg2,
        err => err,
    }
}

pub async fn sys_term_write<H: DeviceBus>(ctx: &UserCtx<H>, buf: &[u8], unit: usize) -> isize {
    // 内核只读这块缓冲，但参数记录统一是可变的
    let mut line = buf.to_vec();
    let mut args = SysArgs::new(TERMWRITE, &mut line);
    args.arg2 = buf.len() as isize;
    args.arg3 = unit as isize;
    match syscall(ctx, &mut args).await {
        0 => args.arg2,
        err => err,
    }
}

pub async fn sys_sleep<H: DeviceBus>(ctx: &UserCtx<H>, seconds: isize) -> isize {
    let mut args = SysArgs::bare(SLEEP);
    args.arg1 = seconds;
    syscall(ctx, &mut args).await
}

/// 成功时返回设备状态字
pub async fn sys_disk_io<H: DeviceBus>(
    ctx: &UserCtx<H>,
    number: usize,
    buf: &mut [u8],
    [sectors, track, first, unit]: [usize; 4],
) -> isize {
    let mut args = SysArgs::new(number, buf);
    args.arg2 = sectors as isize;
    args.arg3 = track as isize;
    args.arg4 = first as isize;
    args.arg5 = unit as isize;
    match syscall(ctx, &mut args).await {
        0 => args.arg1,
        err => err,
    }
}

/// 依次写入扇区大小、每磁道扇区数、磁道数
pub async fn sys_disk_size<H: DeviceBus>(ctx: &UserCtx<H>, unit: usize, size: &mut [usize; 3]) -> isize {
    let mut args = SysArgs::bare(DISKSIZE);
    args.arg1 = unit as isize;
    let ret = syscall(ctx, &mut args).await;
    if ret == 0 {
        *size = [args.arg1, args.arg2, args.arg3].map(|arg| arg as usize);
    }
    ret
}
