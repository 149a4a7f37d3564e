//! 系统调用的参数搬运
//!
//! 用户侧把参数放进 [`SysArgs`]，这里解析出有类型的参数调用各个入口，再把结果写回。
//! 成功时 `arg4 = 0`，任何错误都表现为 `arg4 = -1`。

mod args;

use defines::{
    error::{errno, KResult},
    syscall::*,
};
use hal::DeviceBus;

pub use self::args::SysArgs;
use self::args::arg_usize;
use crate::{task::UserCtx, DiskOp, Kernel, TaskId};

impl<H: DeviceBus> UserCtx<H> {
    pub async fn syscall(&self, args: &mut SysArgs<'_>) {
        syscall(self.kernel(), self.id(), args).await;
    }
}

pub async fn syscall<H: DeviceBus>(kernel: &Kernel<H>, task: TaskId, args: &mut SysArgs<'_>) {
    let id = args.number;
    // 睡眠和终端读写太频繁，降低日志等级
    let is_trace = [SLEEP, TERMREAD, TERMWRITE].contains(&id);
    match syscall_impl(kernel, task, args).await {
        Ok(()) => {
            args.arg4 = 0;
            if is_trace {
                trace!("{} by {task}: {args:?}", name(id));
            } else {
                debug!("{} by {task}: {args:?}", name(id));
            }
        }
        Err(err) => {
            args.arg4 = -1;
            warn!("{} by {task}: {args:?}, {err}", name(id));
        }
    }
}

async fn syscall_impl<H: DeviceBus>(
    kernel: &Kernel<H>,
    task: TaskId,
    args: &mut SysArgs<'_>,
) -> KResult<()> {
    match args.number {
        TERMREAD => sys_term_read(kernel, args).await,
        TERMWRITE => sys_term_write(kernel, task, args).await,
        SLEEP => kernel.sleep(task, args.arg1 as i64).await,
        DISKREAD => sys_disk_io(kernel, task, DiskOp::Read, args).await,
        DISKWRITE => sys_disk_io(kernel, task, DiskOp::Write, args).await,
        DISKSIZE => sys_disk_size(kernel, args),
        _ => Err(errno::ENOSYS),
    }
}

async fn sys_term_read<H: DeviceBus>(kernel: &Kernel<H>, args: &mut SysArgs<'_>) -> KResult<()> {
    let size = arg_usize(args.arg2)?;
    let unit = arg_usize(args.arg3)?;
    if size == 0 || size > args.buf.len() {
        return Err(errno::EINVAL);
    }
    let read = kernel.term_read(unit, &mut args.buf[..size]).await?;
    args.arg2 = read as isize;
    Ok(())
}

async fn sys_term_write<H: DeviceBus>(
    kernel: &Kernel<H>,
    task: TaskId,
    args: &mut SysArgs<'_>,
) -> KResult<()> {
    let size = arg_usize(args.arg2)?;
    let unit = arg_usize(args.arg3)?;
    if size > args.buf.len() {
        return Err(errno::EINVAL);
    }
    let written = kernel.term_write(task, unit, &args.buf[..size]).await?;
    args.arg2 = written as isize;
    Ok(())
}

async fn sys_disk_io<H: DeviceBus>(
    kernel: &Kernel<H>,
    task: TaskId,
    op: DiskOp,
    args: &mut SysArgs<'_>,
) -> KResult<()> {
    let sectors = arg_usize(args.arg2)?;
    let track = arg_usize(args.arg3)?;
    let first = arg_usize(args.arg4)?;
    let unit = arg_usize(args.arg5)?;
    let status = match op {
        DiskOp::Read => {
            kernel
                .disk_read(task, unit, track, first, sectors, args.buf)
                .await?
        }
        DiskOp::Write => {
            kernel
                .disk_write(task, unit, track, first, sectors, args.buf)
                .await?
        }
    };
    args.arg1 = status.raw() as isize;
    Ok(())
}

fn sys_disk_size<H: DeviceBus>(kernel: &Kernel<H>, args: &mut SysArgs<'_>) -> KResult<()> {
    let geometry = kernel.disk_size(arg_usize(args.arg1)?)?;
    args.arg1 = geometry.sector_size as isize;
    args.arg2 = geometry.sectors_per_track as isize;
    args.arg3 = geometry.tracks as isize;
    Ok(())
}
