//! 终端：预读缓冲与后写
//!
//! 每个终端单元有两个驱动任务。接收任务等待设备中断，把收到的字符放进预读缓冲，
//! 同时把发送完成通知给写任务；写任务从通道里取出整行，逐字符发给设备。

mod read_buffer;

use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

use async_channel::{Receiver, Sender};
use defines::{
    config::MAXLINE,
    error::{errno, KResult},
};
use event_listener::{listener, Event, IntoNotification};
use hal::{DeviceBus, DeviceClass, DeviceRequest, DeviceStatus, TermControl};
use klocks::{Semaphore, SpinMutex};
use triomphe::Arc;

use self::read_buffer::ReadBuffer;
use crate::{
    task::{Reply, TaskId},
    Kernel,
};

struct WriteJob {
    owner: TaskId,
    line: Vec<u8>,
}

pub(crate) struct TermUnit {
    lines: SpinMutex<ReadBuffer>,
    line_ready: Event,
    jobs: Sender<WriteJob>,
    job_queue: Receiver<WriteJob>,
    /// 写任务发出了一个字符，正在等它发送完成
    xmit_pending: AtomicBool,
    xmit_done: Semaphore,
}

impl TermUnit {
    pub(crate) fn new() -> Self {
        let (jobs, job_queue) = async_channel::unbounded();
        Self {
            lines: SpinMutex::new(ReadBuffer::new()),
            line_ready: Event::new(),
            jobs,
            job_queue,
            xmit_pending: AtomicBool::new(false),
            xmit_done: Semaphore::new(0),
        }
    }

    pub(crate) fn buffered_lines(&self) -> usize {
        self.lines.lock().lines()
    }

    /// 接收任务收到一个字符
    fn receive(&self, ch: u8) {
        let (closed, dropped) = {
            let mut lines = self.lines.lock();
            let before = lines.dropped();
            (lines.push(ch), lines.dropped() > before)
        };
        if dropped {
            debug!("read-ahead buffer full, oldest unread line dropped");
        }
        if closed {
            // 每凑齐一行恰好放行一个读者
            self.line_ready.notify(1.additional());
        }
    }
}

impl<H: DeviceBus> Kernel<H> {
    /// 读一行，至多 `buf.len()` 个字符（包括行尾的换行）。没有完整的行时阻塞
    pub async fn term_read(&self, unit: usize, buf: &mut [u8]) -> KResult<usize> {
        let term = self.terms.get(unit).ok_or(errno::EINVAL)?;
        if buf.is_empty() {
            return Err(errno::EINVAL);
        }
        loop {
            if let Some(len) = term.lines.lock().take_line(buf) {
                return Ok(len);
            }
            listener!(term.line_ready => listener);
            // 建立监听期间可能刚好凑齐了一行
            if let Some(len) = term.lines.lock().take_line(buf) {
                return Ok(len);
            }
            listener.await;
        }
    }

    /// 把一行交给写任务，等它全部发送完毕后返回写出的字符数
    pub async fn term_write(&self, task: TaskId, unit: usize, buf: &[u8]) -> KResult<usize> {
        let term = self.terms.get(unit).ok_or(errno::EINVAL)?;
        if buf.len() > MAXLINE {
            return Err(errno::EINVAL);
        }
        if !self.tasks.is_live(task) {
            return Err(errno::ESRCH);
        }
        let job = WriteJob {
            owner: task,
            line: buf.to_vec(),
        };
        if term.jobs.try_send(job).is_err() {
            return Err(errno::EIO);
        }
        match self.tasks.wait(task).await {
            Reply::Written(written) => written,
            other => panic!("terminal writer {task} got {other:?}"),
        }
    }
}

/// 接收任务：打开接收中断，然后处理该单元的每一次中断
pub(crate) async fn term_driver<H: DeviceBus>(kernel: Arc<Kernel<H>>, unit: usize) -> KResult<()> {
    let term = &kernel.terms[unit];
    let enabled = kernel.bus.device_output(
        DeviceClass::Term,
        unit,
        DeviceRequest::TermControl(TermControl::RECV_INT),
    );
    // 失败了也要报告，否则启动流程会一直等下去
    kernel.running.signal();
    enabled?;
    info!("terminal driver running");

    loop {
        let status = kernel.bus.wait_device(DeviceClass::Term, unit).await?;
        match status.term_recv() {
            DeviceStatus::BUSY => term.receive(status.term_char()),
            DeviceStatus::ERROR => warn!("receive error, status {status:?}"),
            _ => {}
        }
        match status.term_xmit() {
            DeviceStatus::READY => {
                if term.xmit_pending.swap(false, Ordering::AcqRel) {
                    term.xmit_done.signal();
                }
            }
            DeviceStatus::ERROR => {
                warn!("transmit error, status {status:?}");
                if term.xmit_pending.swap(false, Ordering::AcqRel) {
                    term.xmit_done.signal();
                }
            }
            _ => {}
        }
    }
}

/// 写任务：一次处理一行，每个字符都等到发送完成再发下一个
pub(crate) async fn term_writer<H: DeviceBus>(kernel: Arc<Kernel<H>>, unit: usize) -> KResult<()> {
    let term = &kernel.terms[unit];
    kernel.running.signal();

    while let Ok(job) = term.job_queue.recv().await {
        trace!("write {} chars for task {}", job.line.len(), job.owner);
        let written = write_line(&kernel.bus, term, unit, &job.line).await;
        kernel.tasks.post(job.owner, Reply::Written(written));
    }
    Ok(())
}

async fn write_line<H: DeviceBus>(bus: &H, term: &TermUnit, unit: usize, line: &[u8]) -> KResult<usize> {
    let xmit = TermControl::XMIT_CHAR | TermControl::XMIT_INT | TermControl::RECV_INT;
    // 即使中途出错也要把控制字恢复成只收不发
    let _restore = scopeguard::guard((), |()| {
        let restored = bus.device_output(
            DeviceClass::Term,
            unit,
            DeviceRequest::TermControl(TermControl::RECV_INT),
        );
        if let Err(err) = restored {
            error!("failed to restore terminal control: {err}");
        }
    });
    for &ch in line {
        term.xmit_pending.store(true, Ordering::Release);
        if let Err(err) = bus.device_output(
            DeviceClass::Term,
            unit,
            DeviceRequest::TermControl(xmit.with_char(ch)),
        ) {
            term.xmit_pending.store(false, Ordering::Release);
            return Err(err);
        }
        term.xmit_done.acquire().await;
    }
    Ok(line.len())
}
