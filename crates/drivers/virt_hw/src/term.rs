use std::collections::VecDeque;

use hal::{DeviceStatus, TermControl};
use klocks::SpinMutex;

use crate::line::InterruptLine;

pub(crate) enum TermEvent {
    Received(u8),
    Transmitted,
}

/// 一个模拟终端。接收中断被关闭时，键入的字符先积压在设备里
pub struct SimTerm {
    state: SpinMutex<TermState>,
    pub(crate) line: InterruptLine<TermEvent>,
}

struct TermState {
    recv_enabled: bool,
    xmit_in_flight: bool,
    backlog: VecDeque<u8>,
    output: Vec<u8>,
}

impl SimTerm {
    pub(crate) fn new() -> Self {
        Self {
            state: SpinMutex::new(TermState {
                recv_enabled: false,
                xmit_in_flight: false,
                backlog: VecDeque::new(),
                output: Vec::new(),
            }),
            line: InterruptLine::new(),
        }
    }

    /// 模拟从键盘键入一串字符
    pub fn type_input(&self, input: &[u8]) {
        self.state.lock().backlog.extend(input.iter().copied());
        self.pump();
    }

    /// 设备已经发出去的全部字符
    pub fn output(&self) -> Vec<u8> {
        self.state.lock().output.clone()
    }

    pub fn take_output(&self) -> Vec<u8> {
        core::mem::take(&mut self.state.lock().output)
    }

    pub fn recv_enabled(&self) -> bool {
        self.state.lock().recv_enabled
    }

    pub(crate) fn control(&self, ctrl: TermControl) {
        let transmitted = {
            let mut state = self.state.lock();
            state.recv_enabled = ctrl.contains(TermControl::RECV_INT);
            if ctrl.contains(TermControl::XMIT_CHAR) {
                state.output.push(ctrl.char());
                // 没开发送中断就没有完成通知，直接视为发送完毕
                state.xmit_in_flight = ctrl.contains(TermControl::XMIT_INT);
                state.xmit_in_flight
            } else {
                false
            }
        };
        if transmitted {
            self.line.raise(TermEvent::Transmitted);
        }
        self.pump();
    }

    /// 把积压的输入按顺序变成接收中断
    fn pump(&self) {
        let received: Vec<u8> = {
            let mut state = self.state.lock();
            if !state.recv_enabled {
                return;
            }
            state.backlog.drain(..).collect()
        };
        for ch in received {
            self.line.raise(TermEvent::Received(ch));
        }
    }

    /// 中断被取走的那一刻才计算状态字，发送方向反映当时是否还有字符在途
    pub(crate) fn status_of(&self, event: TermEvent) -> DeviceStatus {
        let mut state = self.state.lock();
        match event {
            TermEvent::Received(ch) => {
                let xmit = if state.xmit_in_flight {
                    DeviceStatus::BUSY
                } else {
                    DeviceStatus::READY
                };
                DeviceStatus::term(DeviceStatus::BUSY, xmit, ch)
            }
            TermEvent::Transmitted => {
                state.xmit_in_flight = false;
                DeviceStatus::term(DeviceStatus::READY, DeviceStatus::READY, 0)
            }
        }
    }
}
