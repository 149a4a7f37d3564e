use core::fmt;

use bitflags::bitflags;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Clock,
    Disk,
    Term,
}

impl DeviceClass {
    pub fn name(self) -> &'static str {
        match self {
            DeviceClass::Clock => "clock",
            DeviceClass::Disk => "disk",
            DeviceClass::Term => "term",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiskGeometry {
    pub sector_size: usize,
    pub sectors_per_track: usize,
    pub tracks: usize,
}

impl DiskGeometry {
    pub const fn track_bytes(&self) -> usize {
        self.sector_size * self.sectors_per_track
    }
}

pub enum DeviceRequest<'a> {
    /// 把磁头移动到某个磁道
    Seek { track: usize },
    /// 读当前磁道上的某个扇区
    ReadSector { sector: usize, buf: &'a mut [u8] },
    /// 写当前磁道上的某个扇区
    WriteSector { sector: usize, buf: &'a [u8] },
    /// 查询磁盘的几何参数
    Geometry { out: &'a mut DiskGeometry },
    /// 写终端控制寄存器
    TermControl(TermControl),
}

impl DeviceRequest<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceRequest::Seek { .. } => "seek",
            DeviceRequest::ReadSector { .. } => "read",
            DeviceRequest::WriteSector { .. } => "write",
            DeviceRequest::Geometry { .. } => "geometry",
            DeviceRequest::TermControl(_) => "term control",
        }
    }
}

bitflags! {
    /// 终端控制字。第 8~15 位放待发送的字符，不属于任何标志位
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TermControl: u32 {
        /// 发送 8~15 位中的字符
        const XMIT_CHAR = 1 << 0;
        /// 允许接收中断
        const RECV_INT = 1 << 1;
        /// 允许发送完成中断
        const XMIT_INT = 1 << 2;
    }
}

impl TermControl {
    pub fn with_char(self, ch: u8) -> Self {
        Self::from_bits_retain((self.bits() & !0xff00) | ((ch as u32) << 8))
    }

    pub fn char(self) -> u8 {
        (self.bits() >> 8) as u8
    }
}

/// 设备中断时读到的状态字
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus(pub u32);

impl DeviceStatus {
    pub const READY: u32 = 0;
    pub const BUSY: u32 = 1;
    pub const ERROR: u32 = 2;

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR
    }

    /// 组装一个终端状态字。接收方向为 `BUSY` 表示 `ch` 是新收到的字符
    pub const fn term(recv: u32, xmit: u32, ch: u8) -> Self {
        Self((recv & 3) | ((xmit & 3) << 2) | ((ch as u32) << 8))
    }

    pub const fn term_recv(self) -> u32 {
        self.0 & 3
    }

    pub const fn term_xmit(self) -> u32 {
        (self.0 >> 2) & 3
    }

    pub const fn term_char(self) -> u8 {
        (self.0 >> 8) as u8
    }
}

impl fmt::Debug for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceStatus({:#x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{DeviceStatus, TermControl};

    #[test]
    fn term_status_fields() {
        let status = DeviceStatus::term(DeviceStatus::BUSY, DeviceStatus::READY, b'x');
        assert_eq!(status.term_recv(), DeviceStatus::BUSY);
        assert_eq!(status.term_xmit(), DeviceStatus::READY);
        assert_eq!(status.term_char(), b'x');
        assert_eq!(status.raw(), 1 | (b'x' as u32) << 8);
    }

    #[test]
    fn control_word_carries_char() {
        let ctrl = (TermControl::XMIT_CHAR | TermControl::XMIT_INT | TermControl::RECV_INT)
            .with_char(b'A');
        assert_eq!(ctrl.bits(), 0x4107);
        assert_eq!(ctrl.char(), b'A');
        assert!(ctrl.contains(TermControl::XMIT_INT));
        assert_eq!(TermControl::RECV_INT.with_char(0).bits(), 0x2);
    }
}
