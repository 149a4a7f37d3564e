use alloc::vec::Vec;
use core::fmt;

use defines::error::{errno, KResult};
use hal::DiskGeometry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiskOp {
    Read,
    Write,
}

/// 一次磁盘请求。从起始 (track, first) 开始连续 `sectors` 个扇区，越过磁道末尾时接到下一磁道
pub struct DiskRequest {
    pub op: DiskOp,
    pub track: usize,
    pub first: usize,
    pub sectors: usize,
    /// 写请求是待写的数据；读请求是接收数据的缓冲区，完成后原样交还给请求者
    pub data: Vec<u8>,
}

impl DiskRequest {
    /// 排序键。队列按它非降序排列
    pub fn position(&self) -> (usize, usize) {
        (self.track, self.first)
    }

    /// 第 `index` 个扇区实际落在哪个 (track, sector)
    pub fn locate(&self, index: usize, sectors_per_track: usize) -> (usize, usize) {
        let sector = self.first + index;
        (self.track + sector / sectors_per_track, sector % sectors_per_track)
    }
}

impl fmt::Debug for DiskRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskRequest")
            .field("op", &self.op)
            .field("track", &self.track)
            .field("first", &self.first)
            .field("sectors", &self.sectors)
            .finish_non_exhaustive()
    }
}

/// 准入前的检查，全部用几何参数的排他上界
pub fn validate(
    geometry: &DiskGeometry,
    track: usize,
    first: usize,
    sectors: usize,
    buf_len: usize,
) -> KResult<()> {
    let spt = geometry.sectors_per_track;
    if sectors > spt || track >= geometry.tracks || first >= spt {
        return Err(errno::EINVAL);
    }
    if buf_len < sectors * geometry.sector_size {
        return Err(errno::EINVAL);
    }
    let last_track = track + (first + sectors).saturating_sub(1) / spt;
    if last_track >= geometry.tracks {
        return Err(errno::EINVAL);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use defines::error::errno;
    use hal::DiskGeometry;

    use super::{validate, DiskOp, DiskRequest};

    const GEOMETRY: DiskGeometry = DiskGeometry {
        sector_size: 512,
        sectors_per_track: 4,
        tracks: 5,
    };

    #[test]
    fn ranges_are_exclusive() {
        assert_eq!(validate(&GEOMETRY, 5, 0, 1, 512), Err(errno::EINVAL));
        assert_eq!(validate(&GEOMETRY, 0, 4, 1, 512), Err(errno::EINVAL));
        assert_eq!(validate(&GEOMETRY, 0, 0, 5, 5 * 512), Err(errno::EINVAL));
        assert_eq!(validate(&GEOMETRY, 4, 3, 1, 512), Ok(()));
        assert_eq!(validate(&GEOMETRY, 0, 0, 4, 4 * 512), Ok(()));
    }

    #[test]
    fn crossing_past_the_last_track_is_rejected() {
        // 从最后一个磁道的第 2 扇区读 3 个，会越过磁盘末尾
        assert_eq!(validate(&GEOMETRY, 4, 2, 3, 3 * 512), Err(errno::EINVAL));
        // 同样的跨越放在倒数第二个磁道上就没问题
        assert_eq!(validate(&GEOMETRY, 3, 2, 3, 3 * 512), Ok(()));
    }

    #[test]
    fn buffer_must_hold_every_sector() {
        assert_eq!(validate(&GEOMETRY, 0, 0, 2, 1023), Err(errno::EINVAL));
        assert_eq!(validate(&GEOMETRY, 0, 0, 0, 0), Ok(()));
    }

    #[test]
    fn sectors_wrap_onto_next_track() {
        let request = DiskRequest {
            op: DiskOp::Read,
            track: 1,
            first: 2,
            sectors: 3,
            data: vec![0; 3 * 512],
        };
        let spots: Vec<_> = (0..request.sectors)
            .map(|i| request.locate(i, GEOMETRY.sectors_per_track))
            .collect();
        assert_eq!(spots, [(1, 2), (1, 3), (2, 0)]);
    }
}
