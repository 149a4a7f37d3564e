use defines::config::{MAXLINE, TERM_SLOTS};

/// 终端的预读缓冲：`TERM_SLOTS` 个定长行槽组成的环
///
/// `write` 是正在填充的槽，`read` 是下一个可读的槽；没有可读的行时 `read` 为 `None`。
/// 十个槽都是未读的行时 `read == Some(write)`，此时再开始一行会覆盖最旧的那一行。
pub struct ReadBuffer {
    slots: [[u8; MAXLINE]; TERM_SLOTS],
    lens: [usize; TERM_SLOTS],
    write: usize,
    read: Option<usize>,
    /// 正在填充的槽里已有的字符数
    fill: usize,
    dropped: usize,
}

impl ReadBuffer {
    pub const fn new() -> Self {
        Self {
            slots: [[0; MAXLINE]; TERM_SLOTS],
            lens: [0; TERM_SLOTS],
            write: 0,
            read: None,
            fill: 0,
            dropped: 0,
        }
    }

    /// 放入一个收到的字符。返回是否因此凑成了完整的一行。
    ///
    /// 遇到换行或者达到 `MAXLINE` 都会结束当前行
    pub fn push(&mut self, ch: u8) -> bool {
        if self.fill == 0 && self.read == Some(self.write) {
            // 环满了，丢掉最旧的未读行
            self.read = Some((self.write + 1) % TERM_SLOTS);
            self.dropped += 1;
        }
        self.slots[self.write][self.fill] = ch;
        self.fill += 1;
        if ch != b'\n' && self.fill < MAXLINE {
            return false;
        }

        self.lens[self.write] = self.fill;
        self.fill = 0;
        if self.read.is_none() {
            self.read = Some(self.write);
        }
        self.write = (self.write + 1) % TERM_SLOTS;
        true
    }

    /// 取出最早的一行，至多拷贝 `buf.len()` 个字符，本行剩下的部分被丢弃
    pub fn take_line(&mut self, buf: &mut [u8]) -> Option<usize> {
        let read = self.read?;
        let len = self.lens[read].min(buf.len());
        buf[..len].copy_from_slice(&self.slots[read][..len]);
        let next = (read + 1) % TERM_SLOTS;
        self.read = (next != self.write).then_some(next);
        Some(len)
    }

    /// 可读的完整行数
    pub fn lines(&self) -> usize {
        match self.read {
            None => 0,
            Some(read) if read == self.write => TERM_SLOTS,
            Some(read) => (self.write + TERM_SLOTS - read) % TERM_SLOTS,
        }
    }

    /// 因为环满而被覆盖掉的行数
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl Default for ReadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use defines::config::{MAXLINE, TERM_SLOTS};

    use super::ReadBuffer;

    fn feed(buffer: &mut ReadBuffer, input: &[u8]) -> usize {
        input.iter().filter(|&&ch| buffer.push(ch)).count()
    }

    #[test]
    fn line_includes_terminator() {
        let mut buffer = ReadBuffer::new();
        assert_eq!(feed(&mut buffer, b"ab\n"), 1);
        let mut out = [0; 10];
        assert_eq!(buffer.take_line(&mut out), Some(3));
        assert_eq!(&out[..3], b"ab\n");
        assert_eq!(buffer.take_line(&mut out), None);
    }

    #[test]
    fn partial_line_is_not_readable() {
        let mut buffer = ReadBuffer::new();
        feed(&mut buffer, b"abc");
        assert_eq!(buffer.lines(), 0);
        assert_eq!(buffer.take_line(&mut [0; 4]), None);
        feed(&mut buffer, b"\n");
        assert_eq!(buffer.take_line(&mut [0; 4]), Some(4));
    }

    #[test]
    fn long_line_is_cut_at_maxline() {
        let mut buffer = ReadBuffer::new();
        let long = [b'x'; MAXLINE + 5];
        assert_eq!(feed(&mut buffer, &long), 1);
        let mut out = [0; MAXLINE * 2];
        assert_eq!(buffer.take_line(&mut out), Some(MAXLINE));
        // 剩下的 5 个字符开始了新的一行，尚未结束
        assert_eq!(buffer.lines(), 0);
        feed(&mut buffer, b"\n");
        assert_eq!(buffer.take_line(&mut out), Some(6));
    }

    #[test]
    fn short_buffer_truncates_the_line() {
        let mut buffer = ReadBuffer::new();
        feed(&mut buffer, b"hello\nworld\n");
        let mut out = [0; 2];
        assert_eq!(buffer.take_line(&mut out), Some(2));
        assert_eq!(&out, b"he");
        let mut out = [0; 16];
        assert_eq!(buffer.take_line(&mut out), Some(6));
        assert_eq!(&out[..6], b"world\n");
    }

    #[test]
    fn eleventh_line_overwrites_the_oldest() {
        let mut buffer = ReadBuffer::new();
        for i in 0..TERM_SLOTS {
            feed(&mut buffer, &[b'0' + i as u8, b'\n']);
        }
        assert_eq!(buffer.lines(), TERM_SLOTS);
        feed(&mut buffer, b"z\n");
        assert_eq!(buffer.lines(), TERM_SLOTS);
        assert_eq!(buffer.dropped(), 1);

        let mut out = [0; 4];
        let mut lines = Vec::new();
        while let Some(len) = buffer.take_line(&mut out) {
            lines.push(out[..len].to_vec());
        }
        assert_eq!(lines.len(), TERM_SLOTS);
        assert_eq!(lines[0], b"1\n");
        assert_eq!(lines[TERM_SLOTS - 1], b"z\n");
    }

    #[test]
    fn reading_from_a_full_ring_frees_one_slot() {
        let mut buffer = ReadBuffer::new();
        for _ in 0..TERM_SLOTS {
            feed(&mut buffer, b"a\n");
        }
        assert_eq!(buffer.take_line(&mut [0; 2]), Some(2));
        feed(&mut buffer, b"b\n");
        assert_eq!(buffer.dropped(), 0);
        assert_eq!(buffer.lines(), TERM_SLOTS);
    }
}
