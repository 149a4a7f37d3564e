use core::{
    cmp::Ordering,
    fmt,
    sync::atomic::{AtomicUsize, Ordering as AtomicOrdering},
};

static LOG_LEVEL_NAMES: [&str; 6] = ["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Level {
    Error = 1,
    Warn,
    Info,
    Debug,
    Trace,
}

impl PartialEq<LevelFilter> for Level {
    #[inline]
    fn eq(&self, other: &LevelFilter) -> bool {
        *self as u8 == *other as u8
    }
}

impl PartialOrd<LevelFilter> for Level {
    #[inline]
    fn partial_cmp(&self, other: &LevelFilter) -> Option<Ordering> {
        (*self as u8).partial_cmp(&(*other as u8))
    }
}

impl fmt::Display for Level {
    #[inline]
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.pad(self.as_str())
    }
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        LOG_LEVEL_NAMES[*self as usize]
    }
}

#[repr(usize)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum LevelFilter {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl PartialEq<Level> for LevelFilter {
    #[inline]
    fn eq(&self, other: &Level) -> bool {
        other.eq(self)
    }
}

impl PartialOrd<Level> for LevelFilter {
    #[inline]
    fn partial_cmp(&self, other: &Level) -> Option<Ordering> {
        (*self as u8).partial_cmp(&(*other as u8))
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.pad(self.as_str())
    }
}

impl LevelFilter {
    pub fn as_str(&self) -> &'static str {
        LOG_LEVEL_NAMES[*self as usize]
    }

    /// 按名字解析，大小写不敏感；无法识别时返回 `None`
    pub fn from_name(name: &str) -> Option<Self> {
        LOG_LEVEL_NAMES
            .iter()
            .position(|level| level.eq_ignore_ascii_case(name))
            .map(|index| match index {
                0 => LevelFilter::Off,
                1 => LevelFilter::Error,
                2 => LevelFilter::Warn,
                3 => LevelFilter::Info,
                4 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            })
    }
}

/// 编译期由 `KERNEL_CLOG` 环境变量决定的默认控制台日志等级
pub const CLOG: LevelFilter = decide_log_level(option_env!("KERNEL_CLOG"));

static MAX_LEVEL: AtomicUsize = AtomicUsize::new(CLOG as usize);

/// 运行时调整日志等级，比如 runner 的 `--log` 参数
pub fn set_max_level(filter: LevelFilter) {
    MAX_LEVEL.store(filter as usize, AtomicOrdering::Relaxed);
}

pub fn max_level() -> LevelFilter {
    match MAX_LEVEL.load(AtomicOrdering::Relaxed) {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

const fn decide_log_level(level_str: Option<&str>) -> LevelFilter {
    const fn str_eq(lhs: &str, rhs: &str) -> bool {
        let lhs = lhs.as_bytes();
        let rhs = rhs.as_bytes();

        if lhs.len() != rhs.len() {
            return false;
        }
        let mut i = 0;
        while i < lhs.len() {
            if lhs[i] != rhs[i] {
                return false;
            }
            i += 1;
        }
        true
    }

    if let Some(level_str) = level_str {
        if str_eq(level_str, "TRACE") {
            LevelFilter::Trace
        } else if str_eq(level_str, "DEBUG") {
            LevelFilter::Debug
        } else if str_eq(level_str, "INFO") {
            LevelFilter::Info
        } else if str_eq(level_str, "WARN") {
            LevelFilter::Warn
        } else if str_eq(level_str, "ERROR") {
            LevelFilter::Error
        } else {
            LevelFilter::Off
        }
    } else {
        LevelFilter::Off
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, LevelFilter};

    #[test]
    fn level_ordering_against_filter() {
        assert!(Level::Error <= LevelFilter::Warn);
        assert!(Level::Trace > LevelFilter::Debug);
        assert!(Level::Error > LevelFilter::Off);
    }

    #[test]
    fn parse_filter_names() {
        assert_eq!(LevelFilter::from_name("debug"), Some(LevelFilter::Debug));
        assert_eq!(LevelFilter::from_name("OFF"), Some(LevelFilter::Off));
        assert_eq!(LevelFilter::from_name("verbose"), None);
    }
}
