//! 时间单位换算

pub const MILLI_PER_SEC: u64 = 1000;
pub const MICRO_PER_SEC: u64 = 1000 * MILLI_PER_SEC;
