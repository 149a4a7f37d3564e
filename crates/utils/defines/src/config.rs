//! 编译期确定的配置

/// 任务表的容量，同时也是各类按任务下标索引的 arena 的大小
pub const MAX_TASKS: usize = 50;

/// 执行器就绪队列的上限，必须是 2 的幂
pub const TASK_LIMIT: usize = 256;

/// 时钟设备每隔这么多微秒产生一次中断
pub const CLOCK_TICK_US: u32 = 20_000;

/// 磁盘单元数
pub const DISK_UNITS: usize = 2;
/// 默认的扇区大小（字节）
pub const DISK_SECTOR_SIZE: usize = 512;
/// 默认的每磁道扇区数
pub const DISK_TRACK_SIZE: usize = 16;
/// 默认的磁道数
pub const DISK_TRACKS: usize = 16;

/// 终端单元数
pub const TERM_UNITS: usize = 4;
/// 一行的最大长度，超过会被截断
pub const MAXLINE: usize = 80;
/// 每个终端预读缓冲的行数
pub const TERM_SLOTS: usize = 10;
