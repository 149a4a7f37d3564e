//! 设备相关系统调用的编号，与用户库保持一致

macro_rules! declare_syscall_id {
    ($($name:tt, $id:literal,)*) => {
        $(pub const $name: usize = $id;)*
        pub fn name(id: usize) -> &'static str {
            match id {
                $($id => stringify!($name),)*
                _ => "UNKNOWN",
            }
        }
    };
}

#[rustfmt::skip]
declare_syscall_id!(
    TERMREAD,           1,
    TERMWRITE,          2,
    SLEEP,              12,
    DISKREAD,           13,
    DISKWRITE,          14,
    DISKSIZE,           15,
);
