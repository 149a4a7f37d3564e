use kernel::tracer::Console;

/// 日志写到 stderr，终端输出走 stdout，两者互不干扰
pub struct StderrConsole;

pub static CONSOLE: StderrConsole = StderrConsole;

impl Console for StderrConsole {
    fn write_line(&self, line: &str) {
        eprintln!("{line}");
    }
}
