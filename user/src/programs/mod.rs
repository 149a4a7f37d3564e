//! 演示程序。每个程序都是一个以 [`UserCtx`] 为参数的 async 函数，返回退出码

mod disk_check;
mod echo;
mod elevator;
mod sleepers;

use alloc::boxed::Box;
use core::{future::Future, pin::Pin};

use hal::DeviceBus;
use kernel::UserCtx;

pub type ProgramMain<H> = fn(UserCtx<H>) -> Pin<Box<dyn Future<Output = i32> + Send>>;

pub struct Program<H: DeviceBus> {
    pub name: &'static str,
    pub about: &'static str,
    pub main: ProgramMain<H>,
}

pub fn programs<H: DeviceBus>() -> [Program<H>; 4] {
    [
        Program {
            name: "echo",
            about: "echo every line typed on terminal 0 until `quit`",
            main: |ctx| Box::pin(echo::main(ctx)),
        },
        Program {
            name: "sleepers",
            about: "children sleep for different lengths and report in wake order",
            main: |ctx| Box::pin(sleepers::main(ctx)),
        },
        Program {
            name: "disk_check",
            about: "write a pattern across a track boundary and read it back",
            main: |ctx| Box::pin(disk_check::main(ctx)),
        },
        Program {
            name: "elevator",
            about: "many concurrent disk reads, printed in service order",
            main: |ctx| Box::pin(elevator::main(ctx)),
        },
    ]
}

pub fn find<H: DeviceBus>(name: &str) -> Option<Program<H>> {
    programs().into_iter().find(|program| program.name == name)
}

#[cfg(test)]
mod tests {
    use defines::config::CLOCK_TICK_US;
    use kernel::Kernel;
    use triomphe::Arc;
    use virt_hw::{Machine, MachineConfig};

    use super::find;

    type TestKernel = Arc<Kernel<Machine>>;

    /// 跑一个程序直到结束，返回退出码
    fn run(kernel: &TestKernel, name: &str, max_ticks: usize) -> i32 {
        let program = find::<Machine>(name).unwrap();
        let booted = Kernel::boot(&kernel, program.main);
        for _ in 0..max_ticks {
            kernel.run_until_idle();
            if booted.is_finished() {
                return smol::block_on(booted).unwrap();
            }
            kernel.bus().tick();
        }
        panic!("{name} did not finish in {max_ticks} ticks");
    }

    fn machine(config: MachineConfig) -> TestKernel {
        let (disks, terms) = (config.disks.len(), config.terms);
        Kernel::with_units(Machine::new(config), disks, terms)
    }

    fn output(kernel: &TestKernel) -> String {
        String::from_utf8(kernel.bus().term(0).output()).unwrap()
    }

    const TICKS_PER_SEC: usize = (1_000_000 / CLOCK_TICK_US) as usize;

    #[test]
    fn echo_until_quit() {
        let kernel = machine(MachineConfig::default());
        kernel.bus().term(0).type_input(b"hello\nworld\nquit\n");
        assert_eq!(run(&kernel, "echo", 10), 0);
        assert_eq!(output(&kernel), "echo: hello\necho: world\nbye\n");
    }

    #[test]
    fn sleepers_wake_shortest_first() {
        let kernel = machine(MachineConfig::default());
        assert_eq!(run(&kernel, "sleepers", 4 * TICKS_PER_SEC), 0);
        assert_eq!(
            output(&kernel),
            "child 1 slept 1s\nchild 2 slept 2s\nchild 0 slept 3s\nall 3 children woke\n"
        );
    }

    #[test]
    fn disk_check_passes() {
        let kernel = machine(MachineConfig::default());
        assert_eq!(run(&kernel, "disk_check", 10), 0);
        assert_eq!(output(&kernel), "disk 0: 512B x 16 x 16, check ok\n");
    }

    #[test]
    fn disk_check_reports_a_bad_sector() {
        let kernel = machine(MachineConfig::default());
        kernel.bus().disk(0).inject_fault(1, 0);
        assert_eq!(run(&kernel, "disk_check", 10), 1);
        assert!(output(&kernel).contains("failed"));
    }

    #[test]
    fn elevator_serves_in_track_order() {
        let kernel = machine(MachineConfig::default());
        assert_eq!(run(&kernel, "elevator", 10), 0);
        let transfers = kernel.bus().disk(0).transfers();
        assert_eq!(transfers.len(), super::elevator::READERS);
        let mut sorted = transfers.clone();
        sorted.sort_unstable();
        assert_eq!(transfers, sorted);
        assert!(output(&kernel).ends_with("elevator done\n"));
    }

    #[test]
    fn unknown_program() {
        assert!(find::<Machine>("fork_bomb").is_none());
    }
}
