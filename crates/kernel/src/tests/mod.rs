//! 在模拟硬件上跑完整驱动的场景测试

mod disk;

use core::future::Future;

use hal::DiskGeometry;
use triomphe::Arc;
use virt_hw::{Machine, MachineConfig};

use crate::{Drivers, Kernel, UserCtx, UserTask};

type TestKernel = Arc<Kernel<Machine>>;

/// 一个磁盘单元 5 磁道 x 4 扇区 x 16 字节，两个终端
fn small_config() -> MachineConfig {
    MachineConfig {
        disks: vec![DiskGeometry {
            sector_size: 16,
            sectors_per_track: 4,
            tracks: 5,
        }],
        terms: 2,
        ..MachineConfig::default()
    }
}

/// 拉起所有驱动，返回时它们都已经在等待中断
fn start(config: MachineConfig) -> (TestKernel, Drivers) {
    let disks = config.disks.len();
    let terms = config.terms;
    let kernel = Kernel::with_units(Machine::new(config), disks, terms);
    let starting = {
        let kernel = Arc::clone(&kernel);
        kernel
            .executor()
            .clone()
            .spawn(async move { Kernel::start_drivers(&kernel).await })
    };
    kernel.run_until_idle();
    assert!(starting.is_finished(), "drivers did not come up");
    let drivers = smol::block_on(starting);
    (kernel, drivers)
}

fn spawn<F, Fut>(kernel: &TestKernel, main: F) -> UserTask<Fut::Output>
where
    F: FnOnce(UserCtx<Machine>) -> Fut,
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    Kernel::spawn_user(kernel, "test", main).unwrap()
}

/// 推进 `n` 个时钟周期，每个周期之后把就绪任务跑完
fn tick(kernel: &TestKernel, n: usize) {
    for _ in 0..n {
        kernel.bus().tick();
        kernel.run_until_idle();
    }
}

/// 取出一个已经结束的任务的结果
fn finished<T>(task: UserTask<T>) -> T {
    assert!(task.is_finished(), "task {} is still blocked", task.id());
    smol::block_on(task)
}

fn zap_drivers(kernel: &TestKernel, drivers: Drivers) {
    let zapping = kernel.executor().spawn(drivers.zap());
    kernel.run_until_idle();
    assert!(zapping.is_finished());
}
