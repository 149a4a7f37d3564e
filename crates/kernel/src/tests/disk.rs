use std::{vec, vec::Vec};

use defines::error::{errno, KResult};
use hal::{DeviceStatus, DiskGeometry};
use virt_hw::{DiskOp, MachineConfig};

use super::{finished, small_config, spawn, start, TestKernel};
use crate::UserTask;

const SECTOR: usize = 16;

fn read(
    kernel: &TestKernel,
    track: usize,
    first: usize,
    sectors: usize,
) -> UserTask<(KResult<DeviceStatus>, Vec<u8>)> {
    spawn(kernel, move |ctx| async move {
        let mut buf = vec![0; sectors * SECTOR];
        let status = ctx
            .kernel()
            .disk_read(ctx.id(), 0, track, first, sectors, &mut buf)
            .await;
        (status, buf)
    })
}

fn write(
    kernel: &TestKernel,
    track: usize,
    first: usize,
    data: Vec<u8>,
) -> UserTask<KResult<DeviceStatus>> {
    spawn(kernel, move |ctx| async move {
        let sectors = data.len() / SECTOR;
        ctx.kernel()
            .disk_write(ctx.id(), 0, track, first, sectors, &data)
            .await
    })
}

fn ok() -> DeviceStatus {
    DeviceStatus(DeviceStatus::READY)
}

#[test]
fn geometry_is_probed_at_startup() {
    let (kernel, _drivers) = start(small_config());
    assert_eq!(
        kernel.disk_size(0),
        Ok(DiskGeometry {
            sector_size: SECTOR,
            sectors_per_track: 4,
            tracks: 5,
        })
    );
    assert_eq!(kernel.disk_size(1), Err(errno::EINVAL));
}

#[test]
fn queued_requests_are_served_by_track_then_sector() {
    let (kernel, _drivers) = start(small_config());
    kernel.bus().disk(0).clear_ops();
    let tasks = [read(&kernel, 3, 0, 1), read(&kernel, 1, 2, 1), read(&kernel, 1, 0, 1)];
    kernel.run_until_idle();

    assert_eq!(kernel.bus().disk(0).transfers(), [(1, 0), (1, 2), (3, 0)]);
    for task in tasks {
        assert_eq!(finished(task).0, Ok(ok()));
    }
}

#[test]
fn seeks_only_when_the_track_changes() {
    let (kernel, _drivers) = start(small_config());
    kernel.bus().disk(0).clear_ops();
    let tasks = [read(&kernel, 2, 0, 1), read(&kernel, 2, 3, 2)];
    kernel.run_until_idle();

    assert_eq!(
        kernel.bus().disk(0).ops(),
        [
            DiskOp::Seek { track: 2 },
            DiskOp::Read { track: 2, sector: 0 },
            DiskOp::Read { track: 2, sector: 3 },
            DiskOp::Seek { track: 3 },
            DiskOp::Read { track: 3, sector: 0 },
        ]
    );
    for task in tasks {
        finished(task);
    }
}

#[test]
fn write_across_a_track_boundary_and_read_back() {
    let (kernel, _drivers) = start(small_config());
    let data: Vec<u8> = (0..3 * SECTOR as u8).collect();
    let writer = write(&kernel, 1, 3, data.clone());
    kernel.run_until_idle();
    assert_eq!(finished(writer), Ok(ok()));

    let disk = kernel.bus().disk(0);
    assert_eq!(disk.peek(1, 3), data[..SECTOR]);
    assert_eq!(disk.peek(2, 0), data[SECTOR..2 * SECTOR]);
    assert_eq!(disk.peek(2, 1), data[2 * SECTOR..]);

    let reader = read(&kernel, 1, 3, 3);
    kernel.run_until_idle();
    let (status, buf) = finished(reader);
    assert_eq!(status, Ok(ok()));
    assert_eq!(buf, data);
}

#[test]
fn invalid_requests_never_reach_the_worker() {
    let (kernel, _drivers) = start(small_config());
    kernel.bus().disk(0).clear_ops();
    let rejected = [
        // 越过最后一个磁道
        read(&kernel, 4, 2, 3),
        read(&kernel, 5, 0, 1),
        read(&kernel, 0, 4, 1),
        read(&kernel, 0, 0, 5),
    ];
    let short_buffer = spawn(&kernel, |ctx| async move {
        let mut buf = [0; SECTOR];
        ctx.kernel()
            .disk_read(ctx.id(), 0, 0, 0, 2, &mut buf)
            .await
    });
    let bad_unit = spawn(&kernel, |ctx| async move {
        ctx.kernel().disk_write(ctx.id(), 7, 0, 0, 1, &[0; SECTOR]).await
    });
    kernel.run_until_idle();

    for task in rejected {
        assert_eq!(finished(task).0, Err(errno::EINVAL));
    }
    assert_eq!(finished(short_buffer), Err(errno::EINVAL));
    assert_eq!(finished(bad_unit), Err(errno::EINVAL));
    assert!(kernel.bus().disk(0).ops().is_empty());
}

#[test]
fn device_error_aborts_the_rest_of_the_request() {
    let (kernel, _drivers) = start(small_config());
    let disk = kernel.bus().disk(0);
    disk.inject_fault(2, 0);
    disk.clear_ops();

    let failed = write(&kernel, 1, 3, vec![7; 3 * SECTOR]);
    kernel.run_until_idle();
    let status = finished(failed).unwrap();
    assert!(status.is_error());
    assert_eq!(disk.transfers(), [(1, 3), (2, 0)]);

    // 出错之后驱动照常服务下一个请求
    disk.clear_faults();
    let next = read(&kernel, 2, 1, 1);
    kernel.run_until_idle();
    assert_eq!(finished(next).0, Ok(ok()));
}

#[test]
fn arrivals_during_service_wait_for_the_cursor() {
    let (kernel, _drivers) = start(small_config());
    let disk = kernel.bus().disk(0);
    disk.clear_ops();
    disk.hold_completions();

    let first = read(&kernel, 2, 0, 1);
    kernel.run_until_idle();
    // (2, 0) 正在服务中，这几个只能排队
    let later = [read(&kernel, 4, 0, 1), read(&kernel, 0, 0, 1), read(&kernel, 3, 0, 1)];
    kernel.run_until_idle();
    assert_eq!(kernel.disk_queued(0), 3);

    disk.release_completions();
    kernel.run_until_idle();
    assert_eq!(disk.transfers(), [(2, 0), (0, 0), (3, 0), (4, 0)]);
    finished(first);
    for task in later {
        assert_eq!(finished(task).0, Ok(ok()));
    }
}

#[test]
fn zapped_requester_is_withdrawn_from_the_queue() {
    let (kernel, _drivers) = start(small_config());
    let disk = kernel.bus().disk(0);
    disk.clear_ops();
    disk.hold_completions();

    let busy = read(&kernel, 1, 0, 1);
    let doomed = read(&kernel, 2, 0, 1);
    let last = read(&kernel, 3, 0, 1);
    kernel.run_until_idle();
    assert_eq!(kernel.disk_queued(0), 2);

    drop(doomed);
    kernel.run_until_idle();
    assert_eq!(kernel.disk_queued(0), 1);

    disk.release_completions();
    kernel.run_until_idle();
    assert_eq!(disk.transfers(), [(1, 0), (3, 0)]);
    finished(busy);
    finished(last);
    assert_eq!(kernel.tasks().live_tasks(), 0);
}

#[test]
fn zapped_requester_in_service_loses_only_its_reply() {
    let (kernel, _drivers) = start(small_config());
    let disk = kernel.bus().disk(0);
    disk.hold_completions();

    let in_flight = read(&kernel, 1, 0, 1);
    kernel.run_until_idle();
    drop(in_flight);
    kernel.run_until_idle();
    assert_eq!(kernel.tasks().live_tasks(), 0);

    // 槽位被新任务复用，旧请求的结果不能送到它那里
    let reuser = spawn(&kernel, |ctx| async move { ctx.kernel().sleep(ctx.id(), 0).await });
    kernel.run_until_idle();
    disk.release_completions();
    kernel.run_until_idle();
    assert!(!reuser.is_finished());
    assert_eq!(kernel.sleepers(), 1);

    let next = read(&kernel, 4, 3, 1);
    kernel.run_until_idle();
    assert_eq!(finished(next).0, Ok(ok()));
}

#[test]
fn random_admissions_are_served_in_order_exactly_once() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..20 {
        let (kernel, _drivers) = start(MachineConfig {
            disks: vec![DiskGeometry {
                sector_size: SECTOR,
                sectors_per_track: 8,
                tracks: 32,
            }],
            ..small_config()
        });
        kernel.bus().disk(0).clear_ops();
        let count = rng.usize(1..30);
        let mut wanted: Vec<_> = (0..count)
            .map(|_| (rng.usize(0..32), rng.usize(0..8)))
            .collect();
        let tasks: Vec<_> = wanted
            .iter()
            .map(|&(track, sector)| read(&kernel, track, sector, 1))
            .collect();
        kernel.run_until_idle();

        wanted.sort_unstable();
        assert_eq!(kernel.bus().disk(0).transfers(), wanted);
        for task in tasks {
            finished(task);
        }
    }
}
