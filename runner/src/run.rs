use std::io::{self, Write};

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use defines::config::{DISK_SECTOR_SIZE, DISK_TRACKS, DISK_TRACK_SIZE, DISK_UNITS, TERM_UNITS};
use hal::DiskGeometry;
use kernel::Kernel;
use kernel_tracer::LevelFilter;
use virt_hw::{Machine, MachineConfig};

use crate::console::CONSOLE;

/// 在模拟硬件上启动内核，以指定的演示程序作为第一个用户任务
#[derive(Parser)]
pub struct RunArgs {
    /// 演示程序名，`list` 子命令可以列出全部
    program: String,
    /// 预先在终端 0 上键入的一行（自动补上换行），可以重复
    #[clap(long)]
    input: Vec<String>,
    /// 程序在这么多个时钟周期内还没结束就放弃
    #[clap(long, default_value_t = 3000)]
    max_ticks: usize,
    /// 控制台日志级别
    #[clap(long, default_value_t = String::from("WARN"))]
    log: String,
    /// 关闭日志的 ANSI 颜色
    #[clap(long)]
    no_color: bool,
    /// 磁盘单元数
    #[clap(long, default_value_t = DISK_UNITS)]
    disks: usize,
    #[clap(long, default_value_t = DISK_SECTOR_SIZE, value_parser = positive)]
    sector_size: usize,
    /// 每磁道扇区数
    #[clap(long, default_value_t = DISK_TRACK_SIZE, value_parser = positive)]
    track_size: usize,
    #[clap(long, default_value_t = DISK_TRACKS, value_parser = positive)]
    tracks: usize,
    /// 终端单元数
    #[clap(long, default_value_t = TERM_UNITS, value_parser = positive)]
    terms: usize,
}

fn positive(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(0) => Err(String::from("must be at least 1")),
        Ok(value) => Ok(value),
        Err(err) => Err(err.to_string()),
    }
}

impl RunArgs {
    /// 返回程序的退出码
    pub fn run(self) -> anyhow::Result<i32> {
        let level = LevelFilter::from_name(&self.log)
            .with_context(|| format!("unknown log level `{}`", self.log))?;
        kernel_tracer::set_max_level(level);
        kernel::tracer::init(&CONSOLE, !self.no_color);

        let program = user::programs::find::<Machine>(&self.program)
            .with_context(|| format!("no program named `{}`", self.program))?;

        let kernel = Kernel::with_units(Machine::new(self.machine_config()), self.disks, self.terms);
        let term = kernel.bus().term(0);
        for line in &self.input {
            term.type_input(line.as_bytes());
            term.type_input(b"\n");
        }

        let booted = Kernel::boot(&kernel, program.main);
        let mut ticks = 0;
        loop {
            kernel.run_until_idle();
            self.flush_terminals(&kernel)?;
            if booted.is_finished() {
                break;
            }
            if ticks == self.max_ticks {
                bail!("`{}` still running after {ticks} ticks", program.name);
            }
            kernel.bus().tick();
            ticks += 1;
        }

        let code = smol::block_on(booted).map_err(|err| anyhow!("boot failed: {err}"))?;
        eprintln!("`{}` exited with {code} after {ticks} ticks", program.name);
        Ok(code)
    }

    fn machine_config(&self) -> MachineConfig {
        let geometry = DiskGeometry {
            sector_size: self.sector_size,
            sectors_per_track: self.track_size,
            tracks: self.tracks,
        };
        MachineConfig {
            disks: vec![geometry; self.disks],
            terms: self.terms,
            ..MachineConfig::default()
        }
    }

    /// 终端 0 原样输出，其余终端的每一行加上单元号前缀
    fn flush_terminals(&self, kernel: &Kernel<Machine>) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        for unit in 0..self.terms {
            let output = kernel.bus().term(unit).take_output();
            if output.is_empty() {
                continue;
            }
            if unit == 0 {
                stdout.write_all(&output)?;
                continue;
            }
            for line in output.split_inclusive(|&ch| ch == b'\n') {
                write!(stdout, "[term {unit}] ")?;
                stdout.write_all(line)?;
            }
        }
        stdout.flush()
    }
}
