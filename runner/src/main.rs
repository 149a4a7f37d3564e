mod console;
mod run;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use run::RunArgs;
use virt_hw::Machine;

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Run(RunArgs),
    List,
}

fn main() -> anyhow::Result<ExitCode> {
    use Commands::*;
    match Cli::parse().command {
        Run(args) => {
            let code = args.run()?;
            // 退出码只保留低 8 位，与进程退出码一致
            Ok(ExitCode::from(code as u8))
        }
        List => {
            for program in user::programs::programs::<Machine>() {
                println!("{:<12}{}", program.name, program.about);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
