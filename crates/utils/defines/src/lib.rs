#![no_std]

pub mod config;
pub mod error;
pub mod syscall;
