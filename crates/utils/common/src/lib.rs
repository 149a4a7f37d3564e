#![no_std]

pub mod constant;
