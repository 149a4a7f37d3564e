#![cfg_attr(not(test), no_std)]

mod gate;
mod kspin;
mod semaphore;

pub use gate::Gate;
pub use kspin::{SpinMutex, SpinMutexGuard};
pub use semaphore::Semaphore;
pub use spin::{Lazy, Once};
