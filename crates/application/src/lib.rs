//! Application layer - The HAL core: tag store, poll loop, write dispatch

pub mod hal;

pub use hal::Hal;
