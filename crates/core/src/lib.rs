#![forbid(unsafe_code)]

pub mod catalog;
pub mod model;
pub mod scoring;
pub mod stats;
pub mod time;

pub use time::Clock;
