#![deny(rust_2018_idioms)]
#![deny(clippy::correctness)]
#![deny(clippy::perf)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod stats;
pub mod transaction;
