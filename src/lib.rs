//! fsod-runner - few-shot object detection experiment orchestration
//!
//! Sequences the external detection framework's entry points (base training,
//! model surgery, config generation, fine-tuning, result extraction) and its
//! split sampler. Everything substantive happens in those programs; this crate
//! decides what runs, with which paths, and what is cleaned up afterwards.

pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod sampler;
pub mod template;

pub use error::{Result, RunnerError};
