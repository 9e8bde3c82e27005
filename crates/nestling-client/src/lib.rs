#![doc = include_str!("../README.md")]

mod client;
mod messages;
mod prompt;

pub use client::{AnalysisBackend, ClientConfig, CloudAnalysisClient};
pub use messages::*;
pub use prompt::build_messages;
