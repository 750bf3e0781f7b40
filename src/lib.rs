#![forbid(unsafe_code)]

pub mod aligner;
pub mod annotations;
pub mod audio;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod process;
pub mod stimulus;
pub mod textgrid;
pub mod trial_info;
pub mod windows;

pub use error::{EaError, EaResult};
pub use model::{CueEvent, Interval, TaskKind, WindowMethod};
pub use orchestrator::{BatchReport, Engine};
