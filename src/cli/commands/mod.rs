//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod run;
mod transcript;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use run::{run_pipeline, save_output, RunOptions};
pub use transcript::run_transcript;
