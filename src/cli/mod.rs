mod replay;
mod root;

pub use replay::{replay, OutputFormat, ReplayCommand, Scenario, StepReport};
pub use root::Cli;
