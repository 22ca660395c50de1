/// Archivis CLI: argument model, interactive naming prompt, reports and
/// command dispatch on top of `archivis-core`.
pub mod args;
pub mod commands;
pub mod prompt;
pub mod report;

pub use args::{Cli, Command, ScanArgs};
pub use commands::{run, run_with};
pub use prompt::LinePrompt;
