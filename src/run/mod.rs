// src/run/mod.rs
// =============================================================================
// Running the pipeline end to end and handing the outcome to a notifier.
// =============================================================================

mod messages;
mod notify;
mod orchestrator;

pub use notify::{ConsoleNotifier, GithubActionsNotifier, Notifier};
pub use orchestrator::{check, run, target_label, Pipeline, RunOutcome};
