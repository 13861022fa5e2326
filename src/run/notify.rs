// src/run/notify.rs
// =============================================================================
// Hand-off to whatever delivers the email.
//
// The checker does not send mail itself. In a workflow it publishes the
// outcome as step outputs / environment entries for the email action; on a
// terminal it prints the message.
// =============================================================================

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::NotifyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub attachment: Option<PathBuf>,
    pub broken_attachment: Option<PathBuf>,
    pub recipients: Vec<String>,
    pub broken_links_found: bool,
}

pub trait Notifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Appends `key=value` lines to `$GITHUB_OUTPUT` and `$GITHUB_ENV`.
#[derive(Debug, Clone)]
pub struct GithubActionsNotifier {
    output_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

impl GithubActionsNotifier {
    pub fn new(output_file: Option<PathBuf>, env_file: Option<PathBuf>) -> Self {
        Self {
            output_file,
            env_file,
        }
    }

    /// `None` outside a workflow run.
    pub fn from_env() -> Option<Self> {
        let output_file = std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from);
        let env_file = std::env::var_os("GITHUB_ENV").map(PathBuf::from);
        if output_file.is_none() && env_file.is_none() {
            return None;
        }
        Some(Self::new(output_file, env_file))
    }
}

// Values must stay on one line for the key=value file format
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn append_lines(path: &Path, lines: &[(&str, String)]) -> Result<(), NotifyError> {
    let to_error = |source| NotifyError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)?;
    for (key, value) in lines {
        writeln!(file, "{}={}", key, single_line(value)).map_err(to_error)?;
    }
    Ok(())
}

fn path_value(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

impl Notifier for GithubActionsNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if let Some(path) = &self.output_file {
            append_lines(
                path,
                &[("broken_links_found", notification.broken_links_found.to_string())],
            )?;
        }

        if let Some(path) = &self.env_file {
            append_lines(
                path,
                &[
                    ("STATUS_MESSAGE", notification.body.clone()),
                    ("EMAIL_SUBJECT", notification.subject.clone()),
                    ("REPORT_FILE", path_value(&notification.attachment)),
                    ("REPORT_BROKEN_FILE", path_value(&notification.broken_attachment)),
                    ("RECIPIENTS", notification.recipients.join(",")),
                ],
            )?;
        }

        Ok(())
    }
}

/// Prints the notification on stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        println!("\n📧 {}", notification.subject);
        println!("   {}", notification.body);
        if let Some(path) = &notification.attachment {
            println!("   📎 {}", path.display());
        }
        if !notification.recipients.is_empty() {
            println!("   To: {}", notification.recipients.join(", "));
        }
        Ok(())
    }
}
