//! Clipboard access through the platform's clipboard command.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::QrDeckError;

/// Destination for copied text.
pub trait ClipboardWriter {
    fn write_text(&self, text: &str) -> Result<(), QrDeckError>;
}

/// Pipes text into the first clipboard tool that runs:
/// `wl-copy`, `xclip -selection clipboard`, then `pbcopy`.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    candidates: Vec<(String, Vec<String>)>,
}

impl Default for CommandClipboard {
    fn default() -> Self {
        let candidates = [
            ("wl-copy", &[][..]),
            ("xclip", &["-selection", "clipboard"][..]),
            ("pbcopy", &[][..]),
        ];
        Self {
            candidates: candidates
                .iter()
                .map(|(program, args)| {
                    (program.to_string(), args.iter().map(|a| a.to_string()).collect())
                })
                .collect(),
        }
    }
}

impl CommandClipboard {
    /// Use a single custom command instead of the platform list.
    pub fn with_command(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            candidates: vec![(program.into(), args.iter().map(|a| a.to_string()).collect())],
        }
    }

    fn pipe(program: &str, args: &[String], text: &str) -> Result<(), String> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("{}: {}", program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| format!("{}: {}", program, e))?;
        }

        let status = child.wait().map_err(|e| format!("{}: {}", program, e))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{} exited with {}", program, status))
        }
    }
}

impl ClipboardWriter for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<(), QrDeckError> {
        let mut failures = Vec::new();
        for (program, args) in &self.candidates {
            match Self::pipe(program, args, text) {
                Ok(()) => {
                    log::debug!("copied {} bytes with {}", text.len(), program);
                    return Ok(());
                }
                Err(e) => failures.push(e),
            }
        }
        Err(QrDeckError::Clipboard(format!(
            "no clipboard command worked ({})",
            failures.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_command_is_clipboard_error() {
        let clipboard = CommandClipboard::with_command("qrdeck-no-such-clipboard-tool", &[]);
        let err = clipboard.write_text("hello").unwrap_err();
        assert!(matches!(err, QrDeckError::Clipboard(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipes_into_command() {
        let clipboard = CommandClipboard::with_command("cat", &[]);
        clipboard.write_text("hello").unwrap();
    }

    #[test]
    fn test_default_order() {
        let clipboard = CommandClipboard::default();
        let names: Vec<&str> = clipboard
            .candidates
            .iter()
            .map(|(p, _)| p.as_str())
            .collect();
        assert_eq!(names, vec!["wl-copy", "xclip", "pbcopy"]);
    }
}
