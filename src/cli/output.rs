//! Command result rendering
//!
//! Every settle command produces a machine-readable value alongside a
//! human rendering of it; the global `--format` flag decides which one
//! reaches stdout. Text mode prints whatever the command considers its
//! natural shape (a DOT listing for `graph`, tab-separated plan rows for
//! `check`). JSON mode always emits exactly one document on one line so
//! the output can be piped straight into a parser.

use serde::Serialize;

/// Wire format selected by the global `--format` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-oriented lines
    #[default]
    Text,
    /// A single JSON document
    Json,
}

/// Renders command results in the selected format
pub struct Printer {
    format: OutputFormat,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Emits a command result: the text rendering verbatim, or the value
    /// serialized as one JSON document. The text closure only runs in
    /// text mode, so commands can defer building the human rendering.
    pub fn render<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) {
        match self.format {
            OutputFormat::Text => print!("{}", text()),
            OutputFormat::Json => {
                if let Ok(doc) = serde_json::to_string(value) {
                    println!("{}", doc);
                }
            }
        }
    }
}
