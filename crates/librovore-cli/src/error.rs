//! CLI error rendering.
//!
//! Per spec §6/§7: the CLI returns exit code 0 on success and 1 on any
//! surfaced error, printing one human-formatted line before exiting. There
//! is no richer exit-code taxonomy in this spec; every `librovore_core::Error`
//! maps to the same exit code, distinguished only by its printed category.

use std::fmt;

use librovore_core::Error as CoreError;

/// Wraps a [`CoreError`] with the one-line rendering the CLI prints on
/// failure (spec §7 "User-visible failure").
#[derive(Debug)]
pub struct CliError(pub CoreError);

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error[{}]: {}", self.0.category(), self.0)?;
        write!(f, "  suggestion: {}", self.0.suggestion())
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_category_and_suggestion() {
        let err = CliError(CoreError::ProcessorInavailability {
            subject: "https://example.com".into(),
        });
        let rendered = err.to_string();
        assert!(rendered.contains("ProcessorInavailability"));
        assert!(rendered.contains("suggestion:"));
    }
}
