//! 错误类型：致命错误与带定位信息的上下文。

use crate::transport::TransportError;
use thiserror::Error;

/// Where a configuration or input problem was found.
///
/// Every field is optional; the display form lists only the ones set, e.g.
/// `(field: settings.batch_size, details: must be at least 1, source: pipeline_settings)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Settings key, env var or CLI flag: `settings.http_timeout`, `env.GITHUB_REPOSITORY`, `--category`.
    pub field_path: Option<String>,
    /// What was expected, or what was available instead.
    pub details: Option<String>,
    /// Loader that raised it: `config`, `pipeline_settings`, `issue_kinds`, `discussions`.
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the seeder.
///
/// Per-item creation failures are *not* errors: they travel as
/// [`crate::client::CreateFailure`] values so the pipeline can keep going.
/// This type covers everything that stops an operation outright.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("GraphQL error: {message}")]
    GraphQl { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let parts: Vec<String> = [
        ("field", &ctx.field_path),
        ("details", &ctx.details),
        ("source", &ctx.source),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label}: {v}")))
    .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Bad credentials, settings or kind definitions. Always fatal.
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Input that loaded but cannot be used: no issues, unknown category.
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Whether this error must abort the run before any request is sent.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }
}
