use crate::span::Span;
use std::sync::Arc;
use thiserror::Error;

pub type EidosResult<T> = std::result::Result<T, EidosError>;

/// Every failure in the core surfaces as one of these kinds. In embedded use
/// the error propagates to the host as a normal `Err`; the CLI converts it to
/// a process exit with a caret diagnostic (see `termination`).
#[derive(Error, Debug, Clone)]
pub enum EidosError {
    #[error("ERROR ({site}): {message}")]
    Lex {
        site: &'static str,
        message: String,
        span: Option<Span>,
    },

    #[error("ERROR ({site}): {message}")]
    Parse {
        site: &'static str,
        message: String,
        span: Option<Span>,
    },

    #[error("ERROR ({site}): undefined identifier {name}.")]
    UndefinedIdentifier {
        site: &'static str,
        name: Arc<String>,
        span: Option<Span>,
    },

    #[error("ERROR ({site}): identifier '{name}' cannot be redefined because it is a constant.")]
    RedefinitionOfConstant {
        site: &'static str,
        name: Arc<String>,
        span: Option<Span>,
    },

    #[error("ERROR ({site}): {message}")]
    Type {
        site: &'static str,
        message: String,
        span: Option<Span>,
    },

    #[error("ERROR ({site}): {message}")]
    LengthMismatch {
        site: &'static str,
        message: String,
        span: Option<Span>,
    },

    #[error("ERROR ({site}): {message}")]
    IndexOutOfRange {
        site: &'static str,
        message: String,
        span: Option<Span>,
    },

    #[error("ERROR ({site}): {message}")]
    InvalidAssignmentTarget {
        site: &'static str,
        message: String,
        span: Option<Span>,
    },

    #[error("ERROR ({site}): {message}")]
    Runtime {
        site: &'static str,
        message: String,
        span: Option<Span>,
    },

    #[error("ERROR ({site}): (internal error) {message}")]
    Internal {
        site: &'static str,
        message: String,
        span: Option<Span>,
    },
}

impl EidosError {
    pub fn lex(site: &'static str, message: impl Into<String>, span: Span) -> Self {
        EidosError::Lex {
            site,
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn parse(site: &'static str, message: impl Into<String>, span: Span) -> Self {
        EidosError::Parse {
            site,
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn undefined_identifier(site: &'static str, name: Arc<String>) -> Self {
        EidosError::UndefinedIdentifier {
            site,
            name,
            span: None,
        }
    }

    pub fn redefinition_of_constant(site: &'static str, name: Arc<String>) -> Self {
        EidosError::RedefinitionOfConstant {
            site,
            name,
            span: None,
        }
    }

    pub fn type_error(site: &'static str, message: impl Into<String>) -> Self {
        EidosError::Type {
            site,
            message: message.into(),
            span: None,
        }
    }

    pub fn length_mismatch(site: &'static str, message: impl Into<String>) -> Self {
        EidosError::LengthMismatch {
            site,
            message: message.into(),
            span: None,
        }
    }

    pub fn index_out_of_range(site: &'static str, message: impl Into<String>) -> Self {
        EidosError::IndexOutOfRange {
            site,
            message: message.into(),
            span: None,
        }
    }

    pub fn invalid_assignment_target(site: &'static str, message: impl Into<String>) -> Self {
        EidosError::InvalidAssignmentTarget {
            site,
            message: message.into(),
            span: None,
        }
    }

    pub fn runtime(site: &'static str, message: impl Into<String>) -> Self {
        EidosError::Runtime {
            site,
            message: message.into(),
            span: None,
        }
    }

    pub fn internal(site: &'static str, message: impl Into<String>) -> Self {
        EidosError::Internal {
            site,
            message: message.into(),
            span: None,
        }
    }

    /// The source span this error is annotated with, if any.
    pub fn span(&self) -> Option<Span> {
        match self {
            EidosError::Lex { span, .. }
            | EidosError::Parse { span, .. }
            | EidosError::UndefinedIdentifier { span, .. }
            | EidosError::RedefinitionOfConstant { span, .. }
            | EidosError::Type { span, .. }
            | EidosError::LengthMismatch { span, .. }
            | EidosError::IndexOutOfRange { span, .. }
            | EidosError::InvalidAssignmentTarget { span, .. }
            | EidosError::Runtime { span, .. }
            | EidosError::Internal { span, .. } => *span,
        }
    }

    /// Annotate with `new_span` unless a more specific (inner) span is
    /// already attached. Callers push spans outside-in as errors unwind, so
    /// the innermost annotation wins.
    pub fn with_span(mut self, new_span: Span) -> Self {
        let slot = match &mut self {
            EidosError::Lex { span, .. }
            | EidosError::Parse { span, .. }
            | EidosError::UndefinedIdentifier { span, .. }
            | EidosError::RedefinitionOfConstant { span, .. }
            | EidosError::Type { span, .. }
            | EidosError::LengthMismatch { span, .. }
            | EidosError::IndexOutOfRange { span, .. }
            | EidosError::InvalidAssignmentTarget { span, .. }
            | EidosError::Runtime { span, .. }
            | EidosError::Internal { span, .. } => span,
        };

        if slot.is_none() {
            *slot = Some(new_span);
        }
        self
    }
}

impl From<std::io::Error> for EidosError {
    fn from(err: std::io::Error) -> Self {
        EidosError::runtime("io", err.to_string())
    }
}
