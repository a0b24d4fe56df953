use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepeatError {
    #[error("failed to {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to {context}: {message}")]
    Parse {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    /// An internal contract was broken, e.g. a banded matrix was addressed
    /// outside its admissible band.
    #[error("internal invariant violated in {context}: {message}")]
    Invariant {
        context: &'static str,
        message: String,
    },
}

impl RepeatError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn parse(context: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            context,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn invariant(context: &'static str, message: impl Into<String>) -> Self {
        Self::Invariant {
            context,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message_is_prefixed() {
        let err = RepeatError::invalid_input("signal is empty");
        assert_eq!(err.to_string(), "invalid input: signal is empty");
    }

    #[test]
    fn invariant_names_its_context() {
        let err = RepeatError::invariant("score matrix", "cell (3, 1) outside band");
        assert_eq!(
            err.to_string(),
            "internal invariant violated in score matrix: cell (3, 1) outside band"
        );
    }

    #[test]
    fn io_error_keeps_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = RepeatError::io("read signal file", source);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "failed to read signal file: gone");
    }
}
