use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn out_of_range(index: u64, len: u64) -> Error {
        Error(ErrorKind::OutOfRange { index, len }.into())
    }

    pub fn schema_mismatch(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::SchemaMismatch {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn precond_violation(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::PrecondViolation {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn ingest_after_drain() -> Error {
        Error(ErrorKind::IngestAfterDrain.into())
    }

    pub fn invalid_format(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn scratch(context: impl Into<String>, message: impl ToString) -> Error {
        Error(
            ErrorKind::Scratch {
                context: context.into(),
                message: message.to_string(),
            }
            .into(),
        )
    }

    /// Returns `true` for contract violations that indicate a programming error
    /// rather than a data or environment problem.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::OutOfRange { .. }
                | ErrorKind::PrecondViolation { .. }
                | ErrorKind::IngestAfterDrain
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("index {index} is out of range for a store of {len} records")]
    OutOfRange { index: u64, len: u64 },

    #[error("schema mismatch for '{element}': {message}")]
    SchemaMismatch { element: String, message: String },

    #[error("precondition violated: {message}")]
    PrecondViolation { message: String },

    #[error("insert after the sorter has been drained")]
    IngestAfterDrain,

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("scratch store error for '{context}': {message}")]
    Scratch { context: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}
