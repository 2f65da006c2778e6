use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn schema(message: impl Into<String>) -> Error {
        ErrorKind::Schema {
            message: message.into(),
        }
        .into()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn unknown_column(name: impl Into<String>) -> Error {
        ErrorKind::UnknownColumn { name: name.into() }.into()
    }

    pub fn unknown_key(key: impl Into<String>) -> Error {
        ErrorKind::UnknownKey { key: key.into() }.into()
    }

    pub fn row_not_found(query: impl Into<String>) -> Error {
        ErrorKind::RowNotFound {
            query: query.into(),
        }
        .into()
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        ErrorKind::Io {
            context: context.into(),
            source,
        }
        .into()
    }

    pub fn arrow<E>(context: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ErrorKind::Arrow {
            context: context.into(),
            source: Box::new(source),
        }
        .into()
    }

    /// True for the caller-facing lookup failures (`UnknownColumn`, `UnknownKey`,
    /// `RowNotFound`).
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UnknownColumn { .. }
                | ErrorKind::UnknownKey { .. }
                | ErrorKind::RowNotFound { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("schema error: {message}")]
    Schema { message: String },

    #[error("row count mismatch: {actual} row(s) read; {expected} row(s) expected")]
    RowCountMismatch { expected: usize, actual: usize },

    #[error("cannot specify row range for a table without fixed-length rows")]
    UnsupportedRowRange,

    #[error(
        "record {row} is too short for column '{column}': {required} bytes or fields required, \
         {actual} available"
    )]
    RecordTooShort {
        row: usize,
        column: String,
        required: usize,
        actual: usize,
    },

    #[error("unknown column '{name}'")]
    UnknownColumn { name: String },

    #[error("unknown key '{key}'")]
    UnknownKey { key: String },

    #[error("row not found: {query}")]
    RowNotFound { query: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("Arrow error: {context}")]
    Arrow {
        context: String,
        source: StdErrorBoxed,
    },
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
