use crate::error::{Error, ErrorKind};

pub type Result<T> = std::result::Result<T, Error>;

/// Returns `InvalidArgument` naming the argument and the violated condition unless the
/// condition holds.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        if !$expr {
            return Err($crate::result::argument_violation(
                stringify!($name),
                stringify!($expr),
            ));
        }
    }};
}

/// Returns a `Schema` error naming the schema element and the violated condition unless
/// the condition holds.
#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        if !$expr {
            return Err($crate::result::schema_violation(
                stringify!($name),
                stringify!($expr),
            ));
        }
    }};
}

#[cold]
pub fn argument_violation(name: &str, condition: &str) -> Error {
    ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: format!("expected {condition}"),
    }
    .into()
}

#[cold]
pub fn schema_violation(element: &str, condition: &str) -> Error {
    ErrorKind::Schema {
        message: format!("{element}: {condition} does not hold"),
    }
    .into()
}
