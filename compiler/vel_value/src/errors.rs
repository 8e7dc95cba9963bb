//! Status codes and error constructors.
//!
//! A [`Status`] is both the failure type of fallible runtime operations and
//! the payload of error values that flow through evaluation. Constructors for
//! every recurring condition live here so messages stay consistent.
//!
//! # Error Codes
//!
//! | code                 | raised for                                        |
//! |----------------------|---------------------------------------------------|
//! | `InvalidArgument`    | bad map keys, type conversions, malformed input   |
//! | `FailedPrecondition` | iteration-variable access without a frame         |
//! | `Internal`           | stack imbalance, bad jumps, budget exhaustion     |
//! | `Unimplemented`      | conversions with no counterpart                   |
//! | `NotFound`           | missing fields, deserializers and keys            |
//! | `AlreadyExists`      | duplicate map keys                                |
//! | `OutOfRange`         | index and numeric range failures                  |
//! | `Unknown`            | overload resolution and host failures             |

use std::fmt;
use std::sync::Arc;

/// Canonical status codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    InvalidArgument,
    FailedPrecondition,
    Internal,
    Unimplemented,
    NotFound,
    AlreadyExists,
    OutOfRange,
    Unknown,
}

impl StatusCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::FailedPrecondition => "FAILED_PRECONDITION",
            StatusCode::Internal => "INTERNAL",
            StatusCode::Unimplemented => "UNIMPLEMENTED",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::AlreadyExists => "ALREADY_EXISTS",
            StatusCode::OutOfRange => "OUT_OF_RANGE",
            StatusCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure with a code and a message. Cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Status {
    code: StatusCode,
    message: Arc<str>,
}

/// Result type used across the runtime.
pub type Result<T, E = Status> = std::result::Result<T, E>;

impl Status {
    pub fn new(code: StatusCode, message: impl Into<Arc<str>>) -> Self {
        Status {
            code,
            message: message.into(),
        }
    }

    #[inline]
    pub fn code(&self) -> StatusCode {
        self.code
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn is_unimplemented(&self) -> bool {
        self.code == StatusCode::Unimplemented
    }
}

// Generic constructors

#[cold]
pub fn invalid_argument(message: impl Into<Arc<str>>) -> Status {
    Status::new(StatusCode::InvalidArgument, message)
}

#[cold]
pub fn failed_precondition(message: impl Into<Arc<str>>) -> Status {
    Status::new(StatusCode::FailedPrecondition, message)
}

#[cold]
pub fn internal(message: impl Into<Arc<str>>) -> Status {
    Status::new(StatusCode::Internal, message)
}

#[cold]
pub fn unimplemented(message: impl Into<Arc<str>>) -> Status {
    Status::new(StatusCode::Unimplemented, message)
}

#[cold]
pub fn not_found(message: impl Into<Arc<str>>) -> Status {
    Status::new(StatusCode::NotFound, message)
}

#[cold]
pub fn out_of_range(message: impl Into<Arc<str>>) -> Status {
    Status::new(StatusCode::OutOfRange, message)
}

#[cold]
pub fn unknown(message: impl Into<Arc<str>>) -> Status {
    Status::new(StatusCode::Unknown, message)
}

// Containers

#[cold]
pub fn duplicate_key_error() -> Status {
    Status::new(StatusCode::AlreadyExists, "duplicate key in map")
}

#[cold]
pub fn invalid_map_key_type(type_name: &str) -> Status {
    invalid_argument(format!("Invalid map key type: '{type_name}'"))
}

#[cold]
pub fn no_such_key(key: &str) -> Status {
    not_found(format!("Key not found in map : {key}"))
}

#[cold]
pub fn no_such_field(field: &str) -> Status {
    if field.is_empty() {
        not_found("no_such_field")
    } else {
        not_found(format!("no_such_field : {field}"))
    }
}

#[cold]
pub fn duplicate_field(field: &str, type_name: &str) -> Status {
    invalid_argument(format!("duplicate field '{field}' in struct {type_name}"))
}

#[cold]
pub fn index_out_of_bounds(index: i64, size: usize) -> Status {
    out_of_range(format!("index {index} out of bounds for list of size {size}"))
}

#[cold]
pub fn type_conversion_error(from: &str, to: &str) -> Status {
    invalid_argument(format!("type conversion error from '{from}' to '{to}'"))
}

// Functions and arithmetic

#[cold]
pub fn no_matching_overload(function: &str) -> Status {
    unknown(format!("No matching overloads found : {function}"))
}

#[cold]
pub fn division_by_zero() -> Status {
    invalid_argument("divide by zero")
}

#[cold]
pub fn modulus_by_zero() -> Status {
    invalid_argument("modulus by zero")
}

#[cold]
pub fn integer_overflow() -> Status {
    out_of_range("integer overflow")
}

// Evaluation

#[cold]
pub fn no_such_variable(name: &str) -> Status {
    unknown(format!("No value with name \"{name}\" found in Activation"))
}

#[cold]
pub fn missing_attribute(path: &str) -> Status {
    invalid_argument(format!("MissingAttributeError: {path}"))
}

#[cold]
pub fn invalid_iteration_state() -> Status {
    failed_precondition("invalid iteration state")
}

#[cold]
pub fn stack_error() -> Status {
    internal("stack error during evaluation")
}
