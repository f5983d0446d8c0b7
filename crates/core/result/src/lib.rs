#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

#[cfg(feature = "axum")]
pub mod axum;

/// Result type with custom Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error information
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Error {
    /// Type of error and additional information
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub error_type: ErrorType,

    /// Where this error occurred
    pub location: String,
}

/// Possible error types
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
#[derive(Debug, Clone)]
pub enum ErrorType {
    /// This error was not labeled :(
    LabelMe,

    // ? Submission related errors
    FailedValidation {
        error: String,
    },
    DuplicateLocation,
    FileTooSmall,
    FileTooLarge {
        max: usize,
    },
    FileTypeNotAllowed,

    // ? Moderation related errors
    InvalidTransition {
        from: String,
        to: String,
    },
    NotFound,

    // ? Upstream collaborator errors
    /// The image classifier could not produce a usable answer.
    /// Absorbed by the verification gate's fallback policy, never
    /// surfaced to a submitting caller.
    ClassifierUnavailable,
    /// An alert channel failed to deliver. Recorded per channel in the
    /// dispatch outcome, never fatal to a submission.
    DispatchFailed {
        channel: String,
    },
    WeatherUnavailable,

    // ? Authentication errors
    NotAuthenticated,
    InvalidCredentials,

    // ? General errors
    DatabaseError {
        operation: String,
        collection: String,
    },
    InternalError,
}

#[macro_export]
macro_rules! create_error {
    ( $error: ident $( $tt:tt )? ) => {
        $crate::Error {
            error_type: $crate::ErrorType::$error $( $tt )?,
            location: format!("{}:{}:{}", file!(), line!(), column!()),
        }
    };
}

#[macro_export]
macro_rules! create_database_error {
    ( $operation: expr, $collection: expr ) => {
        create_error!(DatabaseError {
            operation: $operation.to_string(),
            collection: $collection.to_string()
        })
    };
}

#[macro_export]
#[cfg(debug_assertions)]
macro_rules! query {
    ( $self: ident, $type: ident, $collection: expr, $($rest:expr),+ ) => {
        Ok($self.$type($collection, $($rest),+).await.unwrap())
    };
}

#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! query {
    ( $self: ident, $type: ident, $collection: expr, $($rest:expr),+ ) => {
        $self.$type($collection, $($rest),+).await
            .map_err(|_| create_database_error!(stringify!($type), $collection))
    };
}

#[cfg(test)]
mod tests {
    use crate::ErrorType;

    #[test]
    fn use_macro_to_construct_error() {
        let error = create_error!(DuplicateLocation);
        assert!(matches!(error.error_type, ErrorType::DuplicateLocation));
    }

    #[test]
    fn use_macro_to_construct_complex_error() {
        let error = create_error!(InvalidTransition {
            from: "rejected".to_string(),
            to: "resolved".to_string()
        });
        assert!(matches!(
            error.error_type,
            ErrorType::InvalidTransition { .. }
        ));
    }
}
