//! Error types for ddbctl.
//!
//! This module maps AWS SDK errors to [`Error`] by matching typed `SdkError`
//! variants and service error codes.

use aws_sdk_dynamodb::error::{BuildError, ProvideErrorMetadata, SdkError};
use thiserror::Error;

use crate::Item;
use crate::waiter::WaitError;

/// Errors raised by table, index and item call-throughs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    ResourceNotFound(String),

    #[error("{0}")]
    ResourceInUse(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// The condition expression evaluated to false. Carries the existing item
    /// when the request asked for it.
    #[error("the condition expression evaluated to false")]
    ConditionalCheckFailed { item: Option<Item> },

    #[error("transaction was canceled: {0}")]
    TransactionCanceled(String),

    #[error("{0}")]
    Throttled(String),

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    Credentials(String),

    #[error("{0}")]
    Connection(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("gave up waiting after {attempts} attempts")]
    WaitTimeout { attempts: u32 },

    #[error("{0}")]
    Service(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Error::Validation(format!("failed to build request: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<WaitError<Error>> for Error {
    fn from(err: WaitError<Error>) -> Self {
        match err {
            WaitError::Timeout { attempts } => Error::WaitTimeout { attempts },
            WaitError::Fetch { source, .. } => source,
        }
    }
}

// ========== TYPED ERROR MAPPING ==========

/// Map non-service `SdkError` variants (dispatch failures, timeouts, etc.).
///
/// Returns `Some(Error)` for non-service errors, `None` for `ServiceError`.
fn map_outer_sdk_error<E, R>(err: &SdkError<E, R>) -> Option<Error>
where
    E: std::fmt::Debug,
    R: std::fmt::Debug,
{
    match err {
        SdkError::DispatchFailure(dispatch) => {
            if dispatch.is_timeout() {
                Some(Error::Connection(
                    "Connection timed out to DynamoDB. Check your network or endpoint.".into(),
                ))
            } else if dispatch.is_io() {
                Some(Error::Connection(
                    "Connection failed to DynamoDB (I/O error). Check if the endpoint is reachable."
                        .into(),
                ))
            } else {
                Some(Error::Connection(
                    "Connection failed to DynamoDB. Check if the endpoint is reachable.".into(),
                ))
            }
        }
        SdkError::TimeoutError(_) => Some(Error::Connection(
            "Connection timed out to DynamoDB. Check your network or endpoint.".into(),
        )),
        SdkError::ConstructionFailure(err) => {
            let msg = format!("{:?}", err);
            if msg.contains("credentials")
                || msg.contains("Credentials")
                || msg.contains("NoCredentialsError")
            {
                Some(Error::Credentials(
                    "No AWS credentials found. Configure credentials via environment variables \
                    (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY), AWS profile, or IAM role."
                        .into(),
                ))
            } else {
                Some(Error::Validation(format!("Failed to build request: {}", msg)))
            }
        }
        SdkError::ResponseError(err) => Some(Error::Service(format!(
            "Invalid response from DynamoDB: {:?}",
            err
        ))),
        SdkError::ServiceError(_) => None,
        _ => Some(Error::Service(format!(
            "Unknown error from DynamoDB: {:?}",
            err
        ))),
    }
}

/// Map credential, permission and throttling codes.
///
/// Returns `None` if the code needs DynamoDB-specific handling.
fn map_common_service_code(code: Option<&str>, message: Option<&str>) -> Option<Error> {
    let code = code?;

    match code {
        "UnrecognizedClientException" => Some(Error::Credentials(
            "Invalid AWS credentials. Check your access key and secret.".into(),
        )),
        "InvalidAccessKeyId" => Some(Error::Credentials(
            "Invalid AWS access key ID. Check your credentials.".into(),
        )),
        "SignatureDoesNotMatch" => Some(Error::Credentials(
            "AWS signature mismatch. Check your secret access key.".into(),
        )),
        "ExpiredTokenException" | "ExpiredToken" => Some(Error::Credentials(
            "AWS credentials have expired. Refresh your session token.".into(),
        )),
        "AccessDeniedException" | "AccessDenied" => {
            let msg = message.unwrap_or("Check your IAM permissions.");
            Some(Error::AccessDenied(format!(
                "Access denied to DynamoDB: {}",
                msg
            )))
        }
        "ProvisionedThroughputExceededException"
        | "LimitExceededException"
        | "RequestLimitExceeded"
        | "ThrottlingException" => Some(Error::Throttled(
            "DynamoDB request rate too high. Try again later.".into(),
        )),
        _ => None,
    }
}

/// Map a DynamoDB service error code + message to an [`Error`].
fn map_dynamodb_code(
    code: Option<&str>,
    message: Option<&str>,
    display: &str,
    table: Option<&str>,
) -> Error {
    if let Some(err) = map_common_service_code(code, message) {
        return err;
    }

    match code {
        Some("ResourceNotFoundException") => {
            let msg = if let Some(t) = table {
                format!("Table '{}' not found", t)
            } else {
                "Resource not found".to_string()
            };
            Error::ResourceNotFound(msg)
        }
        Some("ResourceInUseException") => {
            let msg = if let Some(t) = table {
                format!("Table '{}' is in use", t)
            } else {
                "Resource already in use".to_string()
            };
            Error::ResourceInUse(msg)
        }
        Some("ValidationException") => Error::Validation(message.unwrap_or(display).to_string()),
        Some("ConditionalCheckFailedException") => Error::ConditionalCheckFailed { item: None },
        Some("TransactionCanceledException") => Error::TransactionCanceled(
            message.unwrap_or("Transaction was canceled").to_string(),
        ),
        Some("ItemCollectionSizeLimitExceededException") => {
            Error::Validation("Item collection size limit exceeded".into())
        }
        Some("BackupInUseException") => {
            Error::ResourceInUse(message.unwrap_or("Backup already in progress").to_string())
        }
        Some("TableNotFoundException") => {
            Error::ResourceNotFound(message.unwrap_or(display).to_string())
        }
        _ => Error::Service(message.unwrap_or(display).to_string()),
    }
}

/// Map DynamoDB errors using typed `SdkError` variants.
///
/// For `ServiceError`, uses `ProvideErrorMetadata` to get the error code and message
/// instead of parsing debug strings.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>, table: Option<&str>) -> Error
where
    E: ProvideErrorMetadata + std::fmt::Debug + std::fmt::Display,
    R: std::fmt::Debug,
{
    if let Some(mapped) = map_outer_sdk_error(&err) {
        return mapped;
    }

    if let Some(service_err) = err.as_service_error() {
        let meta = ProvideErrorMetadata::meta(service_err);
        return map_dynamodb_code(meta.code(), meta.message(), &service_err.to_string(), table);
    }

    Error::Service(format!("Unexpected DynamoDB error: {:?}", err))
}

/// Map DynamoDB errors, attaching the existing item to a failed condition check.
pub fn map_sdk_error_with_item<E, R>(
    err: SdkError<E, R>,
    table: Option<&str>,
    item: Option<Item>,
) -> Error
where
    E: ProvideErrorMetadata + std::fmt::Debug + std::fmt::Display,
    R: std::fmt::Debug,
{
    match map_sdk_error(err, table) {
        Error::ConditionalCheckFailed { .. } => Error::ConditionalCheckFailed { item },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_not_found_names_the_table() {
        let err = map_dynamodb_code(
            Some("ResourceNotFoundException"),
            None,
            "not found",
            Some("music-test"),
        );
        assert!(matches!(&err, Error::ResourceNotFound(msg) if msg == "Table 'music-test' not found"));
    }

    #[test]
    fn throttling_codes_share_one_variant() {
        for code in ["ProvisionedThroughputExceededException", "ThrottlingException"] {
            let err = map_dynamodb_code(Some(code), None, "", None);
            assert!(matches!(err, Error::Throttled(_)), "{code}");
        }
    }

    #[test]
    fn access_denied_keeps_service_message() {
        let err = map_dynamodb_code(
            Some("AccessDeniedException"),
            Some("not authorized to perform dynamodb:PutItem"),
            "",
            None,
        );
        assert_eq!(
            err.to_string(),
            "Access denied to DynamoDB: not authorized to perform dynamodb:PutItem"
        );
    }

    #[test]
    fn unknown_code_falls_back_to_display() {
        let err = map_dynamodb_code(Some("SomethingNew"), None, "raw display", None);
        assert!(matches!(&err, Error::Service(msg) if msg == "raw display"));
    }
}
