//! Mapping SDK failures onto [`DynamoDBError`].

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use dynaquery_model::{DynamoDBError, DynamoDBErrorCode};

/// Convert an SDK operation error.
///
/// Service responses keep their reported code and message. Anything that
/// never produced a service response (dispatch, timeout, unparseable
/// response) becomes a transport error carrying the full error chain.
pub fn from_sdk_error<E, R>(err: SdkError<E, R>) -> DynamoDBError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    if let Some(service) = err.as_service_error() {
        let code = service.code().unwrap_or("Unknown");
        let message = match service.message() {
            Some(message) => format!("{code}: {message}"),
            None => code.to_owned(),
        };
        return DynamoDBError::with_message(DynamoDBErrorCode::from_service_code(code), message)
            .with_source(err);
    }
    let message = DisplayErrorContext(&err).to_string();
    DynamoDBError::transport(message).with_source(err)
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::error::ErrorMetadata;
    use aws_sdk_dynamodb::operation::query::QueryError;

    use super::*;

    fn service_error(code: &str, message: &str) -> SdkError<QueryError, ()> {
        let meta = ErrorMetadata::builder().code(code).message(message).build();
        SdkError::service_error(QueryError::generic(meta), ())
    }

    #[test]
    fn test_should_keep_service_error_code() {
        let err = from_sdk_error(service_error(
            "ResourceNotFoundException",
            "Requested resource not found",
        ));
        assert_eq!(err.code, DynamoDBErrorCode::ResourceNotFoundException);
        assert_eq!(
            err.message,
            "ResourceNotFoundException: Requested resource not found"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_should_map_unknown_service_code_to_internal_error() {
        let err = from_sdk_error(service_error("BrandNewException", "surprise"));
        assert_eq!(err.code, DynamoDBErrorCode::InternalServerError);
        assert!(err.message.starts_with("BrandNewException"));
    }

    #[test]
    fn test_should_treat_timeouts_as_transport_errors() {
        let err: SdkError<QueryError, ()> =
            SdkError::timeout_error(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        let err = from_sdk_error(err);
        assert_eq!(err.code, DynamoDBErrorCode::TransportError);
        assert!(err.code.is_transient());
    }
}
