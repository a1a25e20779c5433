//! Tencent Cloud error codes and their retry classification

use crate::error::{client_codes, SdkError};
use tfretry::{code_matches, Classification, ClassifiedError, CodeClassifier};

/// Codes retried by every read and write
pub const RETRYABLE_ERROR_CODES: &[&str] = &[
    // client
    client_codes::NETWORK_ERROR,
    client_codes::HTTP_STATUS_CODE_ERROR,
    // common
    "FailedOperation",
    "TradeUnknownError",
    "RequestLimitExceeded",
    "ResourceInUse",
    "ResourceInsufficient",
    "ResourceUnavailable",
    "InternalError",
    // cbs
    "ResourceBusy",
];

/// Codes meaning the target resource no longer exists
pub const NOT_FOUND_ERROR_CODES: &[&str] = &[
    "ResourceNotFound",
    "InvalidParameter.NotFound",
    "InvalidParameterValue.NotFound",
];

/// Returns whether `err` carries one of `codes`, by full or short code
pub fn is_expect_error(err: &SdkError, codes: &[&str]) -> bool {
    code_matches(&err.code, codes)
}

/// Classifier for mutations: retryable codes plus `additional`, minus `stop`
///
/// `stop` wins over every retryable code, so `ResourceInUse.NameExists` can
/// end a create while other `ResourceInUse` sub-codes are still retried.
/// Not-found codes stay fatal here, a write against a missing target fails.
pub fn classifier(additional: &[&str], stop: &[&str]) -> CodeClassifier {
    CodeClassifier::new()
        .with_retryable(RETRYABLE_ERROR_CODES.iter().copied())
        .with_retryable(additional.iter().copied())
        .with_non_retryable(stop.iter().copied())
}

/// Classifier for reads and destroy verification, where absence is an answer
pub fn not_found_classifier() -> CodeClassifier {
    classifier(&[], &[]).with_not_found(NOT_FOUND_ERROR_CODES.iter().copied())
}

/// Tag `err` as retryable or not, allowing extra retryable codes per call
pub fn retry_error(err: SdkError, additional: &[&str]) -> ClassifiedError<SdkError> {
    let kind = classifier(additional, &[]).classify_code(Some(&err.code));
    match kind {
        Classification::Retryable => tracing::warn!("Retryable error: {}", err),
        _ => tracing::error!("NonRetryable error: {}", err),
    }
    ClassifiedError::new(kind, err)
}
