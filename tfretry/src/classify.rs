//! Error classification for retry decisions
//!
//! An operation attempt fails with an error that must be sorted into one of
//! three buckets before the executor can act on it. Classification is either
//! attached by the operation itself through [`ClassifiedError`], or computed
//! by an injected [`Classify`] predicate such as [`CodeClassifier`].

use std::fmt;

/// How the executor should react to a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Transient failure, try again while budget remains
    Retryable,
    /// Fatal failure, stop immediately and surface the error
    NonRetryable,
    /// The target is gone; treated as a successful absence
    NotFound,
}

/// An error tagged with its retry classification
#[derive(Debug)]
pub struct ClassifiedError<E> {
    kind: Classification,
    error: E,
}

impl<E> ClassifiedError<E> {
    pub fn new(kind: Classification, error: E) -> Self {
        Self { kind, error }
    }

    pub fn retryable(error: E) -> Self {
        Self::new(Classification::Retryable, error)
    }

    pub fn non_retryable(error: E) -> Self {
        Self::new(Classification::NonRetryable, error)
    }

    pub fn not_found(error: E) -> Self {
        Self::new(Classification::NotFound, error)
    }

    pub fn kind(&self) -> Classification {
        self.kind
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == Classification::Retryable
    }

    pub fn error(&self) -> &E {
        &self.error
    }

    pub fn into_inner(self) -> E {
        self.error
    }
}

impl<E: fmt::Display> fmt::Display for ClassifiedError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<E> std::error::Error for ClassifiedError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Pluggable retry predicate over a raw error type
pub trait Classify<E> {
    fn classify(&self, error: &E) -> Classification;

    /// Tag an error with this classifier's verdict
    fn tag(&self, error: E) -> ClassifiedError<E> {
        let kind = self.classify(&error);
        ClassifiedError::new(kind, error)
    }
}

impl<E, F> Classify<E> for F
where
    F: Fn(&E) -> Classification,
{
    fn classify(&self, error: &E) -> Classification {
        self(error)
    }
}

/// Errors carrying a machine-readable code such as `ResourceInUse.Listener`
pub trait ErrorCode {
    fn code(&self) -> Option<&str>;
}

/// Returns true if `code` or its short form (the segment before the first
/// `.`) appears in `codes`
pub fn code_matches<S: AsRef<str>>(code: &str, codes: &[S]) -> bool {
    if codes.iter().any(|c| c.as_ref() == code) {
        return true;
    }

    match code.split_once('.') {
        Some((short, _)) => codes.iter().any(|c| c.as_ref() == short),
        None => false,
    }
}

/// Classifies errors by matching their code against allow and stop lists
///
/// Precedence: stop list, then not-found codes, then retryable codes. Codes
/// matching none of the lists, and errors without a code, get the fallback.
#[derive(Debug, Clone)]
pub struct CodeClassifier {
    retryable: Vec<String>,
    non_retryable: Vec<String>,
    not_found: Vec<String>,
    fallback: Classification,
}

impl Default for CodeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeClassifier {
    pub fn new() -> Self {
        Self {
            retryable: Vec::new(),
            non_retryable: Vec::new(),
            not_found: Vec::new(),
            fallback: Classification::NonRetryable,
        }
    }

    /// Add codes that should be retried
    pub fn with_retryable<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Add codes that stop retrying regardless of the other lists
    pub fn with_non_retryable<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.non_retryable.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Add codes that mean the target no longer exists
    pub fn with_not_found<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_found.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Set the classification for unmatched or code-less errors
    pub fn with_fallback(mut self, fallback: Classification) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn classify_code(&self, code: Option<&str>) -> Classification {
        let Some(code) = code else {
            return self.fallback;
        };

        if code_matches(code, self.non_retryable.as_slice()) {
            Classification::NonRetryable
        } else if code_matches(code, self.not_found.as_slice()) {
            Classification::NotFound
        } else if code_matches(code, self.retryable.as_slice()) {
            Classification::Retryable
        } else {
            self.fallback
        }
    }
}

impl<E: ErrorCode> Classify<E> for CodeClassifier {
    fn classify(&self, error: &E) -> Classification {
        self.classify_code(error.code())
    }
}
