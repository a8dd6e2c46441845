//! Result aggregation: ordered successes or one error describing every failure.

use std::fmt;
use thiserror::Error;

use super::descriptor::RequestDescriptor;

/// Every failed attempt of a single request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RequestError<E: fmt::Debug> {
    /// Position of the request in the original input.
    pub index: usize,
    /// Raw attempt failures, oldest first.
    pub errors: Vec<E>,
    message: String,
}

impl<E: fmt::Debug + fmt::Display> RequestError<E> {
    pub fn new(index: usize, errors: Vec<E>) -> Self {
        let message = format!(
            "Tried {} times but could not get successful result. {}",
            errors.len(),
            format_attempt_errors(&errors)
        );
        Self {
            index,
            errors,
            message,
        }
    }
}

impl<E: fmt::Debug> RequestError<E> {
    pub fn attempts(&self) -> usize {
        self.errors.len()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Call-level failure: at least one request exhausted its attempts.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Some requests are unprocessed.")]
pub struct AggregateError<R: fmt::Debug, E: fmt::Debug> {
    /// One entry per request that ended with failures, in input order.
    pub errors: Vec<RequestError<E>>,
    /// Payloads of every request that never completed successfully, in input order.
    pub unprocessed_requests: Vec<R>,
}

impl<R: fmt::Debug, E: fmt::Debug> AggregateError<R, E> {
    pub fn errors(&self) -> &[RequestError<E>] {
        &self.errors
    }

    pub fn unprocessed_requests(&self) -> &[R] {
        &self.unprocessed_requests
    }

    pub fn into_parts(self) -> (Vec<RequestError<E>>, Vec<R>) {
        (self.errors, self.unprocessed_requests)
    }
}

/// Render attempt failures as `"[1] first [2] second"`.
pub fn format_attempt_errors<E: fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("[{}] {}", i + 1, e))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reduce final descriptor state to the call outcome.
///
/// Descriptors are walked in index order whatever order they arrive in.
pub fn aggregate<R, T, E>(
    mut descriptors: Vec<RequestDescriptor<R, T, E>>,
) -> Result<Vec<T>, AggregateError<R, E>>
where
    R: fmt::Debug,
    E: fmt::Debug + fmt::Display,
{
    descriptors.sort_by_key(|d| d.index);

    let mut results = Vec::with_capacity(descriptors.len());
    let mut errors = Vec::new();
    let mut unprocessed_requests = Vec::new();

    for descriptor in descriptors {
        let RequestDescriptor {
            index,
            request,
            succeeded,
            result,
            attempt_errors,
        } = descriptor;

        if !attempt_errors.is_empty() {
            errors.push(RequestError::new(index, attempt_errors));
        } else if let Some(value) = result {
            results.push(value);
        }
        if !succeeded {
            unprocessed_requests.push(request);
        }
    }

    // Unattempted requests imply an earlier failure that paused admission.
    if errors.is_empty() && unprocessed_requests.is_empty() {
        Ok(results)
    } else {
        Err(AggregateError {
            errors,
            unprocessed_requests,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn succeeded(index: usize, request: &'static str, value: u32) -> RequestDescriptor<&'static str, u32, String> {
        RequestDescriptor {
            index,
            request,
            succeeded: true,
            result: Some(value),
            attempt_errors: Vec::new(),
        }
    }

    fn failed(index: usize, request: &'static str, errors: &[&str]) -> RequestDescriptor<&'static str, u32, String> {
        RequestDescriptor {
            index,
            request,
            succeeded: false,
            result: None,
            attempt_errors: errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_format_attempt_errors() {
        let errors = vec!["timeout", "connection reset"];
        assert_eq!(format_attempt_errors(&errors), "[1] timeout [2] connection reset");
        assert_eq!(format_attempt_errors::<String>(&[]), "");
    }

    #[test]
    fn test_request_error_message() {
        let err = RequestError::new(3, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.attempts(), 2);
        assert_eq!(
            err.to_string(),
            "Tried 2 times but could not get successful result. [1] a [2] b"
        );
        assert_eq!(err.index, 3);
    }

    #[test]
    fn test_all_succeeded_in_input_order() {
        let descriptors = vec![succeeded(2, "c", 30), succeeded(0, "a", 10), succeeded(1, "b", 20)];
        assert_eq!(aggregate(descriptors).unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn test_empty_set_succeeds() {
        let descriptors: Vec<RequestDescriptor<&str, u32, String>> = Vec::new();
        assert_eq!(aggregate(descriptors).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_failures_and_unprocessed() {
        let never_ran = RequestDescriptor::new(2, "c");
        let descriptors = vec![succeeded(0, "a", 10), failed(1, "b", &["boom"]), never_ran];
        let err = aggregate(descriptors).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].index, 1);
        assert_eq!(err.errors()[0].errors, vec!["boom".to_string()]);
        assert_eq!(err.unprocessed_requests(), &["b", "c"]);
        assert_eq!(err.to_string(), "Some requests are unprocessed.");
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let descriptors = vec![
            succeeded(0, "a", 1),
            failed(1, "b", &["x", "y"]),
            failed(2, "c", &["z"]),
        ];
        let first = aggregate(descriptors.clone());
        let second = aggregate(descriptors);
        assert_eq!(first, second);
    }

    #[test]
    fn test_into_parts() {
        let err = aggregate(vec![failed(0, "a", &["nope"])]).unwrap_err();
        let (errors, unprocessed) = err.into_parts();
        assert_eq!(errors.len(), 1);
        assert_eq!(unprocessed, vec!["a"]);
    }
}
