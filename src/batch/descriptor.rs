//! Per-request bookkeeping.

/// State of one input request across every attempt of a call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor<R, T, E> {
    /// Position in the original input.
    pub index: usize,
    pub request: R,
    pub succeeded: bool,
    /// Value of the latest successful attempt; `Some` iff `succeeded`.
    pub result: Option<T>,
    /// Failures since the last success, oldest first.
    pub attempt_errors: Vec<E>,
}

impl<R, T, E> RequestDescriptor<R, T, E> {
    pub fn new(index: usize, request: R) -> Self {
        Self {
            index,
            request,
            succeeded: false,
            result: None,
            attempt_errors: Vec::new(),
        }
    }

    pub fn from_record(index: usize, request: R, record: AttemptRecord<T, E>) -> Self {
        Self {
            index,
            request,
            succeeded: record.succeeded,
            result: record.result,
            attempt_errors: record.attempt_errors,
        }
    }

    pub fn is_unprocessed(&self) -> bool {
        !self.succeeded
    }
}

/// Mutable half of a descriptor, kept apart from the request while attempts
/// hold shared borrows of it.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord<T, E> {
    pub succeeded: bool,
    pub result: Option<T>,
    pub attempt_errors: Vec<E>,
    /// Total attempts made, successes included.
    pub attempts: u32,
}

impl<T, E> AttemptRecord<T, E> {
    pub fn new() -> Self {
        Self {
            succeeded: false,
            result: None,
            attempt_errors: Vec::new(),
            attempts: 0,
        }
    }

    pub fn record_success(&mut self, value: T) {
        self.attempts += 1;
        self.succeeded = true;
        self.result = Some(value);
        self.attempt_errors.clear();
    }

    pub fn record_failure(&mut self, error: E) {
        self.attempts += 1;
        self.attempt_errors.push(error);
    }
}

impl<T, E> Default for AttemptRecord<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
