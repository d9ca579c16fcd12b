//! Partial-failure batch results.
//!
//! Batch operations keep going after an item fails. Each failure is
//! recorded next to the successes instead of aborting the batch.

use serde::Serialize;

use crate::error::{Error, ErrorCode};

/// One failed batch item.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// Identifier of the input item (template id, preset node name, ...)
    pub item: String,
    pub code: ErrorCode,
    pub reason: String,
}

impl BatchFailure {
    /// Record `err` as the failure of `item`.
    #[must_use]
    pub fn from_error(item: impl Into<String>, err: &Error) -> Self {
        Self {
            item: item.into(),
            code: err.error_code(),
            reason: err.to_string(),
        }
    }
}

/// Outcome of a batch: what succeeded and what failed, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<BatchFailure>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BatchResult<T> {
    pub fn push_ok(&mut self, value: T) {
        self.succeeded.push(value);
    }

    pub fn push_err(&mut self, item: impl Into<String>, err: &Error) {
        self.failed.push(BatchFailure::from_error(item, err));
    }

    /// Total number of processed items.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Convert to `Err(PartialBatchFailure)` when any item failed.
    ///
    /// # Errors
    ///
    /// Returns `PartialBatchFailure` if at least one item failed.
    pub fn check(&self) -> crate::Result<()> {
        if self.has_failures() {
            Err(Error::PartialBatchFailure {
                failed: self.failed.len(),
                total: self.total(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_reports_partial_failure() {
        let mut batch: BatchResult<&str> = BatchResult::default();
        batch.push_ok("tpl_a");
        assert!(batch.check().is_ok());

        batch.push_err("tpl_b", &Error::TemplateNotFound { id: "tpl_b".into() });
        assert_eq!(batch.total(), 2);
        match batch.check() {
            Err(Error::PartialBatchFailure { failed, total }) => {
                assert_eq!((failed, total), (1, 2));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(batch.failed[0].code, ErrorCode::TemplateNotFound);
    }
}
