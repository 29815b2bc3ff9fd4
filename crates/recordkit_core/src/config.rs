//! Operation options.

use crate::error::{CoreError, CoreResult};
use recordkit_adapter::Filter;

/// Page size used by [`IterateOptions::default`].
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Options for saving an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Whether to run validation before writing.
    pub validate: bool,

    /// Whether a validation failure bypasses the completion callback.
    ///
    /// Only meaningful for callback-style saves: with `throws` set, the
    /// failure surfaces through the returned task handle instead of the
    /// callback. Future-style saves always return the error.
    pub throws: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            validate: true,
            throws: false,
        }
    }
}

impl SaveOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to validate before writing.
    #[must_use]
    pub const fn validate(mut self, value: bool) -> Self {
        self.validate = value;
        self
    }

    /// Sets whether validation failures bypass the callback.
    #[must_use]
    pub const fn throws(mut self, value: bool) -> Self {
        self.throws = value;
        self
    }
}

/// Options for creating an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateOptions {
    /// Whether to run validation before writing.
    pub validate: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self { validate: true }
    }
}

impl CreateOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to validate before writing.
    #[must_use]
    pub const fn validate(mut self, value: bool) -> Self {
        self.validate = value;
        self
    }
}

/// Options for iterating over a model's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterateOptions {
    /// Records fetched from the adapter per page. Must be at least 1.
    pub batch_size: usize,

    /// Maximum number of records processed in total (`None` = unbounded).
    pub limit: Option<usize>,

    /// Whether items of one page are processed concurrently.
    pub concurrent: bool,

    /// Base selection and ordering. Its skip/limit are driven by the cursor.
    pub filter: Filter,
}

impl Default for IterateOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            limit: None,
            concurrent: false,
            filter: Filter::new(),
        }
    }
}

impl IterateOptions {
    /// Creates options with the given page size.
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    /// Sets the page size.
    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the overall limit.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets concurrent processing within a page.
    #[must_use]
    pub fn concurrent(mut self, value: bool) -> Self {
        self.concurrent = value;
        self
    }

    /// Sets the base filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Checks the options before iteration starts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOptions` if `batch_size` is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.batch_size == 0 {
            return Err(CoreError::invalid_options("batch_size must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_save_options() {
        let options = SaveOptions::default();
        assert!(options.validate);
        assert!(!options.throws);
    }

    #[test]
    fn builder_pattern() {
        let options = SaveOptions::new().validate(false).throws(true);
        assert!(!options.validate);
        assert!(options.throws);

        assert!(!CreateOptions::new().validate(false).validate);
    }

    #[test]
    fn iterate_defaults() {
        let options = IterateOptions::default();
        assert_eq!(options.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(options.limit, None);
        assert!(!options.concurrent);
    }

    #[test]
    fn zero_batch_size_rejected() {
        let err = IterateOptions::new(0).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidOptions { .. }));
        assert!(IterateOptions::new(1).limit(0).validate().is_ok());
    }
}
