use std::fmt;

/// A numeric input rejected at a construction boundary.
///
/// Raised for NaN or infinite components and for values outside the accepted
/// range, instead of silently substituting a default.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidValue {
    pub field: &'static str,
    pub value: f32,
    pub reason: &'static str,
}

impl InvalidValue {
    pub(crate) fn new(field: &'static str, value: f32, reason: &'static str) -> Self {
        Self { field, value, reason }
    }

    /// Checks that `value` is finite.
    pub(crate) fn check_finite(field: &'static str, value: f32) -> Result<f32, Self> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::new(field, value, "must be finite"))
        }
    }
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} ({}): {}", self.field, self.value, self.reason)
    }
}

impl std::error::Error for InvalidValue {}
