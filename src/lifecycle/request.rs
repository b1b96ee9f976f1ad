//! Promotion Cycle Requests
//!
//! What an administrator submits to trigger a cycle. Graduation deletes
//! students permanently, so it only runs when `confirm_graduation` is
//! explicitly true; otherwise the sweep is reported as pending confirmation.

use serde::Deserialize;

/// A request to run one promotion cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromotionCycleRequest {
    /// Highest grade ordinal; students in it move to the terminal pool.
    pub max_ordinal: u32,

    /// Explicit confirmation that the pre-cycle terminal roster may be deleted.
    #[serde(default)]
    pub confirm_graduation: bool,

    /// Who triggered the cycle. Recorded in the audit log only.
    #[serde(default)]
    pub operator: Option<String>,
}

impl PromotionCycleRequest {
    pub fn new(max_ordinal: u32) -> Self {
        Self {
            max_ordinal,
            confirm_graduation: false,
            operator: None,
        }
    }

    pub fn with_confirmation(mut self, confirm: bool) -> Self {
        self.confirm_graduation = confirm;
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Validate the request format.
    ///
    /// Returns None if valid, or Some(reason) if invalid.
    pub fn validate_format(&self) -> Option<&'static str> {
        if self.max_ordinal == 0 {
            return Some("max_ordinal must be at least 1");
        }
        if self
            .operator
            .as_deref()
            .is_some_and(|op| op.trim().is_empty())
        {
            return Some("operator must not be blank");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_unconfirmed() {
        let request = PromotionCycleRequest::new(10);
        assert_eq!(request.max_ordinal, 10);
        assert!(!request.confirm_graduation);
        assert!(request.operator.is_none());
        assert!(request.validate_format().is_none());
    }

    #[test]
    fn test_zero_max_ordinal_is_invalid() {
        let request = PromotionCycleRequest::new(0);
        assert!(request.validate_format().is_some());
    }

    #[test]
    fn test_blank_operator_is_invalid() {
        let request = PromotionCycleRequest::new(10).with_operator("  ");
        assert!(request.validate_format().is_some());
    }

    #[test]
    fn test_deserialize_without_confirmation() {
        let request: PromotionCycleRequest = serde_json::from_str(r#"{"max_ordinal": 12}"#).unwrap();
        assert_eq!(request.max_ordinal, 12);
        assert!(!request.confirm_graduation);
    }
}
