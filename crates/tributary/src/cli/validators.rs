//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

use crate::domain::NodeId;

/// Validate a node ID.
///
/// IDs are opaque strings from the ingestion job (`model.shop.fct_orders`,
/// `stg_orders`), so only emptiness and embedded whitespace are rejected.
pub fn validate_node_id(s: &str) -> Result<NodeId, String> {
    validate_identifier(s, "Node ID").map(NodeId::from)
}

/// Validate a flow ID.
pub fn validate_flow_id(s: &str) -> Result<String, String> {
    validate_identifier(s, "Flow ID")
}

fn validate_identifier(s: &str, what: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err(format!("{what} cannot be empty"));
    }

    if s.chars().any(char::is_whitespace) {
        return Err(format!("{what} cannot contain whitespace: '{s}'"));
    }

    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::simple("stg_orders")]
    #[case::dotted("model.shop.fct_orders")]
    #[case::trimmed("  raw_events  ")]
    fn valid_node_ids(#[case] input: &str) {
        let id = validate_node_id(input).unwrap();
        assert_eq!(id.as_str(), input.trim());
    }

    #[rstest]
    #[case::empty("", "cannot be empty")]
    #[case::blank("   ", "cannot be empty")]
    #[case::inner_space("fct orders", "whitespace")]
    #[case::tab("fct\torders", "whitespace")]
    fn invalid_node_ids(#[case] input: &str, #[case] expected: &str) {
        let err = validate_node_id(input).unwrap_err();
        assert!(err.contains(expected), "got: {err}");
    }

    #[test]
    fn flow_errors_name_the_flow() {
        assert_eq!(
            validate_flow_id("").unwrap_err(),
            "Flow ID cannot be empty"
        );
    }
}
