//! Property-based tests for branch-token handling.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::context::{sanitize_branch_token, validate_ref_token};
    use proptest::prelude::*;

    proptest! {
        /// Property: sanitized tokens only ever contain [a-z0-9-]
        #[test]
        fn sanitize_output_is_filesystem_safe(input in ".*") {
            let result = sanitize_branch_token(&input);
            prop_assert!(
                result.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "sanitize produced unsafe output '{}' from input '{}'",
                result,
                input
            );
        }

        /// Property: sanitizing is idempotent
        #[test]
        fn sanitize_is_idempotent(input in ".*") {
            let once = sanitize_branch_token(&input);
            let twice = sanitize_branch_token(&once);
            prop_assert_eq!(once, twice);
        }

        /// Property: the result is never empty (patch files always get a name)
        #[test]
        fn sanitize_never_returns_empty(input in ".*") {
            prop_assert!(!sanitize_branch_token(&input).is_empty());
        }

        /// Property: lowercase alphanumeric branch names pass through unchanged
        #[test]
        fn sanitize_preserves_simple_names(input in "[a-z0-9]+") {
            prop_assert_eq!(sanitize_branch_token(&input), input);
        }

        /// Property: no run of separators survives as more than one dash
        #[test]
        fn sanitize_collapses_separator_runs(input in "[a-z]+[-_/. ]+[a-z]+") {
            let result = sanitize_branch_token(&input);
            prop_assert!(!result.contains("--"), "got '{}'", result);
        }

        /// Property: every sanitized token passes ref validation
        #[test]
        fn sanitized_tokens_are_valid_ref_tokens(input in ".*") {
            let result = sanitize_branch_token(&input);
            prop_assert!(validate_ref_token(&result).is_ok(), "'{}' rejected", result);
        }

        /// Property: validation rejects anything with shell metacharacters
        #[test]
        fn validation_rejects_metacharacters(
            prefix in "[a-z]{1,8}",
            meta in "[;|&$<>`'\" ]",
            suffix in "[a-z]{0,8}",
        ) {
            let token = format!("{}{}{}", prefix, meta, suffix);
            prop_assert!(validate_ref_token(&token).is_err(), "'{}' accepted", token);
        }

        /// Property: validation rejects leading dashes (option smuggling)
        #[test]
        fn validation_rejects_leading_dash(suffix in "[a-z-]{0,16}") {
            let token = format!("-{}", suffix);
            prop_assert!(validate_ref_token(&token).is_err(), "'{}' accepted", token);
        }
    }
}
