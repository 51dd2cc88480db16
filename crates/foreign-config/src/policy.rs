//! Handling policy for request kinds the bridge recognises but does not run.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What the router does with `New`, `Create`, and `InvokeOn` requests.
///
/// By default the router logs a diagnostic and sends nothing, which
/// leaves a caller awaiting that request waiting forever. `Reply` answers with
/// an explicit `Unsupported` outcome instead.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum UnsupportedPolicy {
    /// Log a diagnostic and send no outcome envelope.
    #[default]
    Ignore,
    /// Log a diagnostic and answer with an `Unsupported` outcome envelope.
    Reply,
}

impl UnsupportedPolicy {
    /// Returns `true` when unsupported requests receive an envelope.
    #[must_use]
    pub const fn replies(self) -> bool {
        matches!(self, Self::Reply)
    }
}

/// Errors encountered while parsing an [`UnsupportedPolicy`] from text.
pub type UnsupportedPolicyParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("ignore", UnsupportedPolicy::Ignore)]
    #[case("REPLY", UnsupportedPolicy::Reply)]
    #[case("Reply", UnsupportedPolicy::Reply)]
    fn parses_policy_case_insensitively(#[case] text: &str, #[case] expected: UnsupportedPolicy) {
        let parsed: UnsupportedPolicy = text.parse().expect("policy should parse");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!("drop".parse::<UnsupportedPolicy>().is_err());
    }

    #[test]
    fn only_reply_sends_envelopes() {
        assert!(UnsupportedPolicy::Reply.replies());
        assert!(!UnsupportedPolicy::Ignore.replies());
    }
}
