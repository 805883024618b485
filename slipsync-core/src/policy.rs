//! Run policy: which matching and update behaviours are switched on.

use serde::{Deserialize, Serialize};

/// Phrases the bank feed uses in `original_payee` for outgoing transfers.
pub const DEFAULT_TRANSFER_PHRASES: &[&str] = &[
    "PromptPay Transfer/Top Up eWallet",
    "Payment for Goods /Services",
    "Interbank Transfer",
];

/// How the enriched memo records the notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MemoStyle {
    /// `txref=<value>` only
    #[default]
    #[serde(rename = "reference")]
    Reference,
    /// Every notification field, space separated
    #[serde(rename = "full")]
    Full,
}

/// What happens to the ledger's needs-review flag on update
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ReviewPolicy {
    #[default]
    #[serde(rename = "flag")]
    Flag,
    #[serde(rename = "preserve")]
    Preserve,
}

impl std::str::FromStr for MemoStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reference" => Ok(MemoStyle::Reference),
            "full" => Ok(MemoStyle::Full),
            other => Err(format!("unknown memo style: '{other}' (expected reference or full)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchPolicy {
    pub transfer_phrases: Vec<String>,
    /// Only claim candidates whose original payee names a transfer phrase
    pub require_transfer_phrase: bool,
    /// Stop after this many consecutive already-enriched records (0 = never)
    pub skip_streak_limit: usize,
    pub memo_style: MemoStyle,
    pub review: ReviewPolicy,
    pub infer_categories: bool,
    pub assign_attachments: bool,
    /// Abort the run on an unparseable date/time instead of skipping the record
    pub strict_timestamps: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            transfer_phrases: DEFAULT_TRANSFER_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            require_transfer_phrase: true,
            skip_streak_limit: 10,
            memo_style: MemoStyle::Reference,
            review: ReviewPolicy::Flag,
            infer_categories: true,
            assign_attachments: true,
            strict_timestamps: false,
        }
    }
}

impl MatchPolicy {
    pub fn streak_limit(&self) -> Option<usize> {
        match self.skip_streak_limit {
            0 => None,
            n => Some(n),
        }
    }

    pub fn needs_review(&self, current: bool) -> bool {
        match self.review {
            ReviewPolicy::Flag => true,
            ReviewPolicy::Preserve => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let policy: MatchPolicy = toml::from_str(
            r#"
skip_streak_limit = 0
memo_style = "full"
"#,
        )
        .unwrap();
        assert_eq!(policy.streak_limit(), None);
        assert_eq!(policy.memo_style, MemoStyle::Full);
        assert!(policy.require_transfer_phrase);
        assert_eq!(policy.transfer_phrases.len(), 3);
    }

    #[test]
    fn review_policy() {
        let mut policy = MatchPolicy::default();
        assert!(policy.needs_review(false));
        policy.review = ReviewPolicy::Preserve;
        assert!(!policy.needs_review(false));
        assert!(policy.needs_review(true));
    }

    #[test]
    fn memo_style_from_str() {
        assert_eq!("FULL".parse::<MemoStyle>().unwrap(), MemoStyle::Full);
        assert!("raw".parse::<MemoStyle>().is_err());
    }
}
