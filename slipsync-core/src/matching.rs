//! Candidate selection: pick at most one unclaimed ledger transaction for a
//! notification.
//!
//! The ledger search already narrows candidates to the account, day and
//! amount. Among those, the first one (in service order) that has not been
//! claimed earlier in the run and, when required, whose bank-feed payee names
//! a transfer phrase wins. Claiming happens at selection time and is never
//! undone, even if the later update fails.

use std::collections::HashSet;

use crate::ledger::CandidateTransaction;
use crate::policy::MatchPolicy;

/// Transaction ids already matched during the current run
#[derive(Debug, Clone, Default)]
pub struct ProcessedReferences {
    ids: HashSet<i64>,
}

impl ProcessedReferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    /// Returns false if the id was already claimed.
    pub fn claim(&mut self, id: i64) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub fn contains_transfer_phrase(original_payee: &str, phrases: &[String]) -> bool {
    phrases
        .iter()
        .any(|p| !p.is_empty() && original_payee.contains(p.as_str()))
}

/// Select and claim the first eligible candidate.
pub fn select_candidate<'a>(
    candidates: &'a [CandidateTransaction],
    processed: &mut ProcessedReferences,
    policy: &MatchPolicy,
) -> Option<&'a CandidateTransaction> {
    let chosen = candidates.iter().find(|c| {
        if policy.require_transfer_phrase
            && !contains_transfer_phrase(&c.original_payee, &policy.transfer_phrases)
        {
            return false;
        }
        !processed.contains(c.id)
    })?;

    processed.claim(chosen.id);
    Some(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candidate(id: i64, original_payee: &str) -> CandidateTransaction {
        CandidateTransaction {
            id,
            payee: original_payee.to_string(),
            original_payee: original_payee.to_string(),
            memo: String::new(),
            amount: -50.0,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            is_transfer: false,
            needs_review: false,
            category: None,
            note: String::new(),
        }
    }

    #[test]
    fn first_unclaimed_wins() {
        let policy = MatchPolicy::default();
        let candidates = vec![
            candidate(1, "Interbank Transfer X1234"),
            candidate(2, "Interbank Transfer X5678"),
        ];
        let mut processed = ProcessedReferences::new();

        let a = select_candidate(&candidates, &mut processed, &policy).unwrap();
        let b = select_candidate(&candidates, &mut processed, &policy).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(select_candidate(&candidates, &mut processed, &policy).is_none());
        assert_eq!(processed.len(), 2);
    }

    #[test]
    fn transfer_phrase_filter() {
        let policy = MatchPolicy::default();
        let candidates = vec![
            candidate(1, "ATM Withdrawal"),
            candidate(2, "PromptPay Transfer/Top Up eWallet 0812345678"),
        ];
        let mut processed = ProcessedReferences::new();
        let chosen = select_candidate(&candidates, &mut processed, &policy).unwrap();
        assert_eq!(chosen.id, 2);
        assert!(!processed.contains(1));
    }

    #[test]
    fn any_payee_when_filter_off() {
        let policy = MatchPolicy {
            require_transfer_phrase: false,
            ..MatchPolicy::default()
        };
        let candidates = vec![candidate(1, "ATM Withdrawal")];
        let mut processed = ProcessedReferences::new();
        assert_eq!(
            select_candidate(&candidates, &mut processed, &policy).map(|c| c.id),
            Some(1)
        );
    }

    #[test]
    fn no_candidates() {
        let mut processed = ProcessedReferences::new();
        assert!(select_candidate(&[], &mut processed, &MatchPolicy::default()).is_none());
        assert!(processed.is_empty());
    }

    #[test]
    fn empty_phrase_is_ignored() {
        assert!(!contains_transfer_phrase("ATM", &[String::new()]));
    }
}
