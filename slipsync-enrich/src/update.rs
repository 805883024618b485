//! Build the update submitted for a matched transaction.

use slipsync_core::{CandidateTransaction, MatchPolicy, MemoStyle, TransactionUpdate};
use slipsync_ingest::NotificationRecord;

/// A candidate is already enriched when one whitespace-separated memo token
/// is the record's txref, bare (full memo) or as `txref=<ref>`. Records
/// without a txref can never prove that, so they are never skipped.
pub fn is_already_enriched(candidate: &CandidateTransaction, record: &NotificationRecord) -> bool {
    let txref = record.txref.as_str();
    !txref.is_empty()
        && candidate
            .memo
            .split_whitespace()
            .any(|token| token == txref || token.strip_prefix("txref=") == Some(txref))
}

pub fn render_memo(record: &NotificationRecord, style: MemoStyle) -> String {
    match style {
        MemoStyle::Reference => format!("txref={}", record.txref),
        MemoStyle::Full => {
            let ts = record.timestamp.format("%Y-%m-%d %H:%M:%S %z").to_string();
            [
                record.filename.as_str(),
                record.to.as_str(),
                record.from.as_str(),
                record.amount.as_str(),
                ts.as_str(),
                ts.as_str(),
                record.bankref.as_str(),
                record.txref.as_str(),
            ]
            .join(" ")
        }
    }
}

/// Payee and memo come from the notification, everything else is carried
/// over from the ledger except the review flag and the category.
pub fn build_update(
    record: &NotificationRecord,
    candidate: &CandidateTransaction,
    category_id: Option<i64>,
    policy: &MatchPolicy,
) -> TransactionUpdate {
    TransactionUpdate {
        payee: record.to.clone(),
        memo: render_memo(record, policy.memo_style),
        amount: candidate.amount,
        date: candidate.date,
        is_transfer: candidate.is_transfer,
        needs_review: policy.needs_review(candidate.needs_review),
        note: candidate.note.clone(),
        category_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use slipsync_core::ReviewPolicy;
    use slipsync_ingest::parse_notification_line;

    fn record() -> NotificationRecord {
        parse_notification_line(
            "filename=r1.jpg;to=Jane;from=Me;amountTHB=120.00 THB;date=2024-01-02;time=09:30;bankref=B1;txref=T1",
            chrono_tz::Asia::Bangkok,
        )
        .unwrap()
    }

    fn candidate(memo: &str) -> CandidateTransaction {
        CandidateTransaction {
            id: 42,
            payee: "Interbank Transfer".to_string(),
            original_payee: "Interbank Transfer X1234".to_string(),
            memo: memo.to_string(),
            amount: -120.0,
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            is_transfer: true,
            needs_review: false,
            category: None,
            note: "keep me".to_string(),
        }
    }

    #[test]
    fn enriched_when_memo_has_txref() {
        let rec = record();
        assert!(is_already_enriched(&candidate("txref=T1"), &rec));
        assert!(!is_already_enriched(&candidate(""), &rec));
        assert!(is_already_enriched(&candidate("paid rent txref=T1"), &rec));
    }

    #[test]
    fn longer_reference_is_not_the_same_txref() {
        let rec = record();
        assert!(!is_already_enriched(&candidate("txref=T10"), &rec));
        assert!(!is_already_enriched(&candidate("r1.jpg Jane Me 120.00 B1 T10"), &rec));
    }

    #[test]
    fn full_memo_counts_as_enriched() {
        let rec = record();
        let full = render_memo(&rec, MemoStyle::Full);
        assert!(is_already_enriched(&candidate(&full), &rec));
    }

    #[test]
    fn empty_txref_never_enriched() {
        let mut rec = record();
        rec.txref.clear();
        assert!(!is_already_enriched(&candidate("anything"), &rec));
    }

    #[test]
    fn reference_update_carries_ledger_fields() {
        let rec = record();
        let c = candidate("");
        let update = build_update(&rec, &c, Some(9), &MatchPolicy::default());
        assert_eq!(update.payee, "Jane");
        assert_eq!(update.memo, "txref=T1");
        assert_eq!(update.amount, -120.0);
        assert_eq!(update.date, c.date);
        assert!(update.is_transfer);
        assert!(update.needs_review);
        assert_eq!(update.note, "keep me");
        assert_eq!(update.category_id, Some(9));
    }

    #[test]
    fn full_memo_and_preserved_review() {
        let policy = MatchPolicy {
            memo_style: MemoStyle::Full,
            review: ReviewPolicy::Preserve,
            ..MatchPolicy::default()
        };
        let update = build_update(&record(), &candidate(""), None, &policy);
        assert_eq!(
            update.memo,
            "r1.jpg Jane Me 120.00 2024-01-02 09:30:00 +0700 2024-01-02 09:30:00 +0700 B1 T1"
        );
        assert!(!update.needs_review);
        assert_eq!(update.category_id, None);
    }
}
