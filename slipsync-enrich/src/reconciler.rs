//! The reconciliation loop.
//!
//! Records are processed newest first. Each one is matched against same-day,
//! same-amount transactions on one ledger account; a match that does not
//! already carry the record's txref gets its payee, memo and category
//! rewritten. Per-record failures are logged and reported, never fatal.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use slipsync_core::{
    CandidateTransaction, CategoryRule, ErrorReporter, Ledger, MatchPolicy, NoReporter,
    ProcessedReferences, infer_category, select_candidate,
};
use slipsync_ingest::{NotificationRecord, parse_notification_line};
use tracing::{debug, info, warn};

use crate::update::{build_update, is_already_enriched};

/// What happened to a single notification record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Updated,
    AlreadyEnriched,
    Unmatched,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Non-empty lines in the source
    pub total_records: usize,
    /// Records that reached the matching step
    pub processed: usize,
    pub updated: usize,
    pub already_enriched: usize,
    pub unmatched: usize,
    /// Unparseable records plus search and update failures
    pub failed: usize,
    /// Set when the already-enriched streak limit ended the run
    pub stopped_early: bool,
}

impl RunSummary {
    fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::AlreadyEnriched => self.already_enriched += 1,
            RecordOutcome::Unmatched => self.unmatched += 1,
            RecordOutcome::Failed => self.failed += 1,
        }
    }
}

/// Per-run mutable state, owned by the loop
struct RunState {
    user_id: i64,
    rules: Vec<CategoryRule>,
    processed: ProcessedReferences,
    streak: usize,
}

impl RunState {
    fn observe(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::AlreadyEnriched => self.streak += 1,
            _ => self.streak = 0,
        }
    }
}

pub struct Reconciler<L, R = NoReporter> {
    ledger: L,
    reporter: Option<R>,
    account_id: i64,
    timezone: Tz,
    policy: MatchPolicy,
}

impl<L: Ledger> Reconciler<L, NoReporter> {
    pub fn new(ledger: L, account_id: i64, timezone: Tz, policy: MatchPolicy) -> Self {
        Self {
            ledger,
            reporter: None,
            account_id,
            timezone,
            policy,
        }
    }
}

impl<L: Ledger, R: ErrorReporter> Reconciler<L, R> {
    pub fn with_reporter<R2: ErrorReporter>(self, reporter: Option<R2>) -> Reconciler<L, R2> {
        Reconciler {
            ledger: self.ledger,
            reporter,
            account_id: self.account_id,
            timezone: self.timezone,
            policy: self.policy,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Reconcile `lines` (oldest first, as stored in the source).
    pub async fn run(&self, lines: &[String]) -> Result<RunSummary> {
        let user = match self.ledger.current_user().await {
            Ok(u) => u,
            Err(e) => {
                self.report("fetching current user", &e).await;
                return Err(e.context("fetching current user"));
            }
        };
        debug!(user_id = user.id, login = %user.login, "authenticated");

        let rules = if self.policy.infer_categories {
            match self.ledger.category_rules(user.id).await {
                Ok(rules) => rules,
                Err(e) => {
                    warn!("could not load category rules, keeping existing categories: {e:#}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let mut records: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.trim().is_empty())
            .collect();
        records.reverse();

        let mut state = RunState {
            user_id: user.id,
            rules,
            processed: ProcessedReferences::new(),
            streak: 0,
        };
        let mut summary = RunSummary {
            total_records: records.len(),
            ..RunSummary::default()
        };

        for (i, line) in records.iter().enumerate() {
            if let Some(limit) = self.policy.streak_limit() {
                if state.streak >= limit {
                    info!(limit, "stopping: consecutive records already enriched");
                    summary.stopped_early = true;
                    break;
                }
            }

            let record = match parse_notification_line(line, self.timezone) {
                Ok(r) => r,
                Err(e) if self.policy.strict_timestamps => {
                    self.report("parsing notification", &e).await;
                    return Err(e.context(format!("record {}/{}", i + 1, records.len())));
                }
                Err(e) => {
                    warn!("skipping unparseable notification: {e:#}");
                    self.report("parsing notification", &e).await;
                    summary.record(RecordOutcome::Failed);
                    state.observe(RecordOutcome::Failed);
                    continue;
                }
            };

            info!(
                "[{}/{}] processing {} to {}",
                i + 1,
                records.len(),
                record.txref,
                record.to
            );

            let outcome = self.reconcile_record(&record, &mut state).await;
            summary.processed += 1;
            summary.record(outcome);
            state.observe(outcome);
        }

        info!(
            total = summary.total_records,
            updated = summary.updated,
            already_enriched = summary.already_enriched,
            unmatched = summary.unmatched,
            failed = summary.failed,
            "reconciliation finished"
        );
        Ok(summary)
    }

    async fn reconcile_record(
        &self,
        record: &NotificationRecord,
        state: &mut RunState,
    ) -> RecordOutcome {
        let day = record.day();
        let candidates = match self
            .ledger
            .search_transactions(self.account_id, day, day, &record.amount)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                warn!(txref = %record.txref, "transaction search failed: {e:#}");
                self.report("searching transactions", &e).await;
                return RecordOutcome::Failed;
            }
        };

        if candidates.is_empty() {
            info!(txref = %record.txref, amount = %record.amount, date = %day, "no transactions found");
            return RecordOutcome::Unmatched;
        }
        for c in &candidates {
            debug!(id = c.id, payee = %c.payee, original_payee = %c.original_payee, "candidate");
        }

        let Some(tx) = select_candidate(&candidates, &mut state.processed, &self.policy) else {
            warn!(to = %record.to, "no eligible transaction for notification");
            return RecordOutcome::Unmatched;
        };
        info!(id = tx.id, payee = %tx.payee, original_payee = %tx.original_payee, "using transaction");

        if is_already_enriched(tx, record) {
            info!(id = tx.id, memo = %tx.memo, "transaction already enriched");
            return RecordOutcome::AlreadyEnriched;
        }

        let category = if self.policy.infer_categories {
            infer_category(&tx.payee, tx.category.as_ref(), &state.rules)
        } else {
            tx.category.as_ref()
        };
        if let Some(c) = category {
            if tx.category.as_ref().map(|cur| cur.id) != Some(c.id) {
                info!(category = %c.title, "found a better category");
            }
        }

        if self.policy.assign_attachments {
            self.attach_receipt(state.user_id, record, tx).await;
        }

        info!(id = tx.id, from = %tx.payee, to = %record.to, "enriching transaction");
        let update = build_update(record, tx, category.map(|c| c.id), &self.policy);
        match self.ledger.update_transaction(tx.id, &update).await {
            Ok(_) => RecordOutcome::Updated,
            Err(e) => {
                warn!(id = tx.id, "could not update transaction: {e:#}");
                self.report("updating transaction", &e).await;
                RecordOutcome::Failed
            }
        }
    }

    /// Assign the first unassigned attachment titled like the record's
    /// receipt file. Failures never block the transaction update.
    async fn attach_receipt(
        &self,
        user_id: i64,
        record: &NotificationRecord,
        tx: &CandidateTransaction,
    ) {
        if record.filename.is_empty() {
            return;
        }

        let attachments = match self.ledger.attachments(user_id, true).await {
            Ok(a) => a,
            Err(e) => {
                warn!("could not list attachments: {e:#}");
                self.report("listing attachments", &e).await;
                return;
            }
        };

        let Some(found) = attachments.iter().find(|a| a.title == record.filename) else {
            return;
        };
        info!(title = %found.title, "found unassigned attachment");

        if let Err(e) = self
            .ledger
            .assign_attachment(tx.id, found.id)
            .await
            .with_context(|| format!("attachment {} -> transaction {}", found.id, tx.id))
        {
            warn!("could not attach file to transaction: {e:#}");
            self.report("assigning attachment", &e).await;
        }
    }

    async fn report(&self, context: &str, error: &anyhow::Error) {
        if let Some(reporter) = &self.reporter {
            reporter.capture(context, error).await;
        }
    }
}
