//! slipsync-enrich: match notifications to ledger transactions and enrich them

pub mod reconciler;
pub mod update;

pub use reconciler::{Reconciler, RecordOutcome, RunSummary};
pub use update::{build_update, is_already_enriched, render_memo};
