//! slipsync-core: ledger types, run policy and the matching heuristics

pub mod categorize;
pub mod ledger;
pub mod matching;
pub mod policy;
pub mod report;
pub mod time;

pub use categorize::infer_category;
pub use ledger::{
    Attachment, CandidateTransaction, CategoryRef, CategoryRule, Ledger, LedgerUser,
    TransactionUpdate,
};
pub use matching::{ProcessedReferences, contains_transfer_phrase, select_candidate};
pub use policy::{MatchPolicy, MemoStyle, ReviewPolicy, DEFAULT_TRANSFER_PHRASES};
pub use report::{ErrorReporter, NoReporter};
