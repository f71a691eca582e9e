//! Database access for the evaluator
//!
//! Candidate selection over host content tables. Evaluation persistence
//! lives in `services::result_store`.

mod candidates;

pub use candidates::{CandidateQuery, CandidateRecord, Predicate, RecordColumns};
