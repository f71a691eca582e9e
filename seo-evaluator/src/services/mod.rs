//! Per-record collaborators of the evaluation orchestrator

pub mod content_resolver;
pub mod keyword_resolver;
pub mod result_store;

pub use content_resolver::{ContentResolver, FrontendPage, HttpContentResolver};
pub use keyword_resolver::KeywordResolver;
pub use result_store::ResultStore;
