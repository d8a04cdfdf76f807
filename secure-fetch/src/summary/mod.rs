//! Run summary types and helpers.

mod fetch_summary;

pub use fetch_summary::FetchSummary;
