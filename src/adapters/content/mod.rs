//! Content filter adapters.

mod keyword_blocklist;

pub use keyword_blocklist::KeywordBlocklist;
