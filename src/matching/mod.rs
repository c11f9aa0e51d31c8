//! Matching engines.
//!
//! Company resolution is query-driven: each input runs an escalating chain of
//! filtered catalog searches, re-scoring every candidate set against the raw
//! input. Product resolution is index-driven: the catalog is fetched once
//! into a local index, then every line item is scored against every entry.

pub mod company;
pub mod product;

pub use company::resolve_companies;
pub use product::{ProductIndex, ProductResolver};
