//! Pure string and URL normalisation.
//!
//! Everything here is a total function of its input: malformed values produce
//! `None` or an empty result, never an error. The resolver relies on these
//! functions being deterministic, since their outputs are the join keys of the
//! knowledge base.

pub mod domain;
pub mod name;

pub use domain::canonical_domain;
pub use name::{jaccard, normalize_name, skeleton, token_jaccard, tokenize};
