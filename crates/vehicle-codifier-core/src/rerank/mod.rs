//! Reranker (C8): fuzzy rescoring followed by embedding rescoring and
//! top-N truncation.

pub mod embedding_pass;
pub mod fuzzy_pass;
