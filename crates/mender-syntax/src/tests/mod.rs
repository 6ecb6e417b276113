//! Crate-level tests exercising the rewriter end to end.
