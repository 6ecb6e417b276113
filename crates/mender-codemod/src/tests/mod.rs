//! Cross-module tests for composition and rule files.
