//! End-to-end tests that drive the full router against a scripted executor.
