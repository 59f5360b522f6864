//! Placeholder library target for the integration test crate; the actual
//! coverage lives under `tests/`.
