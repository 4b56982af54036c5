//! Consolidated integration tests for signapk-bootstrap.
//!
//! Kept in one binary so proptest suites do not run as separate
//! processes alongside each other.

mod bootstrap;
mod platform_properties;
