//! Shared primitive types used across the entire pipeline.

/// A policy identifier as it appears in the source file.
pub type PolicyId = String;

/// A categorical attribute value (state, city, channel, ...).
pub type Category = String;

/// A signed day delta between two calendar dates.
pub type DayCount = i64;
