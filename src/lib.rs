//! File-backed annotation store for nightly SSINS recordings.

pub mod data;
