//! Warngate - static-analysis warnings tracking for CI
//!
//! Tracks the issues reported by analysis tools across builds, classifies
//! them as new, fixed or outstanding against a reference build, and
//! evaluates quality gates and a health score for every run.

pub mod cache;
pub mod cli;
pub mod config;
pub mod delta;
pub mod fingerprint;
pub mod gates;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod reporters;
pub mod scoring;
