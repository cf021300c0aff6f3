//! # Buzzwatch Detection Engine
//!
//! Exact-match rules evaluated against every decoded event.

pub mod rules;

pub use rules::{
    evaluate, AlertAction, DetectionError, DetectionRule, Field, FieldPredicate, Firing,
    PatternDetector,
};
