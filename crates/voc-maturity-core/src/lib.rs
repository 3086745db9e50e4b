//! Questionnaire model, scoring engine, and screen flow for voc-maturity.
//!
//! This crate holds everything a front end needs to run a maturity
//! self-assessment: the static questionnaire model and its loader, the
//! lenient scoring engine, and the per-user session state machine. It does
//! no rendering and no I/O beyond reading questionnaires and writing reports.

pub mod error;
pub mod flow;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod traits;
