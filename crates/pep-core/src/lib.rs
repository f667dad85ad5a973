//! # pep-core
//!
//! Core types, enums, and error types for the peptide page pipeline.
//!
//! This crate provides the foundational types shared across all `pep-*` crates:
//! - Entity structs (`Study`, `StudySet`, `Section`, `PageRecord`)
//! - Study design, evidence grade, pipeline step, and run status enums
//! - Citation token parsing
//! - Retry backoff schedule and token usage accounting
//! - Cross-cutting error types

pub mod citation;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod retry;
pub mod usage;

pub use entities::{
    DISCLAIMERS, LiteratureStudy, PageRecord, PeptideIdentity, RegistryTrial, Section, Study,
    StudySet,
};
pub use enums::{ComplianceMode, EvidenceGrade, IssueSeverity, PipelineStep, RunStatus, StudyDesign};
pub use errors::CoreError;
pub use usage::{CostRates, Usage};
