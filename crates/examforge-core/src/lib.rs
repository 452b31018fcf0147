//! examforge-core: question model, validation and import pipelines.
//!
//! This crate defines the question data model, the per-kind normalization
//! rules, the form controllers and the import coordinators. It performs no
//! I/O itself: persistence goes through [`traits::QuestionStore`].

pub mod bulk;
pub mod criteria;
pub mod error;
pub mod form;
pub mod import;
pub mod model;
pub mod notice;
pub mod qcm;
pub mod registry;
pub mod submit;
pub mod traits;
