//! Core types shared by every wirebox module
//!
//! This module holds the error taxonomy and the helpers that build errors with
//! consistent context.
//!
//! - [`WireError`] - Enumerated error type covering every engine failure mode
//! - [`ErrorKind`] - Configuration / resolution / construction classification
//! - [`error_builders`] - Suggestion-aware constructors for common errors
//!
//! Every operation that can fail returns [`Result`], which defaults its error type
//! to [`WireError`]. Code that calls user-supplied closures uses [`anyhow::Result`]
//! and converts at the boundary.

pub mod error;
pub mod error_builders;

pub use error::{ErrorKind, FieldFailure, Result, WireError};
