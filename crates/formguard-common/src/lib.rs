//! # Formguard Common
//!
//! Shared types, form definitions, and utilities used across Formguard
//! components.
//!
//! ## Modules
//! - `types` - Field state, rule names, and the failure taxonomy
//! - `definition` - Form definition loading and shape checks
//! - `error` - Common error types
//! - `constants` - Defaults and shared constants

pub mod constants;
pub mod definition;
pub mod error;
pub mod types;

pub use definition::{FieldSpec, FormDefinition};
pub use error::FormGuardError;
pub use types::*;
