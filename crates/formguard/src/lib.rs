//! # Formguard
//!
//! Server-side protection for web forms against automated submissions.
//!
//! A form session moves through three protocol steps, each gated by a
//! single-use token:
//!
//! ```text
//! initialize ──▶ validate(validationToken, posted data) ──▶ confirm_submit(submissionToken)
//!      ▲                 │ rejected                              │ rejected
//!      └─────────────────┴───────────────────────────────────────┘
//! ```
//!
//! Validation checks timing (too fast, expired), the typed-back
//! challenge, a honeypot field and per-field rules.

pub mod clock;
pub mod config;
pub mod delivery;
pub mod guard;
pub mod messages;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod store;
pub mod token;
pub mod validation;
