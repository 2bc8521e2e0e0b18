//! Anti-automation session protocol.
//!
//! Forms go through three stages:
//! 1. `initialize` - a submission window opens and a validation token
//!    and challenge are issued; the form is shown.
//! 2. `validate` - the posted form is checked against the token, the
//!    window, and the field rules; a submission token is issued.
//! 3. `confirm_submit` - the submission token is checked before the
//!    data is handed on.

mod lifecycle;
mod session;

pub use lifecycle::{Lifecycle, SubmitWindow};
pub use session::{FormSession, Stage};
