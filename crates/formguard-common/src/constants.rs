//! Shared constants for Formguard components.

/// Token value meaning "not issued yet" or "revoked". Never accepted.
pub const FAIL_TOKEN: &str = "fail";

/// Default minimum seconds between initialize and validate
pub const DEFAULT_MIN_SUBMIT_SECS: i64 = 4;

/// Default maximum seconds between initialize and validate (30 minutes)
pub const DEFAULT_MAX_SUBMIT_SECS: i64 = 1800;

/// Default session lifetime in the store (1 hour)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Default bound on a single DNS lookup for the `email` rule
pub const DEFAULT_DNS_TIMEOUT_MS: u64 = 2000;

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8890";

/// Default session cookie name
pub const DEFAULT_COOKIE_NAME: &str = "formguard_sid";

/// Default form definition location
pub const DEFAULT_FORM_DEFINITION_PATH: &str = "config/contact_form.json";

/// Challenge strings the client is asked to type back.
pub const DEFAULT_CHALLENGE_POOL: &[&str] = &[
    "I am a human",
    "This is not spam",
    "No spam here",
    "Human",
    "I hate spam",
    "Not a spammer",
    "Humans only",
    "No bots",
    "Humans rule",
    "Anti-spam box",
];

/// Session store key prefixes
pub mod store_keys {
    /// Form session: formguard:session:{session_id}:{form_name}
    pub const SESSION_PREFIX: &str = "formguard:session:";
}

/// HTTP header names
pub mod headers {
    /// Client address as reported by the fronting proxy
    pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
}

/// Query-string stage markers understood by the controller
pub mod stage_markers {
    /// `submit` value that discards the session instead of submitting
    pub const DELETE: &str = "delete";
}
