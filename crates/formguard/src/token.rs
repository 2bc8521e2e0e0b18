//! One-time link tokens and challenge selection.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::seq::IndexedRandom;

use formguard_common::constants::FAIL_TOKEN;

/// Generate an opaque 128-bit random token, URL safe
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare a presented token against the stored one.
///
/// The sentinel never matches, even when presented verbatim.
pub fn token_matches(presented: Option<&str>, stored: &str) -> bool {
    match presented {
        Some(presented) => stored != FAIL_TOKEN && presented == stored,
        None => false,
    }
}

/// Pick a random challenge string from the pool
pub fn pick_challenge(pool: &[String]) -> Option<String> {
    pool.choose(&mut rand::rng()).cloned()
}

/// Shortened token for log output
pub fn redact(token: &str) -> String {
    if token == FAIL_TOKEN {
        return token.to_string();
    }
    let prefix: String = token.chars().take(4).collect();
    format!("{}…", prefix)
}
