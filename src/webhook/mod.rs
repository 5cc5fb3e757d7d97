//! GitLab webhook ingestion: payload types, token check, the bounded
//! event queue and the HTTP surface.

pub mod payload;
pub mod queue;
pub mod server;

use sha2::{Digest, Sha256};
use tracing::warn;

/// Checks the `X-Gitlab-Token` header against the configured secret.
///
/// Both values are hashed first so the comparison runs over equal-length
/// digests in constant time. An empty secret disables the check.
#[must_use]
pub fn verify_token(secret: &str, provided: Option<&str>) -> bool {
    if secret.is_empty() {
        warn!("webhook secret not configured, skipping token verification");
        return true;
    }
    let Some(provided) = provided else {
        return false;
    };
    let expected = Sha256::digest(secret.as_bytes());
    let actual = Sha256::digest(provided.as_bytes());
    expected.iter().zip(actual.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

#[cfg(test)]
mod tests {
    use super::verify_token;

    #[test]
    fn matching_token_passes() {
        assert!(verify_token("s3cret", Some("s3cret")));
    }

    #[test]
    fn wrong_or_missing_token_fails() {
        assert!(!verify_token("s3cret", Some("s3cre")));
        assert!(!verify_token("s3cret", Some("")));
        assert!(!verify_token("s3cret", None));
    }

    #[test]
    fn empty_secret_disables_check() {
        assert!(verify_token("", None));
        assert!(verify_token("", Some("anything")));
    }
}
