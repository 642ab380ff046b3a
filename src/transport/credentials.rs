//! Mutable credentials shared by a transport and its clones.
//!
//! The bearer token and the admin token are independent slots, each behind
//! its own `RwLock`. Writers replace a slot wholesale; readers take a
//! [`CredentialSnapshot`] once per attempt, while building headers. A
//! rotation that lands after that point is seen by the next attempt, not the
//! current one (last write wins).

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Credentials as observed by one attempt.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSnapshot {
    /// Bearer token for `Authorization`
    pub bearer: Option<Arc<str>>,
    /// Admin token for `X-Admin-Token`
    pub admin: Option<Arc<str>>,
}

impl fmt::Debug for CredentialSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSnapshot")
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field("admin", &self.admin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Thread-safe credential store.
#[derive(Default)]
pub struct Credentials {
    bearer: RwLock<Option<Arc<str>>>,
    admin: RwLock<Option<Arc<str>>>,
}

fn normalize(token: &str) -> Option<Arc<str>> {
    if token.is_empty() {
        None
    } else {
        Some(Arc::from(token))
    }
}

impl Credentials {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the bearer token. An empty string clears it.
    pub fn set_bearer(&self, token: &str) {
        *self.bearer.write() = normalize(token);
    }

    /// Replace the admin token. An empty string clears it.
    pub fn set_admin(&self, token: &str) {
        *self.admin.write() = normalize(token);
    }

    /// Current bearer token.
    pub fn bearer(&self) -> Option<Arc<str>> {
        self.bearer.read().clone()
    }

    /// Current admin token.
    pub fn admin(&self) -> Option<Arc<str>> {
        self.admin.read().clone()
    }

    /// Read both slots.
    pub fn snapshot(&self) -> CredentialSnapshot {
        CredentialSnapshot {
            bearer: self.bearer(),
            admin: self.admin(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.snapshot().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_independent() {
        let creds = Credentials::new();
        creds.set_bearer("user-token");
        creds.set_admin("admin-secret");

        let snap = creds.snapshot();
        assert_eq!(snap.bearer.as_deref(), Some("user-token"));
        assert_eq!(snap.admin.as_deref(), Some("admin-secret"));

        creds.set_bearer("");
        let snap = creds.snapshot();
        assert!(snap.bearer.is_none());
        assert_eq!(snap.admin.as_deref(), Some("admin-secret"));
    }

    #[test]
    fn test_snapshot_is_stable_across_rotation() {
        let creds = Credentials::new();
        creds.set_bearer("first");
        let before = creds.snapshot();
        creds.set_bearer("second");

        assert_eq!(before.bearer.as_deref(), Some("first"));
        assert_eq!(creds.bearer().as_deref(), Some("second"));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let creds = Credentials::new();
        creds.set_bearer("very-secret");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_concurrent_writers_last_write_wins() {
        let creds = Arc::new(Credentials::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let creds = Arc::clone(&creds);
                std::thread::spawn(move || creds.set_bearer(&format!("token-{i}")))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let bearer = creds.bearer().unwrap();
        assert!(bearer.starts_with("token-"));
    }
}
