// Credential provider collaborator: bearer token plus expiry notification

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub type ExpiryCallback = Box<dyn Fn() + Send + Sync>;

type SharedCallback = Arc<dyn Fn() + Send + Sync>;

pub trait CredentialProvider: Send + Sync {
    fn current_token(&self) -> Option<String>;

    /// Registers a callback invoked at most once per expiry.
    fn on_token_expired(&self, callback: ExpiryCallback);

    // Called by the transport when the backend rejects the credential
    fn expire(&self);
}

/// Token storage for one login session at a time.
#[derive(Default)]
pub struct SessionCredentials {
    token: RwLock<Option<String>>,
    listeners: Mutex<Vec<SharedCallback>>,
    expired: AtomicBool,
}

impl SessionCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Arc<Self> {
        let credentials = Self::new();
        credentials.set_token(token);
        Arc::new(credentials)
    }

    /// Starts a new session; a later expiry notifies listeners again.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
        self.expired.store(false, Ordering::SeqCst);
    }

    // Logout: drops the token without notifying anyone
    pub fn clear(&self) {
        *self.token.write() = None;
    }
}

impl CredentialProvider for SessionCredentials {
    fn current_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn on_token_expired(&self, callback: ExpiryCallback) {
        self.listeners.lock().push(Arc::from(callback));
    }

    fn expire(&self) {
        if self.expired.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.token.write() = None;
        info!("Session token expired, notifying listeners");

        // Listeners run without the lock held so they may subscribe again
        let listeners: Vec<SharedCallback> = self.listeners.lock().clone();
        for listener in listeners {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(credentials: &SessionCredentials) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        credentials.on_token_expired(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        count
    }

    #[test]
    fn test_expire_clears_token_and_notifies_once() {
        let credentials = SessionCredentials::with_token("abc");
        let count = counting(&credentials);

        assert_eq!(credentials.current_token().as_deref(), Some("abc"));
        credentials.expire();
        credentials.expire();

        assert_eq!(credentials.current_token(), None);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_session_can_expire_again() {
        let credentials = SessionCredentials::with_token("first");
        let count = counting(&credentials);

        credentials.expire();
        credentials.set_token("second");
        assert_eq!(credentials.current_token().as_deref(), Some("second"));
        credentials.expire();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_can_subscribe_while_notified() {
        let credentials = SessionCredentials::with_token("first");
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let session = Arc::clone(&credentials);
        credentials.on_token_expired(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
            let again = Arc::clone(&seen);
            session.on_token_expired(Box::new(move || {
                again.fetch_add(10, Ordering::SeqCst);
            }));
        }));

        credentials.expire();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        credentials.set_token("second");
        credentials.expire();
        assert_eq!(count.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn test_clear_does_not_notify() {
        let credentials = SessionCredentials::with_token("abc");
        let count = counting(&credentials);
        credentials.clear();
        assert_eq!(credentials.current_token(), None);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
