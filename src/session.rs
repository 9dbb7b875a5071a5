//! Bearer-token sessions.
//!
//! Login exchanges the configured credentials for an opaque token; the
//! API middleware validates it on every other request. Tokens expire
//! after eight hours of inactivity and are swept lazily on access, so
//! no background task is needed.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::Config;

/// Idle time after which a session token stops validating.
pub const SESSION_IDLE_HOURS: i64 = 8;

pub struct SessionStore {
    tokens: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Check credentials against the configured pair. Unset credentials
    /// fail closed: login never succeeds, so no token can ever validate.
    pub fn credentials_valid(config: &Config, username: &str, password: &str) -> bool {
        match (&config.app_user, &config.app_pass) {
            (Some(user), Some(pass)) => username.trim() == user && password == pass,
            _ => false,
        }
    }

    /// Issue a fresh token.
    pub fn login(&self, now: DateTime<Utc>) -> String {
        let token = Uuid::new_v4().to_string();
        let mut tokens = self.tokens.lock();
        Self::sweep(&mut tokens, now);
        tokens.insert(token.clone(), now);
        token
    }

    /// Validate a token and refresh its idle clock.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> bool {
        let mut tokens = self.tokens.lock();
        Self::sweep(&mut tokens, now);
        match tokens.get_mut(token) {
            Some(last_seen) => {
                *last_seen = now;
                true
            }
            None => false,
        }
    }

    /// Revoke a token. Revoking an unknown token is a no-op.
    pub fn logout(&self, token: &str) {
        self.tokens.lock().remove(token);
    }

    fn sweep(tokens: &mut HashMap<String, DateTime<Utc>>, now: DateTime<Utc>) {
        let cutoff = now - TimeDelta::hours(SESSION_IDLE_HOURS);
        tokens.retain(|_, last_seen| *last_seen >= cutoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_auth() -> Config {
        Config {
            app_user: Some("admin".into()),
            app_pass: Some("secret".into()),
            ..Config::default()
        }
    }

    #[test]
    fn test_credentials_check() {
        let config = config_with_auth();
        assert!(SessionStore::credentials_valid(&config, "admin", "secret"));
        assert!(SessionStore::credentials_valid(&config, " admin ", "secret"));
        assert!(!SessionStore::credentials_valid(&config, "admin", "wrong"));
        assert!(!SessionStore::credentials_valid(&config, "other", "secret"));
    }

    #[test]
    fn test_no_credentials_rejects_login() {
        let config = Config::default();
        assert!(!SessionStore::credentials_valid(&config, "", ""));
        assert!(!SessionStore::credentials_valid(&config, "admin", "secret"));
    }

    #[test]
    fn test_token_lifecycle() {
        let store = SessionStore::new();
        let now = Utc::now();

        let token = store.login(now);
        assert!(store.validate(&token, now));

        store.logout(&token);
        assert!(!store.validate(&token, now));
    }

    #[test]
    fn test_idle_expiry_is_refreshed_by_activity() {
        let store = SessionStore::new();
        let start = Utc::now();
        let token = store.login(start);

        // activity at hour 7 pushes expiry forward
        let later = start + TimeDelta::hours(7);
        assert!(store.validate(&token, later));

        let much_later = later + TimeDelta::hours(7);
        assert!(store.validate(&token, much_later));

        // nine idle hours, token is gone
        let expired = much_later + TimeDelta::hours(9);
        assert!(!store.validate(&token, expired));
    }

    #[test]
    fn test_unknown_token_invalid() {
        let store = SessionStore::new();
        assert!(!store.validate("nope", Utc::now()));
    }
}
