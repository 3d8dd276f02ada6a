//! Admin authentication: password check, lockout, optional 2FA, sessions.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::AdminConfig;
use crate::security::{constant_time_eq, generate_token, sha256_hex};

pub const SESSION_TIMEOUT: Duration = Duration::from_secs(60 * 60);
pub const MAX_FAILED_ATTEMPTS: u32 = 5;
pub const LOCKOUT_DURATION: Duration = Duration::from_secs(15 * 60);
const TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct AdminSession {
    pub username: String,
    pub client_ip: String,
    last_activity: Instant,
}

impl AdminSession {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.last_activity) > SESSION_TIMEOUT
    }
}

#[derive(Debug)]
struct FailedAttempts {
    count: u32,
    last_attempt: Instant,
}

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Logged in; carries the new session token.
    Session(String),
    /// Password accepted but a one-time code is still required.
    TwoFactorPending,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidCredentials,
    InvalidCode,
    LockedOut,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::InvalidCredentials => "Invalid username or password",
            RejectReason::InvalidCode => "Invalid 2FA code",
            RejectReason::LockedOut => "Too many failed attempts. Try again later.",
        }
    }
}

pub struct AuthManager {
    username: String,
    password_hash: String,
    two_factor_enabled: bool,
    two_factor_code: String,
    sessions: DashMap<String, AdminSession>,
    failures: DashMap<String, FailedAttempts>,
}

impl AuthManager {
    pub fn new(cfg: &AdminConfig) -> Self {
        Self {
            username: cfg.username.clone(),
            password_hash: cfg.effective_password_hash(),
            two_factor_enabled: cfg.two_factor_enabled,
            two_factor_code: cfg.two_factor_code.clone(),
            sessions: DashMap::new(),
            failures: DashMap::new(),
        }
    }

    pub fn two_factor_enabled(&self) -> bool {
        self.two_factor_enabled
    }

    /// Checks credentials for a login from `client_ip`.
    ///
    /// With 2FA enabled and no `otp` given, a correct password yields
    /// [`AuthOutcome::TwoFactorPending`] without counting as a failure.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
        otp: Option<&str>,
        client_ip: &str,
    ) -> AuthOutcome {
        if self.is_locked_out(client_ip) {
            tracing::warn!(ip = %client_ip, "Login attempt from locked out address");
            return AuthOutcome::Rejected(RejectReason::LockedOut);
        }

        let user_ok = constant_time_eq(username, &self.username);
        let password_ok = constant_time_eq(&sha256_hex(password), &self.password_hash);
        if !(user_ok && password_ok) {
            self.record_failure(client_ip);
            tracing::warn!(ip = %client_ip, username = %username, "Failed admin login");
            return AuthOutcome::Rejected(RejectReason::InvalidCredentials);
        }

        if self.two_factor_enabled {
            match otp.filter(|c| !c.is_empty()) {
                None => return AuthOutcome::TwoFactorPending,
                Some(code) if !constant_time_eq(code.trim(), &self.two_factor_code) => {
                    self.record_failure(client_ip);
                    tracing::warn!(ip = %client_ip, "Invalid 2FA code");
                    return AuthOutcome::Rejected(RejectReason::InvalidCode);
                }
                Some(_) => {}
            }
        }

        self.failures.remove(client_ip);
        let token = self.create_session(username, client_ip);
        tracing::info!(ip = %client_ip, username = %username, "Admin logged in");
        AuthOutcome::Session(token)
    }

    fn create_session(&self, username: &str, client_ip: &str) -> String {
        let token = generate_token(TOKEN_LENGTH);
        self.sessions.insert(
            token.clone(),
            AdminSession {
                username: username.to_string(),
                client_ip: client_ip.to_string(),
                last_activity: Instant::now(),
            },
        );
        token
    }

    /// Returns true for a live session and refreshes its activity time.
    /// Expired sessions are removed.
    pub fn validate_session(&self, token: &str) -> bool {
        let now = Instant::now();
        let expired = match self.sessions.get_mut(token) {
            Some(mut session) if !session.is_expired(now) => {
                session.last_activity = now;
                return true;
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.sessions.remove(token);
        }
        false
    }

    pub fn invalidate_session(&self, token: &str) {
        if let Some((_, session)) = self.sessions.remove(token) {
            tracing::info!(
                ip = %session.client_ip,
                username = %session.username,
                "Admin session invalidated"
            );
        }
    }

    pub fn active_session_count(&self) -> usize {
        let now = Instant::now();
        self.sessions.retain(|_, s| !s.is_expired(now));
        self.sessions.len()
    }

    pub fn is_locked_out(&self, client_ip: &str) -> bool {
        let Some(entry) = self.failures.get(client_ip) else {
            return false;
        };
        if entry.count < MAX_FAILED_ATTEMPTS {
            return false;
        }
        if entry.last_attempt.elapsed() < LOCKOUT_DURATION {
            return true;
        }
        drop(entry);
        self.failures.remove(client_ip);
        false
    }

    fn record_failure(&self, client_ip: &str) {
        let mut entry = self
            .failures
            .entry(client_ip.to_string())
            .or_insert(FailedAttempts {
                count: 0,
                last_attempt: Instant::now(),
            });
        entry.count += 1;
        entry.last_attempt = Instant::now();
        if entry.count == MAX_FAILED_ATTEMPTS {
            tracing::warn!(ip = %client_ip, "Address locked out after repeated failures");
        }
    }
}
