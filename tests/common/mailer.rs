//! Mailers for tests
//!
//! `CapturingMailer` keeps every message so tests can read back the
//! verification code or reset link a real user would receive.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ayu_blog::backend::auth::mailer::{MailError, Mailer, OutgoingEmail};

#[derive(Clone, Default)]
pub struct CapturingMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl CapturingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Last message sent to `to`
    pub fn last_to(&self, to: &str) -> Option<OutgoingEmail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|email| email.to == to)
            .cloned()
    }

    /// Verification code from the last message sent to `to`
    pub fn last_code(&self, to: &str) -> i64 {
        let email = self.last_to(to).expect("No email sent to address");
        email
            .html
            .split(['<', '>'])
            .map(str::trim)
            .find(|part| part.len() == 5 && part.chars().all(|c| c.is_ascii_digit()))
            .and_then(|part| part.parse().ok())
            .expect("No verification code in email")
    }

    /// Reset token from the last reset link sent to `to`
    pub fn last_reset_token(&self, to: &str) -> String {
        let email = self.last_to(to).expect("No email sent to address");
        let marker = "/password/reset/";
        let start = email.html.find(marker).expect("No reset link in email") + marker.len();
        email.html[start..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect()
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Mailer that rejects every recipient
#[derive(Clone, Copy, Default)]
pub struct RejectingMailer;

#[async_trait]
impl Mailer for RejectingMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), MailError> {
        let err = "rejected".parse::<lettre::Address>().unwrap_err();
        Err(MailError::Address(err))
    }
}
