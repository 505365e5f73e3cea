//! In-memory doubles for handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth_admin::PasswordAdmin;
use crate::mail::{MailSender, OutgoingEmail, SentEmail};
use crate::models::{FeedbackRecord, FormDefinition, GuestConfirmation};
use crate::store::GuestStore;
use crate::{Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// [`GuestStore`] backed by maps, with switches to simulate database failures.
#[derive(Default)]
pub struct MemoryGuestStore {
    confirmations: HashMap<String, Vec<GuestConfirmation>>,
    forms: HashMap<String, FormDefinition>,
    users: HashMap<String, Uuid>,
    guests: HashMap<(String, String), Uuid>,
    pub fail_reads: bool,
    pub fail_inserts: bool,
    pub submissions: Mutex<Vec<(String, serde_json::Value)>>,
    pub feedback: Mutex<Vec<FeedbackRecord>>,
}

impl MemoryGuestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirmation(mut self, token: &str, row: GuestConfirmation) -> Self {
        self.confirmations.entry(token.to_string()).or_default().push(row);
        self
    }

    pub fn with_form(mut self, token: &str, form: FormDefinition) -> Self {
        self.forms.insert(token.to_string(), form);
        self
    }

    pub fn with_user(mut self, email: &str, id: Uuid) -> Self {
        self.users.insert(email.to_string(), id);
        self
    }

    pub fn with_guest(mut self, event_id: &str, email: &str, id: Uuid) -> Self {
        self.guests.insert((event_id.to_string(), email.to_string()), id);
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn stored_feedback(&self) -> Vec<FeedbackRecord> {
        lock(&self.feedback).clone()
    }

    pub fn stored_submissions(&self) -> Vec<(String, serde_json::Value)> {
        lock(&self.submissions).clone()
    }
}

#[async_trait]
impl GuestStore for MemoryGuestStore {
    async fn confirm_guest_email(&self, confirmation_token: &str) -> Result<Vec<GuestConfirmation>> {
        self.check_read()?;
        Ok(self.confirmations.get(confirmation_token).cloned().unwrap_or_default())
    }

    async fn submit_form(&self, token: &str, responses: &serde_json::Value) -> Result<serde_json::Value> {
        if self.fail_inserts {
            return Err(Error::Database(sqlx::Error::RowNotFound));
        }
        lock(&self.submissions).push((token.to_string(), responses.clone()));
        Ok(serde_json::json!([{ "guest_created": true }]))
    }

    async fn get_form(&self, token: &str) -> Result<Vec<FormDefinition>> {
        self.check_read()?;
        Ok(self.forms.get(token).cloned().into_iter().collect())
    }

    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<Uuid>> {
        self.check_read()?;
        Ok(self.users.get(email).copied())
    }

    async fn find_guest_id(&self, event_id: &str, email: &str) -> Result<Option<Uuid>> {
        self.check_read()?;
        Ok(self
            .guests
            .get(&(event_id.to_string(), email.to_string()))
            .copied())
    }

    async fn insert_feedback(&self, record: &FeedbackRecord) -> Result<Uuid> {
        if self.fail_inserts {
            return Err(Error::Database(sqlx::Error::RowNotFound));
        }
        lock(&self.feedback).push(record.clone());
        Ok(Uuid::new_v4())
    }
}

/// [`MailSender`] that records messages and can refuse chosen recipients.
#[derive(Default)]
pub struct RecordingMailer {
    refuse: HashSet<String>,
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing(mut self, recipient: &str) -> Self {
        self.refuse.insert(recipient.to_string());
        self
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail> {
        if let Some(refused) = email.to.iter().find(|to| self.refuse.contains(*to)) {
            return Err(Error::ExternalService(format!("Recipient refused: {}", refused)));
        }
        let mut sent = lock(&self.sent);
        sent.push(email.clone());
        Ok(SentEmail {
            id: format!("email-{}", sent.len()),
        })
    }
}

/// [`PasswordAdmin`] that records updates.
#[derive(Default)]
pub struct RecordingPasswordAdmin {
    pub fail: bool,
    updates: Mutex<Vec<(Uuid, String)>>,
}

impl RecordingPasswordAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn updates(&self) -> Vec<(Uuid, String)> {
        lock(&self.updates).clone()
    }
}

#[async_trait]
impl PasswordAdmin for RecordingPasswordAdmin {
    async fn update_password(&self, user_id: Uuid, password: &str) -> Result<()> {
        if self.fail {
            return Err(Error::ExternalService("auth admin unavailable".to_string()));
        }
        lock(&self.updates).push((user_id, password.to_string()));
        Ok(())
    }
}
