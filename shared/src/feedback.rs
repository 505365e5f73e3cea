//! Post-event feedback: request emails out, ratings back in.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::mail::{MailSender, OutgoingEmail};
use crate::models::FeedbackRecord;
use crate::store::GuestStore;
use crate::templates;
use crate::tokens::FeedbackToken;
use crate::{Error, Result};

/// Request to email feedback links to an event's guests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub event_id: Option<String>,
    pub event_name: Option<String>,
    pub guest_emails: Option<Vec<String>>,
    pub custom_message: Option<String>,
}

/// A guest's rating, identified by the token from their feedback link.
#[derive(Debug, Deserialize, Validate)]
pub struct FeedbackSubmission {
    pub token: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i64>,
    pub feedback: Option<String>,
}

/// Outcome of a batch of feedback request emails.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failures: Vec<String>,
}

/// Outcome of storing a submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Email one feedback link per guest, all sends in flight at once.
///
/// Validation failures return `Err`; delivery failures are collected in the
/// summary so the caller can report partial success.
pub async fn send_feedback_requests(
    mailer: &dyn MailSender,
    from: &str,
    request: &FeedbackRequest,
    now: DateTime<Utc>,
) -> Result<DispatchSummary> {
    let missing = || Error::Validation("Missing required fields: eventId, eventName, guestEmails".to_string());

    let event_id = request.event_id.as_deref().filter(|s| !s.is_empty()).ok_or_else(missing)?;
    let event_name = request.event_name.as_deref().filter(|s| !s.is_empty()).ok_or_else(missing)?;
    let guest_emails = request
        .guest_emails
        .as_ref()
        .filter(|emails| !emails.is_empty())
        .ok_or_else(missing)?;

    let emails: Vec<OutgoingEmail> = guest_emails
        .iter()
        .map(|email| {
            let token = FeedbackToken::encode(event_id, email, now);
            let url = format!("{}/{}", templates::FEEDBACK_URL, token);
            OutgoingEmail {
                from: from.to_string(),
                to: vec![email.clone()],
                subject: format!("{} • We'd Love Your Feedback", event_name),
                html: templates::feedback_request(event_name, &url, request.custom_message.as_deref()),
            }
        })
        .collect();

    let results = join_all(emails.iter().map(|email| mailer.send(email))).await;

    let mut summary = DispatchSummary::default();
    for (email, result) in emails.iter().zip(results) {
        match result {
            Ok(_) => summary.sent += 1,
            Err(e) => {
                error!(to = ?email.to, error = %e, "Feedback request failed");
                summary.failures.push(e.to_string());
            }
        }
    }

    info!(event_id = %event_id, sent = summary.sent, failed = summary.failures.len(), "Feedback requests dispatched");
    Ok(summary)
}

/// Validate a submission, resolve the guest and store the rating.
///
/// A failed insert is logged and still acknowledged, with a note, because the
/// guest has done everything asked of them.
pub async fn submit_feedback(
    store: &dyn GuestStore,
    submission: &FeedbackSubmission,
    now: DateTime<Utc>,
) -> Result<SubmissionReceipt> {
    let invalid_rating = || Error::Validation("Missing or invalid rating".to_string());

    let token = submission.token.as_deref().filter(|t| !t.is_empty()).ok_or_else(invalid_rating)?;
    let rating = submission.rating.ok_or_else(invalid_rating)?;
    submission.validate().map_err(|_| invalid_rating())?;

    let decoded = FeedbackToken::decode(token)?;

    let guest_id = store
        .find_guest_id(&decoded.event_id, &decoded.guest_email)
        .await
        .map_err(|e| {
            error!(error = %e, "Error finding guest");
            Error::Internal("Database error".to_string())
        })?
        .ok_or_else(|| Error::NotFound("Guest not found for this event".to_string()))?;

    let record = FeedbackRecord {
        event_id: decoded.event_id,
        guest_id,
        guest_email: decoded.guest_email,
        rating: rating as i16,
        feedback_text: submission.feedback.clone().filter(|f| !f.is_empty()),
        submitted_at: now,
    };

    match store.insert_feedback(&record).await {
        Ok(feedback_id) => {
            info!(feedback_id = %feedback_id, event_id = %record.event_id, rating = record.rating, "Feedback stored");
            Ok(SubmissionReceipt {
                message: "Feedback submitted successfully".to_string(),
                feedback_id: Some(feedback_id),
                note: None,
            })
        }
        Err(e) => {
            warn!(error = %e, record = ?record, "Error inserting feedback, logged only");
            Ok(SubmissionReceipt {
                message: "Feedback submitted successfully".to_string(),
                feedback_id: None,
                note: Some("Feedback logged (table may need to be created)".to_string()),
            })
        }
    }
}
