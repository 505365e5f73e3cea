//! Guest access and form invitation emails.
//!
//! `send_email`, `send_guest_form_email` and `send_guest_confirmation` all
//! accept this request shape; they differ only in sender formatting and in
//! whether the access email carries a confirmation link.

use serde::Deserialize;

use crate::mail::OutgoingEmail;
use crate::templates;
use crate::{Error, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestEmailRequest {
    pub email_type: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub event_name: Option<String>,
    pub guest_name: Option<String>,
    pub confirmation_token: Option<String>,
    pub emails: Option<Vec<String>>,
    pub link: Option<String>,
}

impl GuestEmailRequest {
    pub fn is_login(&self) -> bool {
        self.email_type.as_deref() == Some("login")
    }
}

/// How the guest access email is worded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStyle {
    /// "Welcome to {event}" subject, no confirmation link.
    Welcome,
    /// "{event} • Your Guest Access" subject, no confirmation link.
    Plain,
    /// "{event} • Your Guest Access" subject plus a confirm-email link.
    WithConfirmation,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Guest access email with app credentials.
pub fn access_email(from: &str, request: &GuestEmailRequest, style: AccessStyle) -> Result<OutgoingEmail> {
    let (email, password, event_name, guest_name) = match (
        present(&request.email),
        present(&request.password),
        present(&request.event_name),
        present(&request.guest_name),
    ) {
        (Some(e), Some(p), Some(ev), Some(g)) => (e, p, ev, g),
        _ => {
            let prefix = if request.is_login() { "Missing required fields for login email" } else { "Missing required fields" };
            return Err(Error::Validation(format!(
                "{}: email, password, eventName, guestName",
                prefix
            )));
        }
    };

    let confirmation_url = match style {
        AccessStyle::WithConfirmation => {
            let token = present(&request.confirmation_token)
                .map(str::to_string)
                .unwrap_or_else(|| urlencoding::encode(email).into_owned());
            Some(format!("{}?token={}", templates::GUEST_CONFIRMED_URL, token))
        }
        AccessStyle::Welcome | AccessStyle::Plain => None,
    };

    let subject = match style {
        AccessStyle::Welcome => format!("Welcome to {} • Your Guest Access", event_name),
        AccessStyle::Plain | AccessStyle::WithConfirmation => format!("{} • Your Guest Access", event_name),
    };

    Ok(OutgoingEmail {
        from: from.to_string(),
        to: vec![email.to_string()],
        subject,
        html: templates::guest_access(event_name, guest_name, email, password, confirmation_url.as_deref()),
    })
}

/// One invitation to complete a form, addressed to every recipient.
pub fn form_email(from: &str, request: &GuestEmailRequest) -> Result<OutgoingEmail> {
    let recipients = request.emails.as_ref().filter(|e| !e.is_empty());
    match (recipients, present(&request.link), present(&request.event_name)) {
        (Some(recipients), Some(link), Some(event_name)) => Ok(OutgoingEmail {
            from: from.to_string(),
            to: recipients.clone(),
            subject: format!("{} • Please complete your form", event_name),
            html: templates::form_invitation(event_name, link),
        }),
        _ => Err(Error::Validation(
            "Missing required fields: emails[], link, eventName".to_string(),
        )),
    }
}

/// `OnTimely <address>` display form of a sender address.
pub fn branded_sender(address: &str) -> String {
    format!("OnTimely <{}>", address)
}
