//! HTML bodies for transactional email.

const LOGO_URL: &str = "https://ontimely.co.uk/on-timely-official-logo-email.png";
pub const APP_DOWNLOAD_URL: &str = "https://guest.ontimely.co.uk/app-download";
pub const GUEST_CONFIRMED_URL: &str = "https://ontimely.co.uk/guest-success-email-confirmed";
pub const FEEDBACK_URL: &str = "https://guest.ontimely.co.uk/feedback";

/// Escape text interpolated into HTML.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(heading: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><meta name="viewport" content="width=device-width, initial-scale=1.0"></head>
<body style="margin: 0; padding: 40px 20px; background-color: #000000; color: #e5e7eb; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6;">
    <div style="max-width: 600px; margin: 0 auto; background-color: #1a1a1a; border: 1px solid rgba(255, 255, 255, 0.1); border-radius: 16px; padding: 40px;">
        <img src="{logo}" alt="OnTimely Logo" width="80" height="80" style="display: block; margin-left: auto;" />
        <h1 style="color: #ffffff; font-size: 24px;">{heading}</h1>
        {content}
        <hr style="border: none; border-top: 1px solid rgba(255, 255, 255, 0.1); margin: 32px 0 16px;">
        <p style="color: #9ca3af; font-size: 12px;">Sent by OnTimely</p>
    </div>
</body>
</html>"#,
        logo = LOGO_URL,
        heading = heading,
        content = content,
    )
}

fn button(href: &str, label: &str) -> String {
    format!(
        r#"<p><a href="{}" style="display: inline-block; padding: 12px 24px; background-color: #22c55e; color: #000000; text-decoration: none; border-radius: 8px; font-weight: 600;">{}</a></p>"#,
        escape(href),
        escape(label)
    )
}

/// Guest access email carrying app credentials.
///
/// `confirmation_url` adds a confirm-your-email button when present.
pub fn guest_access(event_name: &str, guest_name: &str, email: &str, password: &str, confirmation_url: Option<&str>) -> String {
    let confirm = confirmation_url
        .map(|url| {
            format!(
                "<p>Please confirm your email address before signing in.</p>{}",
                button(url, "Confirm Email")
            )
        })
        .unwrap_or_default();

    let content = format!(
        r#"<p>Hi {guest},</p>
        <p>You have been invited to <strong>{event}</strong>. Use these details to sign in to the OnTimely guest app:</p>
        <div style="background-color: #2a2a2a; border-radius: 8px; padding: 16px; margin: 20px 0;">
            <p style="margin: 0;">Email: <strong>{email}</strong></p>
            <p style="margin: 8px 0 0 0;">Password: <strong>{password}</strong></p>
        </div>
        {confirm}
        {download}"#,
        guest = escape(guest_name),
        event = escape(event_name),
        email = escape(email),
        password = escape(password),
        confirm = confirm,
        download = button(APP_DOWNLOAD_URL, "Download the App"),
    );

    layout(&format!("Welcome to {}", escape(event_name)), &content)
}

/// Invitation to fill in an event form.
pub fn form_invitation(event_name: &str, link: &str) -> String {
    let content = format!(
        "<p>The organisers of <strong>{}</strong> need a few details from you before the event.</p>{}",
        escape(event_name),
        button(link, "Complete Your Form"),
    );
    layout("Please complete your form", &content)
}

/// Password reset email.
pub fn password_reset(name: &str, reset_url: &str) -> String {
    let content = format!(
        "<p>Hi {},</p><p>We received a request to reset your OnTimely password.</p>{}<p style=\"color: #9ca3af; font-size: 14px;\">If you didn't request this, you can ignore this email.</p>",
        escape(name),
        button(reset_url, "Reset Password"),
    );
    layout("Reset your password", &content)
}

/// Post-event feedback request.
pub fn feedback_request(event_name: &str, feedback_url: &str, custom_message: Option<&str>) -> String {
    let custom = custom_message
        .map(|message| format!("<p>{}</p>", escape(message)))
        .unwrap_or_default();

    let content = format!(
        "<p>Thank you for attending <strong>{}</strong>.</p>{}<p>It takes less than a minute to tell us how it went.</p>{}",
        escape(event_name),
        custom,
        button(feedback_url, "Share Feedback"),
    );
    layout("We'd love your feedback", &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<b>"Tom" & 'Jerry'</b>"#), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_guest_access_includes_credentials_and_confirmation() {
        let html = guest_access("Gala", "Ada", "ada@example.com", "S3cret!", Some("https://x.test/confirm?token=t"));
        assert!(html.contains("ada@example.com"));
        assert!(html.contains("S3cret!"));
        assert!(html.contains("https://x.test/confirm?token=t"));
        assert!(html.contains(APP_DOWNLOAD_URL));

        let html = guest_access("Gala", "Ada", "ada@example.com", "S3cret!", None);
        assert!(!html.contains("Confirm Email"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let html = form_invitation("<script>alert(1)</script>", "https://forms.test/a");
        assert!(!html.contains("<script>"));
    }
}
