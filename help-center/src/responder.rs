//! Canned help-center answers.
//!
//! Rules are evaluated in declaration order and the first one whose keyword
//! appears in the lower-cased message wins.

/// A keyword rule: any of `keywords` found in the message selects `response`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub keywords: &'static [&'static str],
    pub response: &'static str,
}

pub const CREATE_EVENT: &str = "To create your first event, go to the Events section in your dashboard and click 'Create New Event'. Fill in the basic details like event name, date, and location. You can customize the homepage and add modules later.";
pub const INVITE_GUESTS: &str = "You can invite guests by going to Guest Management and uploading a CSV file or manually adding guests. Send invitations via email with custom messages and track RSVP responses in real-time.";
pub const TEAM_MEMBERS: &str = "To add team members, go to Team Management and invite them by email. Assign roles (Admin, Manager, Staff) with different permission levels to control access to features.";
pub const LOGIN_PROBLEM: &str = "If you're having trouble logging in, try resetting your password using the 'Forgot Password' link. Make sure you're using the correct email address and check your spam folder for verification emails.";
pub const SYNC_ISSUE: &str = "If data isn't syncing properly, try logging out and back in. Make sure you have a stable internet connection. If the problem persists, contact our support team.";
pub const PERFORMANCE: &str = "To improve performance, try closing other applications, clearing your browser cache, or restarting the desktop app. Make sure you're using the latest version.";
pub const MOBILE_APP: &str = "The mobile app is designed for guests to access event information, chat with other attendees, and use travel tools like offline maps and translation. Download it from the App Store or Google Play.";
pub const OFFLINE_MAPS: &str = "Offline maps allow guests to navigate without internet. They can download map areas, add custom pins, and get directions. This is especially useful for international events.";
pub const TRANSLATOR: &str = "Our translator supports 40+ languages with real-time translation. Guests can translate text, use quick phrases, and access translation history.";
pub const CHAT_SYSTEM: &str = "The chat system enables real-time communication between guests and organizers. You can send announcements, create group chats, and monitor conversations.";
pub const BILLING: &str = "You can manage your subscription in Account Settings. We accept credit cards, PayPal, and bank transfers. Contact support for billing questions.";
pub const FREE_TRIAL: &str = "We offer a 14-day free trial with full access to all features. No credit card required to start your trial.";
pub const HELP: &str = "I'm here to help! You can ask me about creating events, managing guests, using features, troubleshooting issues, or anything else about OnTimely.";
pub const CONTACT_SUPPORT: &str = "For direct support, click the 'Speak to Agent' button to chat with our human support team, or email us at support@ontimely.co.uk";

pub const THANKS: &str = "You're welcome! Is there anything else I can help you with?";
pub const FAREWELL: &str = "Goodbye! Feel free to come back anytime if you need help with OnTimely.";
pub const FALLBACK: &str = "I understand you're looking for help. Could you be more specific about what you need assistance with? I can help with event creation, guest management, technical issues, or any other OnTimely features.";

/// Product knowledge base, in matching order.
pub const KNOWLEDGE_BASE: &[Rule] = &[
    // Getting started
    Rule { keywords: &["create event"], response: CREATE_EVENT },
    Rule { keywords: &["invite guests"], response: INVITE_GUESTS },
    Rule { keywords: &["team members"], response: TEAM_MEMBERS },
    // Technical issues
    Rule { keywords: &["login problem"], response: LOGIN_PROBLEM },
    Rule { keywords: &["sync issue"], response: SYNC_ISSUE },
    Rule { keywords: &["performance"], response: PERFORMANCE },
    // Features
    Rule { keywords: &["mobile app"], response: MOBILE_APP },
    Rule { keywords: &["offline maps"], response: OFFLINE_MAPS },
    Rule { keywords: &["translator"], response: TRANSLATOR },
    Rule { keywords: &["chat system"], response: CHAT_SYSTEM },
    // Billing
    Rule { keywords: &["billing"], response: BILLING },
    Rule { keywords: &["free trial"], response: FREE_TRIAL },
    // General
    Rule { keywords: &["help"], response: HELP },
    Rule { keywords: &["contact support"], response: CONTACT_SUPPORT },
];

/// Small-talk rules, tried only when nothing in the knowledge base matched.
pub const SMALL_TALK: &[Rule] = &[
    Rule { keywords: &["thank"], response: THANKS },
    Rule { keywords: &["bye", "goodbye"], response: FAREWELL },
];

impl Rule {
    fn matches(&self, message: &str) -> bool {
        self.keywords.iter().any(|keyword| message.contains(keyword))
    }
}

/// Answer a free-text question with the first matching canned response.
pub fn answer(message: &str) -> &'static str {
    let message = message.to_lowercase();

    KNOWLEDGE_BASE
        .iter()
        .chain(SMALL_TALK)
        .find(|rule| rule.matches(&message))
        .map(|rule| rule.response)
        .unwrap_or(FALLBACK)
}
