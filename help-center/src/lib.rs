//! OnTimely help center: canned answers, live-agent queue and screen-share sessions.

pub mod api;
pub mod conversation;
pub mod live_agent;
pub mod responder;
pub mod screen_share;
pub mod service;
pub mod store;

pub use service::{ChatReply, HelpCenter};
pub use store::{ChatRecord, HelpCenterStore, PgHelpCenterStore};
