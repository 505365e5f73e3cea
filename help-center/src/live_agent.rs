//! Live-agent escalation: support tickets, the waiting queue and the agent roster.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wait estimate when nobody is online, in minutes.
pub const DEFAULT_WAIT_MINUTES: u32 = 15;
/// Average time an agent spends per request, in minutes.
pub const AVERAGE_RESPONSE_MINUTES: u32 = 5;

pub const LIVE_CHAT_TITLE: &str = "Live Chat Request";
pub const LIVE_CHAT_CATEGORY: &str = "live_chat";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

/// Support ticket to be created in the data store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTicket {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: TicketPriority,
    pub status: String,
}

impl NewTicket {
    /// Ticket opened when a user asks for a human.
    pub fn live_chat(user_id: Uuid, message: &str, priority: TicketPriority) -> Self {
        Self {
            user_id,
            title: LIVE_CHAT_TITLE.to_string(),
            description: message.to_string(),
            category: LIVE_CHAT_CATEGORY.to_string(),
            priority,
            status: "open".to_string(),
        }
    }
}

/// A user waiting for an agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// What a user is told after joining the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveAgentReceipt {
    pub ticket_id: Uuid,
    pub estimated_wait_time: u32,
    pub position_in_queue: usize,
}

/// Minutes until a user at the back of a queue of `queue_length` is served.
pub fn estimate_wait_time(queue_length: usize, active_agents: usize) -> u32 {
    if active_agents == 0 {
        return DEFAULT_WAIT_MINUTES;
    }
    // ceil(queue / agents * average) in integer arithmetic
    let minutes = (queue_length as u64)
        .saturating_mul(u64::from(AVERAGE_RESPONSE_MINUTES))
        .div_ceil(active_agents as u64);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// FIFO queue of waiting users plus the set of agents currently online.
#[derive(Debug, Default)]
pub struct AgentDesk {
    waiting: VecDeque<QueueEntry>,
    active_agents: HashSet<Uuid>,
}

impl AgentDesk {
    /// Add an entry at the back of the queue and return the receipt for it.
    /// Repeated requests from one user are queued separately.
    pub fn enqueue(&mut self, entry: QueueEntry) -> LiveAgentReceipt {
        let ticket_id = entry.ticket_id;
        self.waiting.push_back(entry);

        LiveAgentReceipt {
            ticket_id,
            estimated_wait_time: estimate_wait_time(self.waiting.len(), self.active_agents.len()),
            position_in_queue: self.waiting.len(),
        }
    }

    /// Mark an agent online. Returns false if they already were.
    pub fn agent_online(&mut self, agent_id: Uuid) -> bool {
        self.active_agents.insert(agent_id)
    }

    /// Mark an agent offline. Returns false if they were not online.
    pub fn agent_offline(&mut self, agent_id: Uuid) -> bool {
        self.active_agents.remove(&agent_id)
    }

    /// Hand the longest-waiting user to an online agent.
    ///
    /// Returns `None` when the agent is offline or nobody is waiting.
    pub fn assign_next(&mut self, agent_id: Uuid) -> Option<QueueEntry> {
        if !self.active_agents.contains(&agent_id) {
            return None;
        }
        self.waiting.pop_front()
    }

    pub fn is_online(&self, agent_id: Uuid) -> bool {
        self.active_agents.contains(&agent_id)
    }

    pub fn queue_length(&self) -> usize {
        self.waiting.len()
    }

    pub fn active_agents(&self) -> usize {
        self.active_agents.len()
    }
}
