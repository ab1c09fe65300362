//! Point-to-point text messaging and per-agent notifications.
//!
//! Delivery is immediate: a message lands in the recipient's inbox the
//! moment it is sent. Inboxes and notification queues are read-once;
//! draining hands the entries to the caller and leaves the queue empty.

use chrono::Utc;
use meadow_types::{AgentId, InboxMessage};
use tracing::{debug, error};

use crate::error::AgentError;
use crate::registry::AgentRegistry;

/// Deliver `message` from `sender` to the agent named `recipient`.
///
/// Returns the recipient's id so the caller can raise a `received_text`
/// trigger for it.
///
/// # Errors
///
/// Unknown senders, unknown recipient names, and self-addressed messages
/// are rejected. The message is dropped and the error is logged.
pub fn send_text(
    agents: &mut AgentRegistry,
    sender: &AgentId,
    recipient: &str,
    message: &str,
) -> Result<AgentId, AgentError> {
    let sender_name = agents.require(sender)?.name.clone();
    let Some(target) = agents.find_by_name(recipient).map(|a| a.id.clone()) else {
        error!(from = %sender, to = recipient, "unknown recipient, message dropped");
        return Err(AgentError::UnknownRecipient {
            name: recipient.to_owned(),
        });
    };
    if &target == sender {
        error!(agent_id = %sender, "self-addressed message dropped");
        return Err(AgentError::SelfAddressed(target));
    }

    let inbox = &mut agents.require_mut(&target)?.inbox;
    inbox.push(InboxMessage {
        sender: sender_name,
        message: message.to_owned(),
        timestamp: Utc::now(),
    });
    debug!(from = %sender, to = %target, queued = inbox.len(), "message delivered");
    Ok(target)
}

/// Take every unread message, oldest first.
pub fn drain_inbox(
    agents: &mut AgentRegistry,
    id: &AgentId,
) -> Result<Vec<InboxMessage>, AgentError> {
    Ok(std::mem::take(&mut agents.require_mut(id)?.inbox))
}

/// Queue a world notification for every agent.
pub fn notify_all(agents: &mut AgentRegistry, text: &str) {
    let ids = agents.ids().to_vec();
    for id in ids {
        if let Ok(agent) = agents.require_mut(&id) {
            agent.notifications.push(text.to_owned());
        }
    }
}

/// Take every undelivered notification, oldest first.
pub fn drain_notifications(
    agents: &mut AgentRegistry,
    id: &AgentId,
) -> Result<Vec<String>, AgentError> {
    Ok(std::mem::take(&mut agents.require_mut(id)?.notifications))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::tests::pair;

    #[test]
    fn text_lands_in_recipient_inbox_once() {
        let mut agents = pair();
        let alice = AgentId::new("agent1");
        let bob = AgentId::new("agent2");

        let to = send_text(&mut agents, &alice, "Bob", "hi").unwrap();
        assert_eq!(to, bob);

        let inbox = &agents.get(&bob).unwrap().inbox;
        assert_eq!(inbox.len(), 1);
        let entry = inbox.first().unwrap();
        assert_eq!(entry.sender, "Alice");
        assert_eq!(entry.message, "hi");

        let drained = drain_inbox(&mut agents, &bob).unwrap();
        assert_eq!(drained.len(), 1);
        assert!(drain_inbox(&mut agents, &bob).unwrap().is_empty());
    }

    #[test]
    fn unknown_recipient_is_dropped() {
        let mut agents = pair();
        let alice = AgentId::new("agent1");
        let result = send_text(&mut agents, &alice, "Carol", "hello?");
        assert!(matches!(result, Err(AgentError::UnknownRecipient { .. })));
        assert!(agents.all().all(|a| a.inbox.is_empty()));
    }

    #[test]
    fn self_messages_are_rejected() {
        let mut agents = pair();
        let alice = AgentId::new("agent1");
        let result = send_text(&mut agents, &alice, "Alice", "echo");
        assert!(matches!(result, Err(AgentError::SelfAddressed(_))));
    }

    #[test]
    fn notifications_reach_everyone_and_drain() {
        let mut agents = pair();
        notify_all(&mut agents, "All coins have been collected.");
        for id in agents.ids().to_vec() {
            assert_eq!(drain_notifications(&mut agents, &id).unwrap().len(), 1);
            assert!(drain_notifications(&mut agents, &id).unwrap().is_empty());
        }
    }
}
