use crate::prompts::{get_system_prompt, memory_priming, MEMORY_ACK};
use shared::agent_api::{ChatMessage, ConversationMessage};
use uuid::Uuid;

/// Model-side state of one conversation: persona plus the turns the model
/// has seen. Rebuilt from scratch whenever the user or their facts change.
#[derive(Debug, Clone)]
pub struct ChatSession {
    system_instruction: String,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(user_name: &str, facts: &[String], transcript: &[ConversationMessage]) -> Self {
        let mut history = Vec::new();
        if !facts.is_empty() {
            history.push(ChatMessage::user(memory_priming(user_name, facts)));
            history.push(ChatMessage::assistant(MEMORY_ACK));
        }
        history.extend(
            transcript
                .iter()
                .filter(|m| !m.is_streaming && !m.text.is_empty() && m.id != Uuid::nil())
                .map(ConversationMessage::to_chat_message),
        );

        tracing::debug!(
            "Chat session for {}: {} fact(s), {} history turn(s)",
            user_name,
            facts.len(),
            history.len()
        );
        Self {
            system_instruction: get_system_prompt(user_name),
            history,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Request payload for sending `text` as the next user turn.
    pub fn messages_for(&self, text: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::system(self.system_instruction.clone()));
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(text));
        messages
    }

    /// Record a completed exchange.
    pub fn commit_turn(&mut self, user_text: &str, model_text: &str) {
        self.history.push(ChatMessage::user(user_text));
        self.history.push(ChatMessage::assistant(model_text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priming_precedes_transcript() {
        let facts = vec!["Likes jazz".to_string()];
        let mut greeting = ConversationMessage::assistant("Hello!");
        greeting.id = Uuid::nil();
        let transcript = vec![
            greeting,
            ConversationMessage::user("hi"),
            ConversationMessage::assistant("hey there"),
            ConversationMessage::assistant(""),
            ConversationMessage::typing(),
        ];

        let session = ChatSession::new("Priya", &facts, &transcript);
        let history = session.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, "user");
        assert!(history[0].content.starts_with("[INTERNAL MEMORY LOADED]\n"));
        assert_eq!(history[1], ChatMessage::assistant(MEMORY_ACK));
        assert_eq!(history[2], ChatMessage::user("hi"));
        assert_eq!(history[3], ChatMessage::assistant("hey there"));
    }

    #[test]
    fn test_no_facts_no_priming() {
        let session = ChatSession::new("Priya", &[], &[]);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_messages_for_wraps_history() {
        let mut session = ChatSession::new("Priya", &[], &[]);
        session.commit_turn("hello", "hi <open_diary/>");

        let messages = session.messages_for("next");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("for Priya."));
        assert_eq!(messages[2], ChatMessage::assistant("hi <open_diary/>"));
        assert_eq!(messages[3], ChatMessage::user("next"));
        assert_eq!(session.history().len(), 2);
    }
}
