//! Agent Host - the wellness companion's chat pipeline
//!
//! This crate provides:
//! - The chat session (persona, remembered facts, model history)
//! - Streaming replies with live updates and cancellation
//! - Extraction and dispatch of UI directives embedded in replies
//! - One-shot insights (song picks, sentiment, diary moods)

pub mod directives;
pub mod dispatcher;
pub mod insights;
pub mod prompts;
pub mod session;
pub mod stream;

pub use directives::extract_directives;
pub use dispatcher::{ActionDispatcher, DispatchReport, UiHost};
pub use insights::{Insights, Recommendation};
pub use session::ChatSession;
pub use stream::{accumulate, StreamOutcome};

use futures::future::AbortRegistration;
use futures::stream::{once, TryStreamExt};
use providers::{ProviderError, ResponseSource, RetryPolicy};
use services::store::{load_json, save_json, KeyValueStore, KEY_CHAT_HISTORY};
use services::{FactStore, ThemeStore};
use shared::agent_api::ConversationMessage;
use std::sync::Arc;
use uuid::Uuid;

pub const CONNECTION_APOLOGY: &str = "Sorry, I'm having trouble connecting. Please try again later.";

/// How a call to [`Companion::send`] ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    Replied {
        text: String,
        report: DispatchReport,
    },
    /// The apology replaced the partial reply.
    Failed(ProviderError),
    Cancelled,
}

/// One user's conversation: transcript, model session and the dispatcher
/// that carries out what the replies ask for.
pub struct Companion<S: ResponseSource, H: UiHost> {
    source: S,
    retry: RetryPolicy,
    store: Arc<dyn KeyValueStore>,
    dispatcher: ActionDispatcher<H>,
    session: ChatSession,
    transcript: Vec<ConversationMessage>,
}

impl<S: ResponseSource, H: UiHost> Companion<S, H> {
    /// Restore the saved transcript (or start with a greeting) and build a
    /// session for `user_name`.
    pub fn new(
        source: S,
        retry: RetryPolicy,
        host: H,
        store: Arc<dyn KeyValueStore>,
        user_name: &str,
    ) -> Self {
        let transcript = match load_json::<Vec<ConversationMessage>>(store.as_ref(), KEY_CHAT_HISTORY) {
            Ok(Some(saved)) if !saved.is_empty() => saved
                .into_iter()
                .filter(|m| !m.is_streaming)
                .collect(),
            Ok(_) => vec![greeting()],
            Err(e) => {
                tracing::warn!("Could not load chat history: {:#}", e);
                vec![greeting()]
            }
        };
        let dispatcher = ActionDispatcher::new(
            host,
            ThemeStore::new(store.clone()),
            FactStore::new(store.clone()),
        );
        let session = build_session(&dispatcher, user_name, &transcript);
        tracing::info!(
            "Companion ready for {} ({} transcript message(s))",
            user_name,
            transcript.len()
        );

        Self {
            source,
            retry,
            store,
            dispatcher,
            session,
            transcript,
        }
    }

    /// Recreate the model session, e.g. after sign-in or when facts changed.
    pub fn replace_session(&mut self, user_name: &str) {
        self.session = build_session(&self.dispatcher, user_name, &self.transcript);
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn transcript(&self) -> &[ConversationMessage] {
        &self.transcript
    }

    pub fn dispatcher(&self) -> &ActionDispatcher<H> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut ActionDispatcher<H> {
        &mut self.dispatcher
    }

    /// Send one user message and stream the reply into the transcript.
    ///
    /// `on_update` sees the accumulated reply after every fragment. When
    /// `reply_to` names a transcript message, the model is told which message
    /// is being answered; the transcript shows `input` unchanged.
    pub async fn send<F>(
        &mut self,
        input: &str,
        reply_to: Option<Uuid>,
        abort: Option<AbortRegistration>,
        mut on_update: F,
    ) -> TurnOutcome
    where
        F: FnMut(&str),
    {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return TurnOutcome::Ignored;
        }

        let quoted = reply_to.and_then(|id| self.transcript.iter().find(|m| m.id == id));
        let model_text = match quoted {
            Some(quoted) => prompts::reply_context(&quoted.text, trimmed),
            None => {
                if let Some(id) = reply_to {
                    tracing::warn!("Reply target {} not in transcript; sending as-is", id);
                }
                trimmed.to_string()
            }
        };

        let typing = ConversationMessage::typing();
        let typing_id = typing.id;
        self.transcript.push(ConversationMessage::user(input));
        self.transcript.push(typing);

        let messages = self.session.messages_for(&model_text);
        let source = &self.source;
        let retry = &self.retry;
        // Opening (with its backoff) is part of the stream so an abort covers it
        let fragments = once(retry.run(|| source.open_stream(messages.clone()))).try_flatten();

        let transcript = &mut self.transcript;
        let result = accumulate(fragments, abort, |text| {
            if let Some(msg) = transcript.iter_mut().find(|m| m.id == typing_id) {
                msg.text = text.to_string();
            }
            on_update(text);
        })
        .await;

        let outcome = match result {
            Ok(StreamOutcome::Completed(raw)) => {
                let (cleaned, directives) = extract_directives(&raw);
                let report = self.dispatcher.dispatch(directives);
                if let Some(msg) = self.transcript.iter_mut().find(|m| m.id == typing_id) {
                    msg.text = cleaned.clone();
                    msg.is_streaming = false;
                }
                self.session.commit_turn(&model_text, &raw);
                TurnOutcome::Replied {
                    text: cleaned,
                    report,
                }
            }
            Ok(StreamOutcome::Cancelled) => {
                self.transcript.retain(|m| m.id != typing_id);
                TurnOutcome::Cancelled
            }
            Err(e) => {
                tracing::error!("Error getting chat response: {}", e);
                self.transcript.retain(|m| m.id != typing_id);
                self.transcript.push(ConversationMessage::assistant(CONNECTION_APOLOGY));
                TurnOutcome::Failed(e)
            }
        };

        self.save_transcript();
        outcome
    }

    fn save_transcript(&self) {
        if let Err(e) = save_json(self.store.as_ref(), KEY_CHAT_HISTORY, &self.transcript) {
            tracing::warn!("Failed to save chat history: {:#}", e);
        }
    }
}

/// Fixed opening message. Its nil id keeps it out of the model history.
fn greeting() -> ConversationMessage {
    ConversationMessage {
        id: Uuid::nil(),
        ..ConversationMessage::assistant(prompts::GREETING)
    }
}

fn build_session<H: UiHost>(
    dispatcher: &ActionDispatcher<H>,
    user_name: &str,
    transcript: &[ConversationMessage],
) -> ChatSession {
    let facts = dispatcher.facts().all().unwrap_or_else(|e| {
        tracing::warn!("Could not load remembered facts: {:#}", e);
        Vec::new()
    });
    ChatSession::new(user_name, &facts, transcript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::tests::RecordingHost;
    use async_trait::async_trait;
    use futures::future::AbortHandle;
    use futures::stream::{self, StreamExt};
    use parking_lot::Mutex;
    use providers::FragmentStream;
    use services::store::MemoryStore;
    use shared::agent_api::{ChatMessage, Role};
    use shared::directive::Panel;
    use std::collections::VecDeque;
    use std::time::Duration;

    enum Script {
        Fragments(Vec<&'static str>),
        /// Some fragments, then a mid-stream failure.
        Broken(Vec<&'static str>),
        Refuse(ProviderError),
    }

    /// Plays one scripted response per request and keeps the requests.
    #[derive(Default)]
    struct ScriptedSource {
        scripts: Mutex<VecDeque<Script>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedSource {
        fn new(scripts: Vec<Script>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                requests: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl ResponseSource for ScriptedSource {
        async fn open_stream(&self, messages: Vec<ChatMessage>) -> Result<FragmentStream, ProviderError> {
            self.requests.lock().push(messages);
            let script = self
                .scripts
                .lock()
                .pop_front()
                .unwrap_or(Script::Refuse(ProviderError::unknown("no script")));
            let to_items = |parts: Vec<&'static str>| {
                parts
                    .into_iter()
                    .map(|p| Ok(p.to_string()))
                    .collect::<Vec<Result<String, ProviderError>>>()
            };
            match script {
                Script::Fragments(parts) => Ok(stream::iter(to_items(parts)).boxed()),
                Script::Broken(parts) => {
                    let mut items = to_items(parts);
                    items.push(Err(ProviderError::network("connection reset")));
                    Ok(stream::iter(items).boxed())
                }
                Script::Refuse(e) => Err(e),
            }
        }
    }

    fn companion(
        scripts: Vec<Script>,
        store: Arc<dyn KeyValueStore>,
    ) -> Companion<ScriptedSource, RecordingHost> {
        let retry = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
        };
        Companion::new(
            ScriptedSource::new(scripts),
            retry,
            RecordingHost::default(),
            store,
            "Priya",
        )
    }

    #[tokio::test]
    async fn test_fresh_transcript_starts_with_greeting() {
        let c = companion(vec![], Arc::new(MemoryStore::new()));
        assert_eq!(c.transcript().len(), 1);
        assert_eq!(c.transcript()[0].text, prompts::GREETING);
        assert!(c.session().history().is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut c = companion(vec![], Arc::new(MemoryStore::new()));
        let outcome = c.send("   ", None, None, |_| {}).await;
        assert!(matches!(outcome, TurnOutcome::Ignored));
        assert_eq!(c.transcript().len(), 1);
        assert!(c.source.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_reply_streams_then_dispatches() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut c = companion(
            vec![Script::Fragments(vec![
                "Sure! <save_fact>Likes jazz</save_fact> ",
                "<save_fact>Likes jazz</save_fact> <open_diary/>",
            ])],
            store.clone(),
        );

        let mut updates = Vec::new();
        let outcome = c
            .send("Open my diary, I love jazz", None, None, |t| updates.push(t.to_string()))
            .await;

        let TurnOutcome::Replied { text, report } = outcome else {
            panic!("expected a reply");
        };
        assert_eq!(text, "Sure!");
        assert_eq!(report.panels, vec![Panel::Diary]);
        assert_eq!(report.facts_added, 1);
        assert_eq!(updates.len(), 2);
        assert!(updates[1].ends_with("<open_diary/>"));

        assert_eq!(c.dispatcher().host().active_panel, Some(Panel::Diary));
        assert_eq!(c.dispatcher().facts().all().unwrap(), vec!["Likes jazz".to_string()]);

        let last = c.transcript().last().unwrap();
        assert_eq!(last.text, "Sure!");
        assert!(!last.is_streaming);

        // The model keeps its own raw wording
        let history = c.session().history();
        assert_eq!(history.len(), 2);
        assert!(history[1].content.contains("<open_diary/>"));

        // Persisted, and restored by a new companion
        let restored = companion(vec![], store);
        assert_eq!(restored.transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_reply_to_adds_context_for_model_only() {
        let mut c = companion(vec![Script::Fragments(vec!["Glad to hear!"])], Arc::new(MemoryStore::new()));
        let greeting_id = c.transcript()[0].id;

        c.send("  doing great  ", Some(greeting_id), None, |_| {}).await;

        let requests = c.source.requests.lock();
        let sent = requests[0].last().unwrap();
        let excerpt: String = prompts::GREETING.chars().take(50).collect();
        assert_eq!(sent.content, format!("In reply to \"{}...\":\ndoing great", excerpt));
        assert_eq!(c.transcript()[1].text, "  doing great  ");
        assert_eq!(c.transcript()[1].role, Role::User);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_becomes_apology() {
        let mut c = companion(
            vec![Script::Broken(vec!["I was say"])],
            Arc::new(MemoryStore::new()),
        );
        let outcome = c.send("hello", None, None, |_| {}).await;

        assert!(matches!(outcome, TurnOutcome::Failed(_)));
        let transcript = c.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2].text, CONNECTION_APOLOGY);
        assert!(transcript.iter().all(|m| !m.is_streaming));
        assert!(c.session().history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_open_is_retried() {
        let mut c = companion(
            vec![
                Script::Refuse(ProviderError::rate_limit("429")),
                Script::Refuse(ProviderError::rate_limit("RESOURCE_EXHAUSTED")),
                Script::Fragments(vec!["Hi!"]),
            ],
            Arc::new(MemoryStore::new()),
        );
        let outcome = c.send("hello", None, None, |_| {}).await;
        assert!(matches!(outcome, TurnOutcome::Replied { .. }));
        assert_eq!(c.source.requests.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_hard_failure_is_not_retried() {
        let mut c = companion(
            vec![Script::Refuse(ProviderError::auth("bad key"))],
            Arc::new(MemoryStore::new()),
        );
        let outcome = c.send("hello", None, None, |_| {}).await;
        assert!(matches!(outcome, TurnOutcome::Failed(_)));
        assert_eq!(c.source.requests.lock().len(), 1);
        assert_eq!(c.transcript().last().unwrap().text, CONNECTION_APOLOGY);
    }

    #[tokio::test]
    async fn test_cancel_removes_partial_reply() {
        let mut c = companion(
            vec![Script::Fragments(vec!["one ", "two ", "<open_settings/>"])],
            Arc::new(MemoryStore::new()),
        );
        let (handle, registration) = AbortHandle::new_pair();
        let outcome = c
            .send("hello", None, Some(registration), |_| handle.abort())
            .await;

        assert!(matches!(outcome, TurnOutcome::Cancelled));
        assert_eq!(c.transcript().len(), 2);
        assert_eq!(c.transcript()[1].role, Role::User);
        assert!(c.dispatcher().host().calls.is_empty());
        assert!(c.session().history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_is_not_a_failure() {
        let mut c = companion(
            vec![
                Script::Refuse(ProviderError::rate_limit("429")),
                Script::Fragments(vec!["too late"]),
            ],
            Arc::new(MemoryStore::new()),
        );
        let (handle, registration) = AbortHandle::new_pair();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            handle.abort();
        });

        let outcome = c.send("hello", None, Some(registration), |_| {}).await;

        assert!(matches!(outcome, TurnOutcome::Cancelled));
        assert_eq!(c.source.requests.lock().len(), 1);
        assert_eq!(c.transcript().len(), 2);
        assert_ne!(c.transcript()[1].text, CONNECTION_APOLOGY);
    }

    #[tokio::test]
    async fn test_replace_session_picks_up_new_facts() {
        let mut c = companion(
            vec![Script::Fragments(vec!["Noted <save_fact>Has a cat</save_fact>"])],
            Arc::new(MemoryStore::new()),
        );
        c.send("I have a cat", None, None, |_| {}).await;
        c.replace_session("Priya");

        let history = c.session().history();
        assert!(history[0].content.contains("- Has a cat"));
        assert_eq!(history[1].content, prompts::MEMORY_ACK);
        // Transcript replay stores the cleaned reply
        assert_eq!(history[3], ChatMessage::assistant("Noted"));
    }
}
