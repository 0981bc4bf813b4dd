//! Seams between the chat pipeline and whatever produces model text.

use crate::error::ProviderError;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use shared::agent_api::{ChatMessage, StreamChunk};
use tokio::sync::mpsc::UnboundedReceiver;

/// Lazy, finite, non-restartable sequence of text fragments for one response.
pub type FragmentStream = BoxStream<'static, Result<String, ProviderError>>;

/// Streams a reply to a conversation.
///
/// Contract: failures that happen *before* the first fragment are returned
/// from `open_stream` (so callers can retry them). Once the stream is handed
/// out, failures arrive as `Err` items and end the stream.
#[async_trait]
pub trait ResponseSource: Send + Sync {
    async fn open_stream(&self, messages: Vec<ChatMessage>) -> Result<FragmentStream, ProviderError>;
}

/// One-shot completion, optionally constrained to a JSON schema.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        response_schema: Option<serde_json::Value>,
    ) -> Result<String, ProviderError>;
}

/// Adapt a chunk channel into a fragment stream. The stream ends at `Done`,
/// at the first `Error` (yielded as `Err`), or when the sender goes away.
pub fn fragments_from_chunks(rx: UnboundedReceiver<StreamChunk>) -> FragmentStream {
    futures::stream::unfold(Some(rx), |state| async move {
        let mut rx = state?;
        match rx.recv().await? {
            StreamChunk::Text(text) => Some((Ok(text), Some(rx))),
            StreamChunk::Error(message) => Some((Err(ProviderError::unknown(message)), None)),
            StreamChunk::Done { stop_reason } => {
                tracing::debug!(?stop_reason, "stream finished");
                None
            }
        }
    })
    .boxed()
}
