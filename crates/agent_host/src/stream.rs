use futures::future::{AbortHandle, AbortRegistration};
use futures::stream::{Abortable, Stream, StreamExt};
use providers::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Full response text.
    Completed(String),
    Cancelled,
}

/// Drain `stream`, calling `on_update` with the text so far after every
/// fragment. A mid-stream error discards what was accumulated.
///
/// An abort is honored whenever the stream is waiting, including before its
/// first fragment.
pub async fn accumulate<S, F>(
    stream: S,
    abort: Option<AbortRegistration>,
    mut on_update: F,
) -> Result<StreamOutcome, ProviderError>
where
    S: Stream<Item = Result<String, ProviderError>>,
    F: FnMut(&str),
{
    let registration = abort.unwrap_or_else(|| AbortHandle::new_pair().1);
    let stream = Abortable::new(stream, registration);
    futures::pin_mut!(stream);
    let mut buffer = String::new();
    let mut fragments = 0usize;

    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        fragments += 1;
        buffer.push_str(&fragment);
        tracing::trace!("fragment {} ({} bytes)", fragments, fragment.len());
        on_update(&buffer);
    }

    if stream.is_aborted() {
        tracing::info!("Response cancelled after {} fragment(s)", fragments);
        return Ok(StreamOutcome::Cancelled);
    }
    tracing::debug!("Response complete: {} fragment(s), {} bytes", fragments, buffer.len());
    Ok(StreamOutcome::Completed(buffer))
}
