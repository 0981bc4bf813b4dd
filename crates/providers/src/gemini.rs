use crate::error::ProviderError;
use crate::source::{fragments_from_chunks, FragmentStream, ResponseSource, TextCompletion};
use crate::sse::{SseEvent, SseParser};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::{ChatMessage, StreamChunk};
use shared::settings::ModelProvider;
use std::env;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Both the one-shot body and each streamed SSE event.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    error: Option<GeminiApiError>,
}

impl GeminiResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    auth_token: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn from_auth(settings: &ModelProvider) -> Result<Self> {
        let auth_token = match &settings.gemini_auth.api_key {
            Some(api_key) if !api_key.trim().is_empty() => api_key.clone(),
            _ => env::var("GEMINI_API_KEY")
                .map_err(|_| anyhow!("No Gemini authentication configured"))?,
        };

        Ok(Self {
            // No total timeout: a streamed reply can legitimately take a while
            http: Client::builder()
                .connect_timeout(Duration::from_secs(15))
                .build()?,
            auth_token,
            model: settings.gemini_model.clone(),
            base_url: settings
                .gemini_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// The key travels in a header so it never shows up in a logged URL.
    fn endpoint(&self, method: &str) -> String {
        let mut url = format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method);
        if method == "streamGenerateContent" {
            url.push_str("?alt=sse");
        }
        url
    }

    async fn post(&self, method: &str, req: &GeminiRequest) -> Result<reqwest::Response, ProviderError> {
        let resp = self
            .http
            .post(self.endpoint(method))
            .header("x-goog-api-key", &self.auth_token)
            .header("Content-Type", "application/json")
            .json(req)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }
        Ok(resp)
    }

    /// Stream a reply, sending chunks to `tx`.
    ///
    /// Contract: if the request fails *before* any chunks are sent, returns
    /// `Err(...)`. Once streaming starts, errors go through
    /// `StreamChunk::Error` and the pump task ends.
    pub async fn generate_stream(
        &self,
        messages: Vec<ChatMessage>,
        tx: UnboundedSender<StreamChunk>,
    ) -> Result<(), ProviderError> {
        let req = build_request(messages, None);
        let resp = self.post("streamGenerateContent", &req).await?;
        tokio::spawn(pump_sse(resp.bytes_stream(), tx));
        Ok(())
    }
}

#[async_trait]
impl ResponseSource for GeminiClient {
    async fn open_stream(&self, messages: Vec<ChatMessage>) -> Result<FragmentStream, ProviderError> {
        let (tx, rx) = unbounded_channel();
        self.generate_stream(messages, tx).await?;
        Ok(fragments_from_chunks(rx))
    }
}

#[async_trait]
impl TextCompletion for GeminiClient {
    async fn complete(
        &self,
        prompt: &str,
        response_schema: Option<serde_json::Value>,
    ) -> Result<String, ProviderError> {
        let generation_config = response_schema.map(|schema| GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: schema,
        });
        let req = build_request(vec![ChatMessage::user(prompt)], generation_config);
        let resp = self.post("generateContent", &req).await?;
        let body: GeminiResponse = resp.json().await?;
        if let Some(err) = &body.error {
            return Err(api_error(err));
        }
        Ok(body.text())
    }
}

fn build_request(messages: Vec<ChatMessage>, generation_config: Option<GenerationConfig>) -> GeminiRequest {
    let mut system_instruction = None;
    let mut contents: Vec<GeminiContent> = Vec::new();
    for m in messages {
        if m.role == "system" {
            system_instruction = Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: m.content }],
            });
        } else {
            // Gemini expects roles: "user" | "model".
            let role = match m.role.as_str() {
                "assistant" => "model",
                other => other,
            };
            contents.push(GeminiContent {
                role: Some(role.to_string()),
                parts: vec![GeminiPart { text: m.content }],
            });
        }
    }
    GeminiRequest {
        contents,
        system_instruction,
        generation_config,
    }
}

fn api_error(err: &GeminiApiError) -> ProviderError {
    let detail = format!("{} {}", err.status, err.message);
    ProviderError::from_status(err.code, detail.trim())
}

/// Decode one SSE event into the chunk to forward, if any.
fn decode_event(event: &SseEvent) -> Option<StreamChunk> {
    match serde_json::from_str::<GeminiResponse>(&event.data) {
        Ok(resp) => {
            if let Some(err) = &resp.error {
                return Some(StreamChunk::Error(api_error(err).message));
            }
            let text = resp.text();
            if text.is_empty() {
                None
            } else {
                Some(StreamChunk::Text(text))
            }
        }
        Err(e) => Some(StreamChunk::Error(format!(
            "Failed to parse Gemini stream: {}",
            e
        ))),
    }
}

/// Forward a raw SSE byte stream as chunks until it ends, fails, or the
/// receiver is dropped.
pub(crate) async fn pump_sse<S, B, E>(bytes: S, tx: UnboundedSender<StreamChunk>)
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let mut parser = SseParser::new();
    let mut stream = Box::pin(bytes);

    while let Some(chunk) = stream.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send(StreamChunk::Error(format!("stream read error: {}", e)));
                return;
            }
        };
        for event in parser.feed(bytes.as_ref()) {
            if let Some(chunk) = decode_event(&event) {
                let is_error = matches!(chunk, StreamChunk::Error(_));
                if tx.send(chunk).is_err() {
                    tracing::debug!("stream receiver dropped; stopping");
                    return;
                }
                if is_error {
                    return;
                }
            }
        }
    }

    if let Some(event) = parser.finish() {
        if let Some(chunk) = decode_event(&event) {
            let is_error = matches!(chunk, StreamChunk::Error(_));
            let _ = tx.send(chunk);
            if is_error {
                return;
            }
        }
    }
    let _ = tx.send(StreamChunk::Done { stop_reason: None });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    async fn drain(mut rx: UnboundedReceiver<StreamChunk>) -> Vec<StreamChunk> {
        let mut out = Vec::new();
        while let Some(c) = rx.recv().await {
            out.push(c);
        }
        out
    }

    fn event(text: &str) -> String {
        format!(
            "data: {{\"candidates\":[{{\"content\":{{\"role\":\"model\",\"parts\":[{{\"text\":{}}}]}}}}]}}\r\n\r\n",
            serde_json::to_string(text).unwrap()
        )
    }

    #[test]
    fn test_build_request_maps_roles() {
        let req = build_request(
            vec![
                ChatMessage::system("be kind"),
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello"),
            ],
            None,
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["system_instruction"]["parts"][0]["text"], "be kind");
        assert!(json["system_instruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_json_generation_config() {
        let config = GenerationConfig {
            response_mime_type: "application/json".into(),
            response_schema: serde_json::json!({"type": "OBJECT"}),
        };
        let req = build_request(vec![ChatMessage::user("x")], Some(config));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[tokio::test]
    async fn test_pump_decodes_fragments_across_chunks() {
        let body = format!("{}{}", event("Hel"), event("lo"));
        let (a, b) = body.as_bytes().split_at(17);
        let chunks: Vec<Result<Vec<u8>, String>> = vec![Ok(a.to_vec()), Ok(b.to_vec())];

        let (tx, rx) = unbounded_channel();
        pump_sse(futures::stream::iter(chunks), tx).await;

        assert_eq!(
            drain(rx).await,
            vec![
                StreamChunk::Text("Hel".into()),
                StreamChunk::Text("lo".into()),
                StreamChunk::Done { stop_reason: None },
            ]
        );
    }

    #[tokio::test]
    async fn test_pump_stops_on_api_error_event() {
        let body = format!(
            "{}data: {{\"error\":{{\"code\":500,\"message\":\"internal\",\"status\":\"INTERNAL\"}}}}\n\n{}",
            event("partial"),
            event("never")
        );
        let chunks: Vec<Result<Vec<u8>, String>> = vec![Ok(body.into_bytes())];

        let (tx, rx) = unbounded_channel();
        pump_sse(futures::stream::iter(chunks), tx).await;

        let out = drain(rx).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], StreamChunk::Text("partial".into()));
        assert!(matches!(&out[1], StreamChunk::Error(m) if m.contains("internal")));
    }

    #[tokio::test]
    async fn test_pump_reports_transport_error() {
        let chunks: Vec<Result<Vec<u8>, String>> =
            vec![Ok(event("a").into_bytes()), Err("connection reset".to_string())];

        let (tx, rx) = unbounded_channel();
        pump_sse(futures::stream::iter(chunks), tx).await;

        let out = drain(rx).await;
        assert!(matches!(&out[1], StreamChunk::Error(m) if m.contains("connection reset")));
    }

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::from_auth(&ModelProvider {
            gemini_model: "m".into(),
            gemini_base_url: Some(base_url.into()),
            gemini_auth: shared::settings::ProviderAuth {
                api_key: Some("SECRETKEY123".into()),
            },
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_carries_no_key() {
        let c = client("http://localhost:8080/");
        assert_eq!(
            c.endpoint("streamGenerateContent"),
            "http://localhost:8080/v1beta/models/m:streamGenerateContent?alt=sse"
        );
        assert_eq!(
            c.endpoint("generateContent"),
            "http://localhost:8080/v1beta/models/m:generateContent"
        );
    }

    #[tokio::test]
    async fn test_connection_error_does_not_leak_key() {
        let c = client("http://127.0.0.1:1");
        let err = match c.open_stream(vec![ChatMessage::user("hi")]).await {
            Ok(_) => panic!("nothing listens on port 1"),
            Err(e) => e,
        };
        assert!(!err.to_string().contains("SECRETKEY123"));
        assert!(!err.message.contains("127.0.0.1"));
    }

    #[test]
    fn test_decode_skips_empty_candidates() {
        let ev = SseEvent {
            event: None,
            data: r#"{"candidates":[{"content":{"parts":[]}}]}"#.into(),
        };
        assert!(decode_event(&ev).is_none());
    }
}
