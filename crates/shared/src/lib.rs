pub mod directive;
pub mod mood;
pub mod palette;

pub mod settings {
    use serde::{Deserialize, Serialize};

    fn default_log_filter() -> String {
        "info".to_string()
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelProvider {
        pub gemini_model: String, // e.g., "gemini-2.5-flash"
        /// Override for the Gemini endpoint (proxies, tests)
        #[serde(default)]
        pub gemini_base_url: Option<String>,
        #[serde(default)]
        pub gemini_auth: ProviderAuth,
    }

    /// Backoff applied to rate-limited requests
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RetrySettings {
        pub max_attempts: u32,
        pub initial_delay_ms: u64,
    }

    impl Default for RetrySettings {
        fn default() -> Self {
            Self {
                max_attempts: 3,
                initial_delay_ms: 1000,
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppSettings {
        pub model: ModelProvider,
        #[serde(default)]
        pub retry: RetrySettings,
        /// Where the key-value store lives; defaults to the platform data dir
        #[serde(default)]
        pub data_dir: Option<String>,
        #[serde(default = "default_log_filter")]
        pub log_filter: String,
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                model: ModelProvider {
                    gemini_model: "gemini-2.5-flash".into(),
                    gemini_base_url: None,
                    gemini_auth: ProviderAuth::default(),
                },
                retry: RetrySettings::default(),
                data_dir: None,
                log_filter: default_log_filter(),
            }
        }
    }
}

pub mod agent_api {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    /// Provider-facing message.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: String, // "system" | "user" | "assistant"
        pub content: String,
    }

    impl ChatMessage {
        pub fn system(content: impl Into<String>) -> Self {
            Self {
                role: "system".to_string(),
                content: content.into(),
            }
        }

        pub fn user(content: impl Into<String>) -> Self {
            Self {
                role: "user".to_string(),
                content: content.into(),
            }
        }

        pub fn assistant(content: impl Into<String>) -> Self {
            Self {
                role: "assistant".to_string(),
                content: content.into(),
            }
        }
    }

    /// One event of a streamed provider response.
    #[derive(Debug, Clone, PartialEq)]
    pub enum StreamChunk {
        Text(String),
        Done { stop_reason: Option<String> },
        Error(String),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Assistant,
    }

    /// A message as shown in the chat transcript.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ConversationMessage {
        pub id: Uuid,
        pub role: Role,
        pub text: String,
        pub timestamp: DateTime<Utc>,
        #[serde(default)]
        pub is_streaming: bool,
    }

    impl ConversationMessage {
        pub fn user(text: impl Into<String>) -> Self {
            Self {
                id: Uuid::new_v4(),
                role: Role::User,
                text: text.into(),
                timestamp: Utc::now(),
                is_streaming: false,
            }
        }

        pub fn assistant(text: impl Into<String>) -> Self {
            Self {
                id: Uuid::new_v4(),
                role: Role::Assistant,
                text: text.into(),
                timestamp: Utc::now(),
                is_streaming: false,
            }
        }

        /// Empty assistant placeholder filled while a response streams in.
        pub fn typing() -> Self {
            Self {
                is_streaming: true,
                ..Self::assistant("")
            }
        }

        pub fn to_chat_message(&self) -> ChatMessage {
            match self.role {
                Role::User => ChatMessage::user(self.text.clone()),
                Role::Assistant => ChatMessage::assistant(self.text.clone()),
            }
        }
    }
}
