pub mod error;
pub mod gemini;
pub mod retry;
pub mod source;
pub mod sse;

pub use error::{ProviderError, ProviderErrorKind};
pub use gemini::GeminiClient;
pub use retry::RetryPolicy;
pub use source::{fragments_from_chunks, FragmentStream, ResponseSource, TextCompletion};
