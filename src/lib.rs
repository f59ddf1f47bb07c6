pub mod backend;
pub mod chat;
pub mod cli;
pub mod error;
pub mod logging;
pub mod message;
pub mod poet;
pub mod server;
pub mod settings;
pub mod store;

// Re-export commonly used items for easier access
pub use backend::{GenerativeBackend, OpenAIBackend, SchemaInvoker, StructuredOutput};
pub use error::{AppError, BackendError, InvokeError, StoreError};
pub use message::{SessionId, Turn};
pub use poet::{FailureKind, PoemFailure, PoemResult, PoetryPipeline};
pub use settings::{GenerationSettings, Settings};
pub use store::{ConversationStore, InMemoryConversationStore, SqliteConversationStore};
