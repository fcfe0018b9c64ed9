pub mod conversation_store;
pub mod error;
pub mod http_store;
pub mod in_memory_store;

pub use conversation_store::{BoxFuture, ConversationStore, StoreOperation};
pub use error::{StoreError, StoreResult};
pub use http_store::{HttpConversationStore, MessagesEndpoint};
pub use in_memory_store::InMemoryConversationStore;
