#[path = "client/types.rs"]
mod types;

#[path = "client/endpoint.rs"]
mod endpoint;

#[path = "client/chat_completions.rs"]
mod chat_completions;

pub use chat_completions::ChatCompletionsClient;
pub use endpoint::{Backend, EndpointConfig};
pub use types::{Generation, ModelClient, Prompt};
