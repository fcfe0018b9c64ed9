mod chat_controller;
mod state;

pub use chat_controller::{ChatController, Outcome};
pub use state::{ChatState, OutgoingMessage, OutgoingState, RetryAction, SendTarget, Status};
