pub mod error_collector_layer;
pub mod reply_generator;

pub use error_collector_layer::ErrorCollectorLayer;
pub use reply_generator::{CannedReply, ReplyGenerator};
