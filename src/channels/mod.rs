//! Chat platform I/O: the collaborator traits the pipeline consumes and the
//! Lark implementation of them.

pub mod events;
pub mod gateway;
pub mod lark;

pub use events::{Callback, EventEnvelope, parse_callback};
pub use gateway::{AuthorDirectory, MessagingGateway};
pub use lark::LarkClient;
