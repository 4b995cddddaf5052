//! MikoNews: a Lark bot that collects news submissions sent to it in private
//! chat, stores them and forwards them as cards to group chats.

pub mod api;
pub mod cards;
pub mod channels;
pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod store;
