//! Resource namespaces. Each method is a direct delegation to the transport,
//! the stream relay or the upload path.

mod beta;
mod chat;
mod files;
mod models;
mod moderations;

pub use beta::{Assistants, Beta, Messages, Runs, Threads};
pub use chat::{Chat, Completions};
pub use files::Files;
pub use models::Models;
pub use moderations::Moderations;
