pub mod client;
pub mod draft;
pub mod extract;
pub mod prompts;

pub use client::ChatClient;
