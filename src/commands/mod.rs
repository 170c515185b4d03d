pub mod auth;
pub mod meet;
pub mod send;
pub mod serve;
pub mod summarize;
