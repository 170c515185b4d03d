pub mod calendar;
pub mod gmail;
pub mod http;
pub mod models;

pub use calendar::CalendarClient;
pub use gmail::GmailClient;
