//! External service integrations

pub mod sheets;
pub mod webhook;

pub use sheets::SheetsClient;
pub use webhook::WebhookClient;
