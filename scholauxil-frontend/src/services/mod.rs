pub mod api_client;
pub mod chat_client;
pub mod identity_client;
pub mod metrics;
pub mod plagiarism_client;
