pub mod app;
pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod metrics;
pub mod plagiarism;
