pub mod chat_service;
pub mod completion;
pub mod mailer;
pub mod pg;
pub mod thread_store;
pub mod user_service;
pub mod user_store;
