pub mod server;

pub use server::{AuthConfig, CompletionConfig, Config, ConfigError, EmailConfig, LogFormat};
