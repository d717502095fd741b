pub mod chat;
pub mod errors;
pub mod message;
pub mod thread;
pub mod timestamp;
pub mod user;

pub use chat::{ChatRequest, ChatResponse};
pub use errors::ErrorResponse;
pub use message::{Message, MessageRole};
pub use thread::{
    CreateThreadRequest, DeleteThreadResponse, RenameThreadRequest, Thread, ThreadDetail,
    ThreadSummary,
};
pub use timestamp::Timestamp;
pub use user::{
    AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
    ResetPasswordRequest, ResetPasswordResponse, SignupRequest, User,
};
