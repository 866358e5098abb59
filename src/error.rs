use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ChatRelayError {
    // Message errors
    EmptyMessage,
    MessageTooLarge(usize),
    MessageParseError(String),

    // Rate limiting
    RateLimited,
}

impl fmt::Display for ChatRelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "Message cannot be empty"),
            Self::MessageTooLarge(max) => {
                write!(f, "Message too long. Maximum {} characters allowed", max)
            }
            Self::MessageParseError(msg) => write!(f, "Message parse error: {}", msg),
            Self::RateLimited => write!(f, "Rate limit exceeded"),
        }
    }
}

impl Error for ChatRelayError {}

// Rate limiting surfaces through warp's rejection machinery
impl warp::reject::Reject for ChatRelayError {}

// Generic result type for the relay
pub type Result<T> = std::result::Result<T, ChatRelayError>;
