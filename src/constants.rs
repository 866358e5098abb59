// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3030;
pub const HUB_PATH: &str = "chat";

// Room and message defaults
pub const DEFAULT_ROOM: &str = "General";
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 1000;

// Rate limiting constants
pub const RATE_WINDOW_SECS: u64 = 60;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;
