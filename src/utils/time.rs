use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Duration since the unix epoch; zero if the clock is set before it.
pub fn get_duration_since_epoch() -> Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

/// return second
pub fn get_now_as_u64() -> u64 {
    get_duration_since_epoch().as_secs()
}
