/// Bounds applied to `config.toml` values before a context is mounted

/// Fastest allowed remote poll
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Slowest allowed remote poll (1 minute)
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// Longest grace window after a manual change (1 minute)
pub const MAX_GRACE_WINDOW_MS: u64 = 60_000;

/// Shortest REST request timeout
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Longest REST request timeout (2 minutes)
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 120;
