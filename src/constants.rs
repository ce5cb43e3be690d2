//! Application-wide constants for tuning and configuration
//!
//! Centralizes magic numbers to make them discoverable and configurable.

/// Number of threads requested per listing or search page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Worker pool size for windowed metadata hydration.
pub const METADATA_CONCURRENCY: usize = 5;

/// Debounce delay before a settled search query goes to the server.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

/// Background refresh interval in seconds (0 disables it).
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 120;

/// Error message display duration in seconds before auto-dismiss.
pub const ERROR_TTL_SECS: u64 = 5;

/// Rows from the end of the list at which the next page is requested.
pub const LOAD_MORE_THRESHOLD: usize = 10;

/// Rows assumed visible before the first resize event arrives.
pub const DEFAULT_VIEWPORT_ROWS: usize = 20;

/// Capacity of the inbound event queue consumed by the event loop.
pub const EVENT_CHANNEL_CAPACITY: usize = 512;

/// Input poll timeout while work is in flight.
pub const POLL_BUSY_MS: u64 = 50;

/// Input poll timeout while idle.
pub const POLL_IDLE_MS: u64 = 150;
