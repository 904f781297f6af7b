// =============================================================================
// ENDPOINTS
// =============================================================================

/// Default agent backend (streaming chat + KB ingestion)
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Default base URL of the directly callable sub-services
pub const DEFAULT_SERVICES_URL: &str = "http://localhost:8001/prod";

/// Streaming chat path on the backend
pub const CHAT_PATH: &str = "/api/chat";

/// Knowledge-base ingestion control path on the backend
pub const KB_INGEST_PATH: &str = "/api/kb-ingest";

/// Sub-service paths (prediction, explanation, retrieval)
pub const PREDICT_PATH: &str = "/t1";
pub const EXPLAIN_PATH: &str = "/t2";
pub const RETRIEVE_PATH: &str = "/t3";

/// Timeout for non-streaming sub-service and ingestion calls
pub const SERVICE_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// ENVIRONMENT
// =============================================================================

pub const ENV_BACKEND_URL: &str = "DCPILOT_BACKEND_URL";
pub const ENV_SERVICES_URL: &str = "DCPILOT_SERVICES_URL";
pub const ENV_STORE_DIR: &str = "DCPILOT_STORE_DIR";
pub const ENV_THEME: &str = "DCPILOT_THEME";
pub const ENV_LOG: &str = "DCPILOT_LOG";

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Local store directory (session id, logs)
pub const STORE_DIR: &str = ".dcpilot";

/// Session key-value file inside the store
pub const SESSION_FILE: &str = "session.json";

/// Log directory and file inside the store
pub const LOGS_DIR: &str = "logs";
pub const LOG_FILE: &str = "dcpilot.log";

// =============================================================================
// STREAM PROTOCOL
// =============================================================================

/// Prefix of every event-bearing line in the stream body
pub const EVENT_PREFIX: &str = "data: ";

/// Sentinel payload some agents send instead of a done record
pub const DONE_SENTINEL: &str = "[DONE]";

/// Read buffer size for the stream body
pub const STREAM_READ_CHUNK: usize = 4096;

// =============================================================================
// RENDERING
// =============================================================================

/// Number of factors requested from the explanation service
pub const EXPLAIN_TOP_N: usize = 10;

/// Importance entries flagged as "top" ranked
pub const TOP_RANKED: usize = 3;

/// Leading importance entries considered for equipment annotations
pub const EQUIPMENT_FEATURE_WINDOW: usize = 5;

/// Gauge circle radius (arc length is derived from it)
pub const GAUGE_RADIUS: f64 = 42.0;

/// Factors shown in the session summary
pub const SUMMARY_FACTORS: usize = 5;

/// Sources shown in the session summary
pub const SUMMARY_SOURCES: usize = 3;

/// Characters of source content shown as a snippet in the summary
pub const SOURCE_SNIPPET_CHARS: usize = 80;

// =============================================================================
// EVENT LOOP
// =============================================================================

/// Poll timeout for terminal input events
pub const EVENT_POLL_MS: u64 = 16;

/// Minimum interval between redraws while nothing changed
pub const RENDER_THROTTLE_MS: u64 = 100;

/// Knowledge-base ingestion polling interval
pub const INGEST_POLL_SECS: u64 = 5;

/// Scroll amount for arrow keys
pub const SCROLL_ARROW_AMOUNT: u16 = 3;

/// Scroll amount for PageUp/PageDown
pub const SCROLL_PAGE_AMOUNT: u16 = 10;

// =============================================================================
// UI LAYOUT
// =============================================================================

/// Width of the insight side panel in characters
pub const SIDEBAR_WIDTH: u16 = 38;

/// Height of the status bar
pub const STATUS_BAR_HEIGHT: u16 = 1;
