//! `SQLite` schema definitions for the awni gateway.

/// SQL statement to create the requests table.
pub const CREATE_REQUESTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    request_text TEXT NOT NULL,
    location TEXT NOT NULL,
    contact_phone TEXT NOT NULL,
    priority TEXT NOT NULL,
    reason TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    status TEXT NOT NULL,
    volunteer_id TEXT,
    volunteer_name TEXT,
    eta TEXT,
    report TEXT,
    revision INTEGER NOT NULL DEFAULT 0
)
";

/// SQL statement to create the volunteers table.
pub const CREATE_VOLUNTEERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS volunteers (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone_number TEXT NOT NULL,
    profession TEXT NOT NULL,
    city TEXT NOT NULL,
    region TEXT NOT NULL,
    gender TEXT NOT NULL,
    photo_id_url TEXT,
    status TEXT NOT NULL,
    registered_at TEXT NOT NULL
)
";

/// SQL statement to create an index on request status for dashboards.
pub const CREATE_REQUEST_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_requests_status ON requests(status)
";

/// SQL statement to create an index on the assigned volunteer for feeds.
pub const CREATE_REQUEST_VOLUNTEER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_requests_volunteer ON requests(volunteer_id)
";

/// SQL statement to create an index on volunteer status for the verified
/// query.
pub const CREATE_VOLUNTEER_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_volunteers_status ON volunteers(status)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_REQUESTS_TABLE,
    CREATE_VOLUNTEERS_TABLE,
    CREATE_REQUEST_STATUS_INDEX,
    CREATE_REQUEST_VOLUNTEER_INDEX,
    CREATE_VOLUNTEER_STATUS_INDEX,
    CREATE_METADATA_TABLE,
];
