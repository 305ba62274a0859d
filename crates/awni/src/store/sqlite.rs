//! `SQLite`-backed persistence gateway.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::request::{Assignment, EmergencyRequest, PriorityLevel, RequestStatus};
use crate::volunteer::{Volunteer, VolunteerStatus};

use super::{
    migrations, PersistenceGateway, RequestPatch, VolunteerPatch, SUBSCRIPTION_CAPACITY,
};

/// Durable gateway over a `SQLite` database.
///
/// Each write publishes a fresh collection snapshot to subscribers. The
/// connection is serialized behind a mutex; every compound update is one
/// SQL statement, so a half-applied transition is never observable.
#[derive(Debug)]
pub struct SqliteGateway {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
    /// Request snapshot publisher.
    requests_tx: broadcast::Sender<Vec<EmergencyRequest>>,
    /// Volunteer snapshot publisher.
    volunteers_tx: broadcast::Sender<Vec<Volunteer>>,
}

impl SqliteGateway {
    /// Open or create a gateway database at the given path.
    ///
    /// Creates the parent directories and database file if they don't
    /// exist. Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self::from_connection(path, conn))
    }

    /// Create an in-memory gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self::from_connection(PathBuf::from(":memory:"), conn))
    }

    fn from_connection(path: PathBuf, conn: Connection) -> Self {
        let (requests_tx, _) = broadcast::channel(SUBSCRIPTION_CAPACITY);
        let (volunteers_tx, _) = broadcast::channel(SUBSCRIPTION_CAPACITY);
        Self {
            path,
            conn: Mutex::new(conn),
            requests_tx,
            volunteers_tx,
        }
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_requests(&self, conn: &Connection) -> Result<()> {
        // Best effort; a send error only means nobody is listening.
        let _ = self.requests_tx.send(Self::list_requests_with(conn)?);
        Ok(())
    }

    fn publish_volunteers(&self, conn: &Connection) -> Result<()> {
        let _ = self.volunteers_tx.send(Self::list_volunteers_with(conn)?);
        Ok(())
    }

    fn list_requests_with(conn: &Connection) -> Result<Vec<EmergencyRequest>> {
        let mut stmt = conn.prepare(
            r"
            SELECT id, request_text, location, contact_phone, priority, reason,
                   timestamp, status, volunteer_id, volunteer_name, eta, report, revision
            FROM requests ORDER BY id ASC
            ",
        )?;
        let requests = stmt
            .query_map([], Self::row_to_request)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(requests)
    }

    fn list_volunteers_with(conn: &Connection) -> Result<Vec<Volunteer>> {
        let mut stmt = conn.prepare(
            r"
            SELECT id, full_name, email, phone_number, profession, city, region,
                   gender, photo_id_url, status, registered_at
            FROM volunteers ORDER BY rowid ASC
            ",
        )?;
        let volunteers = stmt
            .query_map([], Self::row_to_volunteer)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(volunteers)
    }

    /// Convert a database row to a request.
    fn row_to_request(row: &rusqlite::Row) -> rusqlite::Result<EmergencyRequest> {
        let timestamp_str: String = row.get(6)?;
        let status_str: String = row.get(7)?;
        let priority_str: String = row.get(4)?;
        let volunteer_id: Option<String> = row.get(8)?;
        let volunteer_name: Option<String> = row.get(9)?;

        let assignment = match (volunteer_id, volunteer_name) {
            (Some(volunteer_id), Some(volunteer_name)) => Some(Assignment {
                volunteer_id,
                volunteer_name,
            }),
            _ => None,
        };

        Ok(EmergencyRequest {
            id: Some(row.get(0)?),
            request_text: row.get(1)?,
            location: row.get(2)?,
            contact_phone: row.get(3)?,
            priority: PriorityLevel::parse_lossy(&priority_str),
            reason: row.get(5)?,
            timestamp: parse_timestamp(&timestamp_str),
            status: RequestStatus::parse_lossy(&status_str),
            assignment,
            eta: row.get(10)?,
            report: row.get(11)?,
            revision: row.get(12)?,
        })
    }

    /// Convert a database row to a volunteer.
    fn row_to_volunteer(row: &rusqlite::Row) -> rusqlite::Result<Volunteer> {
        let status_str: String = row.get(9)?;
        let registered_str: String = row.get(10)?;

        Ok(Volunteer {
            id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            phone_number: row.get(3)?,
            profession: row.get(4)?,
            city: row.get(5)?,
            region: row.get(6)?,
            gender: row.get(7)?,
            photo_id_url: row.get(8)?,
            status: VolunteerStatus::parse_lossy(&status_str),
            registered_at: parse_timestamp(&registered_str),
        })
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

impl PersistenceGateway for SqliteGateway {
    fn create_request(&self, request: &EmergencyRequest) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            r"
            INSERT INTO requests
                (request_text, location, contact_phone, priority, reason,
                 timestamp, status, volunteer_id, volunteer_name, eta, report, revision)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ",
            params![
                request.request_text,
                request.location,
                request.contact_phone,
                request.priority.to_string(),
                request.reason,
                request.timestamp.to_rfc3339(),
                request.status.to_string(),
                request.assignment.as_ref().map(|a| a.volunteer_id.clone()),
                request.assignment.as_ref().map(|a| a.volunteer_name.clone()),
                request.eta,
                request.report,
                request.revision,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Inserted request with id {}", id);
        self.publish_requests(&conn)?;
        Ok(id)
    }

    fn get_request(&self, id: i64) -> Result<Option<EmergencyRequest>> {
        let conn = self.conn();
        let result = conn
            .query_row(
                r"
                SELECT id, request_text, location, contact_phone, priority, reason,
                       timestamp, status, volunteer_id, volunteer_name, eta, report, revision
                FROM requests WHERE id = ?1
                ",
                [id],
                Self::row_to_request,
            )
            .optional()?;
        Ok(result)
    }

    fn list_requests(&self) -> Result<Vec<EmergencyRequest>> {
        Self::list_requests_with(&self.conn())
    }

    fn requests_for_volunteer(&self, volunteer_id: &str) -> Result<Vec<EmergencyRequest>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r"
            SELECT id, request_text, location, contact_phone, priority, reason,
                   timestamp, status, volunteer_id, volunteer_name, eta, report, revision
            FROM requests WHERE volunteer_id = ?1 ORDER BY id ASC
            ",
        )?;
        let requests = stmt
            .query_map([volunteer_id], Self::row_to_request)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(requests)
    }

    fn update_request(
        &self,
        id: i64,
        expected_revision: i64,
        patch: &RequestPatch,
    ) -> Result<EmergencyRequest> {
        let conn = self.conn();
        let mut current = conn
            .query_row(
                r"
                SELECT id, request_text, location, contact_phone, priority, reason,
                       timestamp, status, volunteer_id, volunteer_name, eta, report, revision
                FROM requests WHERE id = ?1
                ",
                [id],
                Self::row_to_request,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("request", id.to_string()))?;

        if current.revision != expected_revision {
            return Err(Error::conflict(format!(
                "request {id} was modified concurrently (revision {} != {expected_revision})",
                current.revision
            )));
        }

        patch.apply(&mut current);

        // One combined write; the revision guard in the WHERE clause closes
        // the read-modify-write race window.
        let affected = conn.execute(
            r"
            UPDATE requests
            SET request_text = ?1, status = ?2, volunteer_id = ?3, volunteer_name = ?4,
                eta = ?5, report = ?6, revision = ?7
            WHERE id = ?8 AND revision = ?9
            ",
            params![
                current.request_text,
                current.status.to_string(),
                current.assignment.as_ref().map(|a| a.volunteer_id.clone()),
                current.assignment.as_ref().map(|a| a.volunteer_name.clone()),
                current.eta,
                current.report,
                current.revision,
                id,
                expected_revision,
            ],
        )?;

        if affected == 0 {
            return Err(Error::conflict(format!(
                "request {id} was modified concurrently"
            )));
        }

        debug!("Updated request {} to revision {}", id, current.revision);
        self.publish_requests(&conn)?;
        Ok(current)
    }

    fn delete_request(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let affected = conn.execute("DELETE FROM requests WHERE id = ?1", [id])?;
        if affected > 0 {
            self.publish_requests(&conn)?;
        }
        Ok(affected > 0)
    }

    fn subscribe_requests(&self) -> broadcast::Receiver<Vec<EmergencyRequest>> {
        self.requests_tx.subscribe()
    }

    fn create_volunteer(&self, volunteer: &Volunteer) -> Result<()> {
        let conn = self.conn();
        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM volunteers WHERE id = ?1 OR email = ?2",
            params![volunteer.id, volunteer.email],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Err(Error::conflict(
                "a volunteer with this email already exists",
            ));
        }

        conn.execute(
            r"
            INSERT INTO volunteers
                (id, full_name, email, phone_number, profession, city, region,
                 gender, photo_id_url, status, registered_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
            params![
                volunteer.id,
                volunteer.full_name,
                volunteer.email,
                volunteer.phone_number,
                volunteer.profession,
                volunteer.city,
                volunteer.region,
                volunteer.gender,
                volunteer.photo_id_url,
                volunteer.status.to_string(),
                volunteer.registered_at.to_rfc3339(),
            ],
        )?;

        debug!("Inserted volunteer {}", volunteer.id);
        self.publish_volunteers(&conn)?;
        Ok(())
    }

    fn get_volunteer(&self, id: &str) -> Result<Option<Volunteer>> {
        let conn = self.conn();
        let result = conn
            .query_row(
                r"
                SELECT id, full_name, email, phone_number, profession, city, region,
                       gender, photo_id_url, status, registered_at
                FROM volunteers WHERE id = ?1
                ",
                [id],
                Self::row_to_volunteer,
            )
            .optional()?;
        Ok(result)
    }

    fn list_volunteers(&self) -> Result<Vec<Volunteer>> {
        Self::list_volunteers_with(&self.conn())
    }

    fn verified_volunteers(&self) -> Result<Vec<Volunteer>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r"
            SELECT id, full_name, email, phone_number, profession, city, region,
                   gender, photo_id_url, status, registered_at
            FROM volunteers WHERE status = ?1 ORDER BY rowid ASC
            ",
        )?;
        let volunteers = stmt
            .query_map([VolunteerStatus::Verified.to_string()], Self::row_to_volunteer)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(volunteers)
    }

    fn volunteer_by_email(&self, email: &str) -> Result<Option<Volunteer>> {
        let conn = self.conn();
        let result = conn
            .query_row(
                r"
                SELECT id, full_name, email, phone_number, profession, city, region,
                       gender, photo_id_url, status, registered_at
                FROM volunteers WHERE email = ?1
                ",
                [email],
                Self::row_to_volunteer,
            )
            .optional()?;
        Ok(result)
    }

    fn update_volunteer(&self, id: &str, patch: &VolunteerPatch) -> Result<Volunteer> {
        let conn = self.conn();
        let mut current = conn
            .query_row(
                r"
                SELECT id, full_name, email, phone_number, profession, city, region,
                       gender, photo_id_url, status, registered_at
                FROM volunteers WHERE id = ?1
                ",
                [id],
                Self::row_to_volunteer,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("volunteer", id))?;

        patch.apply(&mut current);

        conn.execute(
            r"
            UPDATE volunteers SET profession = ?1, region = ?2, status = ?3 WHERE id = ?4
            ",
            params![
                current.profession,
                current.region,
                current.status.to_string(),
                id,
            ],
        )?;

        debug!("Updated volunteer {}", id);
        self.publish_volunteers(&conn)?;
        Ok(current)
    }

    fn delete_volunteer(&self, id: &str) -> Result<bool> {
        let conn = self.conn();
        let affected = conn.execute("DELETE FROM volunteers WHERE id = ?1", [id])?;
        if affected > 0 {
            self.publish_volunteers(&conn)?;
        }
        Ok(affected > 0)
    }

    fn subscribe_volunteers(&self) -> broadcast::Receiver<Vec<Volunteer>> {
        self.volunteers_tx.subscribe()
    }
}
