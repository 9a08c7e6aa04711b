//! Optional SQLite snapshot store for discovered locations.
//!
//! Records what discovery and ranking observed so a run leaves an
//! inspectable trace. The engine only ever writes here; nothing on the
//! decision path reads it back.

use std::path::Path;

use rusqlite::{params, Connection};
use thiserror::Error;
use uuid::Uuid;

use crate::api::types::{Location, ResourceType};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("location not found: {0}")]
    NotFound(String),
}

/// One snapshot of a location's advisory stock, keyed by `(city, county)`.
#[derive(Debug, Clone)]
pub struct LocationRow {
    pub id: String,
    pub city: String,
    pub county: String,
    pub latitude: f64,
    pub longitude: f64,
    pub medical: i64,
    pub fire: i64,
    pub police: i64,
    pub rescue: i64,
    pub utility: i64,
    pub recorded_at: String,
}

impl LocationRow {
    pub fn from_location(location: &Location) -> Self {
        let quantity =
            |resource: ResourceType| location.stock.get(&resource).copied().unwrap_or(0);
        Self {
            id: Uuid::new_v4().to_string(),
            city: location.city.clone(),
            county: location.county.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            medical: quantity(ResourceType::Medical),
            fire: quantity(ResourceType::Fire),
            police: quantity(ResourceType::Police),
            rescue: quantity(ResourceType::Rescue),
            utility: quantity(ResourceType::Utility),
            recorded_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Single-writer snapshot store. The run is sequential, so the connection
/// is owned directly; there is no shared access to guard.
pub struct Catalog {
    conn: Connection,
}

const COLUMNS: &str =
    "id, city, county, latitude, longitude, medical, fire, police, rescue, utility, recorded_at";

impl Catalog {
    /// Open the store at `path`, creating the file and the locations table
    /// as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::from_connection(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CatalogError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS locations (
                id          TEXT PRIMARY KEY,
                city        TEXT NOT NULL,
                county      TEXT NOT NULL,
                latitude    REAL NOT NULL,
                longitude   REAL NOT NULL,
                medical     INTEGER NOT NULL DEFAULT 0,
                fire        INTEGER NOT NULL DEFAULT 0,
                police      INTEGER NOT NULL DEFAULT 0,
                rescue      INTEGER NOT NULL DEFAULT 0,
                utility     INTEGER NOT NULL DEFAULT 0,
                recorded_at TEXT NOT NULL,
                UNIQUE (city, county)
            );",
        )?;
        Ok(Self { conn })
    }

    /// Write the snapshot for `(city, county)`, replacing any earlier one.
    pub fn upsert_location(&self, row: &LocationRow) -> Result<(), CatalogError> {
        self.conn.execute(
            "INSERT INTO locations (id, city, county, latitude, longitude, medical, fire, police, rescue, utility, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT (city, county) DO UPDATE SET
                 latitude = excluded.latitude,
                 longitude = excluded.longitude,
                 medical = excluded.medical,
                 fire = excluded.fire,
                 police = excluded.police,
                 rescue = excluded.rescue,
                 utility = excluded.utility,
                 recorded_at = excluded.recorded_at",
            params![
                row.id,
                row.city,
                row.county,
                row.latitude,
                row.longitude,
                row.medical,
                row.fire,
                row.police,
                row.rescue,
                row.utility,
                row.recorded_at,
            ],
        )?;
        Ok(())
    }

    pub fn list_locations(&self) -> Result<Vec<LocationRow>, CatalogError> {
        let mut statement = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM locations ORDER BY county, city"))?;
        let rows = statement
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_location(&self, city: &str, county: &str) -> Result<LocationRow, CatalogError> {
        let mut statement = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM locations WHERE city = ?1 AND county = ?2"
        ))?;
        let mut rows = statement.query_map(params![city, county], read_row)?;
        match rows.next() {
            Some(row) => Ok(row?),
            None => Err(CatalogError::NotFound(format!("{city}, {county}"))),
        }
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LocationRow> {
    Ok(LocationRow {
        id: row.get(0)?,
        city: row.get(1)?,
        county: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        medical: row.get(5)?,
        fire: row.get(6)?,
        police: row.get(7)?,
        rescue: row.get(8)?,
        utility: row.get(9)?,
        recorded_at: row.get(10)?,
    })
}
