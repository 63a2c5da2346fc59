use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::discovery::ApplicationDirectory;
use crate::launch_config::Application;
use crate::lookup::LookupError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS application (url TEXT PRIMARY KEY, title TEXT NOT NULL)";

pub fn open_memory() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    conn.execute(SCHEMA, [])?;
    Ok(conn)
}

pub fn open_file(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute(SCHEMA, [])?;
    Ok(conn)
}

pub fn upsert_application(db: &Connection, app: &Application) -> Result<(), StoreError> {
    db.execute(
        "INSERT INTO application (url, title) VALUES (?1, ?2)
         ON CONFLICT(url) DO UPDATE SET title=excluded.title",
        params![app.url, app.title],
    )?;
    Ok(())
}

/// Replaces the whole snapshot in one transaction.
pub fn replace_applications(db: &mut Connection, apps: &[Application]) -> Result<(), StoreError> {
    let tx = db.transaction()?;
    tx.execute("DELETE FROM application", [])?;
    for app in apps {
        tx.execute(
            "INSERT OR REPLACE INTO application (url, title) VALUES (?1, ?2)",
            params![app.url, app.title],
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn get_application(db: &Connection, url: &str) -> Result<Option<Application>, StoreError> {
    let mut stmt = db.prepare("SELECT url, title FROM application WHERE url = ?1")?;
    let mut rows = stmt.query(params![url])?;
    if let Some(row) = rows.next()? {
        Ok(Some(Application {
            url: row.get(0)?,
            title: row.get(1)?,
        }))
    } else {
        Ok(None)
    }
}

pub fn list_applications(db: &Connection) -> Result<Vec<Application>, StoreError> {
    let mut stmt = db.prepare("SELECT url, title FROM application ORDER BY title COLLATE NOCASE, url")?;
    let rows = stmt.query_map([], |row| {
        Ok(Application {
            url: row.get(0)?,
            title: row.get(1)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Application directory served from the SQLite snapshot.
pub struct SqliteDirectory {
    db: Mutex<Connection>,
}

impl SqliteDirectory {
    pub fn new(db: Connection) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(open_file(path)?))
    }

    pub fn replace(&self, apps: &[Application]) -> Result<(), StoreError> {
        let mut db = self
            .db
            .lock()
            .map_err(|_| StoreError::Io(std::io::Error::other("directory lock poisoned")))?;
        replace_applications(&mut db, apps)
    }
}

impl ApplicationDirectory for SqliteDirectory {
    fn provider_name(&self) -> &'static str {
        "sqlite"
    }

    fn applications(&self) -> Result<Vec<Application>, LookupError> {
        let db = self
            .db
            .lock()
            .map_err(|_| LookupError::Failed("directory lock poisoned".to_string()))?;
        list_applications(&db).map_err(|error| LookupError::Failed(error.to_string()))
    }
}
