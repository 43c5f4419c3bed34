//! SQLite-backed persistence of favorite movie records.
//!
//! Rows are keyed by imdb id with a uniqueness constraint on the title.
//! Upserts target the id key only; a clash on the title index surfaces as
//! a storage error instead of silently replacing another movie's row.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};

use crate::{Error, MovieDetail};

/// Open the database in WAL mode with the usual pragmas applied.
fn open_sqlite(path: &Path) -> Result<Connection, rusqlite::Error> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS favorites (
             imdb_id  TEXT PRIMARY KEY,
             title    TEXT NOT NULL,
             year     TEXT NOT NULL,
             rated    TEXT NOT NULL,
             runtime  TEXT NOT NULL,
             genre    TEXT NOT NULL,
             director TEXT NOT NULL,
             actors   TEXT NOT NULL,
             plot     TEXT NOT NULL,
             poster   TEXT
         );
         CREATE UNIQUE INDEX IF NOT EXISTS favorites_title ON favorites (title);",
    )
}

fn row_to_detail(row: &Row<'_>) -> rusqlite::Result<MovieDetail> {
    Ok(MovieDetail {
        imdb_id: row.get(0)?,
        title: row.get(1)?,
        year: row.get(2)?,
        rated: row.get(3)?,
        runtime: row.get(4)?,
        genre: row.get(5)?,
        director: row.get(6)?,
        actors: row.get(7)?,
        plot: row.get(8)?,
        poster: row.get(9)?,
    })
}

pub struct FavoritesStore {
    conn: Mutex<Connection>,
}

impl FavoritesStore {
    pub fn open(path: &Path) -> Result<Self, Error> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = open_sqlite(path)?;
        init_schema(&conn)?;
        tracing::info!(path = %path.display(), "opened favorites store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// An in-memory store; used when no database path is configured.
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or update the record for `detail.imdb_id`.
    pub fn insert(&self, detail: &MovieDetail) -> Result<(), Error> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO favorites
                 (imdb_id, title, year, rated, runtime, genre, director, actors, plot, poster)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(imdb_id) DO UPDATE SET
                 title = excluded.title,
                 year = excluded.year,
                 rated = excluded.rated,
                 runtime = excluded.runtime,
                 genre = excluded.genre,
                 director = excluded.director,
                 actors = excluded.actors,
                 plot = excluded.plot,
                 poster = excluded.poster",
            params![
                detail.imdb_id,
                detail.title,
                detail.year,
                detail.rated,
                detail.runtime,
                detail.genre,
                detail.director,
                detail.actors,
                detail.plot,
                detail.poster
            ],
        )?;
        Ok(())
    }

    /// Remove a record; returns whether it was present.
    pub fn remove(&self, imdb_id: &str) -> Result<bool, Error> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM favorites WHERE imdb_id = ?1", params![imdb_id])?;
        Ok(deleted > 0)
    }

    pub fn contains(&self, imdb_id: &str) -> Result<bool, Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT 1 FROM favorites WHERE imdb_id = ?1")?;
        Ok(stmt.exists(params![imdb_id])?)
    }

    pub fn get(&self, imdb_id: &str) -> Result<Option<MovieDetail>, Error> {
        let conn = self.conn.lock().unwrap();
        let detail = conn
            .query_row(
                "SELECT imdb_id, title, year, rated, runtime, genre, director, actors, plot, poster
                 FROM favorites WHERE imdb_id = ?1",
                params![imdb_id],
                row_to_detail,
            )
            .optional()?;
        Ok(detail)
    }

    /// All favorites in insertion order.
    pub fn list(&self) -> Result<Vec<MovieDetail>, Error> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT imdb_id, title, year, rated, runtime, genre, director, actors, plot, poster
             FROM favorites ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], row_to_detail)?;
        let mut favorites = Vec::new();
        for row in rows {
            favorites.push(row?);
        }
        Ok(favorites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(id: &str, title: &str) -> MovieDetail {
        MovieDetail {
            imdb_id: id.into(),
            title: title.into(),
            year: "2014".into(),
            rated: "R".into(),
            runtime: "112 min".into(),
            genre: "Comedy".into(),
            director: "Evan Goldberg".into(),
            actors: "James Franco".into(),
            plot: "A talk show host lands an interview.".into(),
            poster: None,
        }
    }

    #[test]
    fn round_trips_a_record() {
        let store = FavoritesStore::open_in_memory().unwrap();
        let movie = detail("tt2788710", "The Interview");

        store.insert(&movie).unwrap();
        assert!(store.contains("tt2788710").unwrap());
        assert_eq!(store.get("tt2788710").unwrap(), Some(movie));
        assert_eq!(store.get("tt0000000").unwrap(), None);
    }

    #[test]
    fn upsert_by_id_updates_in_place() {
        let store = FavoritesStore::open_in_memory().unwrap();
        store.insert(&detail("tt2788710", "The Interview")).unwrap();

        let mut updated = detail("tt2788710", "The Interview");
        updated.plot = "Revised plot.".into();
        store.insert(&updated).unwrap();

        assert_eq!(store.list().unwrap().len(), 1);
        assert_eq!(store.get("tt2788710").unwrap().unwrap().plot, "Revised plot.");
    }

    #[test]
    fn duplicate_title_under_another_id_is_rejected() {
        let store = FavoritesStore::open_in_memory().unwrap();
        store.insert(&detail("tt2788710", "The Interview")).unwrap();

        let clash = detail("tt0000001", "The Interview");
        assert!(matches!(store.insert(&clash), Err(Error::Storage(_))));
        assert!(!store.contains("tt0000001").unwrap());
    }

    #[test]
    fn remove_reports_presence() {
        let store = FavoritesStore::open_in_memory().unwrap();
        store.insert(&detail("tt2788710", "The Interview")).unwrap();

        assert!(store.remove("tt2788710").unwrap());
        assert!(!store.remove("tt2788710").unwrap());
        assert!(!store.contains("tt2788710").unwrap());
    }

    #[test]
    fn lists_in_insertion_order() {
        let store = FavoritesStore::open_in_memory().unwrap();
        store.insert(&detail("tt0110148", "Interview with the Vampire")).unwrap();
        store.insert(&detail("tt2788710", "The Interview")).unwrap();

        let titles: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|d| d.title)
            .collect();
        assert_eq!(titles, ["Interview with the Vampire", "The Interview"]);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favorites.db");

        {
            let store = FavoritesStore::open(&path).unwrap();
            store.insert(&detail("tt2788710", "The Interview")).unwrap();
        }

        let store = FavoritesStore::open(&path).unwrap();
        assert!(store.contains("tt2788710").unwrap());
    }
}
