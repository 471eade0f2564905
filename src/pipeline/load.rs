use crate::domain::{MovieRating, KEPT_GENRE_FLAGS};
use crate::error::{EtlError, Result};
use rusqlite::{Connection, Row};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// SQLite-backed store for the denormalized table. The connection is scoped
/// to the stage that opens it and closes on drop.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Replaces the destination table with `rows` in a single transaction:
    /// drop, recreate with the explicit full column schema, insert everything.
    /// Any failure rolls the whole load back; there is no partial commit.
    pub fn load_full_refresh(&mut self, table: &str, rows: &[MovieRating]) -> Result<()> {
        let table = quote_identifier(table)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};\nCREATE TABLE {table} (\n{}\n);",
            column_definitions()
        ))?;
        {
            let mut stmt = tx.prepare(&insert_sql(&table))?;
            for row in rows {
                stmt.execute(rusqlite::params_from_iter(row_values(row)))?;
            }
        }
        tx.commit()?;
        info!(rows = rows.len(), "load complete");
        Ok(())
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let table = quote_identifier(table)?;
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// First `n` rows in storage order. The order is whatever SQLite returns
    /// without an ORDER BY; callers must not rely on it beyond smoke checks.
    pub fn sample(&self, table: &str, n: usize) -> Result<Vec<MovieRating>> {
        let table = quote_identifier(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {table} LIMIT ?1"))?;
        let rows = stmt
            .query_map([n as i64], row_to_movie_rating)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

/// Destination column names in schema order.
pub fn column_names() -> Vec<String> {
    let mut names = vec![
        "user_id".to_string(),
        "movie_id".to_string(),
        "rating".to_string(),
        "timestamp".to_string(),
        "title".to_string(),
        "release_date".to_string(),
        "IMDb_URL".to_string(),
    ];
    for i in 1..=KEPT_GENRE_FLAGS {
        names.push(format!("genre_{i}"));
    }
    names.extend(
        ["age", "gender", "occupation", "zip_code"]
            .iter()
            .map(|s| s.to_string()),
    );
    names
}

fn column_definitions() -> String {
    let mut out = String::new();
    for (i, name) in column_names().iter().enumerate() {
        let ty = match name.as_str() {
            "title" | "release_date" | "IMDb_URL" | "gender" | "occupation" | "zip_code" => {
                "TEXT"
            }
            _ => "INTEGER",
        };
        if i > 0 {
            out.push_str(",\n");
        }
        write!(out, "    {name} {ty}").unwrap();
    }
    out
}

fn insert_sql(quoted_table: &str) -> String {
    let names = column_names();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {quoted_table} ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    )
}

fn row_values(row: &MovieRating) -> Vec<rusqlite::types::Value> {
    use rusqlite::types::Value;
    let mut values = vec![
        Value::Integer(row.user_id),
        Value::Integer(row.movie_id),
        Value::Integer(row.rating),
        Value::Integer(row.timestamp),
        Value::Text(row.title.clone()),
        Value::Text(row.release_date.clone()),
        Value::Text(row.imdb_url.clone()),
    ];
    for flag in row.genres {
        values.push(Value::Integer(flag as i64));
    }
    values.push(Value::Integer(row.age));
    values.push(Value::Text(row.gender.clone()));
    values.push(Value::Text(row.occupation.clone()));
    values.push(Value::Text(row.zip_code.clone()));
    values
}

fn row_to_movie_rating(row: &Row) -> rusqlite::Result<MovieRating> {
    let mut genres = [0u8; KEPT_GENRE_FLAGS];
    for (i, slot) in genres.iter_mut().enumerate() {
        *slot = row.get::<_, i64>(7 + i)? as u8;
    }
    Ok(MovieRating {
        user_id: row.get(0)?,
        movie_id: row.get(1)?,
        rating: row.get(2)?,
        timestamp: row.get(3)?,
        title: row.get(4)?,
        release_date: row.get(5)?,
        imdb_url: row.get(6)?,
        genres,
        age: row.get(7 + KEPT_GENRE_FLAGS)?,
        gender: row.get(8 + KEPT_GENRE_FLAGS)?,
        occupation: row.get(9 + KEPT_GENRE_FLAGS)?,
        zip_code: row.get(10 + KEPT_GENRE_FLAGS)?,
    })
}

/// Table names come from configuration, not user input, but they still get
/// quoted and restricted to plain identifiers before interpolation into SQL.
fn quote_identifier(name: &str) -> Result<String> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(EtlError::Config(format!(
            "invalid table name: {name:?}"
        )));
    }
    Ok(format!("\"{name}\""))
}
