use crate::domain::{RawMovie, RawRating, RawUser, SOURCE_GENRE_FLAGS};
use crate::error::{EtlError, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs;
use std::path::Path;
use tracing::info;

/// Fixed source file names, resolved against the working directory.
pub const RATINGS_FILE: &str = "u.data";
pub const USERS_FILE: &str = "u.user";
pub const MOVIES_FILE: &str = "u.item";

const RATINGS_COLUMNS: usize = 4;
const USERS_COLUMNS: usize = 5;
const MOVIES_COLUMNS: usize = 5 + SOURCE_GENRE_FLAGS;

/// The three source tables as read from disk, before any cleaning.
#[derive(Debug, Clone)]
pub struct ExtractedTables {
    pub ratings: Vec<RawRating>,
    pub users: Vec<RawUser>,
    pub movies: Vec<RawMovie>,
}

/// Reads all three delimited sources from `dir`. A missing file or a record
/// with the wrong column count is fatal; there is no partial extraction.
pub fn extract_all(dir: &Path) -> Result<ExtractedTables> {
    let ratings = read_ratings(&dir.join(RATINGS_FILE))?;
    let users = read_users(&dir.join(USERS_FILE))?;
    let movies = read_movies(&dir.join(MOVIES_FILE))?;
    info!(
        ratings = ratings.len(),
        users = users.len(),
        movies = movies.len(),
        "extraction complete"
    );
    Ok(ExtractedTables {
        ratings,
        users,
        movies,
    })
}

/// Tab-separated ratings: user_id, movie_id, rating, timestamp. No header.
pub fn read_ratings(path: &Path) -> Result<Vec<RawRating>> {
    let file = path.display().to_string();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        expect_columns(&record, RATINGS_COLUMNS, &file, idx)?;
        rows.push(RawRating {
            user_id: parse_int(&record[0], &file, idx, "user_id")?,
            movie_id: parse_int(&record[1], &file, idx, "movie_id")?,
            rating: parse_int(&record[2], &file, idx, "rating")?,
            timestamp: parse_int(&record[3], &file, idx, "timestamp")?,
        });
    }
    Ok(rows)
}

/// Pipe-separated users: user_id, age, gender, occupation, zip_code.
/// No header.
pub fn read_users(path: &Path) -> Result<Vec<RawUser>> {
    let file = path.display().to_string();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'|')
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        expect_columns(&record, USERS_COLUMNS, &file, idx)?;
        rows.push(RawUser {
            user_id: parse_int(&record[0], &file, idx, "user_id")?,
            age: parse_int(&record[1], &file, idx, "age")?,
            gender: parse_text(&record[2]),
            occupation: parse_text(&record[3]),
            zip_code: parse_text(&record[4]),
        });
    }
    Ok(rows)
}

/// Pipe-separated movies: movie_id, title, release_date, video_release_date,
/// IMDb_URL, then 23 positional genre flags. No header. The file is Latin-1
/// encoded; titles contain bytes above 0x7F, so the whole file is decoded
/// byte-for-byte to Unicode scalars before CSV parsing.
pub fn read_movies(path: &Path) -> Result<Vec<RawMovie>> {
    let file = path.display().to_string();
    let bytes = fs::read(path)?;
    let decoded = decode_latin1(&bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'|')
        .flexible(true)
        .from_reader(decoded.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        expect_columns(&record, MOVIES_COLUMNS, &file, idx)?;
        let mut genres = [None; SOURCE_GENRE_FLAGS];
        for (g, slot) in genres.iter_mut().enumerate() {
            *slot = parse_flag(&record[5 + g], &file, idx, g + 1)?;
        }
        rows.push(RawMovie {
            movie_id: parse_int(&record[0], &file, idx, "movie_id")?,
            title: parse_text(&record[1]),
            release_date: parse_text(&record[2]),
            video_release_date: parse_text(&record[3]),
            imdb_url: parse_text(&record[4]),
            genres,
        });
    }
    Ok(rows)
}

/// Latin-1 maps every byte 0x00-0xFF onto the Unicode scalar of the same
/// value, so decoding cannot fail on any input byte.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn expect_columns(record: &StringRecord, want: usize, file: &str, idx: usize) -> Result<()> {
    if record.len() != want {
        return Err(EtlError::Malformed {
            file: file.to_string(),
            record: idx,
            message: format!("expected {} columns, found {}", want, record.len()),
        });
    }
    Ok(())
}

/// An empty field is a missing value and extracts as `None`; a non-empty
/// field that is not an integer is malformed input and fatal.
fn parse_int(field: &str, file: &str, idx: usize, column: &str) -> Result<Option<i64>> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<i64>().map(Some).map_err(|_| EtlError::Malformed {
        file: file.to_string(),
        record: idx,
        message: format!("column {column}: expected integer, found {field:?}"),
    })
}

fn parse_flag(field: &str, file: &str, idx: usize, flag: usize) -> Result<Option<u8>> {
    match field.trim() {
        "" => Ok(None),
        "0" => Ok(Some(0)),
        "1" => Ok(Some(1)),
        other => Err(EtlError::Malformed {
            file: file.to_string(),
            record: idx,
            message: format!("genre_{flag}: expected binary flag, found {other:?}"),
        }),
    }
}

fn parse_text(field: &str) -> Option<String> {
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}
