use serde::{Deserialize, Serialize};

/// Genre flag columns present in the source movies file.
pub const SOURCE_GENRE_FLAGS: usize = 23;

/// Genre flag columns that survive the transform (flags 20-23 are
/// reserved/unused in this dataset revision and are dropped).
pub const KEPT_GENRE_FLAGS: usize = 19;

/// Columns of the denormalized table: 4 rating fields, 3 movie text fields,
/// 19 genre flags and 4 user demographic fields.
pub const DENORMALIZED_COLUMNS: usize = 4 + 3 + KEPT_GENRE_FLAGS + 4;

/// A ratings row as extracted, before missing-value cleaning. Empty source
/// fields land here as `None`.
#[derive(Debug, Clone, Default)]
pub struct RawRating {
    pub user_id: Option<i64>,
    pub movie_id: Option<i64>,
    pub rating: Option<i64>,
    pub timestamp: Option<i64>,
}

/// A users row as extracted, before missing-value cleaning.
#[derive(Debug, Clone, Default)]
pub struct RawUser {
    pub user_id: Option<i64>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub zip_code: Option<String>,
}

/// A movies row as extracted: the five fixed columns followed by 23 genre
/// flags. `video_release_date` is empty on every row in this dataset revision
/// and is dropped by the transform together with flags 20-23.
#[derive(Debug, Clone)]
pub struct RawMovie {
    pub movie_id: Option<i64>,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub video_release_date: Option<String>,
    pub imdb_url: Option<String>,
    pub genres: [Option<u8>; SOURCE_GENRE_FLAGS],
}

/// Cleaned ratings row. One row per user-movie rating event; uniqueness is
/// not enforced anywhere in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: i64,
    pub timestamp: i64,
}

/// Cleaned users row, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub age: i64,
    pub gender: String,
    pub occupation: String,
    pub zip_code: String,
}

/// Cleaned movies row after the column drop, keyed by `movie_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub movie_id: i64,
    pub title: String,
    pub release_date: String,
    pub imdb_url: String,
    pub genres: [u8; KEPT_GENRE_FLAGS],
}

/// One row of the denormalized fact table: a rating event joined with its
/// movie and user. This is the sole artifact passed between the Transformer,
/// Loader and Reporter. No intrinsic primary key; implicitly keyed by
/// (user_id, movie_id, timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRating {
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: i64,
    pub timestamp: i64,
    pub title: String,
    pub release_date: String,
    pub imdb_url: String,
    pub genres: [u8; KEPT_GENRE_FLAGS],
    pub age: i64,
    pub gender: String,
    pub occupation: String,
    pub zip_code: String,
}

/// The shared read-only mapping from genre flag position to display name.
/// Only the first 18 of the 19 kept flags carry names; flag 19 is
/// reserved/unnamed and excluded from named-genre reports.
#[derive(Debug, Clone, Copy)]
pub struct GenreCatalog {
    names: &'static [&'static str],
}

const GENRE_NAMES: [&str; 18] = [
    "Action",
    "Adventure",
    "Animation",
    "Children's",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Fantasy",
    "Film-Noir",
    "Horror",
    "Musical",
    "Mystery",
    "Romance",
    "Sci-Fi",
    "Thriller",
    "War",
    "Western",
];

impl GenreCatalog {
    pub fn new() -> Self {
        Self {
            names: &GENRE_NAMES,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates (flag index, display name) pairs; index i maps onto
    /// `MovieRating::genres[i]`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'static str)> + '_ {
        self.names.iter().copied().enumerate()
    }

    pub fn name(&self, index: usize) -> Option<&'static str> {
        self.names.get(index).copied()
    }
}

impl Default for GenreCatalog {
    fn default() -> Self {
        Self::new()
    }
}
