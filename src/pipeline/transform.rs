use crate::domain::{
    Movie, MovieRating, Rating, RawMovie, RawRating, RawUser, User, KEPT_GENRE_FLAGS,
};
use crate::pipeline::extract::ExtractedTables;
use std::collections::HashMap;
use tracing::{debug, info};

/// Cleans the three extracted tables and joins them into the denormalized
/// fact table. Unmatched join keys are silently dropped (inner-join
/// semantics); a zero-row result is not an error and propagates downstream.
pub fn transform(tables: &ExtractedTables) -> Vec<MovieRating> {
    let ratings = clean_ratings(&tables.ratings);
    let users = clean_users(&tables.users);
    let movies = clean_movies(&tables.movies);
    debug!(
        ratings = ratings.len(),
        users = users.len(),
        movies = movies.len(),
        "cleaned source tables"
    );

    let denormalized = join(&ratings, &movies, &users);
    info!(rows = denormalized.len(), "transform complete");
    denormalized
}

/// Drops ratings rows containing any missing value.
pub fn clean_ratings(raw: &[RawRating]) -> Vec<Rating> {
    raw.iter()
        .filter_map(|r| {
            Some(Rating {
                user_id: r.user_id?,
                movie_id: r.movie_id?,
                rating: r.rating?,
                timestamp: r.timestamp?,
            })
        })
        .collect()
}

/// Drops users rows containing any missing value.
pub fn clean_users(raw: &[RawUser]) -> Vec<User> {
    raw.iter()
        .filter_map(|u| {
            Some(User {
                user_id: u.user_id?,
                age: u.age?,
                gender: u.gender.clone()?,
                occupation: u.occupation.clone()?,
                zip_code: u.zip_code.clone()?,
            })
        })
        .collect()
}

/// Drops the unused `video_release_date` column and genre flags 20-23, then
/// drops rows with a missing value in any remaining field. The column drop
/// comes first: `video_release_date` is empty on every row, so row-dropping
/// against it would empty the table.
pub fn clean_movies(raw: &[RawMovie]) -> Vec<Movie> {
    raw.iter()
        .filter_map(|m| {
            let mut genres = [0u8; KEPT_GENRE_FLAGS];
            for (slot, flag) in genres.iter_mut().zip(m.genres.iter()) {
                *slot = (*flag)?;
            }
            Some(Movie {
                movie_id: m.movie_id?,
                title: m.title.clone()?,
                release_date: m.release_date.clone()?,
                imdb_url: m.imdb_url.clone()?,
                genres,
            })
        })
        .collect()
}

/// Inner-joins ratings to movies on movie_id, then the result to users on
/// user_id, preserving the order of the ratings table. The cleaned row types
/// carry no missing values, so the defensive post-join missing-value pass
/// has nothing left to remove.
fn join(ratings: &[Rating], movies: &[Movie], users: &[User]) -> Vec<MovieRating> {
    let movies_by_id: HashMap<i64, &Movie> =
        movies.iter().map(|m| (m.movie_id, m)).collect();
    let users_by_id: HashMap<i64, &User> = users.iter().map(|u| (u.user_id, u)).collect();

    ratings
        .iter()
        .filter_map(|r| {
            let movie = movies_by_id.get(&r.movie_id)?;
            let user = users_by_id.get(&r.user_id)?;
            Some(MovieRating {
                user_id: r.user_id,
                movie_id: r.movie_id,
                rating: r.rating,
                timestamp: r.timestamp,
                title: movie.title.clone(),
                release_date: movie.release_date.clone(),
                imdb_url: movie.imdb_url.clone(),
                genres: movie.genres,
                age: user.age,
                gender: user.gender.clone(),
                occupation: user.occupation.clone(),
                zip_code: user.zip_code.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SOURCE_GENRE_FLAGS;

    fn raw_rating(user_id: i64, movie_id: i64, rating: i64, timestamp: i64) -> RawRating {
        RawRating {
            user_id: Some(user_id),
            movie_id: Some(movie_id),
            rating: Some(rating),
            timestamp: Some(timestamp),
        }
    }

    fn raw_user(user_id: i64, age: i64, gender: &str, occupation: &str) -> RawUser {
        RawUser {
            user_id: Some(user_id),
            age: Some(age),
            gender: Some(gender.to_string()),
            occupation: Some(occupation.to_string()),
            zip_code: Some("98101".to_string()),
        }
    }

    fn raw_movie(movie_id: i64, title: &str) -> RawMovie {
        RawMovie {
            movie_id: Some(movie_id),
            title: Some(title.to_string()),
            release_date: Some("01-Jan-1995".to_string()),
            video_release_date: None,
            imdb_url: Some("http://example.org".to_string()),
            genres: [Some(0); SOURCE_GENRE_FLAGS],
        }
    }

    #[test]
    fn rows_with_missing_values_are_dropped() {
        let mut bad = raw_rating(1, 1, 5, 100);
        bad.rating = None;
        let cleaned = clean_ratings(&[raw_rating(1, 1, 5, 100), bad]);
        assert_eq!(cleaned.len(), 1);

        let mut bad = raw_user(1, 24, "M", "technician");
        bad.zip_code = None;
        assert_eq!(clean_users(&[bad]).len(), 0);
    }

    #[test]
    fn always_empty_video_release_date_does_not_drop_movies() {
        let cleaned = clean_movies(&[raw_movie(1, "Toy Story (1995)")]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].genres.len(), KEPT_GENRE_FLAGS);
    }

    #[test]
    fn movie_with_missing_release_date_is_dropped() {
        let mut m = raw_movie(267, "unknown");
        m.release_date = None;
        assert_eq!(clean_movies(&[m]).len(), 0);
    }

    #[test]
    fn reserved_genre_flags_are_dropped() {
        let mut m = raw_movie(1, "Toy Story (1995)");
        m.genres[0] = Some(1);
        m.genres[19] = Some(1);
        m.genres[22] = Some(1);
        let cleaned = clean_movies(&[m]);
        assert_eq!(cleaned[0].genres[0], 1);
        assert_eq!(cleaned[0].genres.iter().filter(|&&f| f == 1).count(), 1);
    }

    #[test]
    fn unmatched_keys_are_silently_dropped() {
        let tables = ExtractedTables {
            ratings: vec![
                raw_rating(1, 1, 5, 100),
                raw_rating(1, 99, 4, 101),
                raw_rating(99, 1, 3, 102),
            ],
            users: vec![raw_user(1, 24, "M", "technician")],
            movies: vec![raw_movie(1, "Toy Story (1995)")],
        };
        let rows = transform(&tables);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Toy Story (1995)");
        assert_eq!(rows[0].occupation, "technician");
    }

    #[test]
    fn joined_fields_match_source_records() {
        let tables = ExtractedTables {
            ratings: vec![raw_rating(7, 3, 4, 500)],
            users: vec![raw_user(7, 31, "F", "engineer")],
            movies: vec![raw_movie(3, "Heat (1995)")],
        };
        let rows = transform(&tables);
        assert_eq!(
            rows[0],
            MovieRating {
                user_id: 7,
                movie_id: 3,
                rating: 4,
                timestamp: 500,
                title: "Heat (1995)".to_string(),
                release_date: "01-Jan-1995".to_string(),
                imdb_url: "http://example.org".to_string(),
                genres: [0; KEPT_GENRE_FLAGS],
                age: 31,
                gender: "F".to_string(),
                occupation: "engineer".to_string(),
                zip_code: "98101".to_string(),
            }
        );
    }

    #[test]
    fn empty_ratings_propagate_an_empty_table() {
        let tables = ExtractedTables {
            ratings: vec![],
            users: vec![raw_user(1, 24, "M", "technician")],
            movies: vec![raw_movie(1, "Toy Story (1995)")],
        };
        assert!(transform(&tables).is_empty());
    }

    #[test]
    fn cardinality_is_bounded_by_cleaned_ratings() {
        let tables = ExtractedTables {
            ratings: vec![raw_rating(1, 1, 5, 100), raw_rating(1, 1, 5, 100)],
            users: vec![raw_user(1, 24, "M", "technician")],
            movies: vec![raw_movie(1, "Toy Story (1995)")],
        };
        // Duplicate rating events both survive; no dedupe anywhere.
        assert_eq!(transform(&tables).len(), 2);
    }
}
