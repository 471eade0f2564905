pub mod render;

use crate::domain::{GenreCatalog, MovieRating};
use crate::error::Result;
use render::{BarChart, ChartSink, GroupedBarChart};
use std::collections::HashMap;
use tracing::info;

/// Fixed age-group cut points, left-inclusive and right-exclusive. The
/// "19-30" label against the 18-inclusive lower bound is a long-standing
/// labeling quirk in this report and is kept as-is.
const AGE_BINS: [(i64, i64, &str); 6] = [
    (0, 18, "0-18"),
    (18, 30, "19-30"),
    (30, 40, "31-40"),
    (40, 50, "41-50"),
    (50, 60, "51-60"),
    (60, 100, "60+"),
];

const AGE_HISTOGRAM_BUCKETS: usize = 20;

/// Rating-event count per named genre, descending. Ties keep catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreDistribution {
    pub counts: Vec<(&'static str, u64)>,
}

/// Equal-width histogram over the observed age range.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeHistogram {
    pub buckets: Vec<AgeBucket>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

/// Mean rating per (group, named genre), restricted to rows carrying the
/// genre's flag. `None` marks a cell with no qualifying rows.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreRatingBreakdown {
    pub groups: Vec<String>,
    pub genres: Vec<&'static str>,
    pub mean_ratings: Vec<Vec<Option<f64>>>,
}

/// Sums each named genre's flag across all rows and sorts descending. The
/// sort is stable, so equal counts keep the catalog's genre order.
pub fn genre_distribution(data: &[MovieRating], catalog: &GenreCatalog) -> GenreDistribution {
    let mut counts: Vec<(&'static str, u64)> = catalog
        .iter()
        .map(|(i, name)| {
            let count = data.iter().map(|row| row.genres[i] as u64).sum();
            (name, count)
        })
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    GenreDistribution { counts }
}

/// Histogram of the age field: 20 equal-width buckets over the observed
/// min..max. A degenerate range collapses to a single bucket; empty input
/// yields no buckets.
pub fn age_histogram(data: &[MovieRating]) -> AgeHistogram {
    let Some(min) = data.iter().map(|r| r.age).min() else {
        return AgeHistogram { buckets: vec![] };
    };
    let max = data.iter().map(|r| r.age).max().unwrap_or(min);
    if min == max {
        return AgeHistogram {
            buckets: vec![AgeBucket {
                lower: min as f64,
                upper: max as f64,
                count: data.len() as u64,
            }],
        };
    }

    let width = (max - min) as f64 / AGE_HISTOGRAM_BUCKETS as f64;
    let mut buckets: Vec<AgeBucket> = (0..AGE_HISTOGRAM_BUCKETS)
        .map(|i| AgeBucket {
            lower: min as f64 + width * i as f64,
            upper: min as f64 + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for row in data {
        // The top edge is inclusive so the maximum lands in the last bucket.
        let idx = (((row.age - min) as f64 / width) as usize).min(AGE_HISTOGRAM_BUCKETS - 1);
        buckets[idx].count += 1;
    }
    AgeHistogram { buckets }
}

/// Row count per gender code, descending with first-occurrence tie-break.
pub fn gender_distribution(data: &[MovieRating]) -> Vec<(String, u64)> {
    value_counts(data.iter().map(|r| r.gender.as_str()))
}

/// The `n` most frequent occupations by row count, descending. Equal counts
/// at the cutoff resolve to whichever occupation appears first in the data.
pub fn top_occupations(data: &[MovieRating], n: usize) -> Vec<(String, u64)> {
    let mut counts = value_counts(data.iter().map(|r| r.occupation.as_str()));
    counts.truncate(n);
    counts
}

/// Mean rating per (age group, named genre). All six fixed age groups are
/// reported; cells with no qualifying rows are `None`.
pub fn genre_rating_by_age_group(
    data: &[MovieRating],
    catalog: &GenreCatalog,
) -> GenreRatingBreakdown {
    let groups: Vec<String> = AGE_BINS.iter().map(|(_, _, label)| label.to_string()).collect();
    let mean_ratings = groups
        .iter()
        .map(|label| {
            let rows: Vec<&MovieRating> = data
                .iter()
                .filter(|r| age_group(r.age) == Some(label.as_str()))
                .collect();
            genre_means(&rows, catalog)
        })
        .collect();
    GenreRatingBreakdown {
        groups,
        genres: catalog.iter().map(|(_, name)| name).collect(),
        mean_ratings,
    }
}

/// Mean rating per (gender, named genre), genders in ascending code order.
pub fn genre_rating_by_gender(
    data: &[MovieRating],
    catalog: &GenreCatalog,
) -> GenreRatingBreakdown {
    let mut groups: Vec<String> = Vec::new();
    for row in data {
        if !groups.contains(&row.gender) {
            groups.push(row.gender.clone());
        }
    }
    groups.sort();
    keyed_breakdown(data, catalog, groups, |row| row.gender.as_str())
}

/// Mean rating per (occupation, named genre) for the five most frequent
/// occupations only; everything else is excluded from this view. Display
/// order is alphabetical, matching grouped output elsewhere.
pub fn genre_rating_by_top_occupations(
    data: &[MovieRating],
    catalog: &GenreCatalog,
) -> GenreRatingBreakdown {
    let mut groups: Vec<String> = top_occupations(data, 5)
        .into_iter()
        .map(|(occupation, _)| occupation)
        .collect();
    groups.sort();
    keyed_breakdown(data, catalog, groups, |row| row.occupation.as_str())
}

fn keyed_breakdown<'a>(
    data: &'a [MovieRating],
    catalog: &GenreCatalog,
    groups: Vec<String>,
    key: impl Fn(&'a MovieRating) -> &'a str,
) -> GenreRatingBreakdown {
    let mean_ratings = groups
        .iter()
        .map(|group| {
            let rows: Vec<&MovieRating> =
                data.iter().filter(|r| key(r) == group.as_str()).collect();
            genre_means(&rows, catalog)
        })
        .collect();
    GenreRatingBreakdown {
        groups,
        genres: catalog.iter().map(|(_, name)| name).collect(),
        mean_ratings,
    }
}

fn genre_means(rows: &[&MovieRating], catalog: &GenreCatalog) -> Vec<Option<f64>> {
    catalog
        .iter()
        .map(|(i, _)| {
            let mut sum = 0i64;
            let mut count = 0u64;
            for row in rows {
                if row.genres[i] == 1 {
                    sum += row.rating;
                    count += 1;
                }
            }
            (count > 0).then(|| sum as f64 / count as f64)
        })
        .collect()
}

fn age_group(age: i64) -> Option<&'static str> {
    AGE_BINS
        .iter()
        .find(|(lo, hi, _)| age >= *lo && age < *hi)
        .map(|(_, _, label)| *label)
}

/// Counts occurrences of each key, descending, breaking ties by first
/// occurrence in the input.
fn value_counts<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, (u64, usize)> = HashMap::new();
    for (idx, key) in keys.enumerate() {
        let entry = counts.entry(key).or_insert((0, idx));
        entry.0 += 1;
    }
    let mut out: Vec<(&str, (u64, usize))> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    out.into_iter()
        .map(|(key, (count, _))| (key.to_string(), count))
        .collect()
}

/// Computes the six report views and renders each through `sink`, in the
/// fixed order the pipeline has always emitted them.
pub fn run_reports(
    data: &[MovieRating],
    catalog: &GenreCatalog,
    sink: &mut dyn ChartSink,
) -> Result<()> {
    info!(rows = data.len(), "rendering reports");

    let genres = genre_distribution(data, catalog);
    sink.bar_chart(&BarChart {
        title: "Genre Distribution in the Movie Dataset".to_string(),
        x_label: "Genres".to_string(),
        y_label: "Number of Movies".to_string(),
        bars: genres
            .counts
            .iter()
            .map(|(name, count)| (name.to_string(), *count as f64))
            .collect(),
    })?;

    let ages = age_histogram(data);
    sink.bar_chart(&BarChart {
        title: "Age Distribution of Users".to_string(),
        x_label: "Age".to_string(),
        y_label: "Frequency".to_string(),
        bars: ages
            .buckets
            .iter()
            .map(|b| (format!("{:.1}-{:.1}", b.lower, b.upper), b.count as f64))
            .collect(),
    })?;

    sink.bar_chart(&BarChart {
        title: "Gender Distribution of Users".to_string(),
        x_label: "Gender".to_string(),
        y_label: "Frequency".to_string(),
        bars: gender_distribution(data)
            .into_iter()
            .map(|(gender, count)| (gender, count as f64))
            .collect(),
    })?;

    sink.bar_chart(&BarChart {
        title: "Top 10 Occupations of Users".to_string(),
        x_label: "Occupation".to_string(),
        y_label: "Frequency".to_string(),
        bars: top_occupations(data, 10)
            .into_iter()
            .map(|(occupation, count)| (occupation, count as f64))
            .collect(),
    })?;

    sink.grouped_bar_chart(&to_grouped_chart(
        "Average Genre Ratings by Age Group",
        "Age Group",
        genre_rating_by_age_group(data, catalog),
    ))?;

    sink.grouped_bar_chart(&to_grouped_chart(
        "Average Genre Ratings by Gender",
        "Gender",
        genre_rating_by_gender(data, catalog),
    ))?;

    sink.grouped_bar_chart(&to_grouped_chart(
        "Average Genre Ratings by Top 5 Occupations",
        "Occupation",
        genre_rating_by_top_occupations(data, catalog),
    ))?;

    Ok(())
}

fn to_grouped_chart(title: &str, x_label: &str, breakdown: GenreRatingBreakdown) -> GroupedBarChart {
    GroupedBarChart {
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: "Average Rating".to_string(),
        series: breakdown.genres.iter().map(|g| g.to_string()).collect(),
        groups: breakdown.groups,
        values: breakdown.mean_ratings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::KEPT_GENRE_FLAGS;

    fn row(age: i64, gender: &str, occupation: &str, rating: i64, flags: &[usize]) -> MovieRating {
        let mut genres = [0u8; KEPT_GENRE_FLAGS];
        for &f in flags {
            genres[f] = 1;
        }
        MovieRating {
            user_id: 1,
            movie_id: 1,
            rating,
            timestamp: 0,
            title: "Toy Story (1995)".to_string(),
            release_date: "01-Jan-1995".to_string(),
            imdb_url: "http://example.org".to_string(),
            genres,
            age,
            gender: gender.to_string(),
            occupation: occupation.to_string(),
            zip_code: "85711".to_string(),
        }
    }

    #[test]
    fn genre_counts_follow_the_flags() {
        let catalog = GenreCatalog::new();
        let data = vec![
            row(24, "M", "technician", 3, &[0]),
            row(24, "M", "technician", 4, &[0]),
            row(24, "M", "technician", 5, &[1]),
        ];
        let dist = genre_distribution(&data, &catalog);
        assert_eq!(dist.counts[0], ("Action", 2));
        assert_eq!(dist.counts[1], ("Adventure", 1));
        assert!(dist.counts[2..].iter().all(|(_, c)| *c == 0));
    }

    #[test]
    fn genre_distribution_tie_break_keeps_catalog_order() {
        let catalog = GenreCatalog::new();
        let data = vec![row(24, "M", "technician", 3, &[2, 5])];
        let dist = genre_distribution(&data, &catalog);
        // Animation and Crime both count 1; Animation comes first in the catalog.
        assert_eq!(dist.counts[0].0, "Animation");
        assert_eq!(dist.counts[1].0, "Crime");
    }

    #[test]
    fn age_group_boundaries_are_left_inclusive() {
        assert_eq!(age_group(0), Some("0-18"));
        assert_eq!(age_group(17), Some("0-18"));
        assert_eq!(age_group(18), Some("19-30"));
        assert_eq!(age_group(29), Some("19-30"));
        assert_eq!(age_group(30), Some("31-40"));
        assert_eq!(age_group(60), Some("60+"));
        assert_eq!(age_group(99), Some("60+"));
        assert_eq!(age_group(100), None);
    }

    #[test]
    fn age_group_means_split_on_the_bucket_boundary() {
        let catalog = GenreCatalog::new();
        let data = vec![
            row(17, "M", "student", 5, &[0]),
            row(20, "F", "student", 3, &[0]),
        ];
        let breakdown = genre_rating_by_age_group(&data, &catalog);
        assert_eq!(breakdown.groups[0], "0-18");
        assert_eq!(breakdown.mean_ratings[0][0], Some(5.0));
        assert_eq!(breakdown.groups[1], "19-30");
        assert_eq!(breakdown.mean_ratings[1][0], Some(3.0));
        // No Adventure-flagged rows anywhere.
        assert_eq!(breakdown.mean_ratings[0][1], None);
    }

    #[test]
    fn top_occupations_tie_break_uses_first_occurrence() {
        let data = vec![
            row(24, "M", "writer", 3, &[]),
            row(24, "M", "doctor", 3, &[]),
            row(24, "M", "writer", 3, &[]),
            row(24, "M", "artist", 3, &[]),
            row(24, "M", "doctor", 3, &[]),
        ];
        let top = top_occupations(&data, 2);
        assert_eq!(top[0], ("writer".to_string(), 2));
        assert_eq!(top[1], ("doctor".to_string(), 2));
        // "artist" (count 1) falls below the equal-count pair.
        assert_eq!(top_occupations(&data, 3)[2], ("artist".to_string(), 1));
    }

    #[test]
    fn top_occupation_view_excludes_everyone_else() {
        let mut data = Vec::new();
        for (i, occupation) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
            // 6 occupations with strictly decreasing counts.
            for _ in 0..(6 - i) {
                data.push(row(24, "M", occupation, 4, &[0]));
            }
        }
        let breakdown = genre_rating_by_top_occupations(&data, &GenreCatalog::new());
        assert_eq!(breakdown.groups, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn gender_breakdown_groups_sorted_by_code() {
        let data = vec![
            row(24, "M", "technician", 4, &[0]),
            row(30, "F", "writer", 2, &[0]),
        ];
        let breakdown = genre_rating_by_gender(&data, &GenreCatalog::new());
        assert_eq!(breakdown.groups, vec!["F", "M"]);
        assert_eq!(breakdown.mean_ratings[0][0], Some(2.0));
        assert_eq!(breakdown.mean_ratings[1][0], Some(4.0));
    }

    #[test]
    fn age_histogram_spans_observed_range() {
        let data: Vec<MovieRating> = (0..40)
            .map(|i| row(20 + i, "M", "student", 3, &[]))
            .collect();
        let hist = age_histogram(&data);
        assert_eq!(hist.buckets.len(), 20);
        assert_eq!(hist.buckets[0].lower, 20.0);
        assert_eq!(hist.buckets[19].upper, 59.0);
        assert_eq!(hist.buckets.iter().map(|b| b.count).sum::<u64>(), 40);
        // Top edge is inclusive: the max age lands in the last bucket.
        assert!(hist.buckets[19].count >= 1);
    }

    #[test]
    fn single_age_collapses_to_one_bucket() {
        let data = vec![row(33, "M", "student", 3, &[]); 4];
        let hist = age_histogram(&data);
        assert_eq!(hist.buckets.len(), 1);
        assert_eq!(hist.buckets[0].count, 4);
    }

    #[test]
    fn empty_input_yields_empty_results_not_errors() {
        let catalog = GenreCatalog::new();
        let data: Vec<MovieRating> = vec![];
        assert!(genre_distribution(&data, &catalog)
            .counts
            .iter()
            .all(|(_, c)| *c == 0));
        assert!(age_histogram(&data).buckets.is_empty());
        assert!(gender_distribution(&data).is_empty());
        assert!(top_occupations(&data, 10).is_empty());
        let breakdown = genre_rating_by_age_group(&data, &catalog);
        assert!(breakdown
            .mean_ratings
            .iter()
            .flatten()
            .all(|cell| cell.is_none()));
        assert!(genre_rating_by_top_occupations(&data, &catalog).groups.is_empty());
    }
}
