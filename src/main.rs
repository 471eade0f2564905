use movielens_etl::config::Config;
use movielens_etl::domain::GenreCatalog;
use movielens_etl::logging;
use movielens_etl::pipeline;
use movielens_etl::report;
use movielens_etl::report::render::TextChartSink;
use std::path::Path;
use tracing::info;

fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let config = Config::load()?;
    info!("configuration loaded");

    println!("Running MovieLens ETL pipeline...");
    let summary = pipeline::run(&config, Path::new("."))?;

    println!(
        "Data has been successfully loaded into the SQLite database: {}",
        config.database.path
    );
    println!(
        "\nNumber of rows in '{}' table: {}\n",
        config.database.table, summary.persisted_rows
    );
    println!(
        "First {} rows in the '{}' table:",
        config.database.sample_rows, config.database.table
    );
    for row in &summary.sample {
        println!(
            "({}, {}, {}, {}, {:?}, {:?}, {}, {}, {:?}, {:?})",
            row.user_id,
            row.movie_id,
            row.rating,
            row.timestamp,
            row.title,
            row.release_date,
            row.age,
            row.gender,
            row.occupation,
            row.zip_code
        );
    }

    println!("\nStarting report rendering...");
    let catalog = GenreCatalog::new();
    let mut sink = TextChartSink::new(std::io::stdout().lock(), config.reports.chart_width);
    report::run_reports(&summary.rows, &catalog, &mut sink)?;

    info!("pipeline finished");
    Ok(())
}
