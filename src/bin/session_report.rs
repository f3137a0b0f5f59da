use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use session_dashboard::export::write_csv;
use session_dashboard::ingestion::{
    CompositeObserver, DatasetCache, FileObserver, IngestionObserver, LoadOptions, LoadStatus, TracingObserver,
};
use session_dashboard::processing::{
    date_bounds, default_date_range, filter_sessions, session_counts_by_period, validate_date_range,
    value_counts, CleaningPolicy, DateRange, DateRangeValidation, FilterCriteria, TimeBucket,
};
use session_dashboard::report::BatchReport;
use session_dashboard::sessions;

/// Print a report over a medical-session CSV, optionally filtered and exported
#[derive(Debug, Parser)]
#[command(name = "session-report", version, about)]
struct Args {
    /// Session CSV file
    #[arg(value_name = "PATH", default_value = "sessions_dataset_320.csv")]
    input: PathBuf,

    /// First day of the period (YYYY-MM-DD); defaults to the earliest session.
    /// Without --start or --end, sessions are not filtered by date
    #[arg(long, value_name = "DATE")]
    start: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD); defaults to the latest session, at most today
    #[arg(long, value_name = "DATE")]
    end: Option<NaiveDate>,

    /// Keep only these services (repeatable)
    #[arg(long = "service", value_name = "NAME")]
    services: Vec<String>,

    /// Keep only these languages (repeatable)
    #[arg(long = "langue", value_name = "NAME")]
    langues: Vec<String>,

    /// Minimum practitioner rating
    #[arg(long, value_name = "N")]
    min_note: Option<f64>,

    /// Minimum quality score
    #[arg(long, value_name = "N")]
    min_qualite: Option<f64>,

    /// Keep only this device
    #[arg(long)]
    device: Option<String>,

    /// Case-insensitive search in free-text note columns
    #[arg(long, short = 'q')]
    query: Option<String>,

    /// Granularity of the session timeline
    #[arg(long, value_enum, default_value_t = Bucket::Day)]
    bucket: Bucket,

    /// Number of languages listed
    #[arg(long, default_value_t = 15)]
    top_languages: usize,

    /// Drop duplicate rows and rows with any missing value before reporting
    #[arg(long)]
    drop_incomplete: bool,

    /// Write the filtered sessions to this CSV file
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Also append load events to this file
    #[arg(long, value_name = "PATH")]
    load_log: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Bucket {
    Day,
    Week,
    Month,
}

impl From<Bucket> for TimeBucket {
    fn from(b: Bucket) -> Self {
        match b {
            Bucket::Day => TimeBucket::Day,
            Bucket::Week => TimeBucket::Week,
            Bucket::Month => TimeBucket::Month,
        }
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("session_dashboard={level},session_report={level}")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn run(args: Args) -> Result<()> {
    let observer: Arc<dyn IngestionObserver> = match &args.load_log {
        Some(path) => {
            let observers: Vec<Arc<dyn IngestionObserver>> =
                vec![Arc::new(TracingObserver), Arc::new(FileObserver::new(path))];
            Arc::new(CompositeObserver::new(observers))
        }
        None => Arc::new(TracingObserver),
    };
    let options = LoadOptions {
        observer: Some(observer),
        ..Default::default()
    };
    let cache = DatasetCache::new();
    let loaded = cache
        .get_or_load(&args.input, &options)
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    if loaded.status == LoadStatus::SourceNotFound || loaded.is_empty() {
        anyhow::bail!(
            "the dataset is empty or missing; place a session CSV at {}",
            args.input.display()
        );
    }
    let dataset = &loaded.dataset;

    let today = Local::now().date_naive();
    let mut criteria = FilterCriteria::new();
    if let Some(checked) = requested_period(args.start, args.end, date_bounds(dataset), today) {
        if checked.was_inverted {
            warn!("start and end dates were inverted; swapped");
        }
        if checked.was_clamped {
            warn!(%today, "dates after today were clamped to today");
        }
        let undated = dataset
            .column(sessions::DATE)
            .map_or(0, |values| values.filter(|v| v.is_null()).count());
        if undated > 0 {
            warn!(rows = undated, "sessions without a date are outside any period");
        }
        info!(start = %checked.range.start, end = %checked.range.end, "period");
        criteria = criteria.with_date_range(checked.range);
    }
    if !args.services.is_empty() {
        criteria = criteria.with_services(args.services);
    }
    if !args.langues.is_empty() {
        criteria = criteria.with_langues(args.langues);
    }
    if let Some(min) = args.min_note {
        criteria = criteria.with_min_note(min);
    }
    if let Some(min) = args.min_qualite {
        criteria = criteria.with_min_qualite(min);
    }
    if let Some(device) = args.device {
        criteria = criteria.with_device(device);
    }
    if let Some(query) = args.query {
        criteria = criteria.with_query(query);
    }

    let filtered = filter_sessions(dataset, &criteria);
    info!(rows = filtered.row_count(), of = dataset.row_count(), "filters applied");
    if filtered.is_empty() {
        warn!("no sessions match the filters");
    }

    let policy = if args.drop_incomplete {
        CleaningPolicy::DropDuplicatesAndIncomplete
    } else {
        CleaningPolicy::Preserve
    };
    let report = BatchReport::build(&filtered, policy, &loaded.stats.synthesized_columns);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
        println!();
        println!("Top languages:");
        for lc in value_counts(&filtered, sessions::LANGUE).iter().take(args.top_languages) {
            println!("  {:<20} {}", lc.value, lc.count);
        }
        if !matches!(args.bucket, Bucket::Day) {
            println!();
            println!("Sessions per {:?}:", args.bucket);
            for b in session_counts_by_period(&filtered, args.bucket.into()) {
                println!("  {}  {}", b.bucket, b.count);
            }
        }
    }

    if let Some(path) = args.export {
        let file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        write_csv(&filtered, BufWriter::new(file))?;
        info!(path = %path.display(), rows = filtered.row_count(), "filtered sessions exported");
    }

    Ok(())
}

/// The period to filter on, or `None` when neither bound was given.
///
/// A missing bound comes from the dataset's date span, or from today when no session has a date.
fn requested_period(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    bounds: Option<(NaiveDate, NaiveDate)>,
    today: NaiveDate,
) -> Option<DateRangeValidation> {
    if start.is_none() && end.is_none() {
        return None;
    }
    let default = match bounds {
        Some((min, max)) => default_date_range(min, max, today),
        None => DateRange::day(today),
    };
    Some(validate_date_range(
        start.unwrap_or(default.start),
        end.unwrap_or(default.end),
        today,
    ))
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Err(error) = run(args) {
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}
