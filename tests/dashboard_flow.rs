use chrono::NaiveDate;
use session_dashboard::export::export_csv;
use session_dashboard::ingestion::csv::{ingest_csv_from_reader, CsvReadOptions};
use session_dashboard::ingestion::{load_sessions, LoadOptions};
use session_dashboard::processing::{
    filter_sessions, mean, note_score_table, session_counts_by_period, validate_date_range, value_counts,
    BucketCount, CleaningPolicy, FilterCriteria, SessionSummary, TimeBucket,
};
use session_dashboard::report::BatchReport;
use session_dashboard::sessions;
use session_dashboard::types::{DataSet, DataType, Field, Schema, Value};

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, day).unwrap()
}

fn fixture() -> DataSet {
    load_sessions("tests/fixtures/sessions.csv", &LoadOptions::default())
        .unwrap()
        .dataset
}

fn ids(ds: &DataSet) -> Vec<i64> {
    ds.column(sessions::SESSION_ID)
        .unwrap()
        .map(|v| match v {
            Value::Int64(id) => *id,
            other => panic!("unexpected id {other:?}"),
        })
        .collect()
}

#[test]
fn future_end_is_clamped_before_filtering() {
    let at = |day| Value::DateTime(d(1, day).and_hms_opt(12, 0, 0).unwrap());
    let ds = DataSet::new(
        Schema::new(vec![
            Field::new("session_id", DataType::Int64),
            Field::new("date", DataType::DateTime),
        ]),
        vec![
            vec![Value::Int64(1), at(1)],
            vec![Value::Int64(2), at(2)],
            vec![Value::Int64(3), at(3)],
        ],
    );

    let checked = validate_date_range(d(1, 1), d(1, 5), d(1, 1));
    assert!(checked.was_clamped);
    assert!(!checked.was_inverted);
    assert_eq!(checked.range.end, d(1, 1));

    let out = filter_sessions(&ds, &FilterCriteria::new().with_date_range(checked.range));
    assert_eq!(ids(&out), vec![1]);
}

#[test]
fn loaded_sessions_filter_and_aggregate() {
    let ds = fixture();

    let all = SessionSummary::from_dataset(&ds);
    assert_eq!(all.sessions, 6);
    assert_eq!(all.mean_duree_minutes, Some(19.5));

    let langues = value_counts(&ds, sessions::LANGUE);
    assert_eq!(langues[0].value, "arabe");
    assert_eq!(langues[0].count, 3);
    assert_eq!(langues[1].value, "anglais");

    // Row 4 has an unparsable date and never matches an active period.
    let checked = validate_date_range(d(1, 31), d(1, 1), d(1, 5));
    assert!(checked.was_inverted && checked.was_clamped);
    let january = filter_sessions(&ds, &FilterCriteria::new().with_date_range(checked.range));
    assert_eq!(ids(&january), vec![1, 2, 3]);

    let urgences = filter_sessions(&ds, &FilterCriteria::new().with_services(["Urgences"]).with_min_note(3.0));
    assert_eq!(ids(&urgences), vec![1]);

    let bien = filter_sessions(&ds, &FilterCriteria::new().with_query("bien"));
    assert_eq!(ids(&bien), vec![1, 4]);

    let tablette = filter_sessions(&ds, &FilterCriteria::new().with_device("tablette").with_min_qualite(0.8));
    assert_eq!(ids(&tablette), vec![1, 6]);
    assert!((mean(&tablette, sessions::QUALITE_SCORE).unwrap() - 0.9).abs() < 1e-9);

    let nobody = filter_sessions(&ds, &FilterCriteria::new().with_langues(["basque"]));
    assert!(nobody.is_empty());
    assert_eq!(SessionSummary::from_dataset(&nobody).mean_note_praticien, None);
}

#[test]
fn weekly_counts_fill_gaps() {
    let counts = session_counts_by_period(&fixture(), TimeBucket::Week);
    assert_eq!(
        counts,
        vec![
            BucketCount { bucket: d(1, 1), count: 3 },
            BucketCount { bucket: d(1, 8), count: 1 },
            BucketCount { bucket: d(1, 15), count: 0 },
            BucketCount { bucket: d(1, 22), count: 0 },
            BucketCount { bucket: d(1, 29), count: 1 },
        ]
    );
}

#[test]
fn note_table_lists_recent_sessions_first() {
    let table = note_score_table(&fixture()).unwrap();
    assert_eq!(
        table.schema.field_names().collect::<Vec<_>>(),
        vec!["note_praticien", "session_id", "service", "date"]
    );
    assert_eq!(ids(&table), vec![6, 5, 3, 2, 1, 4]);
}

#[test]
fn export_round_trip_keeps_rows_and_values() {
    let ds = fixture();
    let subset = filter_sessions(&ds, &FilterCriteria::new().with_services(["Urgences"]));
    assert_eq!(subset.row_count(), 3);

    let bytes = export_csv(&subset).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.starts_with("session_id,date,service,"));
    assert!(text.contains("\n1,2024-01-01,Urgences,arabe,12.5,"));

    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(bytes.as_slice());
    let back = ingest_csv_from_reader(&mut rdr, &CsvReadOptions::default()).unwrap().dataset;

    assert_eq!(back.row_count(), subset.row_count());
    assert_eq!(back.schema.field_names().collect::<Vec<_>>(), subset.schema.field_names().collect::<Vec<_>>());

    let date_idx = subset.schema.index_of(sessions::DATE).unwrap();
    for (orig, parsed) in subset.rows.iter().zip(&back.rows) {
        for (i, (a, b)) in orig.iter().zip(parsed).enumerate() {
            if i == date_idx {
                assert_eq!(a.as_date(), b.as_date());
            } else {
                assert_eq!(a, b, "column {}", subset.schema.fields[i].name);
            }
        }
    }
}

#[test]
fn report_cleaning_ignores_columns_missing_from_source() {
    let loaded = load_sessions("tests/fixtures/sessions_partial.csv", &LoadOptions::default()).unwrap();
    let synthesized = &loaded.stats.synthesized_columns;

    let report = BatchReport::build(&loaded.dataset, CleaningPolicy::DropDuplicatesAndIncomplete, synthesized);
    assert_eq!(report.rows, 2);
    // Session 11 has no commentary; session 10 has every source column filled.
    assert_eq!(report.null_cells, 1);
    assert_eq!(report.cleaned_rows, 1);
    assert_eq!(report.summary.sessions, 1);
    assert_eq!(report.daily_sessions, vec![BucketCount { bucket: d(3, 4), count: 1 }]);

    let kept = BatchReport::build(&loaded.dataset, CleaningPolicy::Preserve, synthesized);
    assert_eq!(kept.cleaned_rows, 2);
}
