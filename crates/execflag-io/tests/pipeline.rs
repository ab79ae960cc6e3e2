//! End-to-end integration tests: CSV -> filter/normalize/split -> CSV.

use std::path::Path;

use execflag_frame::{Formula, filter, normalize, split};
use execflag_io::{FrameReader, FrameWriter};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn minute_bars_load_with_trading_formula() {
    let frame = FrameReader::new(&fixture_path("minute_bars.csv"))
        .read(&Formula::execute_flag())
        .expect("fixture should parse");

    assert_eq!(frame.n_rows(), 30);
    assert_eq!(frame.n_cols(), 9);
    assert_eq!(frame.column_names()[0], "WAP");
    assert_eq!(frame.column_names()[8], "EXECUTE");
    assert!(
        frame
            .column_by_name("EXECUTE")
            .unwrap()
            .iter()
            .all(|&v| v == 0.0 || v == 1.0)
    );
}

#[test]
fn filter_normalize_split_round_trip() {
    let formula = Formula::execute_flag();
    let frame = FrameReader::new(&fixture_path("minute_bars.csv"))
        .read(&formula)
        .unwrap();

    // 1. Keep the 0/20/40 minute buckets (5 rows each in 30 rows).
    let filtered = filter(&frame, "Minute", |v| v == 0.0 || v == 20.0 || v == 40.0).unwrap();
    assert_eq!(filtered.n_rows(), 15);

    // 2. Normalize the predictors only; the label stays categorical.
    let normalized = normalize(&formula.project(&filtered).unwrap()).unwrap();
    assert_eq!(normalized.n_cols(), formula.predictors().len());

    // 3. Split on time and write both halves.
    let (train, test) = split(&normalized, 0.7).unwrap();
    assert_eq!(train.n_rows(), 10);
    assert_eq!(test.n_rows(), 5);

    let dir = TempDir::new().unwrap();
    let writer = FrameWriter::new(dir.path()).unwrap();
    let train_path = writer.write("train", &train).unwrap();
    let test_path = writer.write("test", &test).unwrap();

    // 4. Read back with a formula over the written predictor columns.
    let predictors = Formula::new("Decision", ["WAP", "Minute"]).unwrap();
    let train_back = FrameReader::new(&train_path).read(&predictors).unwrap();
    let test_back = FrameReader::new(&test_path).read(&predictors).unwrap();
    assert_eq!(train_back, train);
    assert_eq!(test_back, test);
}
