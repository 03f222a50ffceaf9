mod common;

use chrono::NaiveDate;
use common::{dates, flat_series};
use metal_forecast::data::{align_closes, AlignedCloses};
use metal_forecast::{Asset, DataLoader, ForecastError, PriceBar, PriceSeries, PriceUnit};
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Open,High,Low,Close").unwrap();
    writeln!(file, "2024-01-02, 65.1, 65.9, 64.8, 65.4").unwrap();
    writeln!(file, "2024-01-03, 65.4, 66.2, 65.0, 66.0").unwrap();
    writeln!(file, "2024-01-04, 66.0, 66.1, 65.2, 65.5").unwrap();

    let series = DataLoader::from_csv(file.path(), PriceUnit::PerGram).unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series.unit(), PriceUnit::PerGram);
    assert_eq!(series.closes(), vec![65.4, 66.0, 65.5]);
    assert_eq!(series.last_date(), Some(d("2024-01-04")));
}

#[test]
fn test_lowercase_headers() {
    let csv = "date,open,high,low,close\n2024-02-01,1,2,0.5,1.5\n";
    let series = DataLoader::from_reader(csv.as_bytes(), PriceUnit::IndexPoints).unwrap();
    assert_eq!(series.bars()[0], PriceBar::new(d("2024-02-01"), 1.0, 2.0, 0.5, 1.5));
}

#[test]
fn test_data_loader_error_handling() {
    assert!(matches!(
        DataLoader::from_csv("nonexistent_file.csv", PriceUnit::PerGram),
        Err(ForecastError::IoError(_))
    ));

    let bad = "date,open,high,low,close\nnot-a-date,1,1,1,1\n";
    assert!(matches!(
        DataLoader::from_reader(bad.as_bytes(), PriceUnit::PerGram),
        Err(ForecastError::Csv(_))
    ));
}

#[rstest]
#[case("date,open,high,low,close\n2024-01-02,1,1,1,1\n2024-01-01,1,1,1,1\n")]
#[case("date,open,high,low,close\n2024-01-02,1,1,1,1\n2024-01-02,1,1,1,1\n")]
#[case("date,open,high,low,close\n2024-01-02,1,1,1,-1\n")]
#[case("date,open,high,low,close\n2024-01-02,1,0.5,1,1\n")]
#[case("date,open,high,low,close\n2024-01-02,1,1,1,NaN\n")]
fn test_invalid_series_rejected(#[case] csv: &str) {
    assert!(matches!(
        DataLoader::from_reader(csv.as_bytes(), PriceUnit::PerGram),
        Err(ForecastError::DataError(_))
    ));
}

#[rstest]
#[case("gold", Asset::Gold)]
#[case("XAU", Asset::Gold)]
#[case(" Silver ", Asset::Silver)]
#[case("platinum", Asset::Platinum)]
#[case("copper", Asset::Copper)]
#[case("S&P 500", Asset::Sp500)]
#[case("^GSPC", Asset::Sp500)]
fn test_asset_parsing(#[case] text: &str, #[case] expected: Asset) {
    assert_eq!(text.parse::<Asset>().unwrap(), expected);
}

#[test]
fn test_asset_properties() {
    assert!("bitcoin".parse::<Asset>().is_err());
    assert!(Asset::Copper.is_metal());
    assert!(!Asset::Sp500.is_metal());
    assert_eq!(Asset::Sp500.to_string(), "S&P 500");
}

#[test]
fn test_lookups_and_truncation() {
    let series = flat_series(&[10.0, 11.0, 12.0, 13.0], PriceUnit::PerGram);
    let days = dates(4);

    assert_eq!(series.close_on(days[2]), Some(12.0));
    assert_eq!(series.close_on(d("2030-01-01")), None);

    let head = series.truncated_to(days[1]);
    assert_eq!(head.closes(), vec![10.0, 11.0]);
    assert!(series.truncated_to(d("2000-01-01")).is_empty());
    assert_eq!(series.truncated_to(d("2030-01-01")), series);
}

#[test]
fn test_align_closes_inner_join() {
    let left = PriceSeries::from_closes(
        PriceUnit::PerGram,
        &[d("2024-01-01"), d("2024-01-02"), d("2024-01-03"), d("2024-01-05")],
        &[1.0, 2.0, 3.0, 5.0],
    )
    .unwrap();
    let right = PriceSeries::from_closes(
        PriceUnit::IndexPoints,
        &[d("2024-01-02"), d("2024-01-03"), d("2024-01-04"), d("2024-01-05"), d("2024-01-06")],
        &[20.0, 30.0, 40.0, 50.0, 60.0],
    )
    .unwrap();

    let aligned = align_closes(&left, &right, "test");
    assert_eq!(aligned.dates().to_vec(), vec![d("2024-01-02"), d("2024-01-03"), d("2024-01-05")]);
    assert_eq!(aligned.left(), &[2.0, 3.0, 5.0][..]);
    assert_eq!(aligned.right(), &[20.0, 30.0, 50.0][..]);

    let note = aligned.note().unwrap();
    assert_eq!(note.dropped_left, 1);
    assert_eq!(note.dropped_right, 2);
    assert!(note.to_string().contains("3 aligned bars"));

    let same = align_closes(&left, &left, "self");
    assert!(same.note().is_none());
    assert_eq!(same.len(), 4);
}

#[test]
fn test_aligned_columns_must_match() {
    let ok = AlignedCloses::new(dates(3), vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]).unwrap();
    assert_eq!(ok.len(), 3);
    assert!(ok.note().is_none());

    for (left, right) in [(vec![], vec![1.0, 2.0, 3.0]), (vec![1.0, 2.0, 3.0], vec![1.0])] {
        let result = AlignedCloses::new(dates(3), left, right);
        assert!(matches!(result, Err(ForecastError::DataError(_))));
    }
}
