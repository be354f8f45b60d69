use chrono::{Duration, NaiveDate};
use energy_forecast::domain::model::Granularity;
use energy_forecast::{AppSettings, TimeSeriesInput};
use proptest::prelude::*;

fn hourly_csv(start: NaiveDate, values: &[f64]) -> String {
    let start = start.and_hms_opt(0, 0, 0).unwrap();
    let mut csv = String::from("timestamp,value\n");
    for (i, value) in values.iter().enumerate() {
        let ts = start + Duration::hours(i as i64);
        csv.push_str(&format!("{},{}\n", ts.format("%Y-%m-%d %H:%M:%S"), value));
    }
    csv
}

fn start_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..3650).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + Duration::days(offset)
    })
}

proptest! {
    #[test]
    fn regular_positive_hourly_series_is_accepted(
        start in start_date(),
        values in prop::collection::vec(0.001f64..1e6, 3..200),
    ) {
        let settings = AppSettings::default();
        let csv = hourly_csv(start, &values);
        let input = TimeSeriesInput::from_api_data(&csv, "hourly", "UTC", &settings).unwrap();

        prop_assert_eq!(input.len(), values.len());
        prop_assert!(input.frequency.matches(Granularity::Hourly));
        prop_assert_eq!(&input.values, &values);

        let series = input.to_timeseries("load").unwrap();
        prop_assert_eq!(series.len(), values.len());
    }

    #[test]
    fn any_non_positive_value_is_rejected(
        start in start_date(),
        mut values in prop::collection::vec(0.001f64..1e6, 3..100),
        bad in -1e6f64..=0.0,
        index in any::<prop::sample::Index>(),
    ) {
        let i = index.index(values.len());
        values[i] = bad;

        let settings = AppSettings::default();
        let err = TimeSeriesInput::from_api_data(&hourly_csv(start, &values), "hourly", "UTC", &settings)
            .unwrap_err();
        prop_assert_eq!(err.to_string(), "Data column contains non-positive values.");
    }

    #[test]
    fn dropping_an_inner_row_breaks_frequency(
        start in start_date(),
        values in prop::collection::vec(0.001f64..1e6, 5..100),
        index in any::<prop::sample::Index>(),
    ) {
        let csv = hourly_csv(start, &values);
        let mut lines: Vec<&str> = csv.lines().collect();
        // 移除首末列以外的任一列
        let drop_at = 2 + index.index(lines.len() - 3);
        lines.remove(drop_at);
        let gapped = lines.join("\n");

        let settings = AppSettings::default();
        let err = TimeSeriesInput::from_api_data(&gapped, "hourly", "UTC", &settings).unwrap_err();
        prop_assert_eq!(
            err.to_string(),
            "Series index frequency could not be inferred; data may be irregular."
        );
    }
}
