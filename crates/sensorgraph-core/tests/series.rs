mod common;

use chrono::Duration;
use proptest::prelude::*;
use sensorgraph_core::aggregation::compute_averages;
use sensorgraph_core::series::{build_series, format_time_label, SeriesMetric, SERIES_COUNT};
use sensorgraph_parser::{ChannelKey, ParticleSize, SensorIndex, SensorReading};

use common::{base_time, fixture_readings, full_readings, pm0p3};

const IST: chrono_tz::Tz = chrono_tz::Asia::Kolkata;

#[test]
fn series_order_and_titles() {
    let readings = full_readings(3, 10);
    let averages = compute_averages(&readings);
    let series = build_series(&readings, &averages, 50, IST);

    assert_eq!(series.len(), SERIES_COUNT);
    let titles: Vec<&str> = series.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "> 0.3 µm Particles",
            "> 0.5 µm Particles",
            "> 1.0 µm Particles",
            "> 2.5 µm Particles",
            "> 5.0 µm Particles",
            "> 10.0 µm Particles",
            "Differential Pressure",
        ]
    );
    assert_eq!(series[0].unit, "pcs/l");
    assert_eq!(series[6].unit, "Pa.");
    assert_eq!(series[6].metric, SeriesMetric::Pressure);
    assert_eq!(series[6].primary.legend, "DP Sensor");
    assert!(series[6].secondary.is_none());
    assert_eq!(series[0].primary.legend, "Sensor 1");
    assert_eq!(
        series[0].secondary.as_ref().map(|line| line.legend.as_str()),
        Some("Sensor 2")
    );
}

#[test]
fn labels_use_target_timezone_in_input_order() {
    let readings = fixture_readings("readings_20.json");
    let averages = compute_averages(&readings);
    let series = build_series(&readings, &averages, 3, IST);

    assert_eq!(series[0].labels, vec!["03:15 PM", "03:10 PM", "03:05 PM"]);

    let utc_series = build_series(&readings, &averages, 1, chrono_tz::UTC);
    assert_eq!(utc_series[0].labels, vec!["09:45 AM"]);
}

#[test]
fn points_pass_through_window_values() {
    let readings = fixture_readings("readings_20.json");
    let averages = compute_averages(&readings);
    let series = build_series(&readings, &averages, 12, IST);

    let expected_first: Vec<Option<i64>> = readings[..12]
        .iter()
        .map(|r| r.value(pm0p3(SensorIndex::One)))
        .collect();
    assert_eq!(series[0].primary.points, expected_first);
    // reading 11 had a null pm0p3_1; its slot stays in place
    assert_eq!(series[0].primary.points[11], None);
    assert_eq!(series[0].primary.points.len(), series[0].labels.len());

    let pressure: Vec<Option<i64>> = readings[..12]
        .iter()
        .map(|r| r.value(ChannelKey::Pressure))
        .collect();
    assert_eq!(series[6].primary.points, pressure);
    assert_eq!(series[6].primary.points[3], None);
}

#[test]
fn averages_come_from_full_dataset() {
    let readings = fixture_readings("readings_20.json");
    let averages = compute_averages(&readings);
    let series = build_series(&readings, &averages, 2, IST);

    let pm10 = &series[5];
    let second = pm10.secondary.as_ref().expect("sensor 2 line");
    assert_eq!(
        second.average,
        averages.mean(ChannelKey::particle(ParticleSize::Pm10p0, SensorIndex::Two))
    );
    assert_eq!(series[6].primary.average, averages.mean(ChannelKey::Pressure));
    assert!((series[6].primary.average.unwrap() - 19.842105263157894).abs() < 1e-9);
}

#[test]
fn missing_average_stays_unavailable() {
    let readings = vec![SensorReading::new(Some(base_time())).with_channel(pm0p3(SensorIndex::One), 7)];
    let averages = compute_averages(&readings);
    let series = build_series(&readings, &averages, 50, IST);

    assert_eq!(series[0].primary.average, Some(7.0));
    let sensor_two = series[0].secondary.as_ref().expect("sensor 2 line");
    assert_eq!(sensor_two.average, None);
    assert_eq!(sensor_two.display_average(), 0);
    assert_eq!(sensor_two.points, vec![None]);
    assert_eq!(series[6].primary.average, None);
}

#[test]
fn empty_input_keeps_shape() {
    let averages = compute_averages(&[]);
    let series = build_series(&[], &averages, 50, IST);

    assert_eq!(series.len(), SERIES_COUNT);
    for chart in &series {
        assert!(chart.is_empty());
        for line in chart.lines() {
            assert!(line.points.is_empty());
            assert_eq!(line.average, None);
        }
    }
}

#[test]
fn untimed_readings_never_get_labels() {
    let mut readings = full_readings(4, 1);
    readings[1].created_at = None;
    let averages = compute_averages(&readings);
    let series = build_series(&readings, &averages, 50, IST);

    assert_eq!(series[0].len(), 3);
    let expected: Vec<String> = [0, 2, 3]
        .into_iter()
        .map(|i| format_time_label(base_time() - Duration::minutes(5 * i), IST))
        .collect();
    assert_eq!(series[0].labels, expected);
    // the untimed reading still counts toward the average
    assert_eq!(averages.get(ChannelKey::Pressure).map(|a| a.count), Some(4));
}

#[test]
fn window_counts_untimed_readings_toward_its_size() {
    let mut readings = full_readings(3, 1);
    readings[0].created_at = None;
    let averages = compute_averages(&readings);
    let series = build_series(&readings, &averages, 2, IST);

    let expected = vec![format_time_label(base_time() - Duration::minutes(5), IST)];
    assert_eq!(expected, vec!["03:10 PM".to_string()]);
    for chart in &series {
        assert_eq!(chart.labels, expected);
        for line in chart.lines() {
            assert_eq!(line.points, vec![Some(2)]);
        }
    }
}

#[test]
fn rebuilding_is_idempotent() {
    let readings = fixture_readings("readings_20.json");
    let averages = compute_averages(&readings);
    assert_eq!(
        build_series(&readings, &averages, 7, IST),
        build_series(&readings, &averages, 7, IST)
    );
}

proptest! {
    #[test]
    fn window_length_is_min_of_window_and_readings(window in 0usize..80, count in 0usize..80) {
        let readings = full_readings(count, 100);
        let averages = compute_averages(&readings);
        let series = build_series(&readings, &averages, window, IST);
        let expected = window.min(count);

        let labels: Vec<String> = readings
            .iter()
            .take(expected)
            .map(|r| format_time_label(r.created_at.unwrap(), IST))
            .collect();

        prop_assert_eq!(series.len(), SERIES_COUNT);
        for chart in &series {
            prop_assert_eq!(&chart.labels, &labels);
            for line in chart.lines() {
                prop_assert_eq!(line.points.len(), expected);
            }
        }
    }
}
