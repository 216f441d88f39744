use anyhow::{bail, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Table};
use sensorgraph_core::{Dashboard, Generation, RefreshOutcome};

#[derive(clap::Args, Debug, Default)]
pub struct ShowArgs {
    /// Print at most this many rows of the chart window.
    #[arg(long)]
    pub rows: Option<usize>,
}

pub async fn handle_show_command(dashboard: &Dashboard, args: ShowArgs) -> Result<()> {
    let outcome = dashboard.refresh().await;
    let generation = dashboard.current().await;

    match &outcome {
        RefreshOutcome::Updated { readings, rejected } => {
            println!("Fetched {readings} readings ({rejected} skipped as malformed).");
        }
        RefreshOutcome::Failed(err) => {
            println!("Fetch failed: {err}. Showing an empty dashboard.");
        }
        RefreshOutcome::AlreadyInFlight => bail!("a fetch is already in progress"),
    }

    println!("{}", averages_table(&generation));
    println!("{}", window_table(&generation, args.rows));

    if let RefreshOutcome::Failed(err) = outcome {
        return Err(err.into());
    }
    Ok(())
}

/// One row per chart, showing the full-dataset average of each line.
pub fn averages_table(generation: &Generation) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Chart", "Unit", "Sensor 1 / DP", "Sensor 2"]);

    for chart in &generation.series {
        let secondary = chart
            .secondary
            .as_ref()
            .map(|line| line.display_average().to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&chart.title),
            Cell::new(&chart.unit),
            Cell::new(chart.primary.display_average()).set_alignment(CellAlignment::Right),
            Cell::new(secondary).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// The chart window as a table: one row per label, one column per plotted line.
pub fn window_table(generation: &Generation, limit: Option<usize>) -> Table {
    let lines: Vec<_> = generation
        .series
        .iter()
        .flat_map(|chart| chart.lines())
        .collect();

    let mut header = vec!["Time".to_string()];
    header.extend(lines.iter().map(|line| line.channel.field_name()));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);

    let labels = generation
        .series
        .first()
        .map(|chart| chart.labels.as_slice())
        .unwrap_or_default();
    let shown = limit.unwrap_or(labels.len()).min(labels.len());

    for (index, label) in labels.iter().take(shown).enumerate() {
        let mut row = vec![Cell::new(label)];
        row.extend(lines.iter().map(|line| {
            let value = line
                .points
                .get(index)
                .copied()
                .flatten()
                .map(|value| value.to_string())
                .unwrap_or_default();
            Cell::new(value).set_alignment(CellAlignment::Right)
        }));
        table.add_row(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use sensorgraph_parser::{ChannelKey, ParticleSize, SensorIndex, SensorReading};

    fn reading(minutes_ago: i64, value: i64) -> SensorReading {
        let created_at =
            Utc.with_ymd_and_hms(2024, 10, 1, 9, 45, 0).unwrap() - Duration::minutes(minutes_ago);
        ChannelKey::ALL
            .into_iter()
            .fold(SensorReading::new(Some(created_at)), |r, key| {
                r.with_channel(key, value)
            })
    }

    #[test]
    fn averages_table_has_one_row_per_chart() {
        let generation = Generation::build(
            vec![reading(0, 10), reading(5, 20)],
            0,
            50,
            chrono_tz::Asia::Kolkata,
        );
        let rendered = averages_table(&generation).to_string();

        assert_eq!(averages_table(&generation).row_iter().count(), 7);
        assert!(rendered.contains("> 0.3 µm Particles"));
        assert!(rendered.contains("Differential Pressure"));
        assert!(rendered.contains("15"));
    }

    #[test]
    fn window_table_respects_limit() {
        let generation = Generation::build(
            vec![reading(0, 1), reading(5, 2), reading(10, 3)],
            0,
            50,
            chrono_tz::Asia::Kolkata,
        );

        let table = window_table(&generation, Some(2));
        assert_eq!(table.row_iter().count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("03:15 PM"));
        assert!(rendered.contains("03:10 PM"));
        assert!(!rendered.contains("03:05 PM"));
        assert!(rendered.contains(
            &ChannelKey::particle(ParticleSize::Pm10p0, SensorIndex::Two).field_name()
        ));
    }

    #[test]
    fn empty_generation_renders_headers_only() {
        let generation = Generation::empty();
        assert_eq!(window_table(&generation, None).row_iter().count(), 0);
        assert!(averages_table(&generation).to_string().contains("pcs/l"));
    }
}
