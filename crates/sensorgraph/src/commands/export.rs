use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use sensorgraph_core::{Dashboard, ExportKind, RefreshOutcome, SpreadsheetFormat};
use tracing::info;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Pdf,
    Png,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
    pub format: ExportFormat,

    /// Chart to snapshot for `--format png` (0-5 particle sizes, 6 pressure).
    #[arg(long, default_value_t = 0)]
    pub chart: usize,

    /// Destination directory. Without it, directory-grant platforms refuse the export.
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Override the detected platform class (`directory_grant` or `private_share`).
    #[arg(long)]
    pub platform: Option<String>,
}

impl ExportArgs {
    pub fn kind(&self) -> ExportKind {
        match self.format {
            ExportFormat::Xlsx => ExportKind::Spreadsheet(SpreadsheetFormat::Xlsx),
            ExportFormat::Csv => ExportKind::Spreadsheet(SpreadsheetFormat::Csv),
            ExportFormat::Pdf => ExportKind::Document,
            ExportFormat::Png => ExportKind::Snapshot { chart: self.chart },
        }
    }
}

pub async fn handle_export_command(dashboard: &Dashboard, args: ExportArgs) -> Result<()> {
    match dashboard.refresh().await {
        RefreshOutcome::Updated { readings, rejected } => {
            info!(readings, rejected, "data loaded for export");
        }
        RefreshOutcome::Failed(err) => {
            return Err(err).context("cannot export without data");
        }
        RefreshOutcome::AlreadyInFlight => bail!("a fetch is already in progress"),
    }

    let delivery = dashboard
        .export(args.kind())
        .await
        .with_context(|| format!("{:?} export failed", args.format))?;
    println!("{}", delivery.message());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(format: ExportFormat, chart: usize) -> ExportArgs {
        ExportArgs {
            format,
            chart,
            dest: None,
            platform: None,
        }
    }

    #[test]
    fn formats_map_to_export_kinds() {
        assert_eq!(
            args(ExportFormat::Xlsx, 0).kind(),
            ExportKind::Spreadsheet(SpreadsheetFormat::Xlsx)
        );
        assert_eq!(
            args(ExportFormat::Csv, 0).kind(),
            ExportKind::Spreadsheet(SpreadsheetFormat::Csv)
        );
        assert_eq!(args(ExportFormat::Pdf, 3).kind(), ExportKind::Document);
        assert_eq!(
            args(ExportFormat::Png, 6).kind(),
            ExportKind::Snapshot { chart: 6 }
        );
    }
}
