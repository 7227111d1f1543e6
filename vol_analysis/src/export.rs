/// export.rs — Chart data as CSV / Parquet
///
/// Two frames per run:
///   <stem>_volatility.<ext>   date, return_pct, conditional_volatility, standardized_residual
///   <stem>_forecast.<ext>     horizon, variance, volatility
use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

use garch_engine::{PipelineOutput, VolatilityForecast};

use crate::config::ExportFormat;

pub fn volatility_frame(output: &PipelineOutput) -> PolarsResult<DataFrame> {
    let dates: Vec<String> = output
        .returns
        .dates()
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    df!(
        "date" => dates,
        "return_pct" => output.returns.values(),
        "conditional_volatility" => &output.volatility.volatility,
        "standardized_residual" => &output.volatility.standardized_residuals
    )
}

pub fn forecast_frame(forecast: &VolatilityForecast) -> PolarsResult<DataFrame> {
    let horizon: Vec<u32> = (1..=forecast.horizon() as u32).collect();
    df!(
        "horizon" => horizon,
        "variance" => &forecast.variance,
        "volatility" => &forecast.volatility
    )
}

pub fn write_frame(df: &mut DataFrame, path: &Path, format: ExportFormat) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    match format {
        ExportFormat::Csv => CsvWriter::new(&mut file).include_header(true).finish(df)?,
        ExportFormat::Parquet => {
            ParquetWriter::new(&mut file).finish(df)?;
        }
    }
    Ok(())
}

/// Write both frames into `dir`, returning the paths written.
pub fn export_run(output: &PipelineOutput, dir: &Path, stem: &str, format: ExportFormat) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let ext = format.extension();

    let vol_path = dir.join(format!("{stem}_volatility.{ext}"));
    let mut vol = volatility_frame(output)?;
    write_frame(&mut vol, &vol_path, format)?;
    info!("Saving {} rows to {:?}", vol.height(), vol_path);

    let fc_path = dir.join(format!("{stem}_forecast.{ext}"));
    let mut fc = forecast_frame(&output.forecast)?;
    write_frame(&mut fc, &fc_path, format)?;
    info!("Saving {} rows to {:?}", fc.height(), fc_path);

    Ok(vec![vol_path, fc_path])
}

/// File-name friendly form of a ticker, e.g. `^GSPC` → `GSPC`.
pub fn file_stem(symbol: &str) -> String {
    let stem: String = symbol
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c),
            '-' | '_' | '.' | '=' => Some('_'),
            _ => None,
        })
        .collect();
    if stem.is_empty() { "series".to_string() } else { stem }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::simulated_output;

    #[test]
    fn csv_has_expected_columns() {
        let out = simulated_output();
        let dir = tempfile::tempdir().unwrap();
        let paths = export_run(&out, dir.path(), "sim", ExportFormat::Csv).unwrap();
        assert_eq!(paths.len(), 2);

        let text = fs::read_to_string(&paths[0]).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("date,return_pct,conditional_volatility,standardized_residual")
        );
        assert_eq!(lines.count(), out.returns.len());

        let text = fs::read_to_string(&paths[1]).unwrap();
        assert!(text.starts_with("horizon,variance,volatility"));
        assert_eq!(text.lines().count(), 1 + out.forecast.horizon());
    }

    #[test]
    fn parquet_round_trips_shape() {
        let out = simulated_output();
        let dir = tempfile::tempdir().unwrap();
        let paths = export_run(&out, dir.path(), "sim", ExportFormat::Parquet).unwrap();
        assert!(paths[0].ends_with("sim_volatility.parquet"));

        let df = ParquetReader::new(File::open(&paths[0]).unwrap()).finish().unwrap();
        assert_eq!(df.shape(), (out.returns.len(), 4));
    }

    #[test]
    fn ticker_to_stem() {
        assert_eq!(file_stem("^GSPC"), "GSPC");
        assert_eq!(file_stem("BRK-B"), "BRK_B");
        assert_eq!(file_stem("^"), "series");
    }
}
