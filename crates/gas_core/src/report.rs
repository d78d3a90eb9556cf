//! CSV export of a run report for spreadsheet/report consumers.

use crate::run::RunReport;

/// Write the CSV header row for series samples.
pub fn write_series_header(writer: &mut impl std::io::Write) -> std::io::Result<()> {
    writeln!(
        writer,
        "zone,gas,time_hours,process_day,emission_rate_g_kg_h,\
         concentration_ppm,fan_power_pct,stage_rank,beyond_model_support"
    )
}

/// Append every sample of every series, one row each. Undefined
/// concentrations export as an empty field, not a sentinel number.
pub fn append_report_rows(
    writer: &mut impl std::io::Write,
    report: &RunReport,
) -> std::io::Result<()> {
    for series in &report.series {
        for sample in &series.samples {
            let concentration = sample
                .concentration_ppm
                .map(|c| c.to_string())
                .unwrap_or_default();
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{}",
                series.zone,
                series.gas,
                sample.time_hours,
                sample.process_day,
                sample.emission_rate_g_kg_h,
                concentration,
                sample.fan_power_pct,
                sample.stage_rank,
                sample.beyond_model_support,
            )?;
        }
    }
    Ok(())
}

/// Write a full report to a CSV file.
pub fn write_report_csv(path: &std::path::Path, report: &RunReport) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    write_series_header(&mut writer)?;
    append_report_rows(&mut writer, report)?;
    std::io::Write::flush(&mut writer)
}
