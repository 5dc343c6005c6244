// Batch command: write the district summary document.
//
// Takes no arguments; paths and baselines come from `PipelineConfig`
// (defaults, overridable through `MLA_*` environment variables). Files
// that fail to parse and names that fail to map are warnings, not errors.
use std::process::ExitCode;

use mla_fund_report::config::csv_companion;
use mla_fund_report::{logging, output, reports, run_district_summary, util, PipelineConfig};
use tracing::error;

fn run() -> mla_fund_report::PipelineResult<()> {
    let config = PipelineConfig::from_env()?;
    let result = run_district_summary(&config)?;

    println!(
        "Processing dataset... ({} files found, {} parsed)",
        util::format_int(result.load.files_found),
        util::format_int(result.load.records_parsed)
    );
    if !result.load.failures.is_empty() {
        println!(
            "Note: {} files skipped due to parse errors.",
            util::format_int(result.load.failures.len())
        );
    }
    if !result.anomalies.is_empty() {
        println!(
            "Note: {} unmapped names; see warnings above.",
            util::format_int(result.anomalies.len())
        );
    }
    println!();

    output::write_json(&config.district_summary_file, &result.rows)?;
    let csv_path = csv_companion(&config.district_summary_file);
    output::write_csv(&csv_path, &reports::district_csv_rows(&result.rows))?;

    println!("District Fund Utilization Summary\n");
    output::preview_table_rows(&result.rows, 5);
    println!(
        "District summary generated at {} (flat table at {})",
        config.district_summary_file.display(),
        csv_path.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    logging::init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "district summary failed");
            ExitCode::FAILURE
        }
    }
}
