// Batch command: write the statewide MLA summary document.
use std::process::ExitCode;

use mla_fund_report::config::csv_companion;
use mla_fund_report::{logging, output, run_mla_summary, util, PipelineConfig};
use tracing::error;

fn run() -> mla_fund_report::PipelineResult<()> {
    let config = PipelineConfig::from_env()?;
    let result = run_mla_summary(&config);
    let aggregate = &result.document.aggregate;

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
    println!();

    output::write_json(&config.mla_summary_file, &result.document)?;
    let csv_path = csv_companion(&config.mla_summary_file);
    output::write_csv(&csv_path, &result.document.mlas)?;

    println!("Top MLAs by Expenditure\n");
    output::preview_table_rows(&result.document.mlas, 5);
    println!(
        "{} MLAs, {} projects, {} total",
        util::format_int(aggregate.total_mlas),
        util::format_int(aggregate.total_projects),
        util::format_amount_cr(aggregate.total_expenditure)
    );
    println!(
        "Summary generated successfully at {}",
        config.mla_summary_file.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    logging::init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "MLA summary failed");
            ExitCode::FAILURE
        }
    }
}
