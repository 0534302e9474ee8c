use crate::cli::args::{OutputFormat, SummaryArgs};
use crate::exit_codes;
use audition_core::calibration::CalibrationSummary;
use audition_core::log::{CalibrationRow, ScoreLog};
use std::collections::BTreeSet;

pub fn run(args: SummaryArgs) -> anyhow::Result<i32> {
    if !args.log.exists() {
        eprintln!("log not found: {}", args.log.display());
        return Ok(exit_codes::CONFIG_ERROR);
    }
    let log: ScoreLog<CalibrationRow> = ScoreLog::new(&args.log);
    let rows = log.read_all()?;

    let evaluators: BTreeSet<&str> = rows.iter().map(|r| r.user_name.as_str()).collect();
    let summaries: Vec<CalibrationSummary> = evaluators
        .iter()
        .filter_map(|user| CalibrationSummary::from_rows(user, &rows))
        .collect();

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        OutputFormat::Text => {
            if summaries.is_empty() {
                eprintln!("no ratings in {}", args.log.display());
            }
            for s in &summaries {
                println!(
                    "{}: n={} accuracy={:.1}% mean_error={:.2} min={} max={} — {}",
                    s.user_name,
                    s.n,
                    s.accuracy,
                    s.mean_error,
                    s.min_error,
                    s.max_error,
                    if s.passed { "PASSED" } else { "FAILED" }
                );
            }
        }
    }
    Ok(exit_codes::OK)
}
