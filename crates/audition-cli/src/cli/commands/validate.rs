use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::exit_codes;
use audition_core::errors::codes;
use audition_core::validate::{validate, ValidateReport};
use serde_json::json;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let report = validate(&args.manifest, &args.audio_dir);
    let exit_code = decide_exit(&report);

    match args.format {
        OutputFormat::Json => {
            let doc = json!({
                "exit_code": exit_code,
                "errors": report.error_count(),
                "warnings": report.warning_count(),
                "diagnostics": report.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => {
            for d in &report.diagnostics {
                eprintln!("[{}] {}: {}", d.severity, d.code, d.message);
            }
            eprintln!(
                "validate: {} error(s), {} warning(s)",
                report.error_count(),
                report.warning_count()
            );
        }
    }
    Ok(exit_code)
}

fn decide_exit(report: &ValidateReport) -> i32 {
    if !report.has_errors() {
        return exit_codes::OK;
    }
    // Setup problems (no manifest at all) read as config errors; a
    // loadable manifest with missing clips is a validation failure.
    let config_like = report.diagnostics.iter().any(|d| {
        d.is_error()
            && (d.code == codes::E_MANIFEST_MISSING || d.code == codes::E_MANIFEST_PARSE)
    });
    if config_like {
        exit_codes::CONFIG_ERROR
    } else {
        exit_codes::VALIDATION_FAILED
    }
}
