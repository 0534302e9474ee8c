use crate::cli::args::{ServeArgs, ServeMode};
use crate::exit_codes;
use audition_core::config::{load_config, AppConfig};
use audition_core::manifest::Manifest;
use audition_server::{Mode, ServerState};
use std::sync::Arc;

pub async fn run(args: ServeArgs) -> anyhow::Result<i32> {
    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{}", e);
                return Ok(exit_codes::CONFIG_ERROR);
            }
        },
        None => AppConfig::default(),
    };
    if let Some(manifest) = args.manifest {
        config.manifest = manifest;
    }
    if let Some(audio_dir) = args.audio_dir {
        config.audio_dir = audio_dir;
    }
    if let Some(out_dir) = args.out_dir {
        config.out_dir = out_dir;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let mode = match args.mode {
        ServeMode::Single => Mode::Single,
        ServeMode::Compare => Mode::Compare,
        ServeMode::Calibrate => Mode::Calibrate,
    };

    // The calibration test rates fixed reference clips; no manifest.
    let manifest = if mode == Mode::Calibrate {
        None
    } else {
        match Manifest::load(&config.manifest) {
            Ok(manifest) => {
                if manifest.models.is_empty() {
                    tracing::warn!(
                        manifest = %config.manifest.display(),
                        "manifest has no model columns; nothing to rate"
                    );
                } else if mode == Mode::Compare && manifest.models.len() < 2 {
                    tracing::warn!("comparison needs at least two model columns");
                }
                Some(manifest)
            }
            Err(e) => {
                eprintln!("{}", e);
                return Ok(exit_codes::CONFIG_ERROR);
            }
        }
    };

    println!();
    println!("  audition — {} variant", mode.as_str());
    println!("  http://0.0.0.0:{}", config.port);
    println!("  logs: {}", config.out_dir.display());
    println!();

    let state = Arc::new(ServerState::new(mode, config, manifest));
    audition_server::serve(state).await?;
    Ok(exit_codes::OK)
}
