use std::path::PathBuf;
use std::process::ExitCode;

use aquarium::prelude::*;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: aquarium [CONFIG.json] [--seed N] [--write-default PATH]";

struct Args {
    config: Option<PathBuf>,
    seed: Option<u64>,
    write_default: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        seed: None,
        write_default: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a value")?;
                args.seed = Some(value.parse().map_err(|_| format!("invalid seed '{}'", value))?);
            }
            "--write-default" => {
                args.write_default = Some(iter.next().ok_or("--write-default needs a path")?.into());
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with('-') => return Err(format!("unknown flag '{}'", other)),
            path => args.config = Some(path.into()),
        }
    }
    Ok(args)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aquarium=info,wgpu_core=warn,wgpu_hal=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    init_tracing();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}\n{}", msg, USAGE);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = args.write_default {
        return match AquariumConfig::default().save(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "wrote default config");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to write config");
                ExitCode::FAILURE
            }
        };
    }

    let mut config = match &args.config {
        Some(path) => match AquariumConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to load config");
                return ExitCode::FAILURE;
            }
        },
        None => AquariumConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let aquarium = Aquarium::from_config(&config, &mut BuiltinModels);
    match aquarium::run(aquarium, config.tuning) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "viewer stopped");
            ExitCode::FAILURE
        }
    }
}
