mod cli;
mod config;
mod error;
mod output;

use std::process;

use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use stream_session::{HttpStreamResolver, PlaybackMode, StreamResolver, TimeShift};
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::{
    cli::{Args, Commands, OutputFormat},
    config::AppConfig,
    error::Result,
    output::{OutputManager, write_output},
};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let json_errors = matches!(
        &args.command,
        Commands::Resolve {
            output: OutputFormat::Json | OutputFormat::JsonCompact,
            ..
        }
    );

    if let Err(e) = run(args).await {
        if json_errors {
            let error_json = serde_json::json!({
                "status": "error",
                "message": e.to_string(),
            });
            println!("{error_json}");
        } else {
            error!("Application error: {}", e);
            #[cfg(feature = "colored-output")]
            {
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
            #[cfg(not(feature = "colored-output"))]
            {
                eprintln!("Error: {}", e);
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_overrides(args.endpoint, args.timeout);

    match args.command {
        Commands::Resolve {
            token,
            abs,
            rel,
            output,
            output_file,
        } => {
            config.validate()?;
            let mode = match (abs, rel) {
                (Some(value), _) => PlaybackMode::BackPlay(TimeShift::absolute(value)),
                (None, Some(value)) => PlaybackMode::BackPlay(TimeShift::relative(value)),
                (None, None) => PlaybackMode::Live,
            };
            debug!(token = %token, mode = %mode, endpoint = %config.session.lookup_endpoint, "Resolving");

            let resolver = HttpStreamResolver::new(&config.session)?;
            let resolved = resolver.resolve(&token, mode).await?;

            let manager = OutputManager::new(config.colored_output && output_file.is_none());
            let text = manager.format_resolved(&token, &resolved, output)?;
            write_output(&text, output_file.as_deref())?;
        }

        Commands::Config { show, path } => {
            if path {
                match AppConfig::resolve_path(args.config.as_deref()) {
                    Some(path) => println!("{}", path.display()),
                    None => println!("No configuration directory available"),
                }
            } else if show {
                println!("{}", config.show()?);
            } else {
                println!("Use --show to display the effective configuration or --path to locate it");
            }
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Args::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
