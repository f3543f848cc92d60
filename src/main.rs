use clap::Parser;
use std::process;
use temperature_anomaly::AnalysisError;
use temperature_anomaly::cli::{self, Args};

fn main() {
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = cli::run(args) => result,
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    eprintln!("\nReceived CTRL+C, shutting down...");
                    Err(AnalysisError::Interrupted {
                        reason: "analysis interrupted by user".to_string(),
                    }
                    .into())
                }
                Err(e) => Err(anyhow::Error::new(e).context("Failed to install CTRL+C handler")),
            },
        }
    });

    match result {
        Ok(_summary) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
