//! pgcompare - N-way PostgreSQL catalog comparison.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use pgcompare_cli::{create_formatter, execute, Args};
use std::io::Write;

/// Exit status when the sources agree.
const EXIT_SAME: i32 = 0;

/// Exit status when the sources differ.
const EXIT_DIFFERENT: i32 = 1;

/// Exit status on any error.
const EXIT_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Logs go to stderr so reports on stdout stay machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let (command, format, config) = args.into_config();
    let formatter = create_formatter(format);

    let code = match execute(&command, &config, &*formatter).await {
        Ok(report) => {
            let mut stdout = std::io::stdout().lock();
            match writeln!(stdout, "{}", report.output) {
                Ok(()) if report.differences => EXIT_DIFFERENT,
                Ok(()) => EXIT_SAME,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    EXIT_ERROR
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(code);
}
