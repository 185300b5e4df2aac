mod signal;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use bytesize::ByteSize;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use livecap_core::{load_config, logging, record, CaptureStatus, Error, Recording};
use livecap_providers::BilibiliLiveClient;

#[derive(Parser, Debug)]
#[command(name = "livecap", version)]
#[command(about = "Record a live room's HLS stream into a single file", long_about = None)]
struct Cli {
    /// Public room number
    #[arg(value_name = "ROOM_ID")]
    room_id: u64,

    /// Output file; never overwritten if it already exists
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Configuration file (YAML or TOML)
    #[arg(short, long, env = "LIVECAP_CONFIG_PATH", value_name = "PATH")]
    config: Option<String>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // 1. Load configuration
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&config.capture.default_output));
    let resolver = BilibiliLiveClient::new(config.live_client_options())?;

    // 3. Bridge signals to cancellation
    let cancel = CancellationToken::new();
    let signal_task = signal::cancel_on_signal(cancel.clone());

    info!(room_id = cli.room_id, output = %output.display(), "livecap starting");
    let result = record(&config, &resolver, cli.room_id, &output, &cancel, None).await;

    cancel.cancel();
    let _ = signal_task.await;

    match result {
        Ok(recording) => {
            report(&recording);
            Ok(())
        }
        Err(e) => {
            if let Error::Capture(aborted) = &e {
                error!(
                    bytes_written = aborted.bytes_written,
                    "Capture aborted, partial output kept"
                );
                eprintln!(
                    "{}: partial output kept, {} written",
                    display_name(&output),
                    ByteSize(aborted.bytes_written)
                );
            }
            Err(e.into())
        }
    }
}

fn report(recording: &Recording) {
    println!("{}", summary(recording));
}

/// One-line final report for a run that stopped cleanly.
fn summary(recording: &Recording) -> String {
    let outcome = &recording.outcome;
    if !recording.created {
        return "stopped by user before recording started".to_string();
    }

    let reason = if outcome.status == CaptureStatus::StoppedCancelled {
        "stopped by user"
    } else {
        "room closed"
    };
    format!(
        "{}: {reason}, {} written",
        display_name(&recording.output),
        outcome.readable_size()
    )
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use livecap_core::CaptureOutcome;

    #[test]
    fn test_room_id_is_required() {
        let err = Cli::try_parse_from(["livecap"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.use_stderr());
    }

    #[test]
    fn test_room_id_must_be_an_integer() {
        let err = Cli::try_parse_from(["livecap", "abc"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.use_stderr());
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = Cli::try_parse_from(["livecap", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }

    #[test]
    fn test_output_and_overrides() {
        let cli = Cli::try_parse_from([
            "livecap",
            "21452505",
            "-o",
            "/tmp/rec.ts",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.room_id, 21_452_505);
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/rec.ts")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    fn recording(status: CaptureStatus, created: bool, bytes_written: u64) -> Recording {
        Recording {
            output: PathBuf::from("/data/rec/out.mp4"),
            created,
            outcome: CaptureOutcome {
                status,
                bytes_written,
                segments_written: 1,
                last_key: None,
            },
        }
    }

    #[test]
    fn test_summary_per_stop_reason() {
        let ended = summary(&recording(CaptureStatus::StoppedStreamEnded, true, 3 * 1024 * 1024));
        assert!(ended.starts_with("out.mp4: room closed, "));
        assert!(ended.contains("MiB"));

        let cancelled = summary(&recording(CaptureStatus::StoppedCancelled, true, 512));
        assert!(cancelled.starts_with("out.mp4: stopped by user, "));

        let early = summary(&recording(CaptureStatus::StoppedCancelled, false, 0));
        assert_eq!(early, "stopped by user before recording started");
    }

    #[test]
    fn test_display_name_strips_directories() {
        assert_eq!(display_name(Path::new("/data/rec/out.mp4")), "out.mp4");
        assert_eq!(display_name(Path::new("out.mp4")), "out.mp4");
    }
}
