use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Log levels accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive for `tracing_subscriber::EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Command line arguments structure using clap derive macros
#[derive(Debug, Parser)]
#[command(name = "sphere-tracer")]
#[command(about = "Interactive path-traced sphere viewer")]
pub struct Args {
    /// Logging level; overrides RUST_LOG when given
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// Window or snapshot width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Window or snapshot height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Render a CPU preview to this PNG and exit, without opening a window
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Start in free-fly mode
    #[arg(long)]
    pub free_fly: bool,

    /// Disable temporal accumulation
    #[arg(long)]
    pub no_taa: bool,

    /// Settings file to use instead of the one in the user config directory
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snapshot_invocation() {
        let args = Args::try_parse_from([
            "sphere-tracer",
            "--snapshot",
            "out.png",
            "--width",
            "64",
            "--log-level",
            "debug",
            "--no-taa",
        ])
        .unwrap();
        assert_eq!(args.snapshot, Some(PathBuf::from("out.png")));
        assert_eq!(args.width, Some(64));
        assert_eq!(args.height, None);
        assert!(args.no_taa);
        assert!(!args.free_fly);
        assert_eq!(args.log_level.map(LogLevel::as_directive), Some("debug"));
    }
}
