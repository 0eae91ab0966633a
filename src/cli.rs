//! Command line interface.

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Custom enum for log levels that can be used with clap's ValueEnum
#[derive(Debug, Clone, ValueEnum)]
#[allow(missing_docs)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convert our custom LogLevel enum to log crate's LevelFilter
impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Built-in demo scenes
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DemoScene {
    /// White beam through a dispersive prism onto a screen
    Prism,
    /// Point source bouncing inside a mirror box with a diffusing floor
    MirrorBox,
    /// Beam through a fog chamber onto a screen
    Fog,
}

/// Command line arguments structure using clap derive macros
#[derive(Parser)]
#[command(name = "lumiray")]
#[command(about = "A 2D spectral ray optics simulator")]
pub struct Args {
    /// Demo scene to run
    #[arg(long, value_enum, default_value = "prism", help = "Demo scene to run")]
    pub scene: DemoScene,

    /// Number of propagation passes
    #[arg(long, short = 'p', default_value = "100", help = "Number of propagation passes")]
    pub passes: u64,

    /// RNG seed; identical seeds reproduce identical runs
    #[arg(long, default_value = "0", help = "RNG seed")]
    pub seed: u64,

    /// Height of the output screen strip in pixels
    #[arg(long, default_value = "32", help = "Height of the output screen strip in pixels")]
    pub strip_height: u32,

    /// Output file path for the primary screen strip
    #[arg(short, long, default_value = "screen.png", help = "Output file path")]
    pub output: String,

    /// Set the logging level (defaults to "info")
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub debug_level: LogLevel,
}
