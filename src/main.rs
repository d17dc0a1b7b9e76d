//! Puyotui: Puyo-style falling-pair colour matching puzzle in the terminal.

mod app;
mod board;
mod command;
mod falling;
mod field;
mod game;
mod input;
mod logging;
mod piece;
mod resolve;
mod scoring;
mod snapshot;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use thiserror::Error;

/// Default gravity: ticks between one-row drops.
pub const DEFAULT_FALL_DELAY: u32 = 30;
/// Smallest accepted fall delay; a settling piece needs one check between two drops.
pub const MIN_FALL_DELAY: u32 = 2;

/// Validated options that drive the simulation and the frontend loop.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub tick_rate: f64,
    pub frame_rate: f64,
    pub fall_delay: u32,
    pub seed: Option<u64>,
    pub no_animation: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("tick rate must be a positive number of ticks per second, got {0}")]
    TickRate(f64),
    #[error("frame rate must be a positive number of frames per second, got {0}")]
    FrameRate(f64),
    #[error("fall delay must be at least {MIN_FALL_DELAY} ticks, got {0}")]
    FallDelay(u32),
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if !(args.tick_rate.is_finite() && args.tick_rate > 0.0) {
            return Err(ConfigError::TickRate(args.tick_rate));
        }
        if !(args.frame_rate.is_finite() && args.frame_rate > 0.0) {
            return Err(ConfigError::FrameRate(args.frame_rate));
        }
        if args.fall_delay < MIN_FALL_DELAY {
            return Err(ConfigError::FallDelay(args.fall_delay));
        }
        Ok(Self {
            tick_rate: args.tick_rate,
            frame_rate: args.frame_rate,
            fall_delay: args.fall_delay,
            seed: args.seed,
            no_animation: args.no_animation,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = GameConfig::from_args(&args)?;
    if let Some(path) = args.log_file.as_deref() {
        logging::init(path, args.verbose)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    tracing::info!(?config, "starting");
    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// Puyo-style puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "puyotui",
    version,
    about = "Puyo-style falling-pair puzzle in the terminal. Connect four blobs of one colour to pop them.",
    long_about = "Puyotui is a terminal puzzle game in the style of Puyo Puyo.\n\n\
        Pairs of coloured blobs fall into a 6x12 well. Four or more blobs of the same colour \
        touching up/down/left/right pop; whatever sat on them falls and may pop again (a chain). \
        Each popped blob scores 50 x (chain + 1). The game ends when the stack overflows the top.\n\n\
        CONTROLS:\n  Left/h  Right/l  Move     Down/j   Drop one row\n  \
        Z/u     Rotate CCW       X/Up/k   Rotate CW\n  \
        Enter/P Pause            R        Restart after game over\n  Q/Esc   Quit"
)]
pub struct Args {
    /// Simulation ticks per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Ticks between one-row gravity drops.
    #[arg(long, default_value_t = DEFAULT_FALL_DELAY, value_name = "TICKS")]
    pub fall_delay: u32,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Seed for the colour generator (reproducible games).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the pop animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (the terminal is taken by the game).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Log at debug level instead of info.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
