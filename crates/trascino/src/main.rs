use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use trascino_core::Settings;
use trascino_core::log::LogConfig;

#[derive(Parser)]
#[command(
    name = "trascino",
    version,
    about = "Move, resize and restack windows with Win-key mouse gestures"
)]
struct Cli {
    /// Do not focus the window being dragged
    #[arg(long)]
    no_focus_on_drag: bool,

    /// When focusing fails, fall back to a synthetic left click at the
    /// gesture's entry point (warning: clicks whatever control is there)
    #[arg(long)]
    click_to_focus_fallback: bool,

    /// Rate-limit posted move commands (less CPU, visibly choppier)
    #[arg(long)]
    ratelimit_moves: bool,

    /// Log the move rate once a second (only with --ratelimit-moves)
    #[arg(long)]
    log_move_rate: bool,

    /// Do not preserve the aspect ratio in center-zone resizes
    #[arg(long)]
    ignore_aspect: bool,

    /// Minimum log level: debug, info, warn or error
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log file used when no console is attached
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn into_settings(self) -> Settings {
        Settings {
            focus_on_drag: !self.no_focus_on_drag,
            click_to_focus_fallback: self.click_to_focus_fallback,
            ratelimit_moves: self.ratelimit_moves,
            log_move_rate: self.log_move_rate,
            respect_aspect_ratio: !self.ignore_aspect,
            logging: LogConfig {
                level: self.log_level,
                file: self.log_file,
                ..Default::default()
            },
        }
    }
}

fn main() -> ExitCode {
    let settings = Cli::parse().into_settings();

    trascino_core::log::init(&settings.logging, trascino_windows::has_console());
    trascino_core::log_info!("trascino {} starting", env!("CARGO_PKG_VERSION"));

    let signal = trascino_windows::run(&settings);

    if signal.code != 0 {
        trascino_core::log_error!("{signal}");
        eprintln!("trascino: {signal}");
    }
    trascino_core::log::shutdown();
    ExitCode::from(signal.code.clamp(0, 255) as u8)
}
