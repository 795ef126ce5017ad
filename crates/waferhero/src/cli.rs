use std::path::PathBuf;

use clap::Parser;
use heroconfig::{RimStyleName, TierName};

#[derive(Parser, Debug)]
#[command(
    name = "waferhero",
    author,
    version,
    about = "Animated silicon-wafer hero scene",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Force a quality tier (`mobile`, `balanced`, `high`) instead of
    /// probing capabilities.
    #[arg(long, value_name = "TIER", value_parser = parse_tier)]
    pub quality: Option<TierName>,

    /// Cap the frame rate below the tier's target (0 = tier default).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Render the static reduced-motion pose only.
    #[arg(long)]
    pub reduced_motion: bool,

    /// Treat the pointer as coarse; disables hover classification.
    #[arg(long)]
    pub coarse_pointer: bool,

    /// Device memory hint in GiB for tier classification.
    #[arg(long, value_name = "GB")]
    pub memory: Option<u32>,

    /// Logical core count hint for tier classification.
    #[arg(long, value_name = "N")]
    pub cores: Option<u32>,

    /// Render a single frame to the given PNG path and exit.
    #[arg(long, value_name = "PATH")]
    pub still_export: Option<PathBuf>,

    /// Scene time in milliseconds for still exports.
    #[arg(long, value_name = "MS", default_value_t = 0.0)]
    pub still_time: f32,

    /// Rim gradient strategy (`sweep` or `linear`).
    #[arg(long, value_name = "STYLE", value_parser = parse_rim)]
    pub rim: Option<RimStyleName>,

    /// Configuration file; defaults to the user config directory.
    #[arg(long, value_name = "FILE", env = "WAFERHERO_CONFIG")]
    pub config: Option<PathBuf>,
}

fn parse_tier(value: &str) -> Result<TierName, String> {
    match value {
        "mobile" => Ok(TierName::Mobile),
        "balanced" => Ok(TierName::Balanced),
        "high" => Ok(TierName::High),
        other => Err(format!(
            "unknown tier `{other}` (expected mobile, balanced or high)"
        )),
    }
}

fn parse_rim(value: &str) -> Result<RimStyleName, String> {
    match value {
        "sweep" => Ok(RimStyleName::Sweep),
        "linear" => Ok(RimStyleName::Linear),
        other => Err(format!("unknown rim style `{other}` (expected sweep or linear)")),
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quality_and_rim() {
        let cli = Cli::parse_from(["waferhero", "--quality", "balanced", "--rim", "linear"]);
        assert_eq!(cli.run.quality, Some(TierName::Balanced));
        assert_eq!(cli.run.rim, Some(RimStyleName::Linear));
    }

    #[test]
    fn rejects_unknown_tier() {
        assert!(Cli::try_parse_from(["waferhero", "--quality", "ultra"]).is_err());
    }

    #[test]
    fn still_export_takes_a_path() {
        let cli = Cli::parse_from([
            "waferhero",
            "--still-export",
            "/tmp/wafer.png",
            "--still-time",
            "2500",
        ]);
        assert!(cli.run.still_export.is_some());
        assert_eq!(cli.run.still_time, 2500.0);
    }
}
