use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use engine::{Engine, EngineConfig, QualityTier, RenderPolicy, RimStyle, ZoneThresholds};
use heroconfig::{HeroConfig, RimStyleName, TierName, ZoneTuning};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let engine_config = build_engine_config(&args, &config)?;
    Engine::new(engine_config).run()
}

fn load_config(explicit: Option<&Path>) -> Result<HeroConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            Some(path.to_path_buf())
        }
        None => default_config_path().filter(|path| path.exists()),
    };

    match path {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("read config {}", path.display()))?;
            let config = HeroConfig::from_toml_str(&raw)
                .with_context(|| format!("parse config {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(HeroConfig::default()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    directories_next::ProjectDirs::from("", "", "waferhero")
        .map(|dirs| dirs.config_dir().join("waferhero.toml"))
}

/// Merges CLI flags over the config file; flags always win.
fn build_engine_config(args: &RunArgs, config: &HeroConfig) -> Result<EngineConfig> {
    let surface_size = match &args.size {
        Some(spec) => parse_size(spec)?,
        None => (1280, 720),
    };

    let tier = args.quality.or(config.quality.tier).map(map_tier);
    let fps = args
        .fps
        .or(config.quality.fps)
        .filter(|&fps| fps > 0.0);
    let rim = args.rim.unwrap_or(config.rim.style);

    let policy = match &args.still_export {
        Some(path) => RenderPolicy::Still {
            time_ms: args.still_time,
            path: path.clone(),
        },
        None => RenderPolicy::Animate,
    };

    Ok(EngineConfig {
        surface_size,
        forced_tier: tier,
        fps_override: fps,
        reduced_motion: args.reduced_motion || config.quality.reduced_motion,
        coarse_pointer: args.coarse_pointer || config.quality.coarse_pointer,
        device_memory_gb: args.memory.or(config.quality.device_memory_gb),
        logical_cores: args.cores.or(config.quality.logical_cores),
        zones: map_zones(&config.zones),
        rim_style: map_rim(rim),
        policy,
        drift_phase: None,
    })
}

fn map_tier(tier: TierName) -> QualityTier {
    match tier {
        TierName::Mobile => QualityTier::Mobile,
        TierName::Balanced => QualityTier::Balanced,
        TierName::High => QualityTier::High,
    }
}

fn map_rim(style: RimStyleName) -> RimStyle {
    match style {
        RimStyleName::Sweep => RimStyle::Sweep,
        RimStyleName::Linear => RimStyle::Linear,
    }
}

fn map_zones(zones: &ZoneTuning) -> ZoneThresholds {
    ZoneThresholds {
        hide_beyond: zones.hide_beyond,
        bevel_min: zones.bevel_min,
        exclusion_min: zones.exclusion_min,
        pcm_max: zones.pcm_max,
        notch_min: zones.notch_min,
        notch_descent: zones.notch_descent,
        notch_half_width: zones.notch_half_width,
        shell_radius_factor: zones.shell_radius_factor,
        min_shell_radius: zones.min_shell_radius,
    }
}

fn parse_size(spec: &str) -> Result<(u32, u32)> {
    let (width, height) = spec
        .split_once(['x', 'X'])
        .with_context(|| format!("invalid size `{spec}`; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .with_context(|| format!("invalid width in `{spec}`"))?;
    let height: u32 = height
        .trim()
        .parse()
        .with_context(|| format!("invalid height in `{spec}`"))?;
    if width == 0 || height == 0 {
        bail!("size `{spec}` must be non-zero in both dimensions");
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["waferhero"];
        full.extend_from_slice(argv);
        crate::cli::Cli::parse_from(full).run
    }

    #[test]
    fn parses_size_spec() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size("640X480").unwrap(), (640, 480));
        assert!(parse_size("1280").is_err());
        assert!(parse_size("0x720").is_err());
    }

    #[test]
    fn cli_flags_override_config() {
        let config = HeroConfig::from_toml_str(
            r#"
version = 1

[quality]
tier = "high"
fps = 60

[rim]
style = "sweep"
"#,
        )
        .unwrap();
        let engine = build_engine_config(
            &args(&["--quality", "mobile", "--fps", "24", "--rim", "linear"]),
            &config,
        )
        .unwrap();
        assert_eq!(engine.forced_tier, Some(QualityTier::Mobile));
        assert_eq!(engine.fps_override, Some(24.0));
        assert_eq!(engine.rim_style, RimStyle::Linear);
    }

    #[test]
    fn config_supplies_defaults_when_flags_absent() {
        let config = HeroConfig::from_toml_str(
            r#"
version = 1

[quality]
tier = "balanced"
reduced_motion = true

[zones]
bevel_min = 0.95
"#,
        )
        .unwrap();
        let engine = build_engine_config(&args(&[]), &config).unwrap();
        assert_eq!(engine.forced_tier, Some(QualityTier::Balanced));
        assert!(engine.reduced_motion);
        assert!((engine.zones.bevel_min - 0.95).abs() < f32::EPSILON);
        assert_eq!(engine.surface_size, (1280, 720));
    }

    #[test]
    fn zero_fps_means_tier_default() {
        let config = HeroConfig::default();
        let engine = build_engine_config(&args(&["--fps", "0"]), &config).unwrap();
        assert_eq!(engine.fps_override, None);
    }

    #[test]
    fn still_export_selects_still_policy() {
        let config = HeroConfig::default();
        let engine = build_engine_config(
            &args(&["--still-export", "/tmp/out.png", "--still-time", "1000"]),
            &config,
        )
        .unwrap();
        match engine.policy {
            RenderPolicy::Still { time_ms, ref path } => {
                assert_eq!(time_ms, 1000.0);
                assert_eq!(path, Path::new("/tmp/out.png"));
            }
            RenderPolicy::Animate => panic!("expected still policy"),
        }
    }
}
