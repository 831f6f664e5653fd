use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

/// Range of the growth-threshold sliders (percent).
pub const THRESHOLD_RANGE: std::ops::RangeInclusive<f64> = 0.0..=30.0;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Parser)]
#[command(name = "stream-insights", version, about = "Streaming and campaign dashboard")]
pub struct Args {
    /// JSON configuration file (default: ./dashboard.json when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Streaming-activity table (.csv, .json or .parquet)
    #[arg(long)]
    pub streaming: Option<PathBuf>,

    /// Marketing-campaign table (.csv, .json or .parquet)
    #[arg(long)]
    pub campaigns: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

/// Startup settings. Every field has a default, so a config file only lists
/// what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub streaming_path: PathBuf,
    pub campaigns_path: PathBuf,
    /// Initial position of the "Number of Artists" slider.
    pub artist_limit: usize,
    pub artist_limit_min: usize,
    pub artist_limit_max: usize,
    pub drilldown_limit: usize,
    pub user_growth_threshold: f64,
    pub premium_growth_threshold: f64,
    pub window_size: [f32; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            streaming_path: PathBuf::from("spotify.csv"),
            campaigns_path: PathBuf::from("marketing_campaigns.csv"),
            artist_limit: 10,
            artist_limit_min: 5,
            artist_limit_max: 10,
            drilldown_limit: crate::data::streaming::DRILLDOWN_LIMIT,
            user_growth_threshold: 10.0,
            premium_growth_threshold: 5.0,
            window_size: [1200.0, 800.0],
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults < config file < command line.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        if let Some(p) = &args.streaming {
            config.streaming_path = p.clone();
        }
        if let Some(p) = &args.campaigns {
            config.campaigns_path = p.clone();
        }
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.artist_limit_min == 0 || self.artist_limit_min > self.artist_limit_max {
            bail!(
                "artist limit range {}..={} is empty",
                self.artist_limit_min,
                self.artist_limit_max
            );
        }
        if !(self.artist_limit_min..=self.artist_limit_max).contains(&self.artist_limit) {
            bail!(
                "artist_limit {} outside {}..={}",
                self.artist_limit,
                self.artist_limit_min,
                self.artist_limit_max
            );
        }
        if self.drilldown_limit == 0 {
            bail!("drilldown_limit must be at least 1");
        }
        for (name, value) in [
            ("user_growth_threshold", self.user_growth_threshold),
            ("premium_growth_threshold", self.premium_growth_threshold),
        ] {
            if !THRESHOLD_RANGE.contains(&value) {
                bail!(
                    "{name} {value} outside {}..={}",
                    THRESHOLD_RANGE.start(),
                    THRESHOLD_RANGE.end()
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let f = write_config(r#"{ "artist_limit": 7, "premium_growth_threshold": 2.5 }"#);
        let c = DashboardConfig::from_file(f.path()).unwrap();
        assert_eq!(c.artist_limit, 7);
        assert_eq!(c.premium_growth_threshold, 2.5);
        assert_eq!(c.streaming_path, PathBuf::from("spotify.csv"));
    }

    #[test]
    fn command_line_overrides_file() {
        let f = write_config(r#"{ "streaming_path": "a.csv", "campaigns_path": "b.csv" }"#);
        let args = Args {
            config: Some(f.path().to_path_buf()),
            streaming: Some(PathBuf::from("override.parquet")),
            campaigns: None,
        };
        let c = DashboardConfig::resolve(&args).unwrap();
        assert_eq!(c.streaming_path, PathBuf::from("override.parquet"));
        assert_eq!(c.campaigns_path, PathBuf::from("b.csv"));
    }

    #[test]
    fn out_of_range_limit_is_rejected() {
        let f = write_config(r#"{ "artist_limit": 50 }"#);
        assert!(DashboardConfig::from_file(f.path()).is_err());
    }

    #[test]
    fn thresholds_and_drilldown_are_range_checked() {
        for body in [
            r#"{ "user_growth_threshold": -1.0 }"#,
            r#"{ "premium_growth_threshold": 30.5 }"#,
            r#"{ "drilldown_limit": 0 }"#,
        ] {
            let f = write_config(body);
            assert!(DashboardConfig::from_file(f.path()).is_err(), "{body}");
        }
        let f = write_config(r#"{ "user_growth_threshold": 30.0, "drilldown_limit": 1 }"#);
        assert!(DashboardConfig::from_file(f.path()).is_ok());
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let c = DashboardConfig {
            premium_growth_threshold: f64::NAN,
            ..DashboardConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let f = write_config("{ not json");
        let err = DashboardConfig::from_file(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }
}
