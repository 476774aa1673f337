//! Command-line arguments and layered studio configuration.
//!
//! Values come from built-in defaults, then an optional JSON file, then
//! command-line flags and their environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::{StudioError, StudioResult};

/// VibesCard Studio command-line interface.
#[derive(Parser, Debug)]
#[command(name = "vibescard")]
#[command(about = "Render, export and publish VibesCard designs")]
#[command(version)]
pub struct CliArgs {
    /// JSON configuration file
    #[arg(long, global = true, env = "VIBESCARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Persistence API base URL (e.g., <http://localhost:8000>)
    #[arg(long, global = true, env = "VIBESCARD_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the persistence API
    #[arg(long, global = true, env = "VIBESCARD_TOKEN")]
    pub token: Option<String>,

    /// Directory that local image paths resolve against
    #[arg(long, global = true, env = "VIBESCARD_ASSET_ROOT")]
    pub asset_root: Option<PathBuf>,

    /// Directory exported files are written to
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Design inputs shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct DesignInputs {
    /// Template JSON to start from (defaults to the blank template)
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Event details JSON (title, message, date, location, hostName)
    #[arg(long)]
    pub details: Option<PathBuf>,
}

/// Subcommands of the `vibescard` binary.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render a design and write it as a PNG
    Export {
        /// Template and event details
        #[command(flatten)]
        inputs: DesignInputs,
    },
    /// Render a design and publish it as a new community design
    Publish {
        /// Template and event details
        #[command(flatten)]
        inputs: DesignInputs,
        /// Published title
        #[arg(long)]
        title: Option<String>,
        /// Published sub-title
        #[arg(long)]
        sub_title: Option<String>,
        /// Comma-separated hashtags
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Update an existing community design without re-rendering its image
    Update {
        /// Existing community design JSON
        #[arg(long)]
        design: PathBuf,
        /// Event details JSON
        #[arg(long)]
        details: Option<PathBuf>,
        /// Comma-separated hashtags replacing the stored ones
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Write the design as a portable JSON export
    Json {
        /// Template and event details
        #[command(flatten)]
        inputs: DesignInputs,
    },
}

/// Studio configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Persistence API base URL.
    pub api_base_url: String,
    /// Bearer token for the persistence API.
    pub auth_token: Option<String>,
    /// Directory local image paths resolve against.
    pub asset_root: PathBuf,
    /// Directory exported files are written to.
    pub output_dir: PathBuf,
    /// Per-attempt image load timeout in milliseconds.
    pub image_timeout_ms: u64,
    /// Delay between embedding images and rasterizing, in milliseconds.
    pub settle_delay_ms: u64,
    /// Export raster pixel ratio.
    pub pixel_ratio: f32,
    /// Undo history depth.
    pub history_capacity: usize,
    /// Category id sent with new designs.
    pub categories_id: i64,
    /// Tab a published design is mapped to.
    pub tabs_id: i64,
    /// Default `image_type` of new designs.
    pub image_type: String,
    /// Default `image_sell_type` of new designs.
    pub image_sell_type: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StudioConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            auth_token: None,
            asset_root: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            image_timeout_ms: 10_000,
            settle_delay_ms: 500,
            pixel_ratio: 2.0,
            history_capacity: card_core::history::DEFAULT_HISTORY_CAPACITY,
            categories_id: 1,
            tabs_id: 2,
            image_type: "Beginner".to_string(),
            image_sell_type: "free".to_string(),
        }
    }

    /// Read a JSON configuration file. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> StudioResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StudioError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| StudioError::Config(format!("{}: {e}", path.display())))
    }

    /// Build the effective configuration for `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn load(args: &CliArgs) -> StudioResult<Self> {
        let mut config = match &args.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::new(),
        };
        config.apply_overrides(args);
        Ok(config)
    }

    /// Let flags and environment variables win over file values.
    pub fn apply_overrides(&mut self, args: &CliArgs) {
        if let Some(url) = &args.api_url {
            self.api_base_url.clone_from(url);
        }
        if let Some(token) = &args.token {
            self.auth_token = Some(token.clone());
        }
        if let Some(root) = &args.asset_root {
            self.asset_root.clone_from(root);
        }
        if let Some(dir) = &args.output_dir {
            self.output_dir.clone_from(dir);
        }
    }

    /// Per-attempt image load timeout.
    #[must_use]
    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    /// Delay between embedding images and rasterizing.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
