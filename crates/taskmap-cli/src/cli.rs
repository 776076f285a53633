use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use taskmap_core::config::CliConfigOverrides;
use taskmap_core::models::{BoundingBox, Priority, TaskStatus};
use taskmap_retrieval::ReviewStatusKey;

/// TaskMap - Map-bounded task retrieval
#[derive(Parser, Debug)]
#[command(name = "taskmap")]
#[command(about = "Plan and run map-bounded task fetches", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show how a viewport would be fetched
    Plan(PlanArgs),

    /// Fetch tasks for a viewport and apply filters
    Browse(BrowseArgs),

    /// Show the effective configuration and where each value comes from
    Config(ConfigArgs),
}

/// Overrides for the coordinator tunables
#[derive(Args, Debug, Default)]
pub struct TuningArgs {
    /// Highest zoom level the map supports
    #[arg(long)]
    pub max_zoom: Option<u8>,

    /// Task count above which markers are replaced by clusters
    #[arg(long)]
    pub uncluster_threshold: Option<usize>,

    /// Widest viewport, in degrees, allowed without a scope
    #[arg(long)]
    pub max_allowed_degrees: Option<f64>,
}

impl From<&TuningArgs> for CliConfigOverrides {
    fn from(args: &TuningArgs) -> Self {
        CliConfigOverrides {
            max_zoom: args.max_zoom,
            uncluster_threshold: args.uncluster_threshold,
            max_allowed_degrees: args.max_allowed_degrees,
            search_debounce_ms: None,
        }
    }
}

#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Viewport as west,south,east,north
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<BoundingBox>,

    /// Map zoom level
    #[arg(long, default_value = "12")]
    pub zoom: u8,

    /// Restrict to one task collection
    #[arg(long)]
    pub scope: Option<u64>,

    /// Task count of the previous result
    #[arg(long, default_value = "0")]
    pub previous_count: u64,

    /// Prefer clusters below the maximum zoom
    #[arg(long)]
    pub prefer_clusters: bool,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Parser, Debug)]
pub struct BrowseArgs {
    /// JSON file holding an array of tasks
    #[arg(long, value_name = "FILE", required_unless_present = "endpoint", conflicts_with = "endpoint")]
    pub tasks: Option<PathBuf>,

    /// Base URL of a task service API
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Viewport as west,south,east,north
    #[arg(long, allow_hyphen_values = true)]
    pub bbox: Option<BoundingBox>,

    /// Map zoom level
    #[arg(long, default_value = "12")]
    pub zoom: u8,

    /// Restrict to one task collection
    #[arg(long)]
    pub scope: Option<u64>,

    /// Free-text search on task names
    #[arg(long)]
    pub search: Option<String>,

    /// Prefer clusters below the maximum zoom
    #[arg(long)]
    pub prefer_clusters: bool,

    /// Only show these task statuses (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<TaskStatus>,

    /// Only show these priorities (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub priority: Vec<Priority>,

    /// Only show these review statuses (comma separated, `not_set` for unreviewed)
    #[arg(long, value_delimiter = ',')]
    pub review_status: Vec<ReviewStatusKey>,

    /// Hide tasks locked by other users
    #[arg(long)]
    pub exclude_locked: bool,

    /// Current user id, whose own locks stay visible
    #[arg(long)]
    pub user: Option<String>,

    /// Write the visible tasks or clusters as GeoJSON
    #[arg(long, value_name = "FILE")]
    pub geojson: Option<PathBuf>,

    /// Maximum rows shown in the table
    #[arg(long, default_value = "20")]
    pub limit: usize,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub tuning: TuningArgs,
}
