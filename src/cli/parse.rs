//! CLI parse: clap types for mealplan. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mealplan CLI - personalized daily meal planning
#[derive(Parser)]
#[command(name = "mealplan")]
#[command(about = "Plan meals through constrained generation and a tiered cache")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (config/ is read from here)
    #[arg(long, default_value = ".", global = true)]
    pub workspace: PathBuf,

    /// Configuration file layered above the workspace files
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false", global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (used when --log-output is file)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print canonical preferences and their hash
    HashPrefs {
        /// Preference snapshot (.toml or .json)
        #[arg(long)]
        prefs: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Plan the meals of one day in parallel
    PlanDay {
        #[arg(long)]
        user: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Comma-separated meal types (default: batch.default_meal_types)
        #[arg(long)]
        meals: Option<String>,
        #[arg(long)]
        prefs: PathBuf,
        /// Comma-separated pantry items
        #[arg(long, value_delimiter = ',')]
        pantry: Vec<String>,
        /// Comma-separated ingredients to avoid
        #[arg(long, value_delimiter = ',')]
        avoid: Vec<String>,
        /// Upper bound for waiting on all meals, in seconds
        #[arg(long, default_value = "300")]
        wait_secs: u64,
    },
    /// Generate a whole week and track it as a batch
    PlanWeek {
        #[arg(long)]
        user: String,
        /// Any date in the week (normalized to Monday)
        #[arg(long)]
        week: String,
        #[arg(long)]
        prefs: PathBuf,
        #[arg(long)]
        meals: Option<String>,
        #[arg(long, value_delimiter = ',')]
        pantry: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        avoid: Vec<String>,
    },
    /// Show a week batch status
    Status {
        #[arg(long)]
        user: String,
        #[arg(long)]
        week: String,
        /// Poll until the batch is completed or failed
        #[arg(long)]
        watch: bool,
        /// Give up watching after this many seconds
        #[arg(long, default_value = "600")]
        timeout_secs: u64,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Aggregate ingredients of a completed week
    ShoppingList {
        #[arg(long)]
        user: String,
        #[arg(long)]
        week: String,
        #[arg(long)]
        meals: Option<String>,
        /// Items already at home (flagged in the list)
        #[arg(long, value_delimiter = ',')]
        pantry: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
