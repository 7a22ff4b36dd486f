//! linkprice CLI - dedicated-link pricing dashboard in the terminal

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use linkprice::{DeleteFilter, GroupKey, RecordFilter};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "linkprice")]
#[command(version)]
#[command(about = "Dedicated-link pricing dashboard - import, filter, summarize and prune price records")]
#[command(long_about = r#"
linkprice keeps dedicated-link price quotes in a local SQLite table:
  • CSV import with header aliases and normalized city/state values
  • Upsert by identifying key (re-importing a file is a no-op)
  • Filtered listings, means and group-by summaries
  • Scoped deletes

Example usage:
  linkprice setup
  linkprice import precos.csv
  linkprice summary --state SP --by speed
  linkprice delete --state RJ --service-type IP
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "linkprice.toml")]
    config: PathBuf,

    /// Path to the database file (overrides the config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Create the database and import the seed file if present
    Setup,

    /// Import a CSV file
    Import {
        /// CSV file with a header row
        file: PathBuf,
    },

    /// List records
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum number of rows to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Mean values and a group-by breakdown
    Summary {
        #[command(flatten)]
        filter: FilterArgs,

        /// Column to group by
        #[arg(long, value_enum, default_value = "state")]
        by: GroupBy,
    },

    /// Distinct values of a column, for filter choices
    Options {
        /// Column name (state_code, city, service_type, physical_medium, speed, ...)
        field: String,
    },

    /// Delete records matching every given filter
    Delete {
        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        service_type: Option<String>,

        /// Exact identifying link
        #[arg(long)]
        link: Option<String>,

        /// Required to delete with no filter at all
        #[arg(long)]
        all: bool,
    },

    /// Show statistics about the stored records
    Stats,
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Keep these state codes (repeatable)
    #[arg(long = "state")]
    states: Vec<String>,

    /// Keep these cities (repeatable)
    #[arg(long = "city")]
    cities: Vec<String>,

    /// Keep these speeds (repeatable)
    #[arg(long = "speed")]
    speeds: Vec<i64>,

    /// Keep these service types (repeatable)
    #[arg(long = "service-type")]
    service_types: Vec<String>,

    /// Keep these physical media (repeatable)
    #[arg(long = "medium")]
    media: Vec<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> RecordFilter {
        let mut filter = RecordFilter::new();
        for v in &self.states {
            filter = filter.state(v);
        }
        for v in &self.cities {
            filter = filter.city(v);
        }
        for v in &self.speeds {
            filter = filter.speed(*v);
        }
        for v in &self.service_types {
            filter = filter.service_type(v);
        }
        for v in &self.media {
            filter = filter.physical_medium(v);
        }
        filter
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GroupBy {
    State,
    City,
    ServiceType,
    Medium,
    Speed,
}

impl From<GroupBy> for GroupKey {
    fn from(by: GroupBy) -> Self {
        match by {
            GroupBy::State => GroupKey::State,
            GroupBy::City => GroupKey::City,
            GroupBy::ServiceType => GroupKey::ServiceType,
            GroupBy::Medium => GroupKey::PhysicalMedium,
            GroupBy::Speed => GroupKey::Speed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

/// Print a `{"ok": true, "command": ..., "data": ...}` envelope in JSON mode
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stderr keeps --json output parseable
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    let ctx = || commands::AppContext::load(&cli.config, cli.database.as_deref());

    match cli.command {
        Commands::Init { force } => commands::run_init(&cli.config, force, output_mode),
        Commands::Setup => commands::run_setup(&ctx()?, output_mode),
        Commands::Import { file } => commands::run_import(&ctx()?, &file, output_mode),
        Commands::List { filter, limit } => commands::run_list(&ctx()?, &filter.to_filter(), limit, output_mode),
        Commands::Summary { filter, by } => {
            commands::run_summary(&ctx()?, &filter.to_filter(), by.into(), output_mode)
        }
        Commands::Options { field } => commands::run_options(&ctx()?, &field, output_mode),
        Commands::Delete { state, city, service_type, link, all } => {
            let filter = DeleteFilter {
                state_code: state,
                city,
                service_type,
                link,
                confirm_all: all,
            };
            commands::run_delete(&ctx()?, &filter, output_mode)
        }
        Commands::Stats => commands::run_stats(&ctx()?, output_mode),
    }
}
