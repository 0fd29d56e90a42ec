//! Read-only inventory dashboard.
//!
//! Pipeline per render: resolve settings → build the connection descriptor →
//! fetch (cached) rows → filter → aggregate → render.

pub mod aggregate;
pub mod config;
pub mod connection;
pub mod filter;
pub mod model;
pub mod seed;
pub mod store;
pub mod ui;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, LayeredConfig, OverrideProvider, Settings};
use crate::connection::ConnectionDescriptor;
use crate::filter::{FilterCriteria, Selection, SelectorOptions};
use crate::model::{Price, RecordSet};
use crate::seed::{SeedError, SeedPlan};
use crate::store::{CachedRowSource, Clock, DEFAULT_TTL, DataSourceError, RecordStore, SqliteStore};
use crate::ui::Dashboard;
use crate::ui::render::{describe_criteria, render_dashboard, render_options};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "invdash",
    version,
    about = "Clothes inventory dashboard: filter the Clothes table and summarise it"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Emit machine-readable JSON instead of the text dashboard.
    #[arg(long, global = true, visible_alias = "robot")]
    pub json: bool,

    /// Debug logging on stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable coloured output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Secrets file (TOML) consulted before the environment.
    #[arg(long, global = true, value_name = "PATH")]
    pub secrets: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Per-invocation overrides; these take precedence over secrets and env.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    #[arg(long, global = true, value_name = "NAME")]
    pub driver: Option<String>,
    #[arg(long, global = true, value_name = "HOST")]
    pub server: Option<String>,
    #[arg(long, global = true, value_name = "NAME")]
    pub database: Option<String>,
    #[arg(long, global = true, value_name = "USER")]
    pub uid: Option<String>,
    /// Prefer PWD in the environment or secrets file; argv is visible to other users.
    #[arg(long, global = true, value_name = "PASSWORD")]
    pub pwd: Option<String>,
    #[arg(long, global = true, value_name = "PORT")]
    pub port: Option<String>,
}

impl ConnectionArgs {
    fn into_provider(self) -> OverrideProvider {
        OverrideProvider::new("cli")
            .with(config::KEY_DRIVER, self.driver)
            .with(config::KEY_SERVER, self.server)
            .with(config::KEY_DATABASE, self.database)
            .with(config::KEY_UID, self.uid)
            .with(config::KEY_PWD, self.pwd)
            .with(config::KEY_PORT, self.port)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render the dashboard (default).
    Show(ShowArgs),
    /// List the values available for each filter.
    Options,
    /// Append synthetic rows to the Clothes table (creating it if needed).
    Seed {
        /// Number of rows to insert.
        #[arg(long, default_value_t = seed::DEFAULT_ROWS)]
        rows: usize,
        /// RNG seed; the same seed yields the same rows.
        #[arg(long, default_value_t = seed::DEFAULT_RNG_SEED)]
        seed: u64,
    },
    /// Print the connection descriptor with the password masked.
    Dsn,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Show at most N rows in the detail table.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Seconds a fetched table stays fresh.
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TTL.as_secs())]
    pub cache_ttl: u64,

    /// Re-render every SECS seconds until interrupted.
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,
}

/// Filter selections. Repeat a flag or pass a comma-separated list; omit it
/// to keep every value.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    #[arg(long = "category", value_name = "NAME", value_delimiter = ',')]
    pub categories: Vec<String>,
    #[arg(long = "brand", value_name = "NAME", value_delimiter = ',')]
    pub brands: Vec<String>,
    #[arg(long = "size", value_name = "SIZE", value_delimiter = ',')]
    pub sizes: Vec<String>,
    #[arg(long = "colour", value_name = "NAME", value_delimiter = ',')]
    pub colours: Vec<String>,

    /// Select no categories (empty result).
    #[arg(long, conflicts_with = "categories")]
    pub no_category: bool,
    /// Select no brands (empty result).
    #[arg(long, conflicts_with = "brands")]
    pub no_brand: bool,
    /// Select no sizes (empty result).
    #[arg(long, conflicts_with = "sizes")]
    pub no_size: bool,
    /// Select no colours (empty result).
    #[arg(long, conflicts_with = "colours")]
    pub no_colour: bool,

    /// Lower price bound, inclusive (default: lowest price in the table).
    #[arg(long, value_name = "AMOUNT")]
    pub price_min: Option<Price>,
    /// Upper price bound, inclusive (default: highest price in the table).
    #[arg(long, value_name = "AMOUNT")]
    pub price_max: Option<Price>,
}

impl FilterArgs {
    pub fn to_selection(&self) -> Selection {
        fn pick(values: &[String], none: bool) -> Option<Vec<String>> {
            if none {
                Some(Vec::new())
            } else if values.is_empty() {
                None
            } else {
                Some(values.to_vec())
            }
        }
        Selection {
            categories: pick(&self.categories, self.no_category),
            brands: pick(&self.brands, self.no_brand),
            sizes: pick(&self.sizes, self.no_size),
            colours: pick(&self.colours, self.no_colour),
            price_min: self.price_min,
            price_max: self.price_max,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors at the process boundary
// ---------------------------------------------------------------------------

pub const EXIT_OTHER: i32 = 1;
pub const EXIT_USAGE: i32 = 2;
pub const EXIT_CONFIG: i32 = 3;
pub const EXIT_DATA_SOURCE: i32 = 4;

/// Error envelope returned to `main`.
#[derive(Debug, Clone)]
pub struct CliError {
    pub code: i32,
    pub kind: &'static str,
    pub message: String,
    pub hint: Option<String>,
    pub retryable: bool,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

impl CliError {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code,
                "kind": self.kind,
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
            }
        })
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Missing(keys) => Some(format!(
                "set {} in the environment, a .env file, or the secrets file",
                keys.join(", ")
            )),
            ConfigError::InvalidPort(_) => Some("DB_PORT must be 1-65535".to_string()),
            _ => None,
        };
        Self {
            code: EXIT_CONFIG,
            kind: "config",
            message: err.to_string(),
            hint,
            retryable: false,
        }
    }
}

impl From<DataSourceError> for CliError {
    fn from(err: DataSourceError) -> Self {
        let (hint, retryable) = match &err {
            DataSourceError::UnsupportedDriver(_) => (
                Some("set DRIVER=SQLite3 and DATABASE to the database file path".to_string()),
                false,
            ),
            DataSourceError::Decode { .. } => (None, false),
            DataSourceError::Connect { .. } | DataSourceError::Query(_) => (
                Some("check SERVER/DATABASE and that the Clothes table exists (try `invdash seed`)".to_string()),
                true,
            ),
        };
        Self {
            code: EXIT_DATA_SOURCE,
            kind: "data_source",
            message: err.to_string(),
            hint,
            retryable,
        }
    }
}

impl From<SeedError> for CliError {
    fn from(err: SeedError) -> Self {
        match err {
            SeedError::Store(e) => e.into(),
            other => Self {
                code: EXIT_DATA_SOURCE,
                kind: "seed",
                message: other.to_string(),
                hint: None,
                retryable: true,
            },
        }
    }
}

fn io_error(err: std::io::Error) -> CliError {
    CliError {
        code: EXIT_OTHER,
        kind: "io",
        message: err.to_string(),
        hint: None,
        retryable: false,
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parsed command line.
#[derive(Debug)]
pub struct ParsedCli {
    pub cli: Cli,
}

/// Parse argv. `--help`/`--version` print and exit here.
pub fn parse_cli(raw_args: Vec<String>) -> Result<ParsedCli, CliError> {
    match Cli::try_parse_from(raw_args) {
        Ok(cli) => Ok(ParsedCli { cli }),
        Err(err) => {
            use clap::error::ErrorKind;
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            Err(CliError {
                code: EXIT_USAGE,
                kind: "usage",
                message: err.render().to_string(),
                hint: Some("run `invdash --help` for usage".to_string()),
                retryable: false,
            })
        }
    }
}

fn init_tracing(verbose: bool, ansi: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .try_init();
}

/// Resolve settings through the standard layer stack.
pub fn resolve_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    let overrides = cli.connection.clone().into_provider();
    LayeredConfig::standard(overrides, cli.secrets.clone())?.resolve()
}

fn loading<T>(show: bool, f: impl FnOnce() -> T) -> T {
    if !show {
        return f();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Loading data …");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    out
}

pub fn run_with_parsed(parsed: ParsedCli) -> Result<(), CliError> {
    let cli = parsed.cli;
    let color = !cli.no_color && !cli.json && std::io::stdout().is_terminal();
    colored::control::set_override(color);
    init_tracing(cli.verbose, !cli.no_color && std::io::stderr().is_terminal());

    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Commands::Show(ShowArgs::default_with_ttl()));

    let settings = resolve_settings(&cli)?;
    let descriptor = ConnectionDescriptor::from_settings(&settings)?;
    tracing::debug!(descriptor = %descriptor.redacted(), "connection descriptor");

    match command {
        Commands::Dsn => {
            if cli.json {
                println!("{}", serde_json::json!({ "descriptor": descriptor.redacted() }));
            } else {
                println!("{}", descriptor.redacted());
            }
            Ok(())
        }
        Commands::Seed { rows, seed } => {
            let mut store = SqliteStore::open_writable(&descriptor)?;
            let inserted = seed::seed(&mut store, &SeedPlan { rows, rng_seed: seed })?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "inserted": inserted, "table": store::TABLE })
                );
            } else {
                println!("✓ Inserted {inserted} rows into {}", store::TABLE);
            }
            Ok(())
        }
        Commands::Options => {
            let source = CachedRowSource::new(SqliteStore::open(&descriptor)?);
            let records = loading(!cli.json, || source.get())?;
            let options = SelectorOptions::from_records(&records);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&options).map_err(json_error)?);
            } else {
                print!("{}", render_options(&options));
            }
            Ok(())
        }
        Commands::Show(args) => {
            let store = SqliteStore::open(&descriptor)?;
            let source =
                CachedRowSource::with_ttl(store, Duration::from_secs(args.cache_ttl));
            match args.watch {
                None => {
                    let records = loading(!cli.json, || source.get())?;
                    show_once(&records, &args, cli.json)
                }
                Some(every) => watch(&source, &args, cli.json, Duration::from_secs(every.max(1))),
            }
        }
    }
}

impl ShowArgs {
    fn default_with_ttl() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL.as_secs(),
            ..Default::default()
        }
    }
}

fn json_error(err: serde_json::Error) -> CliError {
    CliError {
        code: EXIT_OTHER,
        kind: "serialize",
        message: err.to_string(),
        hint: None,
        retryable: false,
    }
}

/// Filter, aggregate and render one frame, newline-terminated.
pub fn render_frame(records: &RecordSet, args: &ShowArgs, json: bool) -> Result<String, CliError> {
    let criteria = FilterCriteria::from_selection(records, &args.filters.to_selection());
    tracing::debug!(filters = %describe_criteria(&criteria), "applying filters");
    let dash = Dashboard::build(records, criteria);
    if json {
        let body = serde_json::to_string_pretty(&dash.to_json(args.limit)).map_err(json_error)?;
        Ok(format!("{body}\n"))
    } else {
        Ok(render_dashboard(&dash, args.limit))
    }
}

pub fn show_once(records: &RecordSet, args: &ShowArgs, json: bool) -> Result<(), CliError> {
    print!("{}", render_frame(records, args, json)?);
    Ok(())
}

/// Result of one `--watch` tick.
#[derive(Debug)]
pub enum WatchFrame {
    Rendered(String),
    /// The refresh failed with a retryable error; the next tick tries again.
    Failed(CliError),
}

/// Fetch through the cache and render. Non-retryable errors end the watch.
pub fn watch_tick<S: RecordStore, C: Clock>(
    source: &CachedRowSource<S, C>,
    args: &ShowArgs,
    json: bool,
) -> Result<WatchFrame, CliError> {
    match source.get() {
        Ok(records) => render_frame(&records, args, json).map(WatchFrame::Rendered),
        Err(err) => {
            let err = CliError::from(err);
            if err.retryable {
                Ok(WatchFrame::Failed(err))
            } else {
                Err(err)
            }
        }
    }
}

/// Re-render on a fixed interval. Rows come from the cache until its TTL
/// lapses; a failed refresh is reported and retried on the next tick.
fn watch<S: RecordStore, C: Clock>(
    source: &CachedRowSource<S, C>,
    args: &ShowArgs,
    json: bool,
    every: Duration,
) -> Result<(), CliError> {
    tracing::debug!(
        every_secs = every.as_secs(),
        ttl_secs = source.ttl().as_secs(),
        "watching inventory"
    );
    let term = console::Term::stdout();
    loop {
        match watch_tick(source, args, json)? {
            WatchFrame::Rendered(frame) => {
                if !json {
                    term.clear_screen().map_err(io_error)?;
                }
                print!("{frame}");
            }
            WatchFrame::Failed(err) => eprintln!("refresh failed, retrying: {err}"),
        }
        std::thread::sleep(every);
    }
}
