//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use lodestone_events::{
    absolute_lodestone_url, event_type_from_page, find_event_link, parse_event_timeframe,
};
use lodestone_markdown::LodestoneConverter;
use lodestone_shared::{AppConfig, ConverterConfig, init_config, load_config, load_config_from};
use lodestone_timestamps::{extract_live_letter_timestamp, extract_maintenance_timestamps};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Lodestone: turn Lodestone announcements into Discord messages.
#[derive(Parser)]
#[command(
    name = "lodestone",
    version,
    about = "Convert Lodestone announcement HTML into Discord Markdown and components.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.lodestone/lodestone.toml.
    #[arg(long, global = true, env = "LODESTONE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert announcement HTML to Discord Markdown.
    Convert {
        /// HTML file to read (stdin when omitted or "-").
        input: Option<PathBuf>,

        /// Article URL for the "continue reading" link on truncated output.
        #[arg(short, long)]
        link: Option<String>,
    },

    /// Split announcement HTML into Components v2 JSON.
    Components {
        /// HTML file to read (stdin when omitted or "-").
        input: Option<PathBuf>,

        /// Article URL for truncated text blocks.
        #[arg(short, long)]
        link: Option<String>,
    },

    /// Print the maintenance window found in announcement HTML.
    Maintenance {
        /// HTML file to read (stdin when omitted or "-").
        input: Option<PathBuf>,

        /// Report epoch milliseconds instead of seconds.
        #[arg(long)]
        millis: bool,
    },

    /// Print the broadcast start of a Live Letter announcement, in epoch milliseconds.
    LiveLetter {
        /// HTML file to read (stdin when omitted or "-").
        input: Option<PathBuf>,
    },

    /// Add Markdown fields to parsed Lodestone JSON.
    Fields {
        /// JSON file to read (stdin when omitted or "-").
        input: Option<PathBuf>,
    },

    /// Event link and schedule helpers.
    Event {
        /// Event subcommand.
        #[command(subcommand)]
        action: EventAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Event subcommands.
#[derive(Subcommand)]
pub(crate) enum EventAction {
    /// Print the event link of a topic description.
    Link {
        /// Topic description HTML (stdin when omitted or "-").
        input: Option<PathBuf>,
    },
    /// Classify a fetched event page and print its schedule as JSON.
    Page {
        /// Event page HTML (stdin when omitted or "-").
        input: Option<PathBuf>,

        /// URL the page was served from, after redirects.
        #[arg(long)]
        url: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "lodestone=info",
        1 => "lodestone=debug",
        _ => "lodestone=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Convert { input, link } => {
            cmd_convert(config_path, input.as_deref(), link.as_deref())
        }
        Command::Components { input, link } => {
            cmd_components(config_path, input.as_deref(), link.as_deref())
        }
        Command::Maintenance { input, millis } => cmd_maintenance(input.as_deref(), millis),
        Command::LiveLetter { input } => cmd_live_letter(config_path, input.as_deref()),
        Command::Fields { input } => cmd_fields(config_path, input.as_deref()),
        Command::Event { action } => match action {
            EventAction::Link { input } => cmd_event_link(config_path, input.as_deref()),
            EventAction::Page { input, url } => cmd_event_page(input.as_deref(), &url),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn converter(path: Option<&Path>) -> Result<LodestoneConverter> {
    let config = resolve_config(path)?;
    Ok(LodestoneConverter::new(ConverterConfig::from(&config)))
}

/// Read the whole input from a file, or stdin for `None` and `-`.
fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .wrap_err("failed to read stdin")?;
            Ok(buf)
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_convert(config: Option<&Path>, input: Option<&Path>, link: Option<&str>) -> Result<()> {
    let converter = converter(config)?;
    let html = read_input(input)?;
    let markdown = converter.convert(&html, link);
    info!(chars = markdown.chars().count(), "converted");
    println!("{markdown}");
    Ok(())
}

fn cmd_components(config: Option<&Path>, input: Option<&Path>, link: Option<&str>) -> Result<()> {
    let converter = converter(config)?;
    let html = read_input(input)?;
    let message = converter.parse_to_components(&html, link);
    info!(components = message.components.len(), "split into components");
    println!("{}", serde_json::to_string_pretty(&message)?);
    Ok(())
}

fn cmd_maintenance(input: Option<&Path>, millis: bool) -> Result<()> {
    let html = read_input(input)?;
    let mut window = extract_maintenance_timestamps(&html);
    if window.is_empty() {
        info!("no maintenance window found");
    }
    if millis {
        window = window.in_millis();
    }
    println!("{}", serde_json::to_string_pretty(&window)?);
    Ok(())
}

fn cmd_live_letter(config: Option<&Path>, input: Option<&Path>) -> Result<()> {
    let converter = converter(config)?;
    let html = read_input(input)?;
    let markdown = converter.convert(&html, None);
    let start = extract_live_letter_timestamp(&markdown);
    if start.is_none() {
        info!("no live letter start time found");
    }
    println!("{}", serde_json::to_string(&start)?);
    Ok(())
}

fn cmd_fields(config: Option<&Path>, input: Option<&Path>) -> Result<()> {
    let converter = converter(config)?;
    let raw = read_input(input)?;
    let data: serde_json::Value = serde_json::from_str(&raw).wrap_err("input is not valid JSON")?;
    let enriched = converter.add_markdown_fields(data);
    println!("{}", serde_json::to_string_pretty(&enriched)?);
    Ok(())
}

fn cmd_event_link(config: Option<&Path>, input: Option<&Path>) -> Result<()> {
    let converter = converter(config)?;
    let html = read_input(input)?;
    let markdown = converter.convert(&html, None);
    let link = find_event_link(&html, &markdown).ok_or_else(|| eyre!("no event link found"))?;
    debug!(%link, "event link found");
    println!("{}", absolute_lodestone_url(&link, &converter.config().site_origin)?);
    Ok(())
}

fn cmd_event_page(input: Option<&Path>, url: &str) -> Result<()> {
    let html = read_input(input)?;
    let page = event_type_from_page(&html, url).ok_or_else(|| eyre!("{url} is not an event page"))?;
    let timeframe = parse_event_timeframe(&html, page.event_type);
    if timeframe.is_none() {
        info!(url = %page.url, "event schedule not found");
    }
    let out = serde_json::json!({
        "url": page.url,
        "type": page.event_type,
        "timeframe": timeframe,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
