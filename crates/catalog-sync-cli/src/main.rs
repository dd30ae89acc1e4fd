use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::context::AppContext;
use commands::virtual_list::VirtualAction;
use commands::{config, daemon, lists, lookup, virtual_list, watching};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "catalogsync")]
#[command(about = "Sync, enrich and serve media catalogs from Trakt and TMDB")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one page of a list and enrich its items
    Sync {
        /// List id from the registry (e.g. trakt_trending_movies)
        list: String,

        /// Page to fetch; page 1 resets the list ordering
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Re-sync the first page of one list, or of every enabled list
    Refresh {
        /// List id (omit with --all)
        #[arg(required_unless_present = "all")]
        list: Option<String>,

        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "list")]
        all: bool,
    },
    /// Print the stored items of a list in rank order
    Show {
        list: String,

        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Build the continue-watching feed from Trakt playback and history
    ContinueWatching {
        /// Print the stored feed without contacting Trakt
        #[arg(long, action = ArgAction::SetTrue)]
        cached: bool,
    },
    /// Derived lists attached to an item view
    Virtual {
        #[command(subcommand)]
        cmd: VirtualCommands,
    },
    /// Fetch community ratings for a title
    Ratings {
        /// movie or show
        kind: String,
        trakt_id: u64,
    },
    /// Search titles and people across Trakt and TMDB
    Search { query: String },
    /// Run as daemon with internal scheduler
    #[command(long_about = "Periodically refresh every enabled list and sweep expired virtual lists according to the configured cron schedule. An initial refresh runs on startup unless --no-startup-sync is specified.")]
    Daemon {
        /// Cron schedule with seconds (e.g. '0 0 */6 * * *' for every 6 hours)
        #[arg(long, value_name = "SCHEDULE")]
        schedule: Option<String>,

        /// Skip the initial refresh on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,

        /// Log to stderr instead of the rotating daemon log file
        #[arg(long, action = ArgAction::SetTrue)]
        log_stderr: bool,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum VirtualCommands {
    /// Return the cached list, fetching the first page on a miss
    Get {
        /// view type: list, collection, people, similar, recommendations
        view_type: String,
        item_id: String,
        data_url: String,

        /// Display name stored with the view
        #[arg(long)]
        name: Option<String>,

        /// Background image stored with the view
        #[arg(long)]
        background: Option<String>,
    },
    /// Append the next page to a cached list
    More {
        view_type: String,
        item_id: String,
        data_url: String,
    },
    /// Drop a cached list
    Invalidate { view_type: String, item_id: String },
    /// Remove expired lists and their orphaned entries
    Sweep,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

fn run_config(cmd: ConfigCommands, output: &output::Output) -> color_eyre::Result<()> {
    match cmd {
        ConfigCommands::Show { full } => config::run_show(full, output),
        ConfigCommands::Init { force } => config::run_init(force, output),
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match &cli.command {
        Commands::Daemon { log_stderr: false, .. } => {
            let paths = catalog_sync_config::PathManager::default();
            logging::init_file_logging(cli.verbose, cli.quiet, &paths.daemon_log_file())
        }
        _ => logging::init_logging(cli.verbose, cli.quiet),
    }
    .map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        // Config commands must work before a valid config file exists
        Commands::Config { cmd } => run_config(cmd, &output),
        command => {
            let ctx = AppContext::load()?;
            match command {
                Commands::Sync { list, page } => lists::run_sync(&ctx, &list, page, &output).await,
                Commands::Refresh { list, all: _ } => lists::run_refresh(&ctx, list, &output).await,
                Commands::Show { list, limit } => lists::run_show(&ctx, &list, limit, &output).await,
                Commands::ContinueWatching { cached } => {
                    watching::run_continue_watching(&ctx, cached, &output).await
                }
                Commands::Virtual { cmd } => match cmd {
                    VirtualCommands::Get { view_type, item_id, data_url, name, background } => {
                        let action = VirtualAction::Get { data_url, name, background };
                        virtual_list::run_virtual(&ctx, &view_type, &item_id, action, &output).await
                    }
                    VirtualCommands::More { view_type, item_id, data_url } => {
                        let action = VirtualAction::More { data_url };
                        virtual_list::run_virtual(&ctx, &view_type, &item_id, action, &output).await
                    }
                    VirtualCommands::Invalidate { view_type, item_id } => {
                        let action = VirtualAction::Invalidate;
                        virtual_list::run_virtual(&ctx, &view_type, &item_id, action, &output).await
                    }
                    VirtualCommands::Sweep => virtual_list::run_sweep(&ctx, &output).await,
                },
                Commands::Ratings { kind, trakt_id } => {
                    lookup::run_ratings(&ctx, &kind, trakt_id, &output).await
                }
                Commands::Search { query } => lookup::run_search(&ctx, &query, &output).await,
                Commands::Daemon { schedule, no_startup_sync, .. } => {
                    daemon::run_daemon(ctx, schedule, no_startup_sync, &output).await
                }
                Commands::Config { cmd } => run_config(cmd, &output),
            }
        }
    }
}
