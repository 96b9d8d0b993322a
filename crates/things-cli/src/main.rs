#![forbid(unsafe_code)]

mod cmd;
mod output;
mod render;

use clap::{CommandFactory, Parser, Subcommand};
use cmd::view::{ListArgs, View};
use output::{CliError, OutputMode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use things_core::config::{self, Config};
use things_core::{Database, ErrorCode};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DATE_FILTER_HELP: &str = "DATE FILTERS:\n    set | unset         a date is / is not present\n    future | past       after today / today or earlier\n    YYYY-MM-DD          exactly that day\n    <D <=D >D >=D       before, on or before, after, on or after D\n\nEXAMPLES:\n    # Open tasks due before July\n    things-query tasks --status incomplete --deadline '<2024-07-01'\n\n    # Projects in an area, as JSON\n    things-query tasks --type project --area 8E3F... --format json\n\n    # Show the SQL a query would run\n    things-query tasks --tag errand --sql";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "things-query: read-only queries over the Things 3 database",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the Things `main.sqlite` (overrides THINGSDB and the config file).
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Views",
        about = "Tasks in Today",
        long_about = "Scheduled Anytime to-dos, Someday to-dos whose start date has arrived, and overdue to-dos, in Today order.",
        after_help = "EXAMPLES:\n    # What is on today\n    things-query today\n\n    # Emit machine-readable output\n    things-query today --format json"
    )]
    Today(ListArgs),

    #[command(
        next_help_heading = "Views",
        about = "Scheduled Someday to-dos, soonest first"
    )]
    Upcoming(ListArgs),

    #[command(next_help_heading = "Views", about = "Open to-dos in Anytime")]
    Anytime(ListArgs),

    #[command(
        next_help_heading = "Views",
        about = "Unscheduled to-dos in Someday"
    )]
    Someday(ListArgs),

    #[command(next_help_heading = "Views", about = "Open to-dos in the Inbox")]
    Inbox(ListArgs),

    #[command(
        next_help_heading = "Views",
        about = "Completed and canceled tasks, newest first",
        after_help = "EXAMPLES:\n    # The ten most recently closed tasks\n    things-query logbook -n 10"
    )]
    Logbook(ListArgs),

    #[command(next_help_heading = "Views", about = "Trashed to-dos")]
    Trash(ListArgs),

    #[command(
        next_help_heading = "Views",
        about = "Completed to-dos, newest first"
    )]
    Completed(ListArgs),

    #[command(next_help_heading = "Views", about = "Canceled to-dos, newest first")]
    Canceled(ListArgs),

    #[command(
        next_help_heading = "Views",
        about = "Open to-dos with a deadline, earliest first"
    )]
    Deadlines(ListArgs),

    #[command(
        next_help_heading = "Views",
        about = "Open to-dos created recently",
        after_help = "EXAMPLES:\n    # Created in the last three days\n    things-query created-within 3d\n\n    # Count what arrived in the last hour\n    things-query created-within 1h --count"
    )]
    CreatedWithin(cmd::view::CreatedWithinArgs),

    #[command(
        next_help_heading = "Views",
        about = "Search open to-dos",
        long_about = "Find open to-dos whose title, notes or area title contain the text.",
        after_help = "EXAMPLES:\n    things-query search plumber"
    )]
    Search(cmd::view::SearchArgs),

    #[command(
        next_help_heading = "Query",
        about = "Query tasks with filters",
        long_about = "Query to-dos, projects and headings with any combination of filters.\nTasks inside trashed projects or headings are hidden unless --include-trashed is given.",
        after_help = DATE_FILTER_HELP
    )]
    Tasks(cmd::tasks::TasksArgs),

    #[command(
        next_help_heading = "Query",
        about = "Show one task",
        long_about = "Show full details and the checklist of a task by uuid.",
        after_help = "EXAMPLES:\n    things-query show 2D1F6A8B-...\n\n    # Emit machine-readable output\n    things-query show 2D1F6A8B-... --format json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(next_help_heading = "Query", about = "List areas")]
    Areas(cmd::areas::AreasArgs),

    #[command(next_help_heading = "Query", about = "List tags")]
    Tags(cmd::tags::TagsArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Print the resolved database path",
        long_about = "Print the database path resolved from --database, THINGSDB, the config file or discovery."
    )]
    DbPath,

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    things-query completions bash\n\n    # Generate zsh completions\n    things-query completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

impl Commands {
    /// The fixed view a command lists, if it is one.
    const fn view(&self) -> Option<(View, &ListArgs)> {
        match self {
            Self::Today(args) => Some((View::Today, args)),
            Self::Upcoming(args) => Some((View::Upcoming, args)),
            Self::Anytime(args) => Some((View::Anytime, args)),
            Self::Someday(args) => Some((View::Someday, args)),
            Self::Inbox(args) => Some((View::Inbox, args)),
            Self::Logbook(args) => Some((View::Logbook, args)),
            Self::Trash(args) => Some((View::Trash, args)),
            Self::Completed(args) => Some((View::Completed, args)),
            Self::Canceled(args) => Some((View::Canceled, args)),
            Self::Deadlines(args) => Some((View::Deadlines, args)),
            _ => None,
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("THINGS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "things_core=debug,things_query=debug,info"
        } else {
            "warn"
        })
    });

    let format = env::var("THINGS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn config_error(err: &anyhow::Error) -> CliError {
    let code = ErrorCode::ConfigParseError;
    CliError {
        message: format!("{err:#}"),
        suggestion: code.hint().map(str::to_string),
        error_code: Some(code.code().to_string()),
    }
}

fn run(cli: &Cli, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Completions(args) => {
            let mut command = Cli::command();
            return cmd::completions::run_completions(args.shell, &mut command);
        }
        Commands::DbPath => {
            return cmd::db_path::run_db_path(cli.database.as_deref(), config, output);
        }
        _ => {}
    }

    let db = Database::discover(cli.database.as_deref(), config)?;
    debug!(path = ?db.path(), "opened database");

    if let Some((view, args)) = cli.command.view() {
        return cmd::view::run_view(view, args, &db, output);
    }
    match &cli.command {
        Commands::CreatedWithin(args) => cmd::view::run_created_within(args, &db, output),
        Commands::Search(args) => cmd::view::run_search(args, &db, output),
        Commands::Tasks(args) => cmd::tasks::run_tasks(args, &db, output),
        Commands::Show(args) => cmd::show::run_show(args, &db, output),
        Commands::Areas(args) => cmd::areas::run_areas(args, &db, output),
        Commands::Tags(args) => cmd::tags::run_tags(args, &db, output),
        _ => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let (config, config_err) = match config::load_config() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    let output = output::resolve_output_mode(cli.format, cli.json, config.output.as_deref());

    let result = match config_err {
        Some(err) => Err(config_error(&err)),
        None => run(&cli, &config, output).map_err(|err| CliError::from(&err)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if let Err(render_err) = output::render_error(output, &error) {
                eprintln!("error: {} ({render_err})", error.message);
            }
            ExitCode::FAILURE
        }
    }
}
