use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use prio::commands::list::Filter;
use prio::error::Result;
use prio::model::{Priority, Sequence};
use prio::output::Format;
use prio::store::slot::Theme;

#[derive(Parser)]
#[command(
    name = "prio",
    version,
    about = "Priority-ordered task list for the terminal"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    format: Format,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a .prio/ directory in the current directory
    Init,
    /// Add a new pending task
    Add {
        /// Task text
        text: String,
        /// Task priority
        #[arg(long, short, value_enum, default_value = "medium", ignore_case = true)]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_due_date)]
        due: Option<NaiveDate>,
    },
    /// Mark a pending task as completed
    Complete {
        /// Position in the pending list, as shown by `list`
        position: usize,
    },
    /// Move a completed task back to the pending list
    Restore {
        /// Position in the completed list, as shown by `list`
        position: usize,
    },
    /// Remove a task
    Remove {
        /// Position in the targeted list
        position: usize,
        /// Target the completed list instead of the pending list
        #[arg(long)]
        completed: bool,
    },
    /// Edit a task's text or due date
    Edit {
        /// Position in the targeted list
        position: usize,
        /// Target the completed list instead of the pending list
        #[arg(long)]
        completed: bool,
        /// New task text
        #[arg(long)]
        text: Option<String>,
        /// New due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_due_date, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        /// Drop the due date
        #[arg(long)]
        clear_due: bool,
    },
    /// Drag a task to a new position (it snaps back into sorted order)
    Move {
        /// Position in the source list
        position: usize,
        /// Source list
        #[arg(long, value_enum, default_value = "pending")]
        from: Sequence,
        /// Target list (defaults to the source list)
        #[arg(long, value_enum)]
        to: Option<Sequence>,
        /// Insert before this position in the target list (appends when omitted)
        #[arg(long)]
        before: Option<usize>,
    },
    /// List tasks
    List {
        /// Which lists to show
        #[arg(long, value_enum, default_value = "all")]
        filter: Filter,
    },
    /// Remove every completed task
    Clear,
    /// Show the completion counter
    Stats,
    /// Show or set the color theme
    Theme {
        #[arg(value_enum)]
        set: Option<Theme>,
    },
    /// Open the interactive interface
    Tui,
}

fn parse_due_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    raw.parse()
        .map_err(|_| format!("invalid due date '{raw}' (expected YYYY-MM-DD)"))
}

fn run(cli: Cli, format: Format) -> Result<()> {
    if let Commands::Init = cli.command {
        let cwd = std::env::current_dir()?;
        return prio::commands::init::run(&cwd, format);
    }

    let root = prio::session::find_root()?;
    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Add {
            text,
            priority,
            due,
        } => prio::commands::add::run(&root, text, priority, due, format),
        Commands::Complete { position } => {
            prio::commands::lifecycle::complete(&root, position, format)
        }
        Commands::Restore { position } => prio::commands::lifecycle::restore(&root, position, format),
        Commands::Remove {
            position,
            completed,
        } => prio::commands::remove::run(&root, position, sequence_for(completed), format),
        Commands::Edit {
            position,
            completed,
            text,
            due,
            clear_due,
        } => prio::commands::edit::run(
            &root,
            position,
            sequence_for(completed),
            text,
            due,
            clear_due,
            format,
        ),
        Commands::Move {
            position,
            from,
            to,
            before,
        } => prio::commands::reorder::run(&root, position, from, to.unwrap_or(from), before, format),
        Commands::List { filter } => prio::commands::list::run(&root, filter, format),
        Commands::Clear => prio::commands::clear::run(&root, format),
        Commands::Stats => prio::commands::stats::run(&root, format),
        Commands::Theme { set } => prio::commands::theme::run(&root, set, format),
        Commands::Tui => prio::commands::tui::run(&root),
    }
}

fn sequence_for(completed: bool) -> Sequence {
    if completed {
        Sequence::Completed
    } else {
        Sequence::Pending
    }
}

fn main() {
    let cli = Cli::parse();
    let format = cli.format;
    if let Err(e) = run(cli, format) {
        match format {
            Format::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "error": e.code(),
                        "message": e.to_string()
                    })
                );
            }
            _ => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}
