//! smart-todo CLI: natural-language task manager.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use smart_todo::assistant::{Assistant, BoardView, Outcome};
use smart_todo::board::SummaryResult;
use smart_todo::config::{Backend, Overrides, TodoConfig};
use smart_todo::nlp::{Intent, IntentClassifier, RuleIntentClassifier, categorize, parse_command};
use smart_todo::notify::{JsonNotifier, Notifier, StdoutNotifier};
use smart_todo::paths::TodoPaths;
use smart_todo::store::open_store;
use smart_todo::task::Task;

#[derive(Parser)]
#[command(name = "todo", version, about = "Natural-language task manager")]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/smart-todo/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Task service base URL; selects the HTTP backend.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session id sent as X-Session-Id.
    #[arg(long, global = true)]
    session: Option<String>,

    /// Task store backend.
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    /// Emit notices and outcomes as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Memory,
    Http,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Memory => Backend::Memory,
            BackendArg::Http => Backend::Http,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run one line of input: add a task or execute a command.
    ///
    /// The memory backend starts empty on every run; use `--api-url` or
    /// `repl` to keep tasks around.
    Say {
        /// The text, e.g. `call mom at 6pm` or `show work today`.
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Interactive session. `:clear` drops the filter, `:dismiss` hides the
    /// summary, `:quit` exits.
    Repl,

    /// Show how a line would be interpreted, without touching the store.
    Inspect {
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Inspect or create the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => TodoPaths::resolve()?.config_file(),
    };
    let mut config = TodoConfig::load_or_default(&config_path)?;
    config.apply_env(|key| std::env::var(key).ok());
    config.apply_overrides(&Overrides {
        backend: cli.backend.map(Backend::from),
        api_url: cli.api_url.clone(),
        session_id: cli.session.clone(),
    });

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    match cli.command {
        Commands::Say { text } => {
            if !config.backend.is_persistent() {
                tracing::warn!("memory backend: tasks are not kept after this command");
            }
            let mut assistant = build_assistant(&config, cli.json)?;
            let now = now();
            // Load the board first so filters and counts reflect the store.
            assistant.refresh(now)?;
            let outcome = assistant.submit(&text.join(" "), now)?;
            render(&assistant, &outcome, cli.json)?;
        }

        Commands::Repl => {
            let mut assistant = build_assistant(&config, cli.json)?;
            assistant.refresh(now())?;
            repl(&mut assistant, cli.json)?;
        }

        Commands::Inspect { text } => {
            let text = text.join(" ");
            let now = now();
            let report = match RuleIntentClassifier.classify(&text) {
                Intent::Command => serde_json::json!({
                    "intent": Intent::Command,
                    "command": parse_command(&text),
                }),
                Intent::Add => {
                    let cat = categorize(&text);
                    serde_json::json!({
                        "intent": Intent::Add,
                        "categorization": &cat,
                        "due_resolved": cat.due.map(|d| d.resolve(now).to_string()),
                    })
                }
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&report).into_diagnostic()?
            );
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("# {}", config_path.display());
                print!("{}", toml::to_string_pretty(&config).into_diagnostic()?);
            }
            ConfigAction::Init { force } => {
                TodoConfig::init(&config_path, force)?;
                println!("Wrote default config to {}", config_path.display());
            }
        },
    }

    Ok(())
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn build_assistant(config: &TodoConfig, json: bool) -> Result<Assistant> {
    let store = open_store(config)?;
    let notifier: Arc<dyn Notifier> = if json {
        Arc::new(JsonNotifier)
    } else {
        Arc::new(StdoutNotifier)
    };
    Ok(Assistant::new(store)
        .with_notifier(notifier)
        .with_immediate_hours(config.immediate_hours))
}

fn repl(assistant: &mut Assistant, json: bool) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("> ");
        stdout.flush().into_diagnostic()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
            break;
        }
        let now = now();
        let result = match line.trim() {
            ":quit" | ":q" | "exit" => break,
            ":clear" => assistant.clear_filter(now).map(|()| None),
            ":dismiss" => {
                assistant.dismiss_summary();
                Ok(None)
            }
            input => assistant.submit(input, now).map(Some),
        };
        match result {
            Ok(Some(outcome)) => render(assistant, &outcome, json)?,
            Ok(None) => render_board(assistant.view()),
            // Keep the session alive; the board is unchanged.
            Err(e) => tracing::warn!(error = %e, "input failed"),
        }
    }
    Ok(())
}

fn render(assistant: &Assistant, outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome).into_diagnostic()?);
        return Ok(());
    }
    match outcome {
        Outcome::Summarized { summary } => render_summary(summary),
        Outcome::Ignored => {}
        _ => render_board(assistant.view()),
    }
    Ok(())
}

fn render_board(view: &BoardView) {
    if view.filtered {
        println!("(filtered; `:clear` to show everything)");
    }
    if view.projection.is_empty() {
        println!("  no tasks");
        return;
    }
    for group in &view.projection.categories {
        println!("{}", group.name);
        for task in &group.tasks {
            println!("  {}", task_line(task));
        }
    }
    if !view.projection.isolated.is_empty() {
        println!("--");
        for task in &view.projection.isolated {
            println!("  {}", task_line(task));
        }
    }
}

fn task_line(task: &Task) -> String {
    let mark = if task.is_open() { "[ ]" } else { "[x]" };
    let due = task
        .due
        .map(|d| format!("  due {}", d.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();
    format!("{mark} #{} {} ({}){due}", task.id, task.text, task.priority)
}

fn render_summary(summary: &SummaryResult) {
    println!("{}", summary.headline);
    println!();
    println!("{}", summary.markdown);
    println!();
    println!("{}", summary.narrative);
}
