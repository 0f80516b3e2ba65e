mod host;
mod script;
mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lyt_core::{MULTIPLE_LAYOUTS_NAME, MemoryMode};
use lyt_store::DataDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use crate::script::{Command, parse_line, parse_script};
use crate::session::{Ending, Session};

#[derive(Parser)]
#[command(name = "lyt", about = "Layout lifecycle engine with a simulated activity host")]
struct Cli {
    /// Data directory (defaults to $LYT_DATA_DIR, then ~/.lyt)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List known layouts
    List,

    /// Create a new layout
    New {
        /// Layout name; a counter is appended if it is taken
        name: String,

        /// Activity the layout is assigned to (repeatable)
        #[arg(long = "activity")]
        activities: Vec<String>,

        /// Keep the layout out of the menu
        #[arg(long)]
        hidden: bool,
    },

    /// Show or change persisted settings
    Settings {
        /// Memory mode: single or multiple
        #[arg(long)]
        mode: Option<MemoryMode>,

        /// Show switch and activation notices
        #[arg(long)]
        show_info: Option<bool>,
    },

    /// Run a command script against the engine in virtual time
    Run {
        /// Script file
        script: PathBuf,
    },

    /// Interactive session driven by the wall clock
    Repl,
}

fn open_data(cli: &Cli) -> Result<DataDir> {
    let base_dir = cli.data_dir.clone().or_else(|| {
        std::env::var("LYT_DATA_DIR")
            .ok()
            .map(PathBuf::from)
    });
    DataDir::open(base_dir.as_deref()).context("failed to open data directory")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::List => cmd_list(&cli),
        Commands::New {
            name,
            activities,
            hidden,
        } => cmd_new(&cli, name, activities, *hidden),
        Commands::Settings { mode, show_info } => cmd_settings(&cli, *mode, *show_info),
        Commands::Run { script } => cmd_run(&cli, script),
        Commands::Repl => cmd_repl(&cli).await,
    }
}

fn cmd_list(cli: &Cli) -> Result<()> {
    let data = open_data(cli)?;
    let settings = data.bootstrap()?;
    let current = &settings.engine.current_layout;

    for (path, definition) in data.layouts().list()? {
        match definition {
            Ok(d) if d.name == MULTIPLE_LAYOUTS_NAME => {}
            Ok(d) => {
                let marker = if &d.name == current { "*" } else { " " };
                let activities = if d.activities.is_empty() {
                    "-".to_string()
                } else {
                    d.activities.join(",")
                };
                let hidden = if d.show_in_menu { "" } else { "  (hidden)" };
                let shared = d
                    .shared_layout
                    .map(|s| format!("  shared: {s}"))
                    .unwrap_or_default();
                println!("{marker} {:<20} activities: {activities}{shared}{hidden}", d.name);
            }
            Err(e) => println!("! {}: {e}", path.display()),
        }
    }
    Ok(())
}

fn cmd_new(cli: &Cli, name: &str, activities: &[String], hidden: bool) -> Result<()> {
    let data = open_data(cli)?;
    data.bootstrap()?;
    let created = data
        .layouts()
        .create_layout(name, activities, !hidden)
        .with_context(|| format!("failed to create layout '{name}'"))?;
    println!("created layout '{created}'");
    Ok(())
}

fn cmd_settings(cli: &Cli, mode: Option<MemoryMode>, show_info: Option<bool>) -> Result<()> {
    let data = open_data(cli)?;
    let mut settings = data.bootstrap()?;

    if mode.is_some() || show_info.is_some() {
        if let Some(mode) = mode {
            settings.engine.memory_mode = mode;
        }
        if let Some(show) = show_info {
            settings.engine.show_info_window = show;
        }
        data.save_settings(&settings)?;
    }

    let e = &settings.engine;
    println!("memory_mode:              {}", e.memory_mode);
    println!("current_layout:           {}", e.current_layout);
    println!("last_non_assigned_layout: {}", e.last_non_assigned_layout);
    println!("show_info_window:         {}", e.show_info_window);
    println!("version:                  {}", settings.version);
    Ok(())
}

fn cmd_run(cli: &Cli, script: &Path) -> Result<()> {
    let content = std::fs::read_to_string(script)
        .with_context(|| format!("failed to read {}", script.display()))?;
    let commands = parse_script(&content)?;

    let mut session = Session::open(open_data(cli)?)?;
    let mut ending = Ending::Clean;

    for command in commands {
        let crash = command == Command::Crash;
        for line in session.execute(command)? {
            println!("{line}");
        }
        if crash {
            ending = Ending::Crashed;
            break;
        }
    }

    for line in session.shutdown(ending)? {
        println!("{line}");
    }
    Ok(())
}

async fn cmd_repl(cli: &Cli) -> Result<()> {
    let mut session = Session::open(open_data(cli)?)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let started = Instant::now();
    // virtual time added by `wait`
    let mut skipped_ms: u64 = 0;
    let mut ending = Ending::Clean;

    let clock = |skipped: u64| started.elapsed().as_millis() as u64 + skipped;

    loop {
        let sleep_for = session
            .next_deadline()
            .map(|d| d.saturating_sub(clock(skipped_ms)));

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let mut out = Vec::new();
                session.advance_to(clock(skipped_ms), &mut out);

                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Wait(ms))) => {
                        skipped_ms += ms;
                        session.advance_to(clock(skipped_ms), &mut out);
                    }
                    Ok(Some(command)) => {
                        let crash = command == Command::Crash;
                        match session.execute(command) {
                            Ok(lines) => out.extend(lines),
                            Err(e) => out.push(format!("error: {e:#}")),
                        }
                        if crash {
                            ending = Ending::Crashed;
                        }
                    }
                    Err(e) => out.push(format!("error: {e:#}")),
                }

                for line in out {
                    println!("{line}");
                }
                if ending == Ending::Crashed {
                    break;
                }
            }
            _ = tokio::time::sleep(Duration::from_millis(sleep_for.unwrap_or(0))), if sleep_for.is_some() => {
                let mut out = Vec::new();
                session.advance_to(clock(skipped_ms), &mut out);
                for line in out {
                    println!("{line}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    for line in session.shutdown(ending)? {
        println!("{line}");
    }
    Ok(())
}
