//! `clawmem` – command-line companion for the memory plugin.
//!
//! 1. Loads `~/.clawmem/config.toml`; the interactive shell runs a
//!    **First-Run Wizard** when the file is absent.
//! 2. One-shot subcommands (`status`, `search`, `stats`, `get`, `delete`,
//!    `remember`, `classify`) talk to the worker and exit.
//! 3. Without a subcommand it probes the worker and drops into a REPL.

mod commands;
mod config;
mod repl;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use clawmem_runtime::PluginConfig;
use colored::Colorize;
use tracing::warn;

use commands::Session;

#[derive(Parser)]
#[command(name = "clawmem", version, about = "Persistent memory for conversational agents")]
struct Cli {
    /// Worker URL, overriding the settings file
    #[arg(long, global = true, env = "CLAWMEM_WORKER_URL")]
    worker_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check worker health and show counters
    Status,
    /// Search memories (JSON output)
    Search {
        query: String,
        #[arg(long, default_value_t = clawmem_runtime::tools::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Show memory statistics (JSON output)
    Stats,
    /// Show one memory
    Get { id: i64 },
    /// Delete one memory
    Delete { id: i64 },
    /// Store a memory explicitly
    Remember {
        text: String,
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Show what the capture engine would do with a piece of text
    Classify { text: String },
    /// Interactive shell (default)
    Repl,
}

fn main() -> ExitCode {
    let _telemetry = clawmem_runtime::init_tracing("clawmem");
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {e}", "Failed to start async runtime".red());
            return ExitCode::FAILURE;
        }
    };

    let interactive = matches!(cli.command, None | Some(Command::Repl));
    if interactive {
        print_banner();
    }
    let mut cfg = load_settings(interactive);
    if let Some(url) = cli.worker_url {
        cfg.worker_url = url;
    }
    let session = Session::new(PluginConfig::from(&cfg));

    let result = match cli.command {
        Some(Command::Status) => runtime.block_on(commands::status(&session)),
        Some(Command::Search { query, limit }) => runtime.block_on(commands::search(&session, &query, limit)),
        Some(Command::Stats) => runtime.block_on(commands::stats(&session)),
        Some(Command::Get { id }) => runtime.block_on(commands::get(&session, id)),
        Some(Command::Delete { id }) => runtime.block_on(commands::delete(&session, id)),
        Some(Command::Remember { text, kind }) => {
            runtime.block_on(commands::remember(&session, &text, kind.as_deref()))
        }
        Some(Command::Classify { text }) => {
            commands::classify(&text);
            Ok(())
        }
        None | Some(Command::Repl) => {
            run_interactive(&runtime, session);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "Error".red());
            ExitCode::FAILURE
        }
    }
}

fn load_settings(interactive: bool) -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            if interactive {
                println!("  Config loaded from {}", config::config_path().display().to_string().bold());
            }
            cfg
        }
        Ok(None) if interactive => run_first_run_wizard(),
        Ok(None) => config::defaults_with_env(),
        Err(e) => {
            eprintln!("{}: {e}", "Config error".red());
            eprintln!("  Using default configuration.");
            config::defaults_with_env()
        }
    }
}

fn run_interactive(runtime: &tokio::runtime::Runtime, session: Session) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received, exiting.".yellow().bold());
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }

    print!("\n  Probing worker at {} … ", session.config.worker_url.dimmed());
    std::io::stdout().flush().ok();
    if runtime.block_on(session.client.health()) {
        println!("{}", "online".green());
    } else {
        println!("{}", "offline".yellow());
        println!("  {}", "Memories cannot be searched or stored until the worker is running.".dimmed());
    }

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());
    repl::run(runtime, session, shutdown);
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║       clawmem First-Run Wizard       ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up clawmem.\n");

    let mut cfg = config::Config::default();
    cfg.worker_url = repl::prompt_str(&format!("  Worker URL [{}]: ", cfg.worker_url), &cfg.worker_url);
    cfg.auto_recall = repl::prompt_bool("  Inject relevant memories before each turn? [Y/n]: ", true);
    cfg.auto_capture = repl::prompt_bool("  Capture noteworthy statements after each turn? [Y/n]: ", true);

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {e}", "Error saving config".red()),
    }
    config::apply_env_overrides(&mut cfg);
    cfg
}

fn print_banner() {
    println!();
    println!("{}", r"        __                                    ".bold().cyan());
    println!("{}", r"  _____/ /___ __      ______ ___  ___  ____ ___ ".bold().cyan());
    println!("{}", r" / ___/ / __ `/ | /| / / __ `__ \/ _ \/ __ `__ \".bold().cyan());
    println!("{}", r"/ /__/ / /_/ /| |/ |/ / / / / / /  __/ / / / / /".bold().cyan());
    println!("{}", r"\___/_/\__,_/ |__/|__/_/ /_/ /_/\___/_/ /_/ /_/ ".bold().cyan());
    println!();
    println!("  {} {}", "clawmem".bold(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  Persistent memory for conversational agents");
    println!();
}
