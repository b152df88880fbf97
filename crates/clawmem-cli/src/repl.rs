//! REPL – the interactive `clawmem>` shell.
//!
//! Supported slash-commands:
//!   /status                 – worker health and counters
//!   /search <query> [limit] – search memories
//!   /stats                  – memory statistics
//!   /get <id>               – show one memory
//!   /delete <id>            – delete one memory
//!   /remember <text>        – store a memory explicitly
//!   /classify <text>        – dry-run the capture engine
//!   /settings               – edit `~/.clawmem/config.toml`
//!   /help                   – show this list
//!   /quit | /exit           – leave the shell

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clawmem_runtime::tools::DEFAULT_SEARCH_LIMIT;

use crate::commands::{self, Session};
use crate::config::{self, Config};

/// A parsed input line.
#[derive(Debug, PartialEq)]
pub(crate) enum Input<'a> {
    Status,
    Search { query: &'a str, limit: usize },
    Stats,
    Get(i64),
    Delete(i64),
    Remember(&'a str),
    Classify(&'a str),
    Settings,
    Help,
    Quit,
    Invalid(String),
}

pub(crate) fn parse_line(line: &str) -> Input<'_> {
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };
    match cmd {
        "/status" => Input::Status,
        "/stats" => Input::Stats,
        "/settings" => Input::Settings,
        "/help" => Input::Help,
        "/quit" | "/exit" => Input::Quit,
        "/search" if rest.is_empty() => Input::Invalid("usage: /search <query> [limit]".into()),
        "/search" => {
            // A trailing integer is the limit; everything before it is the query.
            match rest.rsplit_once(char::is_whitespace) {
                Some((query, n)) if n.parse::<usize>().is_ok() => Input::Search {
                    query: query.trim(),
                    limit: n.parse().unwrap_or(DEFAULT_SEARCH_LIMIT),
                },
                _ => Input::Search {
                    query: rest,
                    limit: DEFAULT_SEARCH_LIMIT,
                },
            }
        }
        "/get" | "/delete" => match rest.parse::<i64>() {
            Ok(id) if cmd == "/get" => Input::Get(id),
            Ok(id) => Input::Delete(id),
            Err(_) => Input::Invalid(format!("usage: {cmd} <id>")),
        },
        "/remember" if rest.is_empty() => Input::Invalid("usage: /remember <text>".into()),
        "/remember" => Input::Remember(rest),
        "/classify" if rest.is_empty() => Input::Invalid("usage: /classify <text>".into()),
        "/classify" => Input::Classify(rest),
        other => Input::Invalid(format!("Unknown command: '{other}'")),
    }
}

/// Run until `/quit`, EOF or Ctrl-C.
pub fn run(runtime: &tokio::runtime::Runtime, mut session: Session, shutdown: Arc<AtomicBool>) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "clawmem>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {e}", "Read error".red());
                break;
            }
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Commands return their failures; this is the only place they are printed.
        let _ = match parse_line(line) {
            Input::Status => runtime.block_on(commands::status(&session)),
            Input::Search { query, limit } => runtime.block_on(commands::search(&session, query, limit)),
            Input::Stats => runtime.block_on(commands::stats(&session)),
            Input::Get(id) => runtime.block_on(commands::get(&session, id)),
            Input::Delete(id) => runtime.block_on(commands::delete(&session, id)),
            Input::Remember(text) => runtime.block_on(commands::remember(&session, text, None)),
            Input::Classify(text) => {
                commands::classify(text);
                Ok(())
            }
            Input::Settings => {
                if let Some(cfg) = cmd_settings() {
                    session = Session::new((&cfg).into());
                }
                Ok(())
            }
            Input::Help => {
                cmd_help();
                Ok(())
            }
            Input::Quit => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            Input::Invalid(msg) => {
                println!("{} Type {} for available commands.", msg.red(), "/help".bold());
                Ok(())
            }
        }
        .map_err(|e| println!("{}: {e}", "Error".red()));
    }
}

fn cmd_help() {
    println!();
    println!("{}", "clawmem Commands".bold().underline());
    println!("  {}          – worker health and counters", "/status".bold().cyan());
    println!("  {} – search memories", "/search <q> [limit]".bold().cyan());
    println!("  {}           – memory statistics (JSON)", "/stats".bold().cyan());
    println!("  {}        – show one memory", "/get <id>".bold().cyan());
    println!("  {}     – delete one memory", "/delete <id>".bold().cyan());
    println!("  {} – store a memory", "/remember <text>".bold().cyan());
    println!("  {} – dry-run the capture engine", "/classify <text>".bold().cyan());
    println!("  {}        – edit ~/.clawmem/config.toml", "/settings".bold().cyan());
    println!("  {}     – exit the shell", "/quit  /exit".bold().cyan());
    println!();
}

/// Interactive settings editor.  Returns the saved settings.
fn cmd_settings() -> Option<Config> {
    let mut cfg = match config::load() {
        Ok(Some(c)) => c,
        Ok(None) => Config::default(),
        Err(e) => {
            println!("{}: {e}", "Error loading config".red());
            return None;
        }
    };

    println!("{}", "Settings Editor".bold().underline());
    println!("  (press Enter to keep the current value)");
    cfg.worker_url = prompt_str(&format!("  Worker URL         [{}]: ", cfg.worker_url), &cfg.worker_url);
    cfg.auto_recall = prompt_bool(
        &format!("  Auto-recall        [{}]: ", yes_no(cfg.auto_recall)),
        cfg.auto_recall,
    );
    cfg.auto_capture = prompt_bool(
        &format!("  Auto-capture       [{}]: ", yes_no(cfg.auto_capture)),
        cfg.auto_capture,
    );
    cfg.max_context_tokens = prompt_usize(
        &format!("  Max context tokens [{}]: ", cfg.max_context_tokens),
        cfg.max_context_tokens,
    );
    cfg.recall_limit = prompt_usize(&format!("  Recall limit       [{}]: ", cfg.recall_limit), cfg.recall_limit);

    let current = if cfg.capture_types.is_empty() {
        "all".to_string()
    } else {
        cfg.capture_types.join(",")
    };
    let kinds = prompt_str(&format!("  Recalled types     [{current}]: "), &current);
    cfg.capture_types = parse_kinds(&kinds);

    match config::save(&cfg) {
        Ok(()) => {
            println!(
                "{} {}",
                "✓ Settings saved to".green(),
                config::config_path().display().to_string().bold()
            );
            Some(cfg)
        }
        Err(e) => {
            println!("{}: {e}", "Error saving config".red());
            None
        }
    }
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}

/// `all` (or nothing) means no filter; otherwise a comma-separated list.
pub(crate) fn parse_kinds(raw: &str) -> Vec<String> {
    if raw.trim().eq_ignore_ascii_case("all") {
        return Vec::new();
    }
    raw.split(',')
        .map(|k| k.trim().to_ascii_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Prompt helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Prompt for a string.  Returns `default` when the user presses Enter.
pub(crate) fn prompt_str(msg: &str, default: &str) -> String {
    print!("{msg}");
    io::stdout().flush().ok();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Err(_) => default.to_string(),
    }
}

pub(crate) fn prompt_bool(msg: &str, default: bool) -> bool {
    let raw = prompt_str(msg, "");
    match raw.to_ascii_lowercase().as_str() {
        "" => default,
        "y" | "yes" | "true" | "1" => true,
        "n" | "no" | "false" | "0" => false,
        other => {
            println!("  {} '{other}' is not yes/no, keeping {}", "Warning:".yellow(), yes_no(default));
            default
        }
    }
}

fn prompt_usize(msg: &str, default: usize) -> usize {
    let raw = prompt_str(msg, &default.to_string());
    raw.parse().unwrap_or_else(|_| {
        println!("  {} '{raw}' is not a number, keeping {default}", "Warning:".yellow());
        default
    })
}
