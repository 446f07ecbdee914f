//! mimickv - An In-Process, Type-Checked Redis Stand-In
//!
//! This is the console for mimickv. It reads redis-cli style command lines
//! from a file or stdin, runs them against a fresh store, and prints the
//! replies the way redis-cli would.

use anyhow::Context;
use clap::Parser;
use mimickv::{Command, KvError, KvResult, Store, Transaction};
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Console configuration
#[derive(Parser, Debug)]
#[command(name = "mimickv")]
#[command(version, about = "In-process, type-checked Redis stand-in")]
struct Config {
    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "mimickv=trace" (default: $RUST_LOG, then "warn")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Do not print the banner
    #[arg(short, long)]
    quiet: bool,
}

impl Config {
    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        match &self.log_level {
            Some(level) => EnvFilter::try_new(level)
                .with_context(|| format!("invalid log filter '{}'", level)),
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))),
        }
    }
}

fn print_banner() {
    println!(
        r#"
mimickv v{} - In-Process Redis Stand-In
──────────────────────────────────────────
Type commands as you would in redis-cli.
MULTI / EXEC / DISCARD for transactions, QUIT to leave.
"#,
        mimickv::VERSION
    );
}

/// What the console should do after a line.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Print(String),
    Silent,
    Quit,
}

/// One console session: the store plus the transaction currently open on it.
struct Session<'a> {
    store: &'a Store,
    transaction: Option<Transaction<'a>>,
}

impl<'a> Session<'a> {
    fn new(store: &'a Store) -> Self {
        Self {
            store,
            transaction: None,
        }
    }

    fn eval(&mut self, line: &str) -> Step {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Step::Silent;
        }

        let args = match tokenize(line) {
            Ok(args) => args,
            Err(e) => return Step::Print(format_error(&e)),
        };
        let Some(name) = args.first() else {
            return Step::Silent;
        };

        match name.to_ascii_uppercase().as_str() {
            "QUIT" | "EXIT" => Step::Quit,
            "MULTI" => match self.store.multi() {
                Ok(tx) => {
                    self.transaction = Some(tx);
                    Step::Print("OK".to_string())
                }
                Err(e) => Step::Print(format_error(&e)),
            },
            "EXEC" => match self.transaction.take() {
                Some(tx) => Step::Print(match tx.exec() {
                    Ok(replies) if replies.is_empty() => "(empty array)".to_string(),
                    Ok(replies) => replies
                        .iter()
                        .enumerate()
                        .map(|(i, reply)| format!("{}) {}", i + 1, reply))
                        .collect::<Vec<_>>()
                        .join("\n"),
                    Err(e) => format_error(&e),
                }),
                None => Step::Print("(error) ERR EXEC without MULTI".to_string()),
            },
            "DISCARD" => match self.transaction.take() {
                Some(tx) => {
                    tx.discard();
                    Step::Print("OK".to_string())
                }
                None => Step::Print("(error) ERR DISCARD without MULTI".to_string()),
            },
            _ => Step::Print(self.run(args)),
        }
    }

    fn run(&mut self, args: Vec<String>) -> String {
        let command = match Command::from_args(args) {
            Ok(command) => command,
            Err(e) => return format_error(&e),
        };

        match self.transaction.as_mut() {
            Some(tx) => {
                tx.queue(command);
                "QUEUED".to_string()
            }
            None => match self.store.execute(command) {
                Ok(reply) => reply.to_string(),
                Err(e) => format_error(&e),
            },
        }
    }
}

fn format_error(e: &KvError) -> String {
    format!("(error) {}", e)
}

/// Splits a command line on whitespace. Single or double quotes group words
/// into one argument; an unterminated quote is an error.
fn tokenize(line: &str) -> KvResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(KvError::UnbalancedQuotes);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::parse();

    // Set up logging
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter()?)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let input: Box<dyn BufRead> = match &config.file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            info!("Reading commands from {}", path.display());
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };
    let interactive = config.file.is_none() && io::stdin().is_terminal();

    if !config.quiet {
        print_banner();
    }

    let store = Store::new();
    let mut session = Session::new(&store);
    let mut stdout = io::stdout().lock();

    let mut lines = input.lines();
    loop {
        if interactive {
            write!(stdout, "mimickv> ")?;
            stdout.flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        match session.eval(&line?) {
            Step::Print(output) => writeln!(stdout, "{}", output)?,
            Step::Silent => {}
            Step::Quit => break,
        }
    }

    debug!("session ended");
    Ok(())
}
