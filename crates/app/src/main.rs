mod command;
mod render;

use std::fmt;

use gym_core::Clock;
use services::{ActiveScenario, AppServices, SessionShell, ShellError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::command::Command;

const DEFAULT_DB_URL: &str = "sqlite:persuasion_gym.sqlite3?mode=rwc";
const DEFAULT_CATALOG: &str = "demos/catalog.json";
const DEFAULT_LOG_FILTER: &str = "warn,services=info";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  persuasion-gym [--db <sqlite_url>] [--catalog <path>] [--memory]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --catalog {DEFAULT_CATALOG}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GYM_DB_URL, GYM_CATALOG, RUST_LOG");
    eprintln!("  GYM_AI_API_KEY, GYM_AI_BASE_URL, GYM_AI_MODEL, GYM_AI_MAX_TOKENS");
}

#[derive(Debug)]
struct Args {
    db_url: String,
    catalog: String,
    in_memory: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut db_url = std::env::var("GYM_DB_URL").unwrap_or_else(|_| DEFAULT_DB_URL.into());
        let mut catalog =
            std::env::var("GYM_CATALOG").unwrap_or_else(|_| DEFAULT_CATALOG.into());
        let mut in_memory = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if !value.trim().starts_with("sqlite:") {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value.trim().to_owned();
                }
                "--catalog" => catalog = require_value(args, "--catalog")?,
                "--memory" => in_memory = true,
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(Self {
            db_url,
            catalog,
            in_memory,
        }))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let Some(args) = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    init_tracing();
    let catalog = AppServices::load_catalog(&args.catalog)?;
    let clock = Clock::default();
    let services = if args.in_memory {
        AppServices::in_memory(catalog, clock)
    } else {
        AppServices::new_sqlite(&args.db_url, catalog, clock).await?
    };
    tracing::info!(catalog = %args.catalog, in_memory = args.in_memory, "session starting");

    let mut shell = services.start_session().await;
    println!("{}", render::dashboard(&shell.dashboard()));
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(&mut shell, command).await,
            Err(err) => println!("{err}"),
        }
    }

    shell.flush().await;
    Ok(())
}

async fn execute(shell: &mut SessionShell, command: Command) {
    let before = shell.save_status();
    if let Err(err) = dispatch(shell, command).await {
        println!("{}", render::error(&err));
    }
    let after = shell.save_status();
    match render::save_notice(after) {
        Some(notice) if after != before => println!("{notice}"),
        _ => {}
    }
}

async fn dispatch(shell: &mut SessionShell, command: Command) -> Result<(), ShellError> {
    match command {
        Command::Help => println!("{}", render::HELP),
        Command::Dashboard => println!("{}", render::dashboard(&shell.dashboard())),
        Command::Modules => println!("{}", render::modules(shell.context().catalog())),
        Command::Reference(module) => {
            let mut sections = shell.reference();
            if let Some(module) = module {
                sections.retain(|s| s.module == module);
            }
            println!("{}", render::reference(&sections));
        }
        Command::Open {
            module,
            phase,
            scenario,
        } => {
            let active = shell.open(&module, phase, scenario.as_ref())?;
            println!("{}", render::opened(active));
        }
        Command::Pick(option) => shell.select_option(&option)?,
        Command::Submit => {
            let reveal = shell.submit_recognition()?;
            println!("{}", render::reveal(&reveal));
        }
        Command::Write(text) => match shell.request_coaching(&text).await? {
            Some(report) => println!("{}", render::grade(&report)),
            None => println!(
                "Write at least {} characters before asking for coaching.",
                services::MIN_RESPONSE_CHARS
            ),
        },
        Command::Again => shell.try_again()?,
        Command::Say(text) => {
            let name = match shell.active() {
                Some(ActiveScenario::Dialogue(d)) => d.scenario().character.name.clone(),
                _ => String::new(),
            };
            let outcome = shell.send_turn(&text).await?;
            println!("{}", render::turn(&name, &outcome));
        }
        Command::Retry => {
            let debrief = shell.retry_debrief().await?;
            println!("{}", render::debrief(&debrief));
        }
        Command::Close => shell.close(),
        Command::Quit => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
