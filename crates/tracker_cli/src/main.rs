use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use std::sync::Arc;
use time::UtcOffset;
use tracing_subscriber::EnvFilter;
use tracker_cli::cli::{Cli, Command, config_overrides_from_args};
use tracker_cli::render;
use tracker_cli::session::Session;
use tracker_core::clock::{SystemClock, local_offset};
use tracker_core::config::{Config, Theme, load_config_with_fallback, merge_overrides};
use tracker_core::error::AppError;

struct Output {
    json: bool,
    theme: Theme,
    offset: UtcOffset,
}

impl Output {
    fn new(json: bool, config: &Config) -> Self {
        Self {
            json,
            theme: config.theme,
            offset: local_offset(),
        }
    }

    fn with_json(&self, json: bool) -> Self {
        Self {
            json: self.json || json,
            theme: self.theme,
            offset: self.offset,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error.as_ref() {
        tracing::warn!(error = %err, "falling back to default configuration");
    }

    let overrides = config_overrides_from_args(raw_overrides)?;
    Ok(merge_overrides(&loaded.config, &overrides))
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(session: &mut Session, command: Command, output: &Output) -> Result<(), AppError> {
    match command {
        Command::Add { text } => {
            // Blank text is ignored without an error.
            let Some((position, task)) = session.add(&text.join(" ")) else {
                return Ok(());
            };
            if output.json {
                println!("{}", render::task_json(position, task)?);
            } else {
                println!("{}", render::added_line(position, task));
            }
        }
        Command::Toggle { index } => {
            let task = session.toggle(index)?;
            if output.json {
                println!("{}", render::task_json(index, task)?);
            } else {
                println!("{}", render::toggled_line(index, task, output.offset)?);
            }
        }
        Command::List => {
            if output.json {
                println!("{}", render::grid_json(session.tasks())?);
            } else {
                println!(
                    "{}",
                    render::grid(session.tasks(), output.offset, output.theme)?
                );
            }
        }
        Command::Timeline => {
            if output.json {
                println!("{}", render::timeline_json(session.tasks())?);
            } else {
                println!(
                    "{}",
                    render::timeline(session.tasks(), output.offset, output.theme)?
                );
            }
        }
        Command::Weather => {
            let state = *session.weather();
            if output.json {
                println!("{}", render::weather_json(&state)?);
            } else {
                println!("{}", output.theme.heading("Weather"));
                println!("{}", render::weather(&state, output.offset)?);
            }
        }
        Command::Now => {
            let now = session.now();
            if output.json {
                println!("{}", render::clock_json(now, output.offset)?);
            } else {
                println!("{}", render::clock(now, output.offset)?);
            }
        }
    }

    Ok(())
}

fn run_interactive(session: &mut Session, output: &Output) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("daily_tracker".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if is_informational(&err) => {
                println!("{}", err.render());
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        let Some(command) = cli.command else {
            eprintln!("ERROR: {}", AppError::invalid_input("a command is required"));
            continue;
        };

        if let Err(err) = run_command(session, command, &output.with_json(cli.json)) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if is_informational(&err) => err.exit(),
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    let config = match load_config(&cli.config_override) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    let output = Output::new(cli.json, &config);
    let mut session = Session::new(config, Arc::new(SystemClock));

    let Some(command) = cli.command else {
        session.start();
        let result = run_interactive(&mut session, &output);
        session.stop();
        if let Err(err) = result {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    };

    if let Err(err) = run_command(&mut session, command, &output) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
