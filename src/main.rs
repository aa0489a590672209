use std::io::{self, BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dialoguer::{Confirm, Input, Select};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use roblox_avail::bulk::{Orchestrator, RunReport};
use roblox_avail::check::{
    Checker, Client, ClientConfig, DEFAULT_LOOKUP_URL, DEFAULT_VALIDATE_URL, Existence, Validity,
};
use roblox_avail::config::{Delay, RunConfig, Speed};
use roblox_avail::{input, interrupt, report};

const RULE_WIDTH: usize = 50;

/// The user asked to stop, by Ctrl-C or by aborting a prompt.
#[derive(Debug, Error)]
#[error("operation cancelled by user")]
struct Cancelled;

#[derive(Parser)]
#[command(
    name = "roblox-avail",
    version,
    about = "Check whether Roblox usernames are available, taken, or invalid",
    after_help = "Each name is looked up by name first; names with no account are then \
                  sent to the validation endpoint. Bulk checks run one name at a time \
                  with a delay in between to stay clear of the rate limit.\n\n\
                  With no names and an interactive terminal, a menu is shown."
)]
struct Cli {
    /// Usernames to check (also reads from stdin)
    names: Vec<String>,

    /// Read usernames from a file, one per line
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Preset delay between checks
    #[arg(short, long, value_enum)]
    speed: Option<Speed>,

    /// Delay between checks in seconds, clamped to 0.1-10.0 (overrides --speed)
    #[arg(short, long, value_name = "SECS", env = "ROBLOX_AVAIL_DELAY")]
    delay: Option<f64>,

    /// Save bulk results to roblox_results_<timestamp>.txt
    #[arg(long)]
    save: bool,

    /// Directory for saved results
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..=120))]
    timeout: u64,

    /// Lookup-by-name endpoint
    #[arg(long, env = "ROBLOX_AVAIL_LOOKUP_URL", default_value = DEFAULT_LOOKUP_URL, hide = true)]
    lookup_url: String,

    /// Username validation endpoint
    #[arg(long, env = "ROBLOX_AVAIL_VALIDATE_URL", default_value = DEFAULT_VALIDATE_URL, hide = true)]
    validate_url: String,

    /// Log requests and failure details to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn client(&self) -> Client {
        Client::with_config(ClientConfig {
            lookup_url: self.lookup_url.clone(),
            validate_url: self.validate_url.clone(),
            timeout: Duration::from_secs(self.timeout),
            ..ClientConfig::default()
        })
    }

    /// Delay from flags, if any was given.
    fn delay(&self) -> Option<Delay> {
        self.delay
            .map(Delay::clamped)
            .or_else(|| self.speed.map(Speed::delay))
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be set when embedded; that is fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

fn cancel_if_requested() -> anyhow::Result<()> {
    if interrupt::requested() {
        return Err(Cancelled.into());
    }
    Ok(())
}

/// Unwrap a prompt answer, turning an aborted prompt into [`Cancelled`].
fn ask<T>(answer: Result<T, dialoguer::Error>) -> anyhow::Result<T> {
    match answer {
        Err(dialoguer::Error::IO(e)) if e.kind() == io::ErrorKind::Interrupted => {
            Err(Cancelled.into())
        }
        _ if interrupt::requested() => Err(Cancelled.into()),
        Err(e) => Err(anyhow::Error::new(e).context("prompt failed")),
        Ok(value) => Ok(value),
    }
}

fn check_single(client: &Client, username: &str) -> anyhow::Result<()> {
    println!("\nChecking username: {username}");
    println!("{}", rule('-'));

    let existence = client.check_exists(username);
    cancel_if_requested()?;
    if let Existence::Exists(user) = existence {
        println!("\nUSERNAME TAKEN");
        println!("User ID: {}", user.id);
        println!("Username: {}", user.name);
        return Ok(());
    }

    let validity = client.check_validity(username);
    cancel_if_requested()?;
    match validity {
        Validity::Valid => {
            println!("\nUSERNAME AVAILABLE!");
            println!("This username can be registered on Roblox");
        }
        Validity::Invalid(reason) => {
            println!("\nUSERNAME INVALID");
            println!("Reason: {reason}");
        }
    }
    Ok(())
}

fn check_bulk(client: &Client, names: &[String], delay: Delay) -> anyhow::Result<RunReport> {
    println!("\nChecking {} usernames...", names.len());
    println!("{}", rule('-'));

    let report = {
        let mut stdout = io::stdout().lock();
        Orchestrator::new(client, RunConfig::new(delay))
            .interrupt_on(interrupt::flag())
            .run(names, &mut stdout)
            .context("failed to write progress")?
    };

    print!("{}", report::summary(&report.results));
    Ok(report)
}

fn save_results(report: &RunReport, dir: &Path) -> anyhow::Result<()> {
    let path = report::save(&report.results, dir)
        .with_context(|| format!("failed to save results in {}", dir.display()))?;
    println!("Results saved to: {}", path.display());
    Ok(())
}

fn pick_speed() -> anyhow::Result<Delay> {
    let mut items: Vec<String> = Speed::ALL
        .iter()
        .map(|s| format!("{} ({}) - {}", s.label(), s.delay(), s.note()))
        .collect();
    items.push("Custom - set your own delay".to_string());

    println!("\nTip: use Slow/Normal for large lists to avoid API blocking");
    let choice = ask(
        Select::new()
            .with_prompt("Select speed")
            .items(&items)
            .default(1)
            .interact(),
    )?;

    if let Some(speed) = Speed::ALL.get(choice) {
        println!("Speed selected: {} ({} delay)", speed.label(), speed.delay());
        return Ok(speed.delay());
    }

    let raw = ask(
        Input::<String>::new()
            .with_prompt("Enter delay in seconds (0.1-10.0)")
            .interact_text(),
    )?;
    match raw.trim().parse::<f64>() {
        Ok(secs) => {
            let delay = Delay::clamped(secs);
            println!("Custom delay set: {delay}");
            Ok(delay)
        }
        Err(_) => {
            println!("Invalid input, using Normal speed ({})", Speed::Normal.delay());
            Ok(Speed::Normal.delay())
        }
    }
}

fn complete() -> ExitCode {
    println!("\n{}\nCheck complete!\n{}", rule('='), rule('='));
    ExitCode::SUCCESS
}

fn finish(report: &RunReport) -> ExitCode {
    if report.interrupted {
        println!("\nOperation cancelled by user");
        return ExitCode::SUCCESS;
    }
    complete()
}

fn interactive(cli: &Cli, client: &Client) -> anyhow::Result<ExitCode> {
    println!("\nROBLOX USERNAME CHECKER");
    println!("Check username availability & validity");

    let modes = [
        "Check single username",
        "Check multiple usernames (bulk)",
        "Check from file",
    ];
    let mode = ask(
        Select::new()
            .with_prompt("Select mode")
            .items(&modes)
            .default(0)
            .interact(),
    )?;

    let (names, from_file) = match mode {
        0 => {
            let raw = ask(
                Input::<String>::new()
                    .with_prompt("Enter username to check")
                    .allow_empty(true)
                    .interact_text(),
            )?;
            let name = raw.trim();
            if name.is_empty() {
                eprintln!("error: username cannot be empty");
                return Ok(ExitCode::from(1));
            }
            check_single(client, name)?;
            return Ok(complete());
        }
        1 => {
            let raw = ask(
                Input::<String>::new()
                    .with_prompt("Enter usernames (comma-separated)")
                    .allow_empty(true)
                    .interact_text(),
            )?;
            let names = input::parse_list(&raw);
            if names.is_empty() {
                eprintln!("error: no usernames provided");
                return Ok(ExitCode::from(1));
            }
            (names, false)
        }
        2 => {
            let raw = ask(
                Input::<String>::new()
                    .with_prompt("Enter filename (one username per line)")
                    .interact_text(),
            )?;
            let names = match input::read_file(Path::new(raw.trim())) {
                Ok(names) => names,
                Err(e) => {
                    eprintln!("error: {e}");
                    return Ok(ExitCode::from(1));
                }
            };
            if names.is_empty() {
                eprintln!("error: no usernames found in file");
                return Ok(ExitCode::from(1));
            }
            (names, true)
        }
        _ => {
            eprintln!("error: invalid choice");
            return Ok(ExitCode::from(1));
        }
    };

    let delay = match cli.delay() {
        Some(delay) => delay,
        None => pick_speed()?,
    };
    let report = check_bulk(client, &names, delay)?;
    if report.interrupted {
        return Ok(finish(&report));
    }

    let save = cli.save
        || (from_file
            && ask(
                Confirm::new()
                    .with_prompt("Save results to file?")
                    .default(false)
                    .interact(),
            )?);
    if save {
        save_results(&report, &cli.output_dir)?;
    }
    Ok(finish(&report))
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    // Held for the whole process so Ctrl-C anywhere ends in a clean exit.
    let _interrupt = interrupt::install();
    let client = cli.client();
    let mut raw: Vec<String> = cli.names.clone();

    // Read from stdin if not a terminal
    if !io::stdin().is_terminal() {
        for line in io::stdin().lock().lines() {
            raw.push(line.context("reading stdin")?);
        }
    }
    cancel_if_requested()?;

    if let Some(path) = &cli.file {
        match input::read_file(path) {
            Ok(names) if names.is_empty() => {
                eprintln!("error: no usernames found in file");
                return Ok(ExitCode::from(1));
            }
            Ok(names) => raw.extend(names),
            Err(e) => {
                eprintln!("error: {e}");
                return Ok(ExitCode::from(1));
            }
        }
    }

    let names = input::collect(raw.iter().map(String::as_str));

    if names.is_empty() {
        if cli.file.is_none() && io::stdin().is_terminal() && io::stdout().is_terminal() {
            return interactive(cli, &client);
        }
        eprintln!("error: no usernames provided");
        eprintln!("usage: roblox-avail [OPTIONS] [NAMES...]");
        return Ok(ExitCode::from(1));
    }

    if cli.file.is_none() && names.len() == 1 {
        check_single(&client, &names[0])?;
        return Ok(complete());
    }

    let delay = cli.delay().unwrap_or_default();
    let report = check_bulk(&client, &names, delay)?;
    if !report.interrupted && cli.save {
        save_results(&report, &cli.output_dir)?;
    }
    Ok(finish(&report))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) if e.is::<Cancelled>() => {
            println!("\nOperation cancelled by user");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: unexpected failure: {e:#}");
            ExitCode::from(1)
        }
    }
}
