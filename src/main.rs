mod app;
mod fallback;
mod infra;
mod orchestrator;
mod render;
mod state;
#[cfg(test)]
mod testing;
mod timeline;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::{
    ExecutableCommand,
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use dc_base::catalog;
use dc_base::config::{DEFAULT_THEME, set_active_theme};
use dc_base::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_SERVICES_URL, ENV_BACKEND_URL, ENV_LOG, ENV_SERVICES_URL, ENV_STORE_DIR, ENV_THEME,
    INGEST_POLL_SECS, STORE_DIR,
};
use dc_base::types::{AgentRequest, FeatureSnapshot, IngestJob};

use app::{App, Backends};
use infra::api::HttpAgentClient;
use infra::error::CliError;
use infra::ingest::{IngestClient, IngestControl, IngestUpdate, JobWatcher};
use infra::session::SessionStore;
use infra::settings::{Settings, load_dotenv};
use orchestrator::RequestRun;
use state::State;

/// Terminal client for the die-casting diagnosis agent.
#[derive(Parser, Debug)]
#[command(name = "dcpilot", version, about)]
struct Cli {
    /// Agent backend base URL
    #[arg(long, global = true, env = ENV_BACKEND_URL, default_value = DEFAULT_BACKEND_URL)]
    backend: String,

    /// Analysis sub-service base URL (prediction, importance, retrieval)
    #[arg(long, global = true, env = ENV_SERVICES_URL, default_value = DEFAULT_SERVICES_URL)]
    services: String,

    /// Local store directory for the session id and logs
    #[arg(long, global = true, env = ENV_STORE_DIR, default_value = STORE_DIR)]
    store: PathBuf,

    /// Color theme
    #[arg(long, global = true, env = ENV_THEME, default_value = DEFAULT_THEME)]
    theme: String,

    /// Log filter directive, e.g. `debug` or `dcpilot=trace`
    #[arg(long, global = true, env = ENV_LOG, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask one question without the interactive UI
    Ask {
        question: String,

        /// Override a process parameter, e.g. `--set Process_Pressure=150`
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        overrides: Vec<(String, f64)>,

        /// Print the answer as an HTML document
        #[arg(long)]
        html: bool,
    },
    /// Manage knowledge-base ingestion jobs
    Ingest {
        #[command(subcommand)]
        action: IngestCommand,
    },
}

#[derive(Subcommand, Debug)]
enum IngestCommand {
    /// Start a new ingestion job
    Start {
        /// Keep polling until the job finishes
        #[arg(long)]
        watch: bool,
    },
    /// Show one job
    Status { job_id: String },
    /// List known jobs, most recent first
    List,
}

fn parse_assignment(raw: &str) -> Result<(String, f64), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if catalog::baseline(key).is_none() {
        return Err(format!("unknown parameter '{}'", key));
    }
    let value: f64 = value.trim().parse().map_err(|_| format!("'{}' is not a number", value.trim()))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", value));
    }
    Ok((key.to_string(), value))
}

fn main() -> ExitCode {
    load_dotenv();
    let cli = Cli::parse();

    let settings = Settings::new(&cli.backend, &cli.services, &cli.store, &cli.theme, &cli.log);
    set_active_theme(&settings.theme);

    // The TUI owns stdout, so only headless commands log to stderr
    if let Err(e) = infra::logging::init(&settings, cli.command.is_some()) {
        eprintln!("warning: logging disabled: {}", e);
    }

    let result = match cli.command {
        None => run_tui(settings),
        Some(Command::Ask { question, overrides, html }) => run_ask(settings, &question, &overrides, html),
        Some(Command::Ingest { action }) => run_ingest(&settings, action),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_tui(settings: Settings) -> Result<(), CliError> {
    let sessions = SessionStore::new(settings.session_path());
    let session_id = sessions.load_or_create()?;
    let client = Arc::new(HttpAgentClient::new(settings.clone())?);
    let backends = Backends {
        transport: client.clone(),
        services: client,
        ingest: Arc::new(IngestClient::new(&settings)?),
    };
    tracing::info!(session = %session_id, backend = %settings.backend_url, "starting interactive session");

    // Panic hook: restore the terminal and keep the panic on disk
    let error_dir = settings.store_dir().join("errors");
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore_terminal();

        let _ = std::fs::create_dir_all(&error_dir);
        let backtrace = std::backtrace::Backtrace::force_capture();
        let msg = format!("[{}] {}\n\n{}\n\n---\n", chrono::Local::now().to_rfc3339(), info, backtrace);
        let _ = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(error_dir.join("panic.log"))
            .and_then(|mut f| f.write_all(msg.as_bytes()));

        default_hook(info);
    }));

    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    io::stdout().execute(EnableBracketedPaste)?;
    io::stdout().execute(EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut app = App::new(State::new(session_id, FeatureSnapshot::baseline()), backends, sessions);
    let result = app.run(&mut terminal);

    restore_terminal();
    result?;
    Ok(())
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = io::stdout().execute(DisableMouseCapture);
    let _ = io::stdout().execute(DisableBracketedPaste);
    let _ = io::stdout().execute(LeaveAlternateScreen);
}

fn run_ask(settings: Settings, question: &str, overrides: &[(String, f64)], html: bool) -> Result<(), CliError> {
    let session_id = SessionStore::new(settings.session_path()).load_or_create()?;
    let client = HttpAgentClient::new(settings)?;

    let mut features = FeatureSnapshot::baseline();
    for (key, value) in overrides {
        features.set(key, *value);
    }

    let mut run = RequestRun::new(1, AgentRequest::new(question, features, session_id));
    let mut printed: Vec<String> = Vec::new();
    let summary = orchestrator::driver::run_blocking(&client, &client, &mut run, None, |run| {
        if run.timeline().is_hidden() {
            return;
        }
        for (i, stage) in run.timeline().stages().iter().enumerate() {
            let line = render::text::stage_line(stage);
            if printed.get(i) != Some(&line) {
                eprintln!("{}", line);
                match printed.get_mut(i) {
                    Some(slot) => *slot = line,
                    None => printed.push(line),
                }
            }
        }
    });

    let mut out = io::stdout().lock();
    if html {
        write!(out, "{}", render::html::document(question, &[(question, run.output())]))?;
    } else {
        for line in render::text::region_lines(run.output()) {
            writeln!(out, "{}", line)?;
        }
        if let Some(summary) = &summary {
            writeln!(out)?;
            for line in render::text::summary_lines(summary) {
                writeln!(out, "{}", line)?;
            }
        }
    }
    Ok(())
}

fn run_ingest(settings: &Settings, action: IngestCommand) -> Result<(), CliError> {
    let client = Arc::new(IngestClient::new(settings)?);
    match action {
        IngestCommand::Start { watch } => {
            let job = client.start()?;
            print_job(&job);
            if watch && !job.status.is_terminal() {
                let (tx, rx) = mpsc::channel();
                let _watcher = JobWatcher::spawn(
                    client as Arc<dyn IngestControl>,
                    job.job_id.clone(),
                    Duration::from_secs(INGEST_POLL_SECS),
                    tx,
                );
                for update in rx {
                    match update {
                        IngestUpdate::Job(job) => {
                            print_job(&job);
                            if job.status.is_terminal() {
                                break;
                            }
                        }
                        IngestUpdate::PollFailed { job_id, error } => eprintln!("poll of {} failed: {}", job_id, error),
                        IngestUpdate::RequestFailed(error) => eprintln!("{}", error),
                    }
                }
            }
        }
        IngestCommand::Status { job_id } => print_job(&client.status(&job_id)?),
        IngestCommand::List => {
            let jobs = client.list()?;
            if jobs.is_empty() {
                println!("No ingestion jobs.");
            }
            for job in &jobs {
                print_job(job);
            }
        }
    }
    Ok(())
}

fn print_job(job: &IngestJob) {
    let started = job.started_at.as_deref().map(ui::helpers::format_timestamp).unwrap_or_else(|| "-".to_string());
    let stats = &job.statistics;
    println!(
        "{}  {:<10} started {}  {} scanned, {} indexed, {} failed",
        job.job_id,
        job.status.label(),
        started,
        stats.documents_scanned,
        stats.documents_indexed,
        stats.documents_failed
    );
    if let Some(error) = &job.error {
        println!("    {}", error);
    }
}
