//! refgate - git hook dispatcher
//!
//! # Invocation
//!
//! Installed as a hook (a symlink or copy named after the event, e.g.
//! `.git/hooks/pre-receive`), every argument after argv[0] is passed to the
//! event untouched. Called as `refgate`, options are parsed first:
//!
//! ```text
//! refgate [-d] [-v] [--git-dir DIR] [-c key=value]... [--namespace NS] <EVENT> [ARGS]...
//! ```
//!
//! # Logging
//!
//! Terminal filter: `--debug` > `--verbose` > `REFGATE_LOG` > `warn`.
//! Logs go to stderr; stdout belongs to the hooks.
//!
//! # Exit status
//!
//! 0 when the event is permitted, 1 otherwise. A rejection prints a single
//! line `refgate: <component>: <message>`.

use anyhow::Result;
use clap::Parser;
use refgate_runtime::config::{ConfigLoader, DEFAULT_NAMESPACE};
use refgate_runtime::{DispatchError, DispatchReport, Dispatcher, GitRepository, Invocation, Session};
use refgate_types::{single_line, EventName};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the default log filter.
const LOG_ENV: &str = "REFGATE_LOG";

/// refgate - git hook dispatcher
#[derive(Parser, Debug)]
#[command(name = "refgate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Repository git directory (defaults to `git rev-parse --absolute-git-dir`)
    #[arg(long, value_name = "DIR")]
    git_dir: Option<PathBuf>,

    /// Override a configuration value (repeatable)
    #[arg(short = 'c', value_name = "KEY=VALUE")]
    config: Vec<String>,

    /// Configuration namespace
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Event to dispatch
    event: EventName,

    /// Event arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Args {
    /// Builds arguments for hook mode, where argv[0] names the event.
    fn for_hook(event: EventName, args: Vec<String>) -> Self {
        Self {
            debug: false,
            verbose: false,
            git_dir: None,
            config: Vec::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            event,
            args,
        }
    }
}

/// Returns the event named by argv[0], if the binary runs as a hook.
fn hook_event(arg0: &str) -> Option<EventName> {
    Path::new(arg0).file_name()?.to_str()?.parse().ok()
}

fn parse_args() -> Args {
    let mut argv = std::env::args();
    let arg0 = argv.next().unwrap_or_default();
    match hook_event(&arg0) {
        Some(event) => Args::for_hook(event, argv.collect()),
        None => Args::parse(),
    }
}

fn init_tracing(args: &Args) {
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<DispatchReport> {
    let repo = match &args.git_dir {
        Some(dir) => GitRepository::new(dir),
        None => GitRepository::discover().map_err(DispatchError::from)?,
    };
    info!(git_dir = %repo.git_dir().display(), event = %args.event, "Repository");

    let config = ConfigLoader::new()
        .with_git_dir(repo.git_dir())
        .with_overrides(&args.config)
        .load()
        .map_err(DispatchError::from)?;

    let stdin = std::io::stdin();
    let invocation =
        Invocation::read(args.event, args.args, stdin.lock()).map_err(DispatchError::from)?;

    let session = Session::new(config, repo, invocation).with_namespace(args.namespace);
    let report = Dispatcher::new(&session).run(&session)?;
    Ok(report)
}

/// Formats the single diagnostic line for a rejected event.
///
/// Handler reasons are free text, so the message is folded onto one line.
fn diagnostic(err: &anyhow::Error) -> String {
    let (component, message) = match err.downcast_ref::<DispatchError>() {
        Some(e) => (e.component(), e.to_string()),
        None => ("internal", format!("{err:#}")),
    };
    format!("refgate: {component}: {}", single_line(&message))
}

fn main() -> ExitCode {
    let args = parse_args();
    init_tracing(&args);

    match run(args) {
        Ok(report) => {
            info!(
                plugins = report.plugins,
                handlers = report.handlers,
                externals = report.externals,
                "Event permitted"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", diagnostic(&err));
            ExitCode::FAILURE
        }
    }
}
