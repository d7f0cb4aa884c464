use clap::{error::ErrorKind, Parser};
use scoreload::{
    config::Secret,
    load::{self, LoadOutcome, LoadRequest},
    sink::StoreError,
};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Normalize a score sheet and load it into a table keyed by student id.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Store credential
    secret: String,

    /// Target table
    table: String,

    /// Score sheet: header line, maximum-score line, then one line per student
    csv: PathBuf,

    /// KEY=VALUE connection settings (DB_HOST, DB_USER, DB_NAME, DB_PORT, DB_PATH)
    config: PathBuf,

    /// Newline-delimited header names to load, in output order
    headers: PathBuf,

    /// Print the normalized rows as JSON instead of loading them
    #[arg(long)]
    dry_run: bool,

    /// Also write a per-student performance report (JSON) to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

impl Args {
    fn into_request(self) -> LoadRequest {
        LoadRequest {
            secret: Secret::new(self.secret),
            table: self.table,
            csv_path: self.csv,
            config_path: self.config,
            headers_path: self.headers,
            dry_run: self.dry_run,
            report_path: self.report,
        }
    }
}

/// Exit status for a rejected command line; help and version are not failures.
fn parse_exit_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn main() -> ExitCode {
    // ─── 1) init logging (diagnostics on stderr) ─────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) parse arguments ──────────────────────────────────────────
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_exit_status(e.kind()));
        }
    };

    let req = args.into_request();
    if req.secret.is_empty() {
        warn!("empty credential supplied");
    }

    // ─── 3) extract + load ───────────────────────────────────────────
    match load::run(&req) {
        Ok(LoadOutcome::NothingToLoad) => {
            println!("Nothing to load from {}", req.csv_path.display());
            ExitCode::SUCCESS
        }
        Ok(LoadOutcome::DryRun(result)) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("serializing result set: {}", e);
                ExitCode::FAILURE
            }
        },
        Ok(LoadOutcome::Loaded { table, rows }) => {
            info!(%table, rows, "load finished");
            println!("Inserted {} rows into {}", rows, table);
            ExitCode::SUCCESS
        }
        Err(e) => {
            match e.downcast_ref::<StoreError>() {
                Some(store) => error!(code = store.code(), "load failed: {:#}", e),
                None => error!("load failed: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
