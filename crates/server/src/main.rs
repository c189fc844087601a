// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod attribution;
mod jobs;
mod routes;

#[cfg(test)]
mod tests;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use lms::DEFAULT_WARNING_DAYS;
use lms_api::{ApiError, LicenseReportQuery};
use lms_persistence::Persistence;

/// LMS Server - license and asset tracking backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "LMS_DATABASE")]
    database: Option<PathBuf>,

    /// `MySQL`/`MariaDB` connection URL. Takes precedence over `--database`.
    #[arg(long, env = "LMS_MYSQL_URL")]
    mysql_url: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, env = "LMS_PORT", default_value_t = 3000)]
    port: u16,

    /// Prefix of printed asset codes
    #[arg(long, env = "LMS_ASSET_CODE_PREFIX", default_value = "AMS")]
    asset_code_prefix: String,

    /// Days ahead in which ending subscriptions are reported
    #[arg(long, env = "LMS_REPORT_WARNING_DAYS", default_value_t = DEFAULT_WARNING_DAYS)]
    report_warning_days: i64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Print the license report
    Report {
        /// Report date (YYYY-MM-DD); today when absent
        #[arg(long)]
        today: Option<String>,
        /// Include software used without a license
        #[arg(long)]
        include_unlicensed: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Synchronize users from a directory export (CSV)
    SyncUsers {
        /// Path to the export
        csv: PathBuf,
        /// Report changes without applying them
        #[arg(long)]
        dry_run: bool,
    },
    /// Recount seats in use per license
    Reconcile {
        /// Rewrite counters that disagree with the assignments
        #[arg(long)]
        repair: bool,
    },
}

/// Application state shared across handlers.
///
/// This contains the persistence layer wrapped in a Mutex to allow
/// safe concurrent access.
#[derive(Clone)]
struct AppState {
    persistence: Arc<Mutex<Persistence>>,
    asset_code_prefix: Arc<str>,
    report_warning_days: i64,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::DomainRuleViolation { rule, .. } if rule == "unique" => StatusCode::CONFLICT,
            ApiError::DomainRuleViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

fn open_persistence(args: &Args) -> Result<Persistence, Box<dyn std::error::Error>> {
    let persistence: Persistence = if let Some(url) = &args.mysql_url {
        info!("Using MySQL database");
        Persistence::new_with_mysql(url)?
    } else if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path.display());
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };
    Ok(persistence)
}

async fn serve(args: &Args, persistence: Persistence) -> Result<(), Box<dyn std::error::Error>> {
    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        asset_code_prefix: Arc::from(args.asset_code_prefix.as_str()),
        report_warning_days: args.report_warning_days,
    };

    let app: Router = routes::build_router(app_state);

    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing LMS Server");

    let mut persistence: Persistence = open_persistence(&args)?;

    match &args.command {
        None | Some(Command::Serve) => serve(&args, persistence).await?,
        Some(Command::Report {
            today,
            include_unlicensed,
            json,
        }) => {
            let query: LicenseReportQuery = LicenseReportQuery {
                today: today.clone(),
                warning_days: None,
                include_unlicensed: *include_unlicensed,
            };
            let output: String =
                jobs::run_report(&mut persistence, &query, args.report_warning_days, *json)?;
            println!("{output}");
        }
        Some(Command::SyncUsers { csv, dry_run }) => {
            let response = jobs::run_sync_users(&mut persistence, csv, *dry_run)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Some(Command::Reconcile { repair }) => {
            let outcome = jobs::run_reconcile(&mut persistence, *repair)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
