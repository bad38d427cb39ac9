//! CLI commands

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use qvick_core::{FileStore, TokenStore};
use qvick_http::types::{AttendanceExport, SortCriterion};
use qvick_http::{QvickClient, RefreshPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Settings;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in as a supervisor or administrator
    Login {
        #[arg(long, env = "QVICK_EMAIL")]
        email: String,

        #[arg(long, env = "QVICK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Register a supervisor account
    Signup {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "QVICK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the locally stored session without contacting the backend
    Status,

    /// Show the profile of the signed-in user
    Whoami,

    /// List dormitory members
    Members {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 100)]
        size: u32,

        /// Only list residents (hides staff accounts)
        #[arg(long)]
        residents_only: bool,
    },

    /// Manage notices
    Notices {
        #[command(subcommand)]
        command: NoticeCommands,
    },

    /// Download the attendance spreadsheet for one day
    Export {
        /// Day to export (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, value_enum, default_value_t = SortBy::StudentId)]
        sort_by: SortBy,

        /// Output file (defaults to 전체_명단_<date>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum NoticeCommands {
    /// List published notices
    List,

    /// Publish a notice
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        content: String,
    },

    /// Delete a notice by index
    Delete { idx: i64 },
}

/// Spreadsheet ordering
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortBy {
    StudentId,
    Name,
    Room,
    Attendance,
}

impl From<SortBy> for SortCriterion {
    fn from(sort_by: SortBy) -> Self {
        match sort_by {
            SortBy::StudentId => Self::StudentId,
            SortBy::Name => Self::Name,
            SortBy::Room => Self::Room,
            SortBy::Attendance => Self::Attendance,
        }
    }
}

/// Build a client whose session lives in the configured state directory
pub fn build_client(settings: &Settings) -> Result<QvickClient> {
    let state_dir = settings.state_dir();
    let store = Arc::new(TokenStore::open(Arc::new(FileStore::new(&state_dir))));

    let policy = if settings.api.coalesce_refresh {
        RefreshPolicy::Coalesced
    } else {
        RefreshPolicy::Independent
    };

    let client = QvickClient::builder()
        .base_url(settings.api.base_url.as_str())
        .timeout(settings.api.timeout())
        .token_store(store)
        .refresh_policy(policy)
        .on_login_required(|| {
            eprintln!("Your session has expired. Run `qvick login` to sign in again.");
        })
        .build()
        .context("failed to build API client")?;

    info!(base_url = client.base_url(), state_dir = %state_dir.display(), "client ready");
    Ok(client)
}

impl Commands {
    pub async fn execute(self, client: &QvickClient) -> Result<()> {
        match self {
            Self::Login { email, password } => {
                let role = client.sign_in(email, password).await?;
                println!("Signed in as {role}");
            }
            Self::Signup {
                name,
                email,
                password,
            } => {
                client.sign_up_teacher(name, &email, password).await?;
                println!("Registered {email}. Run `qvick login` to sign in.");
            }
            Self::Logout => {
                client.sign_out();
                println!("Signed out");
            }
            Self::Status => {
                let session = client.session();
                if !session.is_authenticated() {
                    println!("Not signed in");
                } else if let Some(role) = session.role {
                    println!("Signed in ({role})");
                } else {
                    println!("Signed in");
                }
            }
            Self::Whoami => {
                let profile = client.profile().await?;
                println!("{} <{}> ({})", profile.name, profile.email, profile.user_role);
            }
            Self::Members {
                page,
                size,
                residents_only,
            } => {
                let members = client.list_members(page, size).await?;
                for member in members
                    .iter()
                    .filter(|m| !residents_only || m.is_resident())
                {
                    let attendance = if member.checked { "present" } else { "absent" };
                    println!(
                        "{}\t{}\t{}\t{}",
                        member.std_id, member.name, member.room, attendance
                    );
                }
            }
            Self::Notices { command } => command.execute(client).await?,
            Self::Export {
                date,
                sort_by,
                output,
            } => {
                let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
                let export = AttendanceExport::new(date, sort_by.into());
                let output = output.unwrap_or_else(|| PathBuf::from(export.default_file_name()));

                let bytes = client.export_attendance(&export).await?;
                std::fs::write(&output, &bytes)
                    .with_context(|| format!("failed to write {}", output.display()))?;
                println!("Saved {} bytes to {}", bytes.len(), output.display());
            }
        }

        Ok(())
    }
}

impl NoticeCommands {
    async fn execute(self, client: &QvickClient) -> Result<()> {
        match self {
            Self::List => {
                for notice in client.list_notices().await? {
                    println!(
                        "[{}] {} ({}, {})",
                        notice.idx, notice.title, notice.writer, notice.created_date_time
                    );
                }
            }
            Self::Create { title, content } => {
                client.create_notice(title, content).await?;
                println!("Notice published");
            }
            Self::Delete { idx } => {
                client.delete_notice(idx).await?;
                println!("Notice {idx} deleted");
            }
        }

        Ok(())
    }
}
