use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use rollcall_core::app::{Access, BaselineEntry, HoursRequest, UpdateRequest};
use rollcall_core::domain::{
    StatusPeriod, TaskAssignment, TaskId, TaskStatus, Timestamp, UserId, UserState,
};
use rollcall_core::impls::{InMemoryStatusStore, InMemoryTaskBoard, Snapshot};
use rollcall_core::ports::{Clock, FixedClock, SystemClock};
use rollcall_core::{EngineBuilder, EngineConfig, StatusEngine, StatusError};

/// rollcall: user status lifecycle operations against a JSON snapshot
#[derive(Parser)]
#[command(name = "rollcall", version, about)]
struct Cli {
    /// Snapshot file holding userStatus, users and tasks
    #[arg(long, global = true, default_value = "rollcall.json")]
    data: PathBuf,

    /// Engine config (camelCase JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretend the current time is this instant (RFC 3339 or epoch ms)
    #[arg(long, global = true)]
    now: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show one user's status
    Get { user: String },

    /// List statuses, optionally only those currently in STATE
    List {
        #[arg(long)]
        state: Option<UserState>,
    },

    /// Set a status (today or earlier: now; later: scheduled)
    Set {
        user: String,
        #[arg(long)]
        state: Option<UserState>,
        /// Start (RFC 3339 or epoch ms); defaults to now
        #[arg(long)]
        from: Option<String>,
        /// End of an OOO window (RFC 3339 or epoch ms)
        #[arg(long)]
        until: Option<String>,
        #[arg(long, default_value = "")]
        message: String,
        /// Committed monthly hours
        #[arg(long)]
        hours: Option<f64>,
    },

    /// Self-service edit: change only the message of the current status
    Edit {
        user: String,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        hours: Option<f64>,
    },

    /// End the current OOO period now
    CancelOoo { user: String },

    /// Delete a user's status document
    Delete { user: String },

    /// A task was assigned to the user (by id or --username)
    TaskAssigned {
        user: Option<String>,
        #[arg(long, conflicts_with = "user")]
        username: Option<String>,
        /// Record the assignment on the task board too
        #[arg(long)]
        task: Option<String>,
    },

    /// A task of the user was completed
    TaskCompleted {
        user: String,
        /// Mark this task COMPLETED on the task board first
        #[arg(long)]
        task: Option<String>,
    },

    /// Promote or expire all due future statuses
    Reconcile,

    /// Apply ACTIVE/IDLE baselines from a JSON file of [{userId, state}]
    Sync { file: PathBuf },
}

impl Command {
    fn is_read_only(&self) -> bool {
        matches!(self, Command::Get { .. } | Command::List { .. })
    }
}

fn parse_instant(text: &str) -> Result<Timestamp> {
    if let Ok(ms) = text.parse::<Timestamp>() {
        return Ok(ms);
    }
    let parsed = DateTime::parse_from_rfc3339(text)
        .with_context(|| format!("'{text}' is neither epoch ms nor RFC 3339"))?;
    Ok(parsed.with_timezone(&Utc).timestamp_millis())
}

fn clock_from(now: Option<&str>) -> Result<Arc<dyn Clock>> {
    let clock: Arc<dyn Clock> = match now {
        Some(text) => Arc::new(FixedClock::from_millis(parse_instant(text)?)),
        None => Arc::new(SystemClock),
    };
    Ok(clock)
}

async fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::load(path).await?),
        None => Ok(EngineConfig::default()),
    }
}

async fn execute(
    command: Command,
    engine: &StatusEngine,
    board: &InMemoryTaskBoard,
    clock: &dyn Clock,
) -> Result<Value> {
    let value = match command {
        Command::Get { user } => json!({
            "message": "User Status found successfully.",
            "data": engine.service.get(&UserId::new(user)).await?,
        }),
        Command::List { state } => {
            let records = engine.service.list(state).await?;
            json!({
                "message": "All User Status found successfully.",
                "totalUserStatus": records.len(),
                "allUserStatus": records,
            })
        }
        Command::Set {
            user,
            state,
            from,
            until,
            message,
            hours,
        } => {
            let current_status = match state {
                Some(state) => {
                    let from = match from {
                        Some(text) => parse_instant(&text)?,
                        None => clock.now_millis(),
                    };
                    let mut period = StatusPeriod::new(state, from).with_message(message);
                    if let Some(until) = until {
                        period = period.with_until(parse_instant(&until)?);
                    }
                    Some(period)
                }
                None => None,
            };
            let request = UpdateRequest {
                current_status,
                monthly_hours: hours.map(|committed| HoursRequest { committed }),
            };
            let response = engine
                .service
                .update(&UserId::new(user), request, Access::Full)
                .await?;
            serde_json::to_value(response)?
        }
        Command::Edit {
            user,
            message,
            hours,
        } => {
            let user_id = UserId::new(user);
            let current_status = match message {
                Some(message) => {
                    let record = engine.service.get(&user_id).await?;
                    Some(record.current_status.with_message(message))
                }
                None => None,
            };
            let request = UpdateRequest {
                current_status,
                monthly_hours: hours.map(|committed| HoursRequest { committed }),
            };
            let response = engine
                .service
                .update(&user_id, request, Access::EditOnly)
                .await?;
            serde_json::to_value(response)?
        }
        Command::CancelOoo { user } => json!({
            "message": "Status updated successfully.",
            "data": engine.service.cancel_ooo(&UserId::new(user)).await?,
        }),
        Command::Delete { user } => {
            engine.service.delete(&UserId::new(user)).await?;
            json!({ "message": "UserStatus Deleted successfully." })
        }
        Command::TaskAssigned {
            user,
            username,
            task,
        } => {
            let outcome = match (user, username) {
                (Some(user), _) => {
                    let user_id = UserId::new(user);
                    if let Some(task) = task {
                        board
                            .upsert_task(TaskAssignment {
                                id: TaskId::new(task),
                                assignee: Some(user_id.clone()),
                                status: TaskStatus::Assigned,
                            })
                            .await;
                    }
                    engine.task_linked.on_task_assigned(&user_id).await
                }
                (None, Some(username)) => {
                    engine
                        .task_linked
                        .on_task_assigned_by_username(&username)
                        .await
                }
                (None, None) => bail!("either a user id or --username is required"),
            };
            serde_json::to_value(outcome)?
        }
        Command::TaskCompleted { user, task } => {
            if let Some(task) = task {
                let id = TaskId::new(task);
                if !board.set_task_status(&id, TaskStatus::Completed).await {
                    bail!("task {id} is not on the task board");
                }
            }
            let outcome = engine.task_linked.on_task_completed(&UserId::new(user)).await;
            serde_json::to_value(outcome)?
        }
        Command::Reconcile => {
            let summary = engine.reconciler.run().await?;
            json!({ "message": "User Status updated successfully.", "data": summary })
        }
        Command::Sync { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let entries: Vec<BaselineEntry> = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse {}", file.display()))?;
            let summary = engine.reconciler.sync_baselines(entries).await?;
            json!({ "message": "All User Status updated successfully.", "data": summary })
        }
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    rollcall_core::observability::init_logging(cli.verbose, cli.log_json);

    let config = load_config(cli.config.as_deref()).await?;
    let clock = clock_from(cli.now.as_deref())?;

    let snapshot = Snapshot::load(&cli.data).await?;
    let (store, board): (InMemoryStatusStore, InMemoryTaskBoard) =
        snapshot.into_adapters(config.batch_write_limit).await;

    let engine = EngineBuilder::new()
        .store(Arc::new(store.clone()))
        .task_lookup(Arc::new(board.clone()))
        .user_directory(Arc::new(board.clone()))
        .clock(clock.clone())
        .config(config)
        .build()?;

    let read_only = cli.command.is_read_only();
    let result = execute(cli.command, &engine, &board, clock.as_ref()).await;

    if !read_only {
        Snapshot::capture(&store, &board).await.save(&cli.data).await?;
        tracing::debug!(path = %cli.data.display(), "snapshot saved");
    }

    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => match err.downcast_ref::<StatusError>() {
            Some(status) => {
                let kind = status.kind();
                let body = json!({
                    "statusCode": kind.status_code(),
                    "error": kind.as_str(),
                    "message": status.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}
