//! tasklist - reactive to-do list
//!
//! CLI entry point: one-shot commands over the task and preference stores,
//! plus an interactive shell with a live list.

use std::fs;
use std::path::Path;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use tasklist::cli::{Cli, Command};
use tasklist::config::Config;
use tasklist::context::AppContext;
use tasklist::editor::AddEditTaskEvent;
use tasklist::shell;
use taskstore::{SortOrder, TaskId};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>, log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("tasklist.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref(), &config.log_dir())
        .context("Failed to setup logging")?;
    info!(data_dir = %config.storage.data_dir.display(), "tasklist starting");

    let ctx = AppContext::open(&config).context("Failed to open stores")?;

    debug!(command = ?cli.command, "main: dispatching command");
    let result = match cli.command {
        Some(Command::List { search, json }) => cmd_list(&ctx, search, json).await,
        Some(Command::Add { name, important }) => cmd_add(&ctx, name, important).await,
        Some(Command::Edit { id, name, important }) => cmd_edit(&ctx, id, name, important).await,
        Some(Command::Check { id }) => cmd_set_completed(&ctx, id, true).await,
        Some(Command::Uncheck { id }) => cmd_set_completed(&ctx, id, false).await,
        Some(Command::Delete { id }) => cmd_delete(&ctx, id).await,
        Some(Command::ClearCompleted) => cmd_clear_completed(&ctx).await,
        Some(Command::Sort { order }) => cmd_sort(&ctx, order).await,
        Some(Command::HideCompleted { hide }) => cmd_hide_completed(&ctx, hide).await,
        Some(Command::Prefs) => cmd_prefs(&ctx),
        Some(Command::Shell { search }) => shell::run_interactive(&ctx, search).await,
        None => {
            debug!("main: no command specified, launching shell");
            shell::run_interactive(&ctx, String::new()).await
        }
    };

    ctx.shutdown().await;
    result
}

/// Print the first emission of a filter pipeline
async fn cmd_list(ctx: &AppContext, search: String, json: bool) -> Result<()> {
    debug!(%search, json, "cmd_list: called");
    let controller = ctx.task_list(search);
    let mut pipeline = controller.tasks();
    let tasks = pipeline
        .next()
        .await
        .ok_or_else(|| eyre::eyre!("Task list ended before producing a result"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else if tasks.is_empty() {
        println!("No tasks");
    } else {
        for task in &tasks {
            println!("{}", shell::format_task_line(task));
        }
    }
    Ok(())
}

async fn cmd_add(ctx: &AppContext, name: String, important: bool) -> Result<()> {
    debug!(%name, important, "cmd_add: called");
    let mut editor = ctx.editor(None);
    editor.set_name(name);
    editor.set_important(important);
    save(editor).await
}

async fn cmd_edit(ctx: &AppContext, id: TaskId, name: Option<String>, important: Option<bool>) -> Result<()> {
    debug!(%id, ?name, ?important, "cmd_edit: called");
    let task = ctx.store().get_required(id).await?;
    let mut editor = ctx.editor(Some(task));
    if let Some(name) = name {
        editor.set_name(name);
    }
    if let Some(important) = important {
        editor.set_important(important);
    }
    save(editor).await
}

/// Save through the editor, printing its messages
async fn save(mut editor: tasklist::AddEditTaskController) -> Result<()> {
    let mut events = editor
        .take_events()
        .ok_or_else(|| eyre::eyre!("Editor events already taken"))?;
    let outcome = editor.on_save_click().await;
    while let Ok(event) = events.try_recv() {
        if let AddEditTaskEvent::NavigateBackWithResult(result) = event {
            println!("{}", result.confirmation_message());
        }
    }
    outcome?;
    Ok(())
}

async fn cmd_set_completed(ctx: &AppContext, id: TaskId, completed: bool) -> Result<()> {
    debug!(%id, completed, "cmd_set_completed: called");
    let task = ctx.store().get_required(id).await?;
    let name = task.name.clone();
    ctx.task_list("").on_task_checked_changed(task, completed).await?;
    let state = if completed { "completed" } else { "not completed" };
    println!("Marked '{}' {}", name, state);
    Ok(())
}

async fn cmd_delete(ctx: &AppContext, id: TaskId) -> Result<()> {
    debug!(%id, "cmd_delete: called");
    let Some(task) = ctx.store().get(id).await? else {
        println!("No task with id {}", id);
        return Ok(());
    };
    let name = task.name.clone();
    if ctx.task_list("").on_task_swiped(task).await? {
        println!("Deleted '{}'", name);
    } else {
        println!("No task with id {}", id);
    }
    Ok(())
}

async fn cmd_clear_completed(ctx: &AppContext) -> Result<()> {
    debug!("cmd_clear_completed: called");
    let count = ctx.task_list("").on_delete_all_completed_confirmed().await?;
    println!("Deleted {} completed task(s)", count);
    Ok(())
}

async fn cmd_sort(ctx: &AppContext, order: SortOrder) -> Result<()> {
    debug!(%order, "cmd_sort: called");
    ctx.task_list("").on_sort_order_selected(order).await?;
    println!("Sort order: {}", order);
    Ok(())
}

async fn cmd_hide_completed(ctx: &AppContext, hide: bool) -> Result<()> {
    debug!(hide, "cmd_hide_completed: called");
    ctx.task_list("").on_hide_completed_click(hide).await?;
    println!("Hide completed: {}", hide);
    Ok(())
}

fn cmd_prefs(ctx: &AppContext) -> Result<()> {
    debug!("cmd_prefs: called");
    let prefs = ctx.preferences().current();
    print!("{}", serde_yaml::to_string(&prefs)?);
    Ok(())
}
