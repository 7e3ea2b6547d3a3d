//! Interactive shell
//!
//! Renders the live task list whenever the pipeline emits and turns typed
//! commands into controller calls.

use std::sync::{Arc, Mutex};

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use taskstore::{SortOrder, Task, TaskId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::controller::{TaskListController, TasksEvent};
use crate::editor::{AddEditTaskEvent, EditError};
use crate::pipeline::FilterPipeline;

/// One line of task list output
pub fn format_task_line(task: &Task) -> String {
    let check = if task.completed { "[x]" } else { "[ ]" };
    let star = if task.important { "!" } else { " " };
    let name = if task.completed {
        task.name.dimmed().strikethrough().to_string()
    } else if task.important {
        task.name.bold().to_string()
    } else {
        task.name.clone()
    };
    format!("{:>4} {} {} {}", task.id, check, star.bright_red(), name)
}

/// Run the shell until /quit or Ctrl+D
pub async fn run_interactive(ctx: &AppContext, search: String) -> Result<()> {
    let mut session = ShellSession::new(ctx, search)?;
    session.run().await
}

enum SlashResult {
    Continue,
    Quit,
}

struct ShellSession {
    ctx: AppContext,
    controller: TaskListController,
    events: mpsc::Receiver<TasksEvent>,
    latest: Arc<Mutex<Vec<Task>>>,
    render: JoinHandle<()>,
    last_deleted: Option<Task>,
}

impl ShellSession {
    fn new(ctx: &AppContext, search: String) -> Result<Self> {
        let mut controller = ctx.task_list(search);
        let events = controller
            .take_events()
            .ok_or_else(|| eyre::eyre!("Task list events already taken"))?;
        let latest = Arc::new(Mutex::new(Vec::new()));
        let render = tokio::spawn(render_loop(controller.tasks(), latest.clone()));

        Ok(Self {
            ctx: ctx.clone(),
            controller,
            events,
            latest,
            render,
            last_deleted: None,
        })
    }

    async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input) {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    }

                    if let Err(e) = self.handle_command(input).await {
                        println!("{} {}", "Error:".red(), e);
                    }
                    if let Err(e) = self.drain_events(&mut rl).await {
                        println!("{} {}", "Error:".red(), e);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!("{}", "tasklist shell".bold());
        println!("Type {} for commands, {} to exit.", "/help".cyan(), "/quit".cyan());
        let search = self.controller.search_query();
        if !search.is_empty() {
            println!("Search: {}", search.yellow());
        }
        println!();
    }

    fn handle_slash_command(&self, input: &str) -> SlashResult {
        match input {
            "/quit" | "/exit" | "/q" => SlashResult::Quit,
            "/help" | "/h" | "/?" => {
                print_help();
                SlashResult::Continue
            }
            "/list" | "/l" => {
                match self.latest.lock() {
                    Ok(tasks) => print_tasks(&tasks),
                    Err(e) => warn!(error = %e, "Task list lock poisoned"),
                }
                SlashResult::Continue
            }
            other => {
                println!("Unknown command: {} (try /help)", other.yellow());
                SlashResult::Continue
            }
        }
    }

    async fn handle_command(&mut self, input: &str) -> Result<()> {
        debug!(%input, "handle_command: called");
        let (command, rest) = match input.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (input, ""),
        };

        match command {
            "search" => {
                self.controller.set_search_query(rest);
            }
            "sort" => {
                let order: SortOrder = rest.parse().map_err(|e| eyre::eyre!("{}", e))?;
                self.controller.on_sort_order_selected(order).await?;
            }
            "hide" => {
                let hide = parse_switch(rest)?;
                self.controller.on_hide_completed_click(hide).await?;
            }
            "add" => {
                if rest.is_empty() {
                    self.controller.on_add_new_task_click();
                } else {
                    let (name, important) = split_importance(rest);
                    self.save(None, name, important).await?;
                }
            }
            "edit" => {
                let task = self.task(rest).await?;
                self.controller.on_task_selected(task);
            }
            "check" | "uncheck" => {
                let task = self.task(rest).await?;
                self.controller
                    .on_task_checked_changed(task, command == "check")
                    .await?;
            }
            "delete" | "rm" => {
                let task = self.task(rest).await?;
                if !self.controller.on_task_swiped(task).await? {
                    println!("Nothing to delete");
                }
            }
            "undo" => match self.last_deleted.take() {
                Some(task) => {
                    self.controller.on_undo_delete_click(task).await?;
                }
                None => println!("Nothing to undo"),
            },
            "clear-completed" => {
                self.controller.on_delete_all_completed_click();
            }
            other => {
                println!("Unknown command: {} (try /help)", other.yellow());
            }
        }
        Ok(())
    }

    async fn drain_events(&mut self, rl: &mut DefaultEditor) -> Result<()> {
        while let Ok(event) = self.events.try_recv() {
            debug!(?event, "drain_events: handling");
            match event {
                TasksEvent::NavigateToAddTaskScreen => {
                    let Some(line) = prompt(rl, "New task (prefix ! for important): ")? else {
                        continue;
                    };
                    let (name, important) = split_importance(&line);
                    self.save(None, name, important).await?;
                }
                TasksEvent::NavigateToEditTaskScreen(task) => {
                    let Some(line) = prompt(rl, &format!("Name [{}]: ", task.name))? else {
                        continue;
                    };
                    let name = if line.is_empty() { task.name.clone() } else { line };
                    let important = prompt_yes_no(rl, "Important?", task.important)?;
                    self.save(Some(task), &name, important).await?;
                }
                TasksEvent::ShowUndoDeleteTaskMessage(task) => {
                    println!("Deleted '{}'. Type {} to restore it.", task.name, "undo".cyan());
                    self.last_deleted = Some(task);
                }
                TasksEvent::ShowTaskSavedConfirmationMessage(message) => {
                    println!("{}", message.green());
                }
                TasksEvent::NavigateToDeleteAllCompletedScreen => {
                    if prompt_yes_no(rl, "Delete all completed tasks?", false)? {
                        let count = self.controller.on_delete_all_completed_confirmed().await?;
                        println!("Deleted {} completed task(s)", count);
                    }
                }
            }
        }
        Ok(())
    }

    /// Save through an editor and report the result to the list
    async fn save(&self, task: Option<Task>, name: &str, important: bool) -> Result<()> {
        let mut editor = self.ctx.editor(task);
        let mut editor_events = editor
            .take_events()
            .ok_or_else(|| eyre::eyre!("Editor events already taken"))?;
        editor.set_name(name);
        editor.set_important(important);

        let outcome = editor.on_save_click().await;
        while let Ok(event) = editor_events.try_recv() {
            match event {
                AddEditTaskEvent::ShowInvalidInputMessage(message) => println!("{}", message.red()),
                AddEditTaskEvent::NavigateBackWithResult(result) => self.controller.on_add_edit_result(result),
            }
        }
        // validation failures were already shown
        match outcome {
            Ok(_) | Err(EditError::Validation(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn task(&self, arg: &str) -> Result<Task> {
        let id: TaskId = arg
            .parse()
            .map_err(|_| eyre::eyre!("Expected a task id, got '{}'", arg))?;
        Ok(self.ctx.store().get_required(id).await?)
    }
}

impl Drop for ShellSession {
    fn drop(&mut self) {
        self.render.abort();
    }
}

async fn render_loop(mut pipeline: FilterPipeline, latest: Arc<Mutex<Vec<Task>>>) {
    while let Some(tasks) = pipeline.next().await {
        print_tasks(&tasks);
        match latest.lock() {
            Ok(mut guard) => *guard = tasks,
            Err(e) => warn!(error = %e, "Task list lock poisoned"),
        }
    }
    debug!("render_loop: pipeline ended");
}

fn print_tasks(tasks: &[Task]) {
    println!();
    if tasks.is_empty() {
        println!("{}", "  (no tasks)".dimmed());
    }
    for task in tasks {
        println!("{}", format_task_line(task));
    }
    println!();
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  search <text>      filter by name (empty clears)");
    println!("  sort <name|date>   change sort order");
    println!("  hide <on|off>      hide completed tasks");
    println!("  add [!]<name>      add a task (! marks it important)");
    println!("  edit <id>          edit a task");
    println!("  check <id>         mark completed");
    println!("  uncheck <id>       mark not completed");
    println!("  delete <id>        delete a task");
    println!("  undo               restore the last deleted task");
    println!("  clear-completed    delete all completed tasks");
    println!("  /list              show the list again");
    println!("  /quit              exit");
}

fn split_importance(input: &str) -> (&str, bool) {
    match input.strip_prefix('!') {
        Some(name) => (name.trim(), true),
        None => (input, false),
    }
}

fn parse_switch(input: &str) -> Result<bool> {
    match input.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(eyre::eyre!("Expected on or off, got '{}'", other)),
    }
}

/// Read one line; None when the user cancels
fn prompt(rl: &mut DefaultEditor, message: &str) -> Result<Option<String>> {
    match rl.readline(message) {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
    }
}

fn prompt_yes_no(rl: &mut DefaultEditor, question: &str, default: bool) -> Result<bool> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let Some(answer) = prompt(rl, &format!("{} {} ", question, hint))? else {
        return Ok(false);
    };
    Ok(match answer.to_lowercase().as_str() {
        "" => default,
        "y" | "yes" => true,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_importance() {
        assert_eq!(split_importance("!Pay rent"), ("Pay rent", true));
        assert_eq!(split_importance("Pay rent"), ("Pay rent", false));
        assert_eq!(split_importance("! spaced"), ("spaced", true));
    }

    #[test]
    fn test_parse_switch() {
        assert!(parse_switch("on").unwrap());
        assert!(!parse_switch("OFF").unwrap());
        assert!(parse_switch("maybe").is_err());
    }

    #[test]
    fn test_format_task_line_shows_id_and_state() {
        colored::control::set_override(false);
        let mut task = Task::new("Call mom").with_completed(true);
        task.id = 7;
        let line = format_task_line(&task);
        assert!(line.contains("   7 [x]"));
        assert!(line.ends_with("Call mom"));
    }
}
