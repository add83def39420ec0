use chrono::Utc;
use clap::Subcommand;
use taskstrike_core::storage::Database;

#[derive(Subcommand)]
pub enum TodoAction {
    /// Show the to-do list
    List {
        /// JSON output
        #[arg(long)]
        json: bool,
    },
    /// Remove tasks by name
    Remove {
        /// Name of the task to remove
        task_name: String,
    },
}

/// `add` lives at the top level of the CLI but belongs with the other
/// to-do operations.
pub fn add(task_name: String, duration_min: u32) -> Result<(), Box<dyn std::error::Error>> {
    if task_name.trim().is_empty() {
        return Err("task name must not be empty".into());
    }
    let db = Database::open()?;
    db.todo_add(&task_name, duration_min, Utc::now())?;
    println!("Task '{task_name}' added to the to-do list.");
    Ok(())
}

pub fn run(action: TodoAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TodoAction::List { json } => {
            let items = db.todo_list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("The to-do list is empty.");
            } else {
                println!("{:<30} {:>9}  {}", "Task", "Minutes", "Added");
                for item in items {
                    println!(
                        "{:<30} {:>9}  {}",
                        item.task_name,
                        item.duration_min,
                        item.added_date.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        TodoAction::Remove { task_name } => {
            let removed = db.todo_remove(&task_name)?;
            if removed == 0 {
                println!("No to-do entry named '{task_name}'.");
            } else {
                println!("Removed {removed} to-do entry(ies) named '{task_name}'.");
            }
        }
    }
    Ok(())
}
