use taskstrike_core::storage::Database;

/// Print the task history, most recent run first.
pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let history = db.task_history()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No task history yet.");
        return Ok(());
    }

    println!(
        "{:<30} {:<17} {:<17} {:>8} {:>8}  {}",
        "Task", "Start", "End", "Planned", "Actual", "Status"
    );
    for record in history {
        println!(
            "{:<30} {:<17} {:<17} {:>8} {:>8}  {}",
            record.task_name,
            record.start_time.format("%Y-%m-%d %H:%M"),
            record.end_time.format("%Y-%m-%d %H:%M"),
            record.initial_duration_min,
            record.actual_duration_min,
            record.status,
        );
    }
    Ok(())
}
