use taskstrike_core::notify::DesktopNotifier;
use taskstrike_core::storage::{Config, Database};
use taskstrike_core::timer::Timer;

/// Run a countdown for one task and record the outcome.
pub fn run(
    config: &Config,
    task_name: String,
    duration_min: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    if task_name.trim().is_empty() {
        return Err("task name must not be empty".into());
    }
    let minutes = duration_min.unwrap_or(config.settings.default_duration);
    let total_seconds = i64::from(minutes) * 60;

    let db = Database::open()?;
    let notifier = DesktopNotifier::from_config(config);
    let mut timer = Timer::new(task_name, total_seconds, config.timer_config());
    timer.run(&db, &notifier);
    Ok(())
}
