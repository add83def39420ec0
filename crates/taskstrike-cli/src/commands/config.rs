use clap::Subcommand;
use taskstrike_core::storage::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one configuration value
    Get {
        /// Dot-separated key, e.g. `timer.tick_interval`
        key: String,
    },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Print the whole configuration as TOML
    List,
    /// Print the config file path
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown configuration key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("{key} = {value}");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}
