use clap::Subcommand;
use seedling_core::{Config, SessionSettings};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "session.duration_min", "audio.default_track")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value (JSON for lists, e.g. '["3:50","2:00"]')
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok");
            if key.starts_with("session.") {
                println!("{}", describe_session(&config.session_settings()?));
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
            println!("{}", describe_session(&config.session_settings()?));
        }
    }
    Ok(())
}

/// One-line summary of the session a `seedling session` run would use,
/// milestones in the order the clock passes them.
fn describe_session(settings: &SessionSettings) -> String {
    let milestones = settings.milestones.thresholds().join(" -> ");
    format!(
        "session: {} min, grows at {} (max stage {})",
        settings.duration_min(),
        if milestones.is_empty() { "never" } else { milestones.as_str() },
        settings.milestones.ceiling(),
    )
}
