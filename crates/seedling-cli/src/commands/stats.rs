use clap::Subcommand;
use seedling_core::{Config, DailyLedger, SqliteStore};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's focus totals
    Today,
    /// The raw stored record, whatever day it belongs to
    Stored,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SqliteStore::open(&config.storage.namespace)?;
    let ledger = DailyLedger::with_local_dates(store);

    match action {
        StatsAction::Today => {
            let totals = ledger.current_display_stats();
            let json = serde_json::json!({
                "date": ledger.today(),
                "minutes": totals.minutes,
                "sessions": totals.sessions,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        StatsAction::Stored => {
            println!("{}", serde_json::to_string_pretty(&ledger.load())?);
        }
    }
    Ok(())
}
