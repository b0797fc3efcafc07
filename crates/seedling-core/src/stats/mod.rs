//! Daily statistics: the persisted ledger and the task that feeds it.

pub mod ledger;
mod recorder;

pub use ledger::{
    format_date, DailyLedger, DailyStats, DailyTotals, DateSource, LocalDates, DATE_FORMAT,
};
pub use recorder::spawn_recorder;
