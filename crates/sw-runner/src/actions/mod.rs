//! Built-in custom actions.

mod backfill;
mod index;

pub use backfill::BackfillUploadDate;
pub use index::RepairUniqueIndex;

use crate::error::UpgradeError;

fn action_error(action: &str, message: impl Into<String>) -> UpgradeError {
    UpgradeError::Action {
        action: action.to_string(),
        message: message.into(),
    }
}
