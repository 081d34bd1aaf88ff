// Entity Models
//
// Each record has:
// - Stable identity (UUID) assigned on insert
// - An owner (`user_id`) checked before every mutation
// - createdAt / updatedAt timestamps

pub mod category;
pub mod expense;
pub mod user;
pub mod yield_record;

pub use category::{ExpenseCategory, Season};
pub use expense::{Expense, ExpenseChanges, NewExpense};
pub use user::{Registration, User};
pub use yield_record::{NewYield, YieldChanges, YieldRecord};

use crate::error::{AppError, Result};

/// Fails with 403 unless `caller` owns the record
pub(crate) fn ensure_owner(owner: &str, caller: &str, message: &str) -> Result<()> {
    if owner == caller {
        Ok(())
    } else {
        Err(AppError::forbidden(message))
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
