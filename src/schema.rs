// 📐 Shape Layer - Payload Validation
// Turns loosely-typed request payloads into typed, checked values.
// Field errors are collected and joined into one message for the client.

use crate::entities::expense::{ExpenseChanges, NewExpense};
use crate::entities::user::Registration;
use crate::entities::yield_record::{NewYield, YieldChanges};
use crate::entities::{ExpenseCategory, Season};
use crate::error::AppError;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

impl From<Vec<ValidationError>> for AppError {
    fn from(errors: Vec<ValidationError>) -> Self {
        let message = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        AppError::Validation(message)
    }
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// Body of `POST /api/expenses`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    pub date: Option<String>,
    pub crop: Option<String>,
    pub category: Option<String>,
    pub season: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
}

/// Body of `PUT /api/expenses/:id` - every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePatch {
    pub date: Option<String>,
    pub crop: Option<String>,
    pub category: Option<String>,
    pub season: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "explicit_number")]
    pub amount: Option<Option<f64>>,
}

/// Body of `POST /api/yields`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldDraft {
    pub date: Option<String>,
    pub crop: Option<String>,
    pub season: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub price_per_unit: Option<f64>,
}

/// Body of `PUT /api/yields/:id` - every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldPatch {
    pub date: Option<String>,
    pub crop: Option<String>,
    pub season: Option<String>,
    #[serde(default, deserialize_with = "explicit_number")]
    pub quantity: Option<Option<f64>>,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "explicit_number")]
    pub price_per_unit: Option<Option<f64>>,
}

/// Absent field -> `None`, `"field": null` -> `Some(None)`
fn explicit_number<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

// ============================================================================
// FIELD HELPERS
// ============================================================================

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept)
pub fn parse_record_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Trimmed text, or None when absent or blank
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// A patch value that was sent must be a positive number; `null` counts as sent
fn check_positive_patch(
    field: &str,
    value: Option<Option<f64>>,
    message: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<f64> {
    match value {
        Some(Some(v)) if is_positive(v) => Some(v),
        Some(_) => {
            errors.push(ValidationError::new(field, message));
            None
        }
        None => None,
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_date(raw: &str, errors: &mut Vec<ValidationError>) -> Option<NaiveDate> {
    let parsed = parse_record_date(raw);
    if parsed.is_none() {
        errors.push(ValidationError::new("date", "Invalid date"));
    }
    parsed
}

fn check_category(raw: &str, errors: &mut Vec<ValidationError>) -> Option<ExpenseCategory> {
    match raw.trim().parse() {
        Ok(category) => Some(category),
        Err(message) => {
            errors.push(ValidationError::new("category", message));
            None
        }
    }
}

/// Blank season means "not set"
fn check_season(raw: Option<&str>, errors: &mut Vec<ValidationError>) -> Option<Season> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse() {
        Ok(season) => Some(season),
        Err(message) => {
            errors.push(ValidationError::new("season", message));
            None
        }
    }
}

fn check_not_blank(
    field: &str,
    value: &Option<String>,
    message: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match value {
        None => None,
        Some(_) => {
            let trimmed = present(value);
            if trimmed.is_none() {
                errors.push(ValidationError::new(field, message));
            }
            trimmed
        }
    }
}

// ============================================================================
// EXPENSES
// ============================================================================

pub fn validate_expense_draft(draft: &ExpenseDraft) -> ValidationResult<NewExpense> {
    let (date, crop, category, amount) = match (
        present(&draft.date),
        present(&draft.crop),
        present(&draft.category),
        draft.amount,
    ) {
        (Some(date), Some(crop), Some(category), Some(amount)) => (date, crop, category, amount),
        _ => {
            return Err(vec![ValidationError::new(
                "request",
                "Please provide date, crop, category, and amount",
            )])
        }
    };

    let mut errors = Vec::new();

    if !is_positive(amount) {
        errors.push(ValidationError::new("amount", "Amount must be greater than zero"));
    }
    let date = check_date(&date, &mut errors);
    let category = check_category(&category, &mut errors);
    let season = check_season(draft.season.as_deref(), &mut errors);

    match (date, category) {
        (Some(date), Some(category)) if errors.is_empty() => Ok(NewExpense {
            date,
            crop,
            category,
            season,
            description: present(&draft.description),
            amount,
        }),
        _ => Err(errors),
    }
}

pub fn validate_expense_patch(patch: &ExpensePatch) -> ValidationResult<ExpenseChanges> {
    let mut errors = Vec::new();

    let amount = check_positive_patch(
        "amount",
        patch.amount,
        "Amount must be greater than zero",
        &mut errors,
    );

    let date = patch
        .date
        .as_deref()
        .and_then(|raw| check_date(raw, &mut errors));
    let crop = check_not_blank("crop", &patch.crop, "Crop name is required", &mut errors);
    let category = patch
        .category
        .as_deref()
        .and_then(|raw| check_category(raw, &mut errors));
    let season = patch
        .season
        .as_deref()
        .map(|raw| check_season(Some(raw), &mut errors));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ExpenseChanges {
        date,
        crop,
        category,
        season,
        description: patch.description.as_ref().map(|_| present(&patch.description)),
        amount,
    })
}

// ============================================================================
// YIELDS
// ============================================================================

pub const TOTAL_REVENUE_TOO_LARGE: &str = "Total revenue is too large";

pub fn validate_yield_draft(draft: &YieldDraft) -> ValidationResult<NewYield> {
    let (date, crop, quantity, unit, price_per_unit) = match (
        present(&draft.date),
        present(&draft.crop),
        draft.quantity,
        present(&draft.unit),
        draft.price_per_unit,
    ) {
        (Some(date), Some(crop), Some(quantity), Some(unit), Some(price)) => {
            (date, crop, quantity, unit, price)
        }
        _ => {
            return Err(vec![ValidationError::new(
                "request",
                "Please provide all required fields: date, crop, quantity, unit, pricePerUnit",
            )])
        }
    };

    let mut errors = Vec::new();

    if !is_positive(quantity) || !is_positive(price_per_unit) {
        errors.push(ValidationError::new(
            "quantity",
            "Quantity and price per unit must be greater than zero",
        ));
    } else if !(quantity * price_per_unit).is_finite() {
        errors.push(ValidationError::new("totalRevenue", TOTAL_REVENUE_TOO_LARGE));
    }
    let date = check_date(&date, &mut errors);
    let season = check_season(draft.season.as_deref(), &mut errors);

    match date {
        Some(date) if errors.is_empty() => Ok(NewYield {
            date,
            crop,
            season,
            quantity,
            unit,
            price_per_unit,
        }),
        _ => Err(errors),
    }
}

pub fn validate_yield_patch(patch: &YieldPatch) -> ValidationResult<YieldChanges> {
    let mut errors = Vec::new();

    let quantity = check_positive_patch(
        "quantity",
        patch.quantity,
        "Quantity must be greater than zero",
        &mut errors,
    );
    let price_per_unit = check_positive_patch(
        "pricePerUnit",
        patch.price_per_unit,
        "Price per unit must be greater than zero",
        &mut errors,
    );

    let date = patch
        .date
        .as_deref()
        .and_then(|raw| check_date(raw, &mut errors));
    let crop = check_not_blank("crop", &patch.crop, "Crop name is required", &mut errors);
    let unit = check_not_blank("unit", &patch.unit, "Unit is required", &mut errors);
    let season = patch
        .season
        .as_deref()
        .map(|raw| check_season(Some(raw), &mut errors));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(YieldChanges {
        date,
        crop,
        season,
        quantity,
        unit,
        price_per_unit,
    })
}

// ============================================================================
// USERS
// ============================================================================

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn validate_registration(registration: &Registration) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if registration.full_name.trim().is_empty() {
        errors.push(ValidationError::new("fullName", "Full name is required"));
    }

    let email = registration.email.trim();
    if email.is_empty() || !email.contains('@') {
        errors.push(ValidationError::new("email", "Please provide a valid email"));
    }

    if registration.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(ValidationError::new(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn wheat_draft() -> ExpenseDraft {
        ExpenseDraft {
            date: Some("2025-01-15".to_string()),
            crop: Some("  Wheat ".to_string()),
            category: Some("Seeds".to_string()),
            season: Some("Rabi".to_string()),
            description: Some("  ".to_string()),
            amount: Some(1200.0),
        }
    }

    fn message_of(errors: Vec<ValidationError>) -> String {
        AppError::from(errors).to_string()
    }

    #[test]
    fn test_parse_record_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(parse_record_date("2025-03-09"), Some(expected));
        assert_eq!(parse_record_date("2025-03-09T18:30:00.000Z"), Some(expected));
        assert_eq!(parse_record_date("09/03/2025"), None);
    }

    #[test]
    fn test_valid_expense_draft_is_trimmed() {
        let expense = validate_expense_draft(&wheat_draft()).unwrap();

        assert_eq!(expense.crop, "Wheat");
        assert_eq!(expense.category, ExpenseCategory::Seeds);
        assert_eq!(expense.season, Some(Season::Rabi));
        assert_eq!(expense.description, None);
        assert_eq!(expense.amount, 1200.0);
    }

    #[test]
    fn test_expense_draft_missing_fields() {
        let mut draft = wheat_draft();
        draft.crop = Some("   ".to_string());

        let message = message_of(validate_expense_draft(&draft).unwrap_err());
        assert_eq!(message, "Please provide date, crop, category, and amount");
    }

    #[test]
    fn test_expense_draft_collects_field_errors() {
        let mut draft = wheat_draft();
        draft.amount = Some(0.0);
        draft.category = Some("Snacks".to_string());

        let message = message_of(validate_expense_draft(&draft).unwrap_err());
        assert_eq!(
            message,
            "Amount must be greater than zero, Snacks is not a valid category"
        );
    }

    #[test]
    fn test_expense_draft_rejects_nan_amount() {
        let mut draft = wheat_draft();
        draft.amount = Some(f64::NAN);
        assert!(validate_expense_draft(&draft).is_err());
    }

    #[test]
    fn test_expense_patch_partial() {
        let patch = ExpensePatch {
            amount: Some(Some(50.0)),
            description: Some("".to_string()),
            ..Default::default()
        };

        let changes = validate_expense_patch(&patch).unwrap();
        assert_eq!(changes.amount, Some(50.0));
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.crop, None);
        assert_eq!(changes.category, None);
    }

    #[test]
    fn test_expense_patch_rejects_non_positive_amount_and_blank_crop() {
        let patch = ExpensePatch {
            amount: Some(Some(-1.0)),
            crop: Some(" ".to_string()),
            ..Default::default()
        };

        let errors = validate_expense_patch(&patch).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "amount"));
        assert!(errors.iter().any(|e| e.field == "crop"));
    }

    #[test]
    fn test_yield_draft_requires_positive_numbers() {
        let draft = YieldDraft {
            date: Some("2025-04-01".to_string()),
            crop: Some("Rice".to_string()),
            season: None,
            quantity: Some(10.0),
            unit: Some("quintal".to_string()),
            price_per_unit: Some(-25.0),
        };

        let message = message_of(validate_yield_draft(&draft).unwrap_err());
        assert_eq!(message, "Quantity and price per unit must be greater than zero");
    }

    #[test]
    fn test_yield_draft_missing_unit() {
        let draft = YieldDraft {
            date: Some("2025-04-01".to_string()),
            crop: Some("Rice".to_string()),
            season: None,
            quantity: Some(10.0),
            unit: None,
            price_per_unit: Some(25.0),
        };

        let message = message_of(validate_yield_draft(&draft).unwrap_err());
        assert!(message.starts_with("Please provide all required fields"));
    }

    #[test]
    fn test_yield_patch_messages() {
        let patch = YieldPatch {
            quantity: Some(Some(0.0)),
            price_per_unit: Some(Some(0.0)),
            ..Default::default()
        };

        let message = message_of(validate_yield_patch(&patch).unwrap_err());
        assert_eq!(
            message,
            "Quantity must be greater than zero, Price per unit must be greater than zero"
        );
    }

    #[test]
    fn test_yield_draft_rejects_overflowing_revenue() {
        let draft = YieldDraft {
            date: Some("2025-04-01".to_string()),
            crop: Some("Wheat".to_string()),
            season: None,
            quantity: Some(1e200),
            unit: Some("kg".to_string()),
            price_per_unit: Some(1e200),
        };

        let message = message_of(validate_yield_draft(&draft).unwrap_err());
        assert_eq!(message, TOTAL_REVENUE_TOO_LARGE);
    }

    #[test]
    fn test_patch_null_numbers_are_rejected() {
        let patch: ExpensePatch =
            serde_json::from_str(r#"{"amount": null, "crop": null}"#).unwrap();
        assert_eq!(patch.amount, Some(None));
        let message = message_of(validate_expense_patch(&patch).unwrap_err());
        assert_eq!(message, "Amount must be greater than zero");

        // Absent stays absent
        let patch: ExpensePatch = serde_json::from_str(r#"{"crop": "Rice"}"#).unwrap();
        assert_eq!(patch.amount, None);
        assert!(validate_expense_patch(&patch).is_ok());

        let patch: YieldPatch = serde_json::from_str(r#"{"pricePerUnit": null}"#).unwrap();
        assert_eq!(patch.quantity, None);
        let message = message_of(validate_yield_patch(&patch).unwrap_err());
        assert_eq!(message, "Price per unit must be greater than zero");
    }

    #[test]
    fn test_registration_rules() {
        let registration = Registration {
            full_name: " ".to_string(),
            email: "ravi.example.com".to_string(),
            password: "123".to_string(),
        };

        let errors = validate_registration(&registration).unwrap_err();
        assert_eq!(errors.len(), 3);

        let registration = Registration {
            full_name: "Ravi Kumar".to_string(),
            email: "ravi@example.com".to_string(),
            password: "harvest2025".to_string(),
        };
        assert!(validate_registration(&registration).is_ok());
    }
}
