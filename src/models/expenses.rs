use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Patch, ValidationError};

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern is valid"));

/// Exact monetary amount. Travels as a decimal string in both directions
/// and keeps the scale it was written with, so `12.50` stays `12.50`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Whole units an amount must stay below.
    pub const LIMIT: i64 = 1_000_000_000_000;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.0 <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount);
        }
        if self.0 >= Decimal::from(Self::LIMIT) {
            return Err(ValidationError::AmountTooLarge(Self::LIMIT));
        }

        Ok(())
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str_exact(s).map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::str::serialize(&self.0, serializer)
    }
}

// JSON numbers are refused: they would go through f64 on the way in.
impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        rust_decimal::serde::str::deserialize(deserializer).map(Self)
    }
}

/// Checks the `YYYY-MM-DD` shape only; `2024-02-30` passes.
pub fn validate_date(date: &str) -> Result<(), ValidationError> {
    if !DATE.is_match(date) {
        return Err(ValidationError::InvalidDate(date.to_string()));
    }

    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub amount: Amount,
    pub date: String,
    pub note: Option<String>,
}

/// Body of a create request. The owner is never taken from here.
#[derive(Clone, Debug, Deserialize)]
pub struct NewExpense {
    pub category_id: i64,
    pub amount: Amount,
    pub date: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.amount.validate()?;
        validate_date(&self.date)
    }
}

/// Body of a partial update.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExpenseUpdate {
    #[serde(default)]
    pub category_id: Patch<i64>,
    #[serde(default)]
    pub amount: Patch<Amount>,
    #[serde(default)]
    pub date: Patch<String>,
    #[serde(default)]
    pub note: Patch<String>,
}

impl ExpenseUpdate {
    /// Resolves the patch into concrete changes, applying the same rules as
    /// creation to every field that is present.
    pub fn validate(self) -> Result<ExpenseChanges, ValidationError> {
        let amount = self.amount.required("amount")?;
        if let Some(amount) = &amount {
            amount.validate()?;
        }

        let date = self.date.required("date")?;
        if let Some(date) = &date {
            validate_date(date)?;
        }

        let note = match self.note {
            Patch::Absent => None,
            Patch::Null => Some(None),
            Patch::Value(note) => Some(Some(note)),
        };

        Ok(ExpenseChanges {
            category_id: self.category_id.required("category_id")?,
            amount,
            date,
            note,
        })
    }
}

/// Validated field changes. `None` leaves a column untouched; for `note`,
/// `Some(None)` clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseChanges {
    pub category_id: Option<i64>,
    pub amount: Option<Amount>,
    pub date: Option<String>,
    pub note: Option<Option<String>>,
}

impl ExpenseChanges {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.amount.is_none()
            && self.date.is_none()
            && self.note.is_none()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn amount_keeps_its_scale() {
        let amount: Amount = serde_json::from_value(json!("12.50")).unwrap();

        assert_eq!(amount, Amount(dec!(12.50)));
        assert_eq!(serde_json::to_value(amount).unwrap(), json!("12.50"));
    }

    #[test]
    fn amount_rejects_json_numbers() {
        assert!(serde_json::from_value::<Amount>(json!(12.5)).is_err());
    }

    #[rstest]
    #[case("0", Err(ValidationError::InvalidAmount))]
    #[case("-3.00", Err(ValidationError::InvalidAmount))]
    #[case("0.01", Ok(()))]
    #[case("999999999999.99", Ok(()))]
    #[case("1000000000000", Err(ValidationError::AmountTooLarge(Amount::LIMIT)))]
    #[case("79228162514264337593543950335", Err(ValidationError::AmountTooLarge(Amount::LIMIT)))]
    fn amount_must_be_positive(#[case] raw: &str, #[case] expected: Result<(), ValidationError>) {
        let amount: Amount = raw.parse().unwrap();
        assert_eq!(amount.validate(), expected);
    }

    #[rstest]
    #[case("2024-03-01", true)]
    #[case("2024-02-30", true)]
    #[case("2024-3-01", false)]
    #[case("01-03-2024", false)]
    #[case("2024-03-01T00:00", false)]
    #[case("२०२४-03-01", false)]
    fn date_is_checked_by_shape(#[case] date: &str, #[case] ok: bool) {
        assert_eq!(validate_date(date).is_ok(), ok);
    }

    #[test]
    fn update_resolves_present_fields_only() {
        let update: ExpenseUpdate =
            serde_json::from_value(json!({"amount": "7.25", "note": null})).unwrap();

        let changes = update.validate().unwrap();

        assert_eq!(
            changes,
            ExpenseChanges {
                category_id: None,
                amount: Some(Amount(dec!(7.25))),
                date: None,
                note: Some(None),
            }
        );
    }

    #[test]
    fn update_rejects_null_for_required_columns() {
        let update: ExpenseUpdate = serde_json::from_value(json!({"date": null})).unwrap();

        assert_eq!(update.validate(), Err(ValidationError::NullField("date")));
    }

    #[test]
    fn empty_update_changes_nothing() {
        let changes = ExpenseUpdate::default().validate().unwrap();

        assert!(changes.is_empty());
        assert_eq!(changes, ExpenseChanges::default());
    }
}
