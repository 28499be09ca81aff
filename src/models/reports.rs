use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ValidationError;

#[derive(Clone, Debug, Deserialize)]
pub struct SummaryQuery {
    pub year: String,
    pub month: String,
}

/// A calendar month, matched against the `YYYY-MM` prefix of stored dates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Period {
    year: String,
    month: String,
}

impl Period {
    /// `year` must be four digits, `month` one or two; a single-digit month
    /// is zero-padded.
    pub fn parse(year: &str, month: &str) -> Result<Self, ValidationError> {
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidPeriod(format!(
                "year '{year}' must have 4 digits"
            )));
        }
        if month.is_empty() || month.len() > 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidPeriod(format!(
                "month '{month}' must have 1 or 2 digits"
            )));
        }

        Ok(Self {
            year: year.to_string(),
            month: format!("{month:0>2}"),
        })
    }

    /// Prefix shared by every `YYYY-MM-DD` date in this month.
    pub fn date_prefix(&self) -> String {
        format!("{}-{}-", self.year, self.month)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategoryTotal {
    pub category_name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct MonthlySummary {
    #[serde(with = "rust_decimal::serde::str")]
    pub total_expenses: Decimal,
    pub expenses_by_category: Vec<CategoryTotal>,
}

impl MonthlySummary {
    /// Groups `(category_name, amount)` pairs, largest subtotal first.
    /// Fails with `TotalOverflow` when a sum leaves the decimal range.
    pub fn from_entries<I>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut subtotals: HashMap<String, Decimal> = HashMap::new();
        for (category_name, amount) in entries {
            let subtotal = subtotals.entry(category_name).or_insert(Decimal::ZERO);
            *subtotal = subtotal
                .checked_add(amount)
                .ok_or(ValidationError::TotalOverflow)?;
        }

        let mut expenses_by_category: Vec<CategoryTotal> = subtotals
            .into_iter()
            .map(|(category_name, total_amount)| CategoryTotal {
                category_name,
                total_amount,
            })
            .collect();
        expenses_by_category.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then_with(|| a.category_name.cmp(&b.category_name))
        });

        let total_expenses = expenses_by_category
            .iter()
            .try_fold(Decimal::ZERO, |acc, row| acc.checked_add(row.total_amount))
            .ok_or(ValidationError::TotalOverflow)?;

        Ok(Self {
            total_expenses,
            expenses_by_category,
        })
    }
}
