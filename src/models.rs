use serde::{Deserialize, Deserializer};

pub mod auth;
pub mod categories;
pub mod expenses;
pub mod reports;
pub mod users;

/// Input rejected before it reaches the store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{0} must not be null")]
    NullField(&'static str),
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Password too short (min {0} characters)")]
    PasswordTooShort(usize),
    #[error("Password too long (max {0} bytes)")]
    PasswordTooLong(usize),
    #[error("Amount must be greater than zero")]
    InvalidAmount,
    #[error("Amount must be less than {0}")]
    AmountTooLarge(i64),
    #[error("Total exceeds the supported amount range")]
    TotalOverflow,
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

/// A field of a partial update.
///
/// `Absent` means the field was not sent and stays unchanged. `Null` means
/// the client sent an explicit `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    /// For columns that cannot be cleared: `Null` is rejected, `Absent`
    /// becomes `None`.
    pub fn required(self, field: &'static str) -> Result<Option<T>, ValidationError> {
        match self {
            Patch::Absent => Ok(None),
            Patch::Null => Err(ValidationError::NullField(field)),
            Patch::Value(value) => Ok(Some(value)),
        }
    }
}

// Only called for keys present in the payload; missing keys fall back to
// `Default` through `#[serde(default)]`.
impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default)]
        note: Patch<String>,
    }

    #[test]
    fn patch_distinguishes_missing_null_and_value() {
        let missing: Probe = serde_json::from_str("{}").unwrap();
        let null: Probe = serde_json::from_str(r#"{"note": null}"#).unwrap();
        let value: Probe = serde_json::from_str(r#"{"note": "lunch"}"#).unwrap();

        assert_eq!(missing.note, Patch::Absent);
        assert_eq!(null.note, Patch::Null);
        assert_eq!(value.note, Patch::Value("lunch".to_string()));
    }

    #[test]
    fn required_rejects_null() {
        assert_eq!(Patch::<i64>::Absent.required("amount"), Ok(None));
        assert_eq!(Patch::Value(3).required("amount"), Ok(Some(3)));
        assert_eq!(
            Patch::<i64>::Null.required("amount"),
            Err(ValidationError::NullField("amount"))
        );
    }
}
