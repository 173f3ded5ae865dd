use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A permit/quota code as entered by the caller and stored in the
/// authorization table. Syntactically valid codes are alphanumeric and
/// between 5 and 10 characters; anything else is rejected before a lookup
/// is attempted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermitCode(pub String);

impl PermitCode {
    pub fn parse(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        let length_ok = (5..=10).contains(&trimmed.len());
        if length_ok && trimmed.bytes().all(|byte| byte.is_ascii_alphanumeric()) {
            Some(Self(trimmed.to_owned()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PermitCode {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Caller phone number as supplied by the gateway, normalized to digits with
/// the country code prefixed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Msisdn(pub String);

const COUNTRY_CODE: &str = "27";

impl Msisdn {
    pub fn normalize(raw: &str) -> Self {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        if digits.starts_with(COUNTRY_CODE) {
            Self(digits)
        } else {
            let without_leading_zero = digits.trim_start_matches('0');
            Self(format!("{COUNTRY_CODE}{without_leading_zero}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Msisdn {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightsHolderContact {
    pub cell_phone: String,
    pub email: String,
}

/// One authorization record: a permit code with its expiry, remaining quota
/// and the registered rights holder contact (absent when no rights holder is
/// linked to the permit). Read-only from this crate's perspective; the
/// authorization store owns the lifecycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Permit {
    pub code: PermitCode,
    pub date_expiry: DateTime<Utc>,
    pub quota_balance_kg: Decimal,
    pub contact: Option<RightsHolderContact>,
}

impl Permit {
    /// A permit is valid iff its expiry is strictly after the given instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.date_expiry > now
    }

    pub fn has_remaining_balance(&self) -> bool {
        self.quota_balance_kg > Decimal::ZERO
    }
}
