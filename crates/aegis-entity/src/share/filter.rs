//! Owner-side share listing filter.

use aegis_core::types::FileId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{ShareRecord, ShareStatus};

/// Which of an owner's shares to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "file_id", rename_all = "snake_case")]
pub enum ShareFilter {
    /// Every share, including revoked ones.
    #[default]
    All,
    /// Shares still accepting access.
    Active,
    /// Shares past their expiry.
    Expired,
    /// Shares whose quota is used up.
    Exhausted,
    /// Shares the owner revoked.
    Revoked,
    /// Every share of one file.
    ForFile(FileId),
}

impl ShareFilter {
    /// Whether `record` passes this filter at `now`.
    pub fn matches(&self, record: &ShareRecord, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Active => record.status(now) == ShareStatus::Active,
            Self::Expired => record.status(now) == ShareStatus::Expired,
            Self::Exhausted => record.status(now) == ShareStatus::Exhausted,
            Self::Revoked => record.status(now) == ShareStatus::Revoked,
            Self::ForFile(file_id) => record.file_id == *file_id,
        }
    }
}

impl std::str::FromStr for ShareFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "exhausted" => Ok(Self::Exhausted),
            "revoked" => Ok(Self::Revoked),
            other => other
                .parse::<FileId>()
                .map(Self::ForFile)
                .map_err(|_| format!("unknown share filter '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::model::tests::record;

    #[test]
    fn test_matches_status() {
        let now = Utc::now();
        let exhausted = record(1, 1);
        assert!(ShareFilter::Exhausted.matches(&exhausted, now));
        assert!(!ShareFilter::Active.matches(&exhausted, now));
        assert!(ShareFilter::All.matches(&exhausted, now));
        assert!(ShareFilter::ForFile(exhausted.file_id).matches(&exhausted, now));
    }

    #[test]
    fn test_parse() {
        assert_eq!("active".parse::<ShareFilter>().unwrap(), ShareFilter::Active);
        let id = FileId::new();
        assert_eq!(
            id.to_string().parse::<ShareFilter>().unwrap(),
            ShareFilter::ForFile(id)
        );
        assert!("bogus".parse::<ShareFilter>().is_err());
    }
}
