//! Job data model — records, input, filters, and operation outcomes.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// On-disk format of `created_at`.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// On-disk format of `date_applied`.
pub const DATE_APPLIED_FORMAT: &str = "%Y-%m-%d";

/// A single tracked job application.
///
/// Field names and order match the backing file exactly. Absent optional
/// fields are written as `null`, never omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Store-assigned, unique, never reused while a higher id survives.
    pub id: u64,
    pub title: String,
    pub company: String,
    /// Link to the posting.
    pub link: Option<String>,
    pub notes: Option<String>,
    pub applied: bool,
    /// Set together with `applied`.
    #[serde(default, with = "date_applied_format")]
    pub date_applied: Option<NaiveDate>,
    /// Minute precision, immutable after creation.
    #[serde(with = "created_at_format")]
    pub created_at: NaiveDateTime,
}

impl JobRecord {
    /// Create an unapplied record. `created_at` is truncated to the minute.
    pub fn new(
        id: u64,
        title: impl Into<String>,
        company: impl Into<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            company: company.into(),
            link: None,
            notes: None,
            applied: false,
            date_applied: None,
            created_at: truncate_to_minute(created_at),
        }
    }

    /// Builder: set link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Builder: set notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Mark as applied on `date`. Returns false (and leaves the record
    /// untouched) if it was already applied.
    pub fn mark_applied(&mut self, date: NaiveDate) -> bool {
        if self.applied {
            return false;
        }
        self.applied = true;
        self.date_applied = Some(date);
        true
    }
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

/// Caller-supplied fields for a new record. Everything else is assigned by
/// the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJob {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewJob {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            link: None,
            notes: None,
        }
    }

    /// Builder: set link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Builder: set notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Trim every field. Empty optional fields become `None`; an empty title
    /// or company is a validation failure.
    pub fn normalize(&self) -> Result<NewJob, ValidationError> {
        let title = self.title.trim();
        let company = self.company.trim();

        let mut missing = Vec::new();
        if title.is_empty() {
            missing.push("title");
        }
        if company.is_empty() {
            missing.push("company");
        }
        if !missing.is_empty() {
            return Err(ValidationError { missing });
        }

        Ok(NewJob {
            title: title.to_string(),
            company: company.to_string(),
            link: non_empty(self.link.as_deref()),
            notes: non_empty(self.notes.as_deref()),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Required fields that were empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("missing required field(s): {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// Result of adding a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Created(JobRecord),
    /// Nothing was written.
    Invalid(ValidationError),
}

/// Result of marking a job as applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(JobRecord),
    /// Record left untouched, including its original `date_applied`.
    AlreadyApplied(JobRecord),
    NotFound,
}

/// Named listing filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobFilter {
    #[default]
    All,
    /// Only jobs not yet applied to.
    Open,
}

impl JobFilter {
    /// Parse `"all"` / `"open"`. Anything else lists everything.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Self::Open,
            _ => Self::All,
        }
    }

    pub fn matches(&self, job: &JobRecord) -> bool {
        match self {
            Self::All => true,
            Self::Open => !job.applied,
        }
    }
}

mod created_at_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::CREATED_AT_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&value.format(CREATED_AT_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, CREATED_AT_FORMAT).map_err(serde::de::Error::custom)
    }
}

mod date_applied_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_APPLIED_FORMAT;

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.collect_str(&date.format(DATE_APPLIED_FORMAT)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, DATE_APPLIED_FORMAT)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
