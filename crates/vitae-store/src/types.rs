//! Data types for accounts, personal details, lookups and statistics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A user account row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub registered_on: DateTime<Utc>,
    pub admin: bool,
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_on: Option<DateTime<Utc>>,
}

/// Options for creating a user account.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub admin: bool,
    pub confirmed: bool,
    pub confirmed_on: Option<DateTime<Utc>>,
}

/// Normalize an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Personal details, one row per user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalDetails {
    #[serde(default, deserialize_with = "blank::string")]
    pub firstname: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub surname: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub initials: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub maiden_name: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub id_type: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub id_number: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub race: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "blank::date")]
    pub birthdate: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::string")]
    pub alt_email: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub telno: Option<String>,
    #[serde(default)]
    pub notification: bool,
    #[serde(default)]
    pub fulltime_student: bool,
    #[serde(default, deserialize_with = "blank::string")]
    pub current_org: Option<String>,
}

/// Categories of admin-maintained reference values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Gender,
    InstitutionType,
    PublicationCategory,
    PatentOffice,
    PatentStatus,
}

impl LookupKind {
    pub fn all() -> &'static [LookupKind] {
        &[
            Self::Gender,
            Self::InstitutionType,
            Self::PublicationCategory,
            Self::PatentOffice,
            Self::PatentStatus,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::InstitutionType => "institution_type",
            Self::PublicationCategory => "publication_category",
            Self::PatentOffice => "patent_office",
            Self::PatentStatus => "patent_status",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lookup row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lookup {
    pub id: i64,
    pub kind: LookupKind,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A stored section row: its id plus the section fields.
#[derive(Debug, Clone, Serialize)]
pub struct Entry<T> {
    pub id: i64,
    #[serde(flatten)]
    pub data: T,
}

/// Store-level statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub users: i64,
    pub confirmed_users: i64,
    pub employment: i64,
    pub education: i64,
    pub publications: i64,
    pub patents: i64,
    pub certifications: i64,
    pub lookups: i64,
    pub db_path: String,
    pub db_size_mb: f64,
}

/// Per-user row counts for each section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionCounts {
    pub employment: i64,
    pub education: i64,
    pub publications: i64,
    pub patents: i64,
    pub certifications: i64,
}

/// Deserializers that treat blank form input as absent.
pub mod blank {
    use chrono::NaiveDate;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    /// Trimmed string; empty or null becomes `None`.
    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    /// Trimmed string that may be empty; null becomes the empty string.
    pub fn required<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(string(deserializer)?.unwrap_or_default())
    }

    /// ISO `YYYY-MM-DD` date; empty or null becomes `None`.
    pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match string(deserializer)? {
            None => Ok(None),
            Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid date '{}', expected YYYY-MM-DD", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_kind_roundtrip_names() {
        for kind in LookupKind::all() {
            assert_eq!(LookupKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(LookupKind::parse("country"), None);
    }

    #[test]
    fn test_personal_details_blank_fields() {
        let details: PersonalDetails = serde_json::from_value(serde_json::json!({
            "firstname": "  Ada ",
            "surname": "",
            "birthdate": "",
            "notification": true,
        }))
        .unwrap();
        assert_eq!(details.firstname.as_deref(), Some("Ada"));
        assert!(details.surname.is_none());
        assert!(details.birthdate.is_none());
        assert!(details.notification);
        assert!(!details.fulltime_student);
    }

    #[test]
    fn test_invalid_date_rejected() {
        let result: Result<PersonalDetails, _> =
            serde_json::from_value(serde_json::json!({ "birthdate": "31/12/1990" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_user_hides_password_hash() {
        let user = User {
            id: 1,
            email: "a@b.com".into(),
            password_hash: "$2b$04$secret".into(),
            registered_on: Utc::now(),
            admin: false,
            confirmed: false,
            confirmed_on: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@b.com");
    }
}
