//! Repeatable CV sections and the table mapping shared by all of them.
//!
//! Each section is a plain struct of form fields. The `Section` trait ties
//! it to a table and its columns so the store can run the same CRUD
//! queries for every section type.

use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{blank, LookupKind};

/// A repeatable, user-owned CV section stored in its own table.
pub trait Section: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table name.
    const TABLE: &'static str;
    /// Route segment.
    const NAME: &'static str;
    /// Singular display name used in messages.
    const LABEL: &'static str;
    /// Data columns, in the order `bind` returns values.
    const COLUMNS: &'static [&'static str];

    /// Column values in `COLUMNS` order.
    fn bind(&self) -> Vec<&dyn ToSql>;

    /// Build from a row selected with `SELECT *`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Fields that must reference an existing lookup value: (field, kind, value).
    fn lookup_refs(&self) -> Vec<(&'static str, LookupKind, &str)> {
        Vec::new()
    }

    /// Required text fields: (field, value).
    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        Vec::new()
    }

    /// Date pairs that must be ordered: (later field, earlier, later).
    fn date_ranges(&self) -> Vec<(&'static str, Option<NaiveDate>, Option<NaiveDate>)> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employment {
    #[serde(default, deserialize_with = "blank::required")]
    pub human_id: String,
    #[serde(default, deserialize_with = "blank::required")]
    pub employer: String,
    #[serde(default, deserialize_with = "blank::required")]
    pub position: String,
    #[serde(default, deserialize_with = "blank::date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::string")]
    pub job_desc: Option<String>,
}

impl Section for Employment {
    const TABLE: &'static str = "employment";
    const NAME: &'static str = "employment";
    const LABEL: &'static str = "Employment";
    const COLUMNS: &'static [&'static str] = &[
        "human_id",
        "employer",
        "position",
        "start_date",
        "end_date",
        "job_desc",
    ];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.human_id,
            &self.employer,
            &self.position,
            &self.start_date,
            &self.end_date,
            &self.job_desc,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            human_id: row.get("human_id")?,
            employer: row.get("employer")?,
            position: row.get("position")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            job_desc: row.get("job_desc")?,
        })
    }

    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("human_id", &self.human_id),
            ("employer", &self.employer),
            ("position", &self.position),
        ]
    }

    fn date_ranges(&self) -> Vec<(&'static str, Option<NaiveDate>, Option<NaiveDate>)> {
        vec![("end_date", self.start_date, self.end_date)]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default, deserialize_with = "blank::string")]
    pub human_id: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub educational_institution: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub course_studied: Option<String>,
    #[serde(default, deserialize_with = "blank::date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::string")]
    pub accolades: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub educational_institution_type: Option<String>,
}

impl Section for Education {
    const TABLE: &'static str = "education";
    const NAME: &'static str = "education";
    const LABEL: &'static str = "Education";
    const COLUMNS: &'static [&'static str] = &[
        "human_id",
        "educational_institution",
        "course_studied",
        "start_date",
        "end_date",
        "accolades",
        "educational_institution_type",
    ];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.human_id,
            &self.educational_institution,
            &self.course_studied,
            &self.start_date,
            &self.end_date,
            &self.accolades,
            &self.educational_institution_type,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            human_id: row.get("human_id")?,
            educational_institution: row.get("educational_institution")?,
            course_studied: row.get("course_studied")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            accolades: row.get("accolades")?,
            educational_institution_type: row.get("educational_institution_type")?,
        })
    }

    fn lookup_refs(&self) -> Vec<(&'static str, LookupKind, &str)> {
        self.educational_institution_type
            .as_deref()
            .map(|v| ("educational_institution_type", LookupKind::InstitutionType, v))
            .into_iter()
            .collect()
    }

    fn date_ranges(&self) -> Vec<(&'static str, Option<NaiveDate>, Option<NaiveDate>)> {
        vec![("end_date", self.start_date, self.end_date)]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    #[serde(default, deserialize_with = "blank::string")]
    pub human_id: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub authors: Option<String>,
    #[serde(default, deserialize_with = "blank::date")]
    pub publication_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::string")]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub publication_url: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub publication_category: Option<String>,
}

impl Section for Publication {
    const TABLE: &'static str = "publications";
    const NAME: &'static str = "publications";
    const LABEL: &'static str = "Publication";
    const COLUMNS: &'static [&'static str] = &[
        "human_id",
        "title",
        "authors",
        "publication_date",
        "publisher",
        "publication_url",
        "description",
        "publication_category",
    ];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.human_id,
            &self.title,
            &self.authors,
            &self.publication_date,
            &self.publisher,
            &self.publication_url,
            &self.description,
            &self.publication_category,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            human_id: row.get("human_id")?,
            title: row.get("title")?,
            authors: row.get("authors")?,
            publication_date: row.get("publication_date")?,
            publisher: row.get("publisher")?,
            publication_url: row.get("publication_url")?,
            description: row.get("description")?,
            publication_category: row.get("publication_category")?,
        })
    }

    fn lookup_refs(&self) -> Vec<(&'static str, LookupKind, &str)> {
        self.publication_category
            .as_deref()
            .map(|v| ("publication_category", LookupKind::PublicationCategory, v))
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patent {
    #[serde(default, deserialize_with = "blank::string")]
    pub human_id: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub patent_number: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub inventors: Option<String>,
    #[serde(default, deserialize_with = "blank::date")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::string")]
    pub patent_office: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub patent_status: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub patent_url: Option<String>,
}

impl Section for Patent {
    const TABLE: &'static str = "patents";
    const NAME: &'static str = "patents";
    const LABEL: &'static str = "Patent";
    const COLUMNS: &'static [&'static str] = &[
        "human_id",
        "title",
        "description",
        "patent_number",
        "inventors",
        "issue_date",
        "patent_office",
        "patent_status",
        "patent_url",
    ];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.human_id,
            &self.title,
            &self.description,
            &self.patent_number,
            &self.inventors,
            &self.issue_date,
            &self.patent_office,
            &self.patent_status,
            &self.patent_url,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            human_id: row.get("human_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            patent_number: row.get("patent_number")?,
            inventors: row.get("inventors")?,
            issue_date: row.get("issue_date")?,
            patent_office: row.get("patent_office")?,
            patent_status: row.get("patent_status")?,
            patent_url: row.get("patent_url")?,
        })
    }

    fn lookup_refs(&self) -> Vec<(&'static str, LookupKind, &str)> {
        let mut refs = Vec::new();
        if let Some(office) = self.patent_office.as_deref() {
            refs.push(("patent_office", LookupKind::PatentOffice, office));
        }
        if let Some(status) = self.patent_status.as_deref() {
            refs.push(("patent_status", LookupKind::PatentStatus, status));
        }
        refs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(default, deserialize_with = "blank::string")]
    pub human_id: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "blank::string")]
    pub certification_number: Option<String>,
    #[serde(default, deserialize_with = "blank::date")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::date")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank::string")]
    pub certification_url: Option<String>,
}

impl Section for Certification {
    const TABLE: &'static str = "certifications";
    const NAME: &'static str = "certifications";
    const LABEL: &'static str = "Certification";
    const COLUMNS: &'static [&'static str] = &[
        "human_id",
        "name",
        "certification_number",
        "issue_date",
        "expiry_date",
        "certification_url",
    ];

    fn bind(&self) -> Vec<&dyn ToSql> {
        vec![
            &self.human_id,
            &self.name,
            &self.certification_number,
            &self.issue_date,
            &self.expiry_date,
            &self.certification_url,
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            human_id: row.get("human_id")?,
            name: row.get("name")?,
            certification_number: row.get("certification_number")?,
            issue_date: row.get("issue_date")?,
            expiry_date: row.get("expiry_date")?,
            certification_url: row.get("certification_url")?,
        })
    }

    fn date_ranges(&self) -> Vec<(&'static str, Option<NaiveDate>, Option<NaiveDate>)> {
        vec![("expiry_date", self.issue_date, self.expiry_date)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_match_bind() {
        assert_eq!(Employment::COLUMNS.len(), Employment::default().bind().len());
        assert_eq!(Education::COLUMNS.len(), Education::default().bind().len());
        assert_eq!(Publication::COLUMNS.len(), Publication::default().bind().len());
        assert_eq!(Patent::COLUMNS.len(), Patent::default().bind().len());
        assert_eq!(
            Certification::COLUMNS.len(),
            Certification::default().bind().len()
        );
    }

    #[test]
    fn test_patent_lookup_refs() {
        let patent = Patent {
            patent_office: Some("EPO".into()),
            patent_status: Some("Patent Pending".into()),
            ..Default::default()
        };
        let refs = patent.lookup_refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0], ("patent_office", LookupKind::PatentOffice, "EPO"));
        assert_eq!(refs[1].1, LookupKind::PatentStatus);

        assert!(Patent::default().lookup_refs().is_empty());
    }

    #[test]
    fn test_employment_form_parsing() {
        let job: Employment = serde_json::from_value(serde_json::json!({
            "human_id": "1",
            "employer": " Acme ",
            "position": "Engineer",
            "start_date": "2019-02-01",
            "end_date": "",
        }))
        .unwrap();
        assert_eq!(job.employer, "Acme");
        assert_eq!(job.start_date, NaiveDate::from_ymd_opt(2019, 2, 1));
        assert!(job.end_date.is_none());
        assert!(job.job_desc.is_none());

        let missing: Employment = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(missing.required_fields().iter().all(|(_, v)| v.is_empty()));
    }
}
