//! # Student Roster
//!
//! Students are owned by an external records service. The card designer
//! only reads them: an export takes a snapshot of one school's roster and
//! renders one card per student, in the order the provider returns them.
//!
//! Two providers are included:
//!
//! | Provider | Source |
//! |----------|--------|
//! | [`JsonFileRoster`] | A JSON array of student records on disk |
//! | [`RestRoster`] | A PostgREST `students` table (`school_id=eq.{id}`) |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A student record as stored by the records service.
///
/// Only `given_name` and `identity` reach the card; the other fields are
/// carried so records round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Student {
    pub id: String,
    pub created_at: Option<String>,
    pub given_name: String,
    pub fathers_name: Option<String>,
    pub mothers_name: Option<String>,
    pub school_id: String,
    pub level_id: Option<i64>,
    pub identity: Option<String>,
    pub check_time_id: Option<String>,
}

impl Student {
    /// Placeholder student used for design previews.
    pub fn placeholder(given_name: &str, identity: &str) -> Self {
        Self {
            given_name: given_name.to_string(),
            identity: Some(identity.to_string()),
            ..Default::default()
        }
    }

    /// Payload encoded in the student's QR code.
    pub fn qr_payload(&self) -> &str {
        self.identity.as_deref().unwrap_or("")
    }
}

/// Errors from fetching a roster.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Roster request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Roster service returned HTTP {0}")]
    Status(u16),

    #[error("Roster decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Roster I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of student rosters, keyed by school.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Fetch the ordered roster of a school.
    async fn fetch(&self, school_id: &str) -> Result<Vec<Student>, RosterError>;
}

/// Roster backed by a JSON file containing an array of [`Student`].
///
/// Records are filtered by `school_id`; an empty school id returns the
/// whole file. The file is re-read on every fetch so edits are picked up.
pub struct JsonFileRoster {
    path: PathBuf,
}

impl JsonFileRoster {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RosterProvider for JsonFileRoster {
    async fn fetch(&self, school_id: &str) -> Result<Vec<Student>, RosterError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let students: Vec<Student> = serde_json::from_slice(&bytes)?;
        Ok(filter_school(students, school_id))
    }
}

fn filter_school(students: Vec<Student>, school_id: &str) -> Vec<Student> {
    if school_id.is_empty() {
        return students;
    }
    students
        .into_iter()
        .filter(|s| s.school_id == school_id)
        .collect()
}

/// Roster backed by a PostgREST endpoint (the hosted records service).
pub struct RestRoster {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestRoster {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, RosterError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("carnet/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn students_url(&self) -> String {
        format!("{}/rest/v1/students", self.base_url)
    }
}

#[async_trait]
impl RosterProvider for RestRoster {
    async fn fetch(&self, school_id: &str) -> Result<Vec<Student>, RosterError> {
        let filter = format!("eq.{}", school_id);
        let response = self
            .client
            .get(self.students_url())
            .query(&[("select", "*"), ("school_id", filter.as_str())])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RosterError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Fixed in-memory roster, for tests and previews.
pub struct StaticRoster {
    students: Vec<Student>,
}

impl StaticRoster {
    pub fn new(students: Vec<Student>) -> Self {
        Self { students }
    }
}

#[async_trait]
impl RosterProvider for StaticRoster {
    async fn fetch(&self, school_id: &str) -> Result<Vec<Student>, RosterError> {
        Ok(filter_school(self.students.clone(), school_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(name: &str, school: &str) -> Student {
        Student {
            given_name: name.to_string(),
            school_id: school.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_student_decodes_records_service_shape() {
        let json = r#"{
            "id": "7f1c", "created_at": "2024-03-01T10:00:00Z",
            "given_name": "Mateo", "fathers_name": "Quispe", "mothers_name": null,
            "school_id": "s1", "level_id": 3, "identity": "70112233",
            "check_time_id": null
        }"#;
        let s: Student = serde_json::from_str(json).unwrap();
        assert_eq!(s.given_name, "Mateo");
        assert_eq!(s.level_id, Some(3));
        assert_eq!(s.qr_payload(), "70112233");
    }

    #[test]
    fn test_qr_payload_without_identity() {
        assert_eq!(record("Ana", "s1").qr_payload(), "");
    }

    #[tokio::test]
    async fn test_json_file_roster_filters_and_keeps_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let students = vec![record("B", "s1"), record("X", "s2"), record("A", "s1")];
        file.write_all(serde_json::to_string(&students).unwrap().as_bytes())
            .unwrap();

        let roster = JsonFileRoster::new(file.path());
        let fetched = roster.fetch("s1").await.unwrap();
        let names: Vec<&str> = fetched.iter().map(|s| s.given_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);

        assert_eq!(roster.fetch("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_json_file_roster_missing_file() {
        let roster = JsonFileRoster::new("/nonexistent/roster.json");
        assert!(matches!(roster.fetch("s1").await, Err(RosterError::Io(_))));
    }

    #[tokio::test]
    async fn test_json_file_roster_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        let roster = JsonFileRoster::new(file.path());
        assert!(matches!(roster.fetch("s1").await, Err(RosterError::Decode(_))));
    }

    #[test]
    fn test_rest_url_trims_trailing_slash() {
        let roster =
            RestRoster::new("https://db.example.org/", "key", Duration::from_secs(5)).unwrap();
        assert_eq!(roster.students_url(), "https://db.example.org/rest/v1/students");
    }

    #[tokio::test]
    async fn test_static_roster() {
        let roster = StaticRoster::new(vec![record("A", "s1"), record("B", "s2")]);
        assert_eq!(roster.fetch("s2").await.unwrap().len(), 1);
    }
}
