//! Survey and version models
//!
//! Surveys are stored as single MongoDB documents with their versions
//! embedded in order. `StoredSurvey`/`StoredVersion` are the collection
//! types (BSON datetimes); `Survey`/`SurveyVersion` are the API-facing
//! shapes with RFC 3339 timestamps. The internal `_id` never crosses the
//! API boundary: the stored types simply don't carry it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derive the version identifier for a survey version (e.g. "1232v1").
pub fn version_id(survey_id: &str, version: i32) -> String {
    format!("{}v{}", survey_id, version)
}

/// One configuration snapshot, embedded in its parent survey document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVersion {
    /// Contiguous within the parent, starting at 1
    pub version: i32,
    pub version_id: String,
    /// Opaque survey configuration, stored and returned verbatim
    pub config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}

/// Survey document (stored in the surveys collection)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSurvey {
    pub survey_id: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub versions: Vec<StoredVersion>,
}

/// Survey as served over the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub survey_id: String,
    pub created_at: DateTime<Utc>,
    pub versions: Vec<SurveyVersion>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyVersion {
    pub version: i32,
    pub version_id: String,
    pub config: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<StoredVersion> for SurveyVersion {
    fn from(v: StoredVersion) -> Self {
        Self {
            version: v.version,
            version_id: v.version_id,
            config: v.config,
            prompt: v.prompt,
            timestamp: v.timestamp,
        }
    }
}

impl From<StoredSurvey> for Survey {
    fn from(s: StoredSurvey) -> Self {
        Self {
            survey_id: s.survey_id,
            created_at: s.created_at,
            versions: s.versions.into_iter().map(SurveyVersion::from).collect(),
        }
    }
}

/// One version payload as submitted by the client. Version numbers and
/// identifiers are assigned server-side; client numbering is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInput {
    pub config: serde_json::Value,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Create survey request (explicit surveyId is optional)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyRequest {
    pub versions: Vec<VersionInput>,
    #[serde(default)]
    pub survey_id: Option<String>,
}

/// Append versions request
#[derive(Debug, Deserialize)]
pub struct AppendVersionsRequest {
    pub versions: Vec<VersionInput>,
}

#[derive(Debug, Serialize)]
pub struct SurveyResponse {
    pub success: bool,
    pub survey: Survey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SurveysListResponse {
    pub success: bool,
    pub surveys: Vec<Survey>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub success: bool,
    pub version: SurveyVersion,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAllResponse {
    pub success: bool,
    pub deleted_count: u64,
    pub message: String,
}

/// Aggregate storage statistics
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStatsResponse {
    pub total_surveys: u64,
    pub total_versions: u64,
    pub storage_size_bytes: u64,
    #[serde(rename = "storageSizeMB")]
    pub storage_size_mb: String,
    pub surveys: Vec<SurveyInfo>,
}

/// Per-survey line item in the stats response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyInfo {
    pub survey_id: String,
    pub version_count: usize,
    pub created_at: DateTime<Utc>,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_id_format() {
        assert_eq!(version_id("1232", 1), "1232v1");
        assert_eq!(version_id("1232", 12), "1232v12");
        assert_eq!(version_id("0007", 3), "0007v3");
    }

    #[test]
    fn test_stored_survey_bson_round_trip() {
        let survey = StoredSurvey {
            survey_id: "4821".to_string(),
            created_at: Utc::now(),
            versions: vec![StoredVersion {
                version: 1,
                version_id: "4821v1".to_string(),
                config: json!({ "title": "Demo", "sections": [{ "id": "s1", "questions": [] }] }),
                prompt: Some("make it short".to_string()),
                timestamp: Utc::now(),
            }],
        };

        let doc = bson::to_document(&survey).unwrap();
        let back: StoredSurvey = bson::from_document(doc).unwrap();

        assert_eq!(back.survey_id, "4821");
        assert_eq!(back.versions.len(), 1);
        assert_eq!(back.versions[0].version_id, "4821v1");
        assert_eq!(back.versions[0].config, survey.versions[0].config);
        assert_eq!(back.versions[0].prompt.as_deref(), Some("make it short"));
    }

    #[test]
    fn test_api_survey_serialization() {
        let survey = Survey {
            survey_id: "1232".to_string(),
            created_at: Utc::now(),
            versions: vec![SurveyVersion {
                version: 1,
                version_id: "1232v1".to_string(),
                config: json!({ "a": 1 }),
                prompt: None,
                timestamp: Utc::now(),
            }],
        };

        let value = serde_json::to_value(&survey).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("surveyId"));
        assert!(obj.contains_key("createdAt"));
        assert!(!obj.contains_key("_id"));
        // RFC 3339 timestamp, not an extended-JSON date object
        assert!(obj["createdAt"].is_string());

        let version = &value["versions"][0];
        assert_eq!(version["versionId"], "1232v1");
        assert_eq!(version["config"]["a"], 1);
        // prompt is omitted when absent
        assert!(version.get("prompt").is_none());
    }

    #[test]
    fn test_create_request_accepts_missing_survey_id() {
        let req: CreateSurveyRequest =
            serde_json::from_value(json!({ "versions": [{ "config": { "a": 1 } }] })).unwrap();
        assert!(req.survey_id.is_none());
        assert_eq!(req.versions.len(), 1);

        let req: CreateSurveyRequest = serde_json::from_value(
            json!({ "surveyId": "1234", "versions": [{ "config": {}, "prompt": "p" }] }),
        )
        .unwrap();
        assert_eq!(req.survey_id.as_deref(), Some("1234"));
        assert_eq!(req.versions[0].prompt.as_deref(), Some("p"));
    }
}
