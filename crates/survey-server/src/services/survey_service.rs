//! Survey service for MongoDB
//!
//! Every operation maps to a single query/update against the surveys
//! collection. Read-modify-write of one survey document (create with
//! generated ID, append) has no optimistic-concurrency check; concurrent
//! appends to the same survey may race. Known gap, carried over from the
//! original storage layer.

use crate::db::{collections, MongoDb};
use crate::error::{SurveyError, SurveyResult};
use crate::models::{
    version_id, StorageStatsResponse, StoredSurvey, StoredVersion, Survey, SurveyInfo,
    VersionInput,
};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Regex as BsonRegex};
use mongodb::options::FindOptions;
use mongodb::Collection;
use rand::Rng;

/// Search results are capped at this many surveys
const SEARCH_LIMIT: i64 = 100;

/// Build the case-insensitive substring filter for survey-ID search.
/// Metacharacters in the query are escaped so it is a pure substring
/// predicate, not a regex.
fn search_filter(query: &str) -> mongodb::bson::Document {
    let re = BsonRegex {
        pattern: regex::escape(query),
        options: "i".to_string(),
    };
    doc! { "surveyId": { "$regex": re } }
}

/// Generate a random 4-digit survey ID
fn generate_survey_id() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

/// Assign contiguous version numbers starting at `first`, deriving each
/// versionId and stamping the write time.
fn number_versions(
    survey_id: &str,
    first: i32,
    inputs: Vec<VersionInput>,
    now: DateTime<Utc>,
) -> Vec<StoredVersion> {
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let version = first + i as i32;
            StoredVersion {
                version,
                version_id: version_id(survey_id, version),
                config: input.config,
                prompt: input.prompt,
                timestamp: now,
            }
        })
        .collect()
}

/// Build the stats payload from the full set of stored surveys. Storage
/// size is the serialized-JSON size of the surveys as the API would return
/// them; the title comes from the latest version's config.
fn build_storage_stats(
    surveys: Vec<StoredSurvey>,
) -> Result<StorageStatsResponse, serde_json::Error> {
    let total_versions = surveys.iter().map(|s| s.versions.len() as u64).sum();
    let surveys: Vec<Survey> = surveys.into_iter().map(Survey::from).collect();
    let storage_size_bytes = serde_json::to_vec(&surveys)?.len() as u64;

    let infos = surveys
        .iter()
        .map(|s| SurveyInfo {
            survey_id: s.survey_id.clone(),
            version_count: s.versions.len(),
            created_at: s.created_at,
            title: s
                .versions
                .last()
                .and_then(|v| v.config.get("title"))
                .and_then(|t| t.as_str())
                .unwrap_or("Untitled")
                .to_string(),
        })
        .collect();

    Ok(StorageStatsResponse {
        total_surveys: surveys.len() as u64,
        total_versions,
        storage_size_bytes,
        storage_size_mb: format!("{:.2}", storage_size_bytes as f64 / (1024.0 * 1024.0)),
        surveys: infos,
    })
}

pub struct SurveyService {
    db: MongoDb,
}

impl SurveyService {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }

    fn surveys(&self) -> Collection<StoredSurvey> {
        self.db.collection(collections::SURVEYS)
    }

    /// Create a survey with its first batch of versions, numbered 1..N.
    /// Fails with a conflict if an explicit surveyId is already taken.
    pub async fn create(
        &self,
        survey_id: Option<String>,
        versions: Vec<VersionInput>,
    ) -> SurveyResult<StoredSurvey> {
        if versions.is_empty() {
            return Err(SurveyError::InvalidInput(
                "versions must not be empty".to_string(),
            ));
        }

        let coll = self.surveys();
        let survey_id = match survey_id {
            Some(id) => {
                let existing = coll.find_one(doc! { "surveyId": &id }, None).await?;
                if existing.is_some() {
                    return Err(SurveyError::SurveyExists(id));
                }
                id
            }
            None => self.unused_survey_id(&coll).await?,
        };

        let now = Utc::now();
        let survey = StoredSurvey {
            survey_id: survey_id.clone(),
            created_at: now,
            versions: number_versions(&survey_id, 1, versions, now),
        };

        coll.insert_one(&survey, None).await?;
        tracing::info!("Created survey {}", survey_id);
        Ok(survey)
    }

    /// Draw random IDs until one is not present in the collection
    async fn unused_survey_id(&self, coll: &Collection<StoredSurvey>) -> SurveyResult<String> {
        loop {
            let id = generate_survey_id();
            if coll
                .find_one(doc! { "surveyId": &id }, None)
                .await?
                .is_none()
            {
                return Ok(id);
            }
        }
    }

    /// Append versions to an existing survey, numbered from max existing + 1.
    /// Existing versions are never touched.
    pub async fn append_versions(
        &self,
        survey_id: &str,
        versions: Vec<VersionInput>,
    ) -> SurveyResult<StoredSurvey> {
        if versions.is_empty() {
            return Err(SurveyError::InvalidInput(
                "versions must not be empty".to_string(),
            ));
        }

        let coll = self.surveys();
        let mut survey = coll
            .find_one(doc! { "surveyId": survey_id }, None)
            .await?
            .ok_or_else(|| SurveyError::SurveyNotFound(survey_id.to_string()))?;

        let next = survey.versions.iter().map(|v| v.version).max().unwrap_or(0) + 1;
        let new_versions = number_versions(survey_id, next, versions, Utc::now());

        let push: Vec<Bson> = new_versions
            .iter()
            .map(bson::to_bson)
            .collect::<Result<_, _>>()?;
        let result = coll
            .update_one(
                doc! { "surveyId": survey_id },
                doc! { "$push": { "versions": { "$each": push } } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Err(SurveyError::SurveyNotFound(survey_id.to_string()));
        }

        survey.versions.extend(new_versions);
        Ok(survey)
    }

    /// Get a survey by ID
    pub async fn get(&self, survey_id: &str) -> SurveyResult<StoredSurvey> {
        self.surveys()
            .find_one(doc! { "surveyId": survey_id }, None)
            .await?
            .ok_or_else(|| SurveyError::SurveyNotFound(survey_id.to_string()))
    }

    /// Get a specific version of a survey
    pub async fn get_version(&self, survey_id: &str, version: i32) -> SurveyResult<StoredVersion> {
        let survey = self.get(survey_id).await?;
        survey
            .versions
            .into_iter()
            .find(|v| v.version == version)
            .ok_or_else(|| SurveyError::VersionNotFound {
                survey_id: survey_id.to_string(),
                version,
            })
    }

    /// Search surveys whose ID contains `query` (case-insensitive substring)
    pub async fn search(&self, query: &str) -> SurveyResult<Vec<StoredSurvey>> {
        let options = FindOptions::builder()
            .limit(SEARCH_LIMIT)
            .sort(doc! { "createdAt": -1 })
            .build();

        let cursor = self.surveys().find(search_filter(query), options).await?;
        Ok(cursor.try_collect().await?)
    }

    /// List surveys newest-first with skip/limit, plus the total count
    pub async fn list(&self, skip: u64, limit: i64) -> SurveyResult<(Vec<StoredSurvey>, u64)> {
        let coll = self.surveys();
        let options = FindOptions::builder()
            .skip(skip)
            .limit(limit)
            .sort(doc! { "createdAt": -1 })
            .build();

        let cursor = coll.find(doc! {}, options).await?;
        let surveys: Vec<StoredSurvey> = cursor.try_collect().await?;
        let total = coll.count_documents(doc! {}, None).await?;
        Ok((surveys, total))
    }

    /// Delete a survey and all its embedded versions
    pub async fn delete(&self, survey_id: &str) -> SurveyResult<()> {
        let result = self
            .surveys()
            .delete_one(doc! { "surveyId": survey_id }, None)
            .await?;
        if result.deleted_count == 0 {
            return Err(SurveyError::SurveyNotFound(survey_id.to_string()));
        }
        tracing::info!("Deleted survey {}", survey_id);
        Ok(())
    }

    /// Delete every survey; returns the number removed
    pub async fn delete_all(&self) -> SurveyResult<u64> {
        let result = self.surveys().delete_many(doc! {}, None).await?;
        tracing::info!("Deleted {} surveys", result.deleted_count);
        Ok(result.deleted_count)
    }

    /// Aggregate storage statistics over the whole collection
    pub async fn storage_stats(&self) -> SurveyResult<StorageStatsResponse> {
        let cursor = self.surveys().find(doc! {}, None).await?;
        let surveys: Vec<StoredSurvey> = cursor.try_collect().await?;
        Ok(build_storage_stats(surveys)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(config: serde_json::Value) -> VersionInput {
        VersionInput {
            config,
            prompt: None,
        }
    }

    #[test]
    fn test_generate_survey_id_is_four_digits() {
        for _ in 0..200 {
            let id = generate_survey_id();
            assert_eq!(id.len(), 4);
            let n: u32 = id.parse().unwrap();
            assert!((1000..=9999).contains(&n));
        }
    }

    #[test]
    fn test_number_versions_from_one() {
        let now = Utc::now();
        let versions = number_versions(
            "1232",
            1,
            vec![input(json!({ "a": 1 })), input(json!({ "a": 2 }))],
            now,
        );
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].version, 1);
        assert_eq!(versions[0].version_id, "1232v1");
        assert_eq!(versions[0].config, json!({ "a": 1 }));
        assert_eq!(versions[1].version, 2);
        assert_eq!(versions[1].version_id, "1232v2");
        assert_eq!(versions[1].config, json!({ "a": 2 }));
        assert_eq!(versions[1].timestamp, now);
    }

    #[test]
    fn test_number_versions_continues_from_existing() {
        let now = Utc::now();
        let versions = number_versions("1232", 4, vec![input(json!({})), input(json!({}))], now);
        assert_eq!(versions[0].version, 4);
        assert_eq!(versions[0].version_id, "1232v4");
        assert_eq!(versions[1].version, 5);
        assert_eq!(versions[1].version_id, "1232v5");
    }

    fn survey(id: &str, configs: Vec<serde_json::Value>) -> StoredSurvey {
        let now = Utc::now();
        StoredSurvey {
            survey_id: id.to_string(),
            created_at: now,
            versions: number_versions(id, 1, configs.into_iter().map(input).collect(), now),
        }
    }

    #[test]
    fn test_storage_stats_totals_and_titles() {
        let stats = build_storage_stats(vec![
            survey(
                "1111",
                vec![json!({ "title": "Draft" }), json!({ "title": "Final" })],
            ),
            survey("2222", vec![json!({ "sections": [] })]),
        ])
        .unwrap();

        assert_eq!(stats.total_surveys, 2);
        assert_eq!(stats.total_versions, 3);
        assert!(stats.storage_size_bytes > 0);
        assert_eq!(stats.surveys.len(), 2);
        // Title comes from the latest version; missing titles fall back
        assert_eq!(stats.surveys[0].title, "Final");
        assert_eq!(stats.surveys[0].version_count, 2);
        assert_eq!(stats.surveys[1].title, "Untitled");
    }

    #[test]
    fn test_search_filter_is_case_insensitive_substring() {
        let filter = search_filter("123");
        let re = filter
            .get_document("surveyId")
            .unwrap()
            .get("$regex")
            .unwrap();
        let re = match re {
            Bson::RegularExpression(re) => re,
            other => panic!("expected regex, got {:?}", other),
        };
        assert_eq!(re.pattern, "123");
        assert_eq!(re.options, "i");
    }

    #[test]
    fn test_search_filter_escapes_metacharacters() {
        let filter = search_filter("12.3");
        let re = match filter.get_document("surveyId").unwrap().get("$regex") {
            Some(Bson::RegularExpression(re)) => re,
            other => panic!("expected regex, got {:?}", other),
        };
        // "." must not act as a wildcard
        assert_eq!(re.pattern, "12\\.3");
    }

    #[test]
    fn test_storage_stats_empty_store() {
        let stats = build_storage_stats(vec![]).unwrap();
        assert_eq!(stats.total_surveys, 0);
        assert_eq!(stats.total_versions, 0);
        assert_eq!(stats.storage_size_mb, "0.00");
        assert!(stats.surveys.is_empty());
    }
}
