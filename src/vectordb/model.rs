use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{ScoredPoint, Value};
use serde::{Deserialize, Serialize};

/// Kind of reference document stored in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    JobDescription,
    CaseStudyBrief,
    ScoringRubric,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::JobDescription,
        DocumentType::CaseStudyBrief,
        DocumentType::ScoringRubric,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::JobDescription => "job_description",
            DocumentType::CaseStudyBrief => "case_study_brief",
            DocumentType::ScoringRubric => "scoring_rubric",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half of the scoring rubric a chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricSection {
    CvEvaluation,
    ProjectEvaluation,
}

impl RubricSection {
    pub const ALL: [RubricSection; 2] = [RubricSection::CvEvaluation, RubricSection::ProjectEvaluation];

    pub fn as_str(&self) -> &'static str {
        match self {
            RubricSection::CvEvaluation => "cv_evaluation",
            RubricSection::ProjectEvaluation => "project_evaluation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for RubricSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chunk of reference text plus the metadata stored as its point payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceChunk {
    pub document_type: DocumentType,
    pub section: Option<RubricSection>,
    pub description: String,
    pub filename: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ReferenceChunk {
    pub(crate) fn to_payload(&self) -> HashMap<String, Value> {
        let mut payload: HashMap<String, Value> = HashMap::new();
        payload.insert("type".to_string(), self.document_type.as_str().into());
        if let Some(section) = self.section {
            payload.insert("section".to_string(), section.as_str().into());
        }
        payload.insert("description".to_string(), self.description.clone().into());
        payload.insert("filename".to_string(), self.filename.clone().into());
        payload.insert("chunk_index".to_string(), (self.chunk_index as i64).into());
        payload.insert("total_chunks".to_string(), (self.total_chunks as i64).into());
        payload.insert("text".to_string(), self.text.clone().into());
        payload.insert("created_at".to_string(), self.created_at.to_rfc3339().into());
        payload
    }

    /// Rebuilds a chunk from a point payload. Points without a known `type` are skipped.
    pub(crate) fn from_payload(payload: &HashMap<String, Value>) -> Option<Self> {
        let string = |key: &str| payload.get(key).and_then(|v| v.as_str()).cloned();
        let integer = |key: &str| {
            payload
                .get(key)
                .and_then(|v| v.as_integer())
                .map(|i| i.max(0) as usize)
                .unwrap_or(0)
        };

        let document_type = DocumentType::parse(&string("type")?)?;
        let section = string("section").and_then(|s| RubricSection::parse(&s));
        let created_at = string("created_at")
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_default();

        Some(Self {
            document_type,
            section,
            description: string("description").unwrap_or_default(),
            filename: string("filename").unwrap_or_default(),
            chunk_index: integer("chunk_index"),
            total_chunks: integer("total_chunks"),
            text: string("text").unwrap_or_default(),
            created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub chunk: ReferenceChunk,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: u64,
    pub score: f32,
    pub chunk: ReferenceChunk,
}

impl SearchResult {
    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let id = match point.id.and_then(|pid| pid.point_id_options) {
            Some(PointIdOptions::Num(n)) => n,
            _ => return None,
        };

        let chunk = ReferenceChunk::from_payload(&point.payload)?;

        Some(SearchResult {
            id,
            score: point.score,
            chunk,
        })
    }
}

/// Payload filter applied to searches. Empty fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub document_type: Option<DocumentType>,
    pub section: Option<RubricSection>,
}

impl SearchFilter {
    pub fn document(document_type: DocumentType) -> Self {
        Self {
            document_type: Some(document_type),
            section: None,
        }
    }

    pub fn section(mut self, section: RubricSection) -> Self {
        self.section = Some(section);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.document_type.is_none() && self.section.is_none()
    }

    pub fn matches(&self, chunk: &ReferenceChunk) -> bool {
        self.document_type.is_none_or(|t| t == chunk.document_type)
            && self.section.is_none_or(|s| Some(s) == chunk.section)
    }
}

/// Collection summary reported by [`VectorDbClient::collection_stats`](super::VectorDbClient::collection_stats).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub collection: String,
    pub points_count: u64,
    pub vector_size: u64,
    pub distance: String,
    pub status: String,
}
