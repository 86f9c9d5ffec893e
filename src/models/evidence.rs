use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kinds of evidence that can be attached to an item. The binary
/// payload lives in external storage; only metadata is tracked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Photo,
    Video,
    Document,
}

impl EvidenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::Photo => "photo",
            EvidenceKind::Video => "video",
            EvidenceKind::Document => "document",
        }
    }
}

impl std::str::FromStr for EvidenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(EvidenceKind::Photo),
            "video" => Ok(EvidenceKind::Video),
            "document" => Ok(EvidenceKind::Document),
            other => Err(format!("unknown evidence kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EvidenceModel {
    pub id: i64,
    pub item_id: i64,
    pub kind: String,
    pub file_name: String,
    pub created_at: String,
}

/// Per-item evidence tally, used by the delete receipt and the
/// evidence-presence filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceCounts {
    pub photos: u32,
    pub videos: u32,
    pub documents: u32,
}

impl EvidenceCounts {
    pub fn total(&self) -> u32 {
        self.photos + self.videos + self.documents
    }

    pub fn of(&self, kind: EvidenceKind) -> u32 {
        match kind {
            EvidenceKind::Photo => self.photos,
            EvidenceKind::Video => self.videos,
            EvidenceKind::Document => self.documents,
        }
    }

    pub fn add(&mut self, kind: EvidenceKind) {
        match kind {
            EvidenceKind::Photo => self.photos += 1,
            EvidenceKind::Video => self.videos += 1,
            EvidenceKind::Document => self.documents += 1,
        }
    }
}
