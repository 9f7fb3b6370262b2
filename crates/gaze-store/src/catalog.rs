use std::fmt;
use std::fs;
use std::path::Path;

use gaze_core::ContentItem;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Shape of a YouTube-style video id.
const MEDIA_ID_PATTERN: &str = r"^[A-Za-z0-9_-]{11}$";

/// The gallery's content list as stored on disk:
///
/// ```json
/// { "items": [ { "title": "Alpine Lakes", "media_id": "G5Y_X9VeNrw" } ] }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub items: Vec<ContentItem>,
}

/// Non-fatal problem found in a catalog entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogIssue {
    /// Will be skipped when the grid is built.
    MissingMediaId { index: usize, title: String },
    /// Kept, but probably not a playable id.
    MalformedMediaId { index: usize, media_id: String },
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogIssue::MissingMediaId { index, title } => {
                write!(f, "item {index} ('{title}') has no media id and will be skipped")
            }
            CatalogIssue::MalformedMediaId { index, media_id } => {
                write!(f, "item {index} media id '{media_id}' is not an 11-character video id")
            }
        }
    }
}

impl Catalog {
    pub fn new(items: Vec<ContentItem>) -> Self {
        let mut catalog = Self { items };
        catalog.normalize();
        catalog
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let mut catalog: Catalog = serde_json::from_str(content)?;
        catalog.normalize();
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidData(format!("failed to read catalog {}: {e}", path.display()))
        })?;
        let catalog = Self::from_json(&content)?;
        tracing::info!("loaded {} catalog items from {}", catalog.items.len(), path.display());
        Ok(catalog)
    }

    /// Strip stray whitespace from titles and media ids.
    pub fn normalize(&mut self) {
        for item in &mut self.items {
            let title = item.title.trim();
            if title.len() != item.title.len() {
                item.title = title.to_string();
            }
            let media_id = item.media_id.trim();
            if media_id.len() != item.media_id.len() {
                item.media_id = media_id.to_string();
            }
        }
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Entries that will be skipped or look wrong. Never blocks loading.
    pub fn issues(&self) -> Result<Vec<CatalogIssue>> {
        let pattern = Regex::new(MEDIA_ID_PATTERN)
            .map_err(|e| StoreError::InvalidData(format!("bad media id pattern: {e}")))?;
        let mut issues = Vec::new();
        for (index, item) in self.items.iter().enumerate() {
            if !item.has_media() {
                issues.push(CatalogIssue::MissingMediaId {
                    index,
                    title: item.title.clone(),
                });
            } else if !pattern.is_match(&item.media_id) {
                issues.push(CatalogIssue::MalformedMediaId {
                    index,
                    media_id: item.media_id.clone(),
                });
            }
        }
        Ok(issues)
    }

    /// Log every issue as a warning and return how many there were.
    pub fn warn_issues(&self) -> Result<usize> {
        let issues = self.issues()?;
        for issue in &issues {
            tracing::warn!("catalog: {issue}");
        }
        Ok(issues.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_trims_fields() {
        let c = Catalog::from_json(
            r#"{"items": [{"title": "  Alpine Lakes ", "media_id": " G5Y_X9VeNrw\n"}]}"#,
        )
        .unwrap();
        assert_eq!(c.items()[0], ContentItem::new("Alpine Lakes", "G5Y_X9VeNrw"));
    }

    #[test]
    fn test_youtube_id_alias_and_missing_fields() {
        let json = r#"{"items": [{"youtube_id": "G5Y_X9VeNrw"}, {"title": "Untitled"}]}"#;
        let c = Catalog::from_json(json).unwrap();
        assert_eq!(c.items()[0].media_id, "G5Y_X9VeNrw");
        assert_eq!(c.items()[0].title, "");
        assert_eq!(c.items()[1].media_id, "");
    }

    #[test]
    fn test_issues() {
        let c = Catalog::new(vec![
            ContentItem::new("Good", "G5Y_X9VeNrw"),
            ContentItem::new("Empty", "   "),
            ContentItem::new("Short", "abc"),
            ContentItem::new("Bad chars", "abc def ghi"),
        ]);
        let issues = c.issues().unwrap();
        assert_eq!(
            issues,
            vec![
                CatalogIssue::MissingMediaId {
                    index: 1,
                    title: "Empty".into()
                },
                CatalogIssue::MalformedMediaId {
                    index: 2,
                    media_id: "abc".into()
                },
                CatalogIssue::MalformedMediaId {
                    index: 3,
                    media_id: "abc def ghi".into()
                },
            ]
        );
        assert_eq!(c.warn_issues().unwrap(), 3);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Catalog::from_json("[1, 2"), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"{"items": [{"title": "Reef", "media_id": "aBcDeFgHiJk"}]}"#).unwrap();
        let c = Catalog::load(&path).unwrap();
        assert_eq!(c.items().len(), 1);
        assert!(Catalog::load(&dir.path().join("missing.json")).is_err());
    }
}
