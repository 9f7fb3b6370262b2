use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::debounce::{GazePointer, GazeTarget};
use crate::dwell::{DwellConfig, DwellEngine, DwellEvent, DwellPhase, FillIndicator};
use crate::highlight::{Highlight, HighlightConfig};

/// Stable identity of a tile for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(Uuid);

impl TileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Thumbnail qualities in fetch order, best first.
const THUMBNAIL_QUALITIES: [&str; 5] = [
    "maxresdefault",
    "hqdefault",
    "sddefault",
    "mqdefault",
    "default",
];

/// One entry of the gallery catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "youtube_id")]
    pub media_id: String,
}

impl ContentItem {
    pub fn new(title: &str, media_id: &str) -> Self {
        Self {
            title: title.to_string(),
            media_id: media_id.to_string(),
        }
    }

    pub fn has_media(&self) -> bool {
        !self.media_id.trim().is_empty()
    }

    /// Playback URL handed to the external launcher.
    pub fn watch_url(&self) -> String {
        if self.has_media() {
            format!("https://www.youtube.com/watch?v={}", self.media_id)
        } else {
            "https://www.youtube.com".to_string()
        }
    }

    /// Thumbnail URLs to try in order. Empty when there is no media id.
    pub fn thumbnail_urls(&self) -> Vec<String> {
        if !self.has_media() {
            return Vec::new();
        }
        THUMBNAIL_QUALITIES
            .iter()
            .map(|q| format!("https://img.youtube.com/vi/{}/{q}.jpg", self.media_id))
            .collect()
    }

    /// Name used in log lines.
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.media_id
        } else {
            &self.title
        }
    }
}

/// A gallery cell bound to one content item. Owns exactly one dwell engine.
pub struct Tile {
    id: TileId,
    content: ContentItem,
    engine: DwellEngine,
    highlight: Highlight,
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("id", &self.id)
            .field("content", &self.content)
            .field("phase", &self.engine.phase())
            .finish()
    }
}

impl Tile {
    pub fn new(content: ContentItem, dwell: DwellConfig, highlight: HighlightConfig) -> Self {
        Self {
            id: TileId::new(),
            content,
            engine: DwellEngine::new(dwell),
            highlight: Highlight::new(highlight),
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn content(&self) -> &ContentItem {
        &self.content
    }

    pub fn phase(&self) -> DwellPhase {
        self.engine.phase()
    }

    pub fn engine(&self) -> &DwellEngine {
        &self.engine
    }

    pub fn indicator(&self) -> FillIndicator {
        self.engine.indicator()
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    pub fn begin_gaze(&mut self) {
        self.engine.begin_gaze();
    }

    pub fn end_gaze(&mut self) {
        self.engine.end_gaze();
    }

    /// Tile removed or view hidden: no dwell and no visible feedback survive.
    pub fn disable(&mut self) {
        self.engine.disable();
        self.highlight.reset();
    }

    /// Advance dwell and hover feedback.
    pub fn tick(&mut self, dt: f64) -> Option<DwellEvent> {
        self.highlight.tick(dt);

        let counted = self.engine.total_secs();
        let event = self.engine.tick(dt);
        if self.engine.total_secs() != counted {
            tracing::debug!(
                "dwell {} -> total={}s (current={}s)",
                self.content.display_name(),
                self.engine.total_secs(),
                self.engine.session_secs()
            );
        }
        event
    }
}

impl GazeTarget for Tile {
    fn on_gaze_enter(&mut self, pointer: &GazePointer) {
        tracing::trace!(
            "gaze enter {} at ({:.1}, {:.1})",
            self.content.display_name(),
            pointer.cursor.x,
            pointer.cursor.y
        );
        self.highlight.set_hovered(true);
        self.begin_gaze();
    }

    fn on_gaze_exit(&mut self, pointer: &GazePointer) {
        tracing::trace!(
            "gaze exit {} at ({:.1}, {:.1})",
            self.content.display_name(),
            pointer.cursor.x,
            pointer.cursor.y
        );
        self.highlight.set_hovered(false);
        self.end_gaze();
    }
}
