/*!
 * Detected page regions and their filtering.
 */

use log::debug;
use serde::{Deserialize, Serialize};

/// Axis-aligned box in page pixel coordinates, `x1`/`y1` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl BoundingBox {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Grow the box by the given margins and clamp it to a `width`×`height` page
    pub fn expand(&self, margin_x: u32, margin_y: u32, width: u32, height: u32) -> Self {
        Self {
            x0: self.x0.saturating_sub(margin_x).min(width),
            y0: self.y0.saturating_sub(margin_y).min(height),
            x1: self.x1.saturating_add(margin_x).min(width),
            y1: self.y1.saturating_add(margin_y).min(height),
        }
    }

    /// Clamp the box to a `width`×`height` page
    pub fn clamp(&self, width: u32, height: u32) -> Self {
        self.expand(0, 0, width, height)
    }
}

/// Layout categories produced by the detector, in category id order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionLabel {
    Background,
    Text,
    Title,
    List,
    Table,
    Figure,
}

/// What the pipeline does with a region of a given label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRole {
    /// OCR, translate and repaint
    Translate,
    /// Read to drive the section state machine, never repainted
    SectionMarker,
    /// Left exactly as rendered
    Preserve,
}

impl RegionLabel {
    /// Map a detector category id to a label
    pub fn from_category(id: usize) -> Option<Self> {
        match id {
            0 => Some(Self::Background),
            1 => Some(Self::Text),
            2 => Some(Self::Title),
            3 => Some(Self::List),
            4 => Some(Self::Table),
            5 => Some(Self::Figure),
            _ => None,
        }
    }

    pub fn role(&self) -> RegionRole {
        match self {
            Self::Text => RegionRole::Translate,
            Self::Title => RegionRole::SectionMarker,
            Self::Background | Self::List | Self::Table | Self::Figure => RegionRole::Preserve,
        }
    }
}

/// Raw detector output in the coordinates of the image it was run on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// `[x0, y0, x1, y1]`
    pub bbox: [f32; 4],
    pub category: usize,
    pub score: f32,
}

/// A labelled page region in original page coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub bounds: BoundingBox,
    pub label: RegionLabel,
    pub confidence: f32,
    /// Position in the detector output
    pub order: usize,
}

impl Region {
    /// Convert detections made on an image scaled by `scale` back to page
    /// coordinates. Unknown categories are dropped; detector order is kept.
    pub fn from_detections(
        detections: &[Detection],
        scale: f32,
        page_width: u32,
        page_height: u32,
    ) -> Vec<Region> {
        let scale = if scale > 0.0 { scale } else { 1.0 };

        detections
            .iter()
            .enumerate()
            .filter_map(|(order, detection)| {
                let Some(label) = RegionLabel::from_category(detection.category) else {
                    debug!("Ignoring detection with unknown category {}", detection.category);
                    return None;
                };
                let [x0, y0, x1, y1] = detection.bbox.map(|v| (v / scale).max(0.0) as u32);
                Some(Region {
                    bounds: BoundingBox::new(x0, y0, x1, y1).clamp(page_width, page_height),
                    label,
                    confidence: detection.score,
                    order,
                })
            })
            .collect()
    }
}

/// Selects regions above a confidence threshold, by label or by role
pub struct RegionExtractor;

impl RegionExtractor {
    /// Regions with `label` and `confidence >= min_confidence`, in detector order
    pub fn filter(regions: &[Region], label: RegionLabel, min_confidence: f32) -> Vec<Region> {
        regions
            .iter()
            .filter(|r| r.label == label && r.confidence >= min_confidence)
            .cloned()
            .collect()
    }

    /// Regions whose label plays `role`, in detector order
    pub fn by_role(regions: &[Region], role: RegionRole, min_confidence: f32) -> Vec<Region> {
        regions
            .iter()
            .filter(|r| r.label.role() == role && r.confidence >= min_confidence)
            .cloned()
            .collect()
    }
}
