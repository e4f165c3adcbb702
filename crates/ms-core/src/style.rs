//! House style identifiers and the scene-file catalog
//!
//! The catalog is a static bijection between [`StyleId`] and the scene file
//! fragment (`<dir>/<file>` without extension) shipped in the house-style
//! asset bundle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scene file extension used by every house style
pub const SCENE_EXTENSION: &str = ".yaml";

/// Default directory house-style assets are installed under
pub const DEFAULT_ASSET_ROOT: &str = "housestyles.bundle";

/// A bundled house style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleId {
    BubbleWrap,
    Cinnabar,
    Refill,
    Walkabout,
    Zinc,
    Tron,
}

const CATALOG: [(StyleId, &str); 6] = [
    (StyleId::BubbleWrap, "bubble-wrap/bubble-wrap-style-more-labels"),
    (StyleId::Cinnabar, "cinnabar/cinnabar-style-more-labels"),
    (StyleId::Refill, "refill/refill-style-more-labels"),
    (StyleId::Walkabout, "walkabout/walkabout-style-more-labels"),
    (StyleId::Zinc, "zinc/zinc-style-more-labels"),
    (StyleId::Tron, "tron/tron-style-more-labels"),
];

impl StyleId {
    /// Every house style, in catalog order
    pub const ALL: [StyleId; 6] = [
        StyleId::BubbleWrap,
        StyleId::Cinnabar,
        StyleId::Refill,
        StyleId::Walkabout,
        StyleId::Zinc,
        StyleId::Tron,
    ];

    /// Scene file fragment for this style
    pub fn scene_fragment(self) -> &'static str {
        CATALOG
            .iter()
            .find(|(style, _)| *style == self)
            .map(|(_, fragment)| *fragment)
            .unwrap_or_default()
    }

    /// Look up a style by its exact scene file fragment
    pub fn from_scene_fragment(fragment: &str) -> Option<Self> {
        CATALOG
            .iter()
            .find(|(_, candidate)| *candidate == fragment)
            .map(|(style, _)| *style)
    }

    pub fn name(self) -> &'static str {
        match self {
            StyleId::BubbleWrap => "bubbleWrap",
            StyleId::Cinnabar => "cinnabar",
            StyleId::Refill => "refill",
            StyleId::Walkabout => "walkabout",
            StyleId::Zinc => "zinc",
            StyleId::Tron => "tron",
        }
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StyleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleId::ALL
            .iter()
            .copied()
            .find(|style| style.name() == s)
            .ok_or_else(|| format!("Unknown style '{}'", s))
    }
}

/// Resolves styles to scene paths and engine-resolved paths back to styles
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    asset_root: String,
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_ROOT)
    }
}

impl StyleCatalog {
    /// Create a catalog whose scene paths live under `asset_root`
    pub fn new(asset_root: impl Into<String>) -> Self {
        let asset_root = asset_root.into();
        Self {
            asset_root: asset_root.trim_end_matches('/').to_string(),
        }
    }

    pub fn asset_root(&self) -> &str {
        &self.asset_root
    }

    /// Path fragment for a style
    pub fn resolve(&self, style: StyleId) -> &'static str {
        style.scene_fragment()
    }

    /// Scene file path handed to the engine
    pub fn scene_path(&self, style: StyleId) -> String {
        if self.asset_root.is_empty() {
            format!("{}{}", style.scene_fragment(), SCENE_EXTENSION)
        } else {
            format!("{}/{}{}", self.asset_root, style.scene_fragment(), SCENE_EXTENSION)
        }
    }

    /// Identify the style behind a path reported by the engine.
    ///
    /// Only the last two segments matter, so any install prefix or URL
    /// scheme in front of `<dir>/<file>.yaml` is ignored.
    pub fn identify(&self, path: &str) -> Option<StyleId> {
        let mut segments = path.rsplit('/');
        let file = segments.next()?;
        let dir = segments.next()?;
        if dir.is_empty() {
            return None;
        }
        let file = file.strip_suffix(SCENE_EXTENSION)?;
        StyleId::from_scene_fragment(&format!("{}/{}", dir, file))
    }
}
