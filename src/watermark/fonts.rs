//! Font lookup by family name.
//!
//! The text compositor asks a [`FontRegistry`] for a font every time it
//! draws; the default [`SystemFontRegistry`] indexes installed system fonts
//! plus any configured directories once, at construction.

use super::RenderFault;
use crate::config::FontsConfig;
use ab_glyph::FontVec;
use fontdb::{Database, Family, Query};

/// Host font registry.
pub trait FontRegistry: Send + Sync {
    /// Load the face registered under `family`.
    fn resolve(&self, family: &str) -> Result<FontVec, RenderFault>;
}

/// Font registry backed by a `fontdb` database.
pub struct SystemFontRegistry {
    db: Database,
}

impl SystemFontRegistry {
    pub fn new(config: &FontsConfig) -> Self {
        let mut db = Database::new();
        if config.load_system_fonts {
            db.load_system_fonts();
        }
        for dir in &config.dirs {
            db.load_fonts_dir(dir);
        }

        tracing::debug!(faces = db.len(), "Font database loaded");
        Self { db }
    }

    /// Build from raw font files, skipping system fonts entirely.
    pub fn from_font_data(fonts: impl IntoIterator<Item = Vec<u8>>) -> Self {
        let mut db = Database::new();
        for data in fonts {
            db.load_font_data(data);
        }
        Self { db }
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Family names of every indexed face, sorted and deduplicated.
    pub fn families(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .db
            .faces()
            .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl FontRegistry for SystemFontRegistry {
    fn resolve(&self, family: &str) -> Result<FontVec, RenderFault> {
        let fault = |reason: String| RenderFault::FontResolution {
            font: family.to_string(),
            reason,
        };

        let families = [Family::Name(family)];
        let id = self
            .db
            .query(&Query {
                families: &families,
                ..Query::default()
            })
            .ok_or_else(|| fault("no matching face installed".to_string()))?;

        self.db
            .with_face_data(id, |data, index| {
                FontVec::try_from_vec_and_index(data.to_vec(), index)
            })
            .ok_or_else(|| fault("face data unavailable".to_string()))?
            .map_err(|e| fault(e.to_string()))
    }
}

impl std::fmt::Debug for SystemFontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemFontRegistry")
            .field("faces", &self.db.len())
            .finish()
    }
}
