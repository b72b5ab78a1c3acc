use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{CardError, CardResult};

/// Family tried first when querying the system font database.
pub const DEFAULT_FAMILY: &str = "Lexend Deca";

/// Font selection. Explicit file paths win over the system database.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontConfig {
    pub bold_path: Option<PathBuf>,
    pub regular_path: Option<PathBuf>,
    pub family: Option<String>,
}

/// The two text roles drawn on the card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontRole {
    Bold,
    Regular,
}

/// Raw font file bytes plus the face index inside the file.
#[derive(Clone)]
pub struct FontFace {
    pub family: String,
    pub bytes: Arc<Vec<u8>>,
    pub index: u32,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("bytes_len", &self.bytes.len())
            .field("index", &self.index)
            .finish()
    }
}

/// Faces used for the bold and regular text roles.
#[derive(Clone, Debug, Default)]
pub struct FontSet {
    pub bold: Option<FontFace>,
    pub regular: Option<FontFace>,
}

impl FontSet {
    /// A set with no faces. Text ops are skipped when rendering with it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve faces from configured files, falling back to the system font database.
    pub fn resolve(cfg: &FontConfig) -> Self {
        let mut bold = cfg.bold_path.as_deref().and_then(|p| load_logged(p));
        let mut regular = cfg.regular_path.as_deref().and_then(|p| load_logged(p));

        if bold.is_none() || regular.is_none() {
            let family = cfg.family.as_deref().unwrap_or(DEFAULT_FAMILY);
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            if bold.is_none() {
                bold = query_system(&db, family, usvg::fontdb::Weight::BOLD);
            }
            if regular.is_none() {
                regular = query_system(&db, family, usvg::fontdb::Weight::NORMAL);
            }
        }

        tracing::debug!(
            bold = bold.as_ref().map(|f| f.family.as_str()),
            regular = regular.as_ref().map(|f| f.family.as_str()),
            "resolved card fonts"
        );
        Self { bold, regular }
    }

    /// Face for `role`; a missing role borrows the other one.
    pub fn face(&self, role: FontRole) -> Option<&FontFace> {
        match role {
            FontRole::Bold => self.bold.as_ref().or(self.regular.as_ref()),
            FontRole::Regular => self.regular.as_ref().or(self.bold.as_ref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bold.is_none() && self.regular.is_none()
    }
}

/// Load one font file and detect its primary family name.
pub fn load_font_file(path: &Path) -> CardResult<FontFace> {
    let bytes = std::fs::read(path).map_err(|e| {
        CardError::validation(format!("read font file '{}': {e}", path.display()))
    })?;
    face_from_bytes(bytes)
}

/// Wrap font bytes, taking the family from the first face in the data.
pub fn face_from_bytes(bytes: Vec<u8>) -> CardResult<FontFace> {
    let mut db = usvg::fontdb::Database::new();
    db.load_font_data(bytes.clone());
    let face = db
        .faces()
        .next()
        .ok_or_else(|| CardError::validation("font data contains no faces"))?;
    let family = face
        .families
        .first()
        .map(|(name, _)| name.clone())
        .ok_or_else(|| CardError::validation("font face has no family name"))?;
    Ok(FontFace {
        family,
        index: face.index,
        bytes: Arc::new(bytes),
    })
}

fn load_logged(path: &Path) -> Option<FontFace> {
    match load_font_file(path) {
        Ok(face) => Some(face),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "configured font unusable");
            None
        }
    }
}

fn query_system(
    db: &usvg::fontdb::Database,
    family: &str,
    weight: usvg::fontdb::Weight,
) -> Option<FontFace> {
    let families = [
        usvg::fontdb::Family::Name(family),
        usvg::fontdb::Family::SansSerif,
    ];
    let query = usvg::fontdb::Query {
        families: &families,
        weight,
        stretch: usvg::fontdb::Stretch::Normal,
        style: usvg::fontdb::Style::Normal,
    };
    let id = db.query(&query).or_else(|| db.faces().next().map(|f| f.id))?;
    let name = db
        .face(id)
        .and_then(|f| f.families.first().map(|(n, _)| n.clone()))?;
    let (bytes, index) = db.with_face_data(id, |data, index| (data.to_vec(), index))?;
    Some(FontFace {
        family: name,
        bytes: Arc::new(bytes),
        index,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
