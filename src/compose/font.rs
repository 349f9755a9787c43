// Font resolution for ticket number stamping: configured files -> system font -> built-in digits

use std::path::{Path, PathBuf};

use crate::error::TicketOverlayError;

/// Characters a face must provide to be usable for stamping.
const REQUIRED_CHARS: &str = "0123456789";

/// A face that can draw ticket numbers.
#[derive(Clone)]
pub enum StampFace {
    /// A TrueType/OpenType face (`index` selects the face inside a collection).
    Outline {
        data: Vec<u8>,
        index: u32,
        source: String,
    },
    /// Built-in 5x7 bitmap digits. Always available.
    Builtin,
}

impl std::fmt::Debug for StampFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StampFace::Outline { source, index, .. } => f
                .debug_struct("Outline")
                .field("source", source)
                .field("index", index)
                .finish(),
            StampFace::Builtin => f.write_str("Builtin"),
        }
    }
}

impl StampFace {
    pub fn describe(&self) -> &str {
        match self {
            StampFace::Outline { source, .. } => source,
            StampFace::Builtin => "built-in digits",
        }
    }
}

/// One entry of the font lookup list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    /// Bold sans-serif from the installed system fonts.
    System,
}

/// Configured files in order, then the system font.
pub fn default_sources(configured: &[PathBuf]) -> Vec<FontSource> {
    configured
        .iter()
        .cloned()
        .map(FontSource::File)
        .chain(std::iter::once(FontSource::System))
        .collect()
}

/// Try each source in order and take the first usable face.
///
/// Falls back to [`StampFace::Builtin`], so this never fails.
pub fn resolve_face(sources: &[FontSource]) -> StampFace {
    for source in sources {
        let loaded = match source {
            FontSource::File(path) => load_file(path),
            FontSource::System => load_system(),
        };
        match loaded {
            Ok(face) => {
                tracing::debug!(font = face.describe(), "stamp font resolved");
                return face;
            }
            Err(e) => tracing::debug!(?source, error = %e, "stamp font source failed"),
        }
    }
    tracing::debug!("no stamp font found, using built-in digits");
    StampFace::Builtin
}

fn load_file(path: &Path) -> crate::error::Result<StampFace> {
    let data = std::fs::read(path)
        .map_err(|e| TicketOverlayError::font(format!("{}: {e}", path.display())))?;
    check_usable(&data, 0)?;
    Ok(StampFace::Outline {
        data,
        index: 0,
        source: path.display().to_string(),
    })
}

fn load_system() -> crate::error::Result<StampFace> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif],
        weight: fontdb::Weight::BOLD,
        ..Default::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| TicketOverlayError::font("no system sans-serif font"))?;
    let source = db
        .face(id)
        .map(|info| info.post_script_name.clone())
        .unwrap_or_else(|| "system font".to_string());
    let (data, index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| TicketOverlayError::font("system font data unavailable"))?;

    check_usable(&data, index)?;
    Ok(StampFace::Outline {
        data,
        index,
        source,
    })
}

fn check_usable(data: &[u8], index: u32) -> crate::error::Result<()> {
    let face = ttf_parser::Face::parse(data, index)
        .map_err(|e| TicketOverlayError::font(format!("unparseable font: {e}")))?;
    for c in REQUIRED_CHARS.chars() {
        let Some(gid) = face.glyph_index(c) else {
            return Err(TicketOverlayError::font(format!("font has no glyph for '{c}'")));
        };
        // subset fonts map digits to empty glyphs
        if face.glyph_bounding_box(gid).is_none() {
            return Err(TicketOverlayError::font(format!(
                "font has no outline for '{c}'"
            )));
        }
    }
    Ok(())
}
