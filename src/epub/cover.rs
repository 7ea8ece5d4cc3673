//! Cover lookup over rbook's manifest.
use crate::error::Result;
use crate::types::CoverImage;
use rbook::prelude::*;
use rbook::Epub;

/// Manifest ids that conventionally name the cover, in priority order.
const COVER_IDS: [&str; 8] = [
    "cover",
    "cover-image",
    "coverimage",
    "cover_image",
    "bookcover",
    "frontcover",
    "cover-art",
    "cover_art",
];

/// Href fragments that suggest a cover when no id matched.
const COVER_HREF_HINTS: [&str; 3] = ["cover", "frontcover", "book-cover"];

/// A manifest entry the resolver may pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverCandidate {
    pub id: String,
    /// Absolute, percent-encoded href as rbook resolves it
    pub href: String,
    pub media_type: String,
    /// Decoded file name of the href
    pub filename: String,
    /// Tagged `cover-image`, either in the manifest or via EPUB 2 `<meta name="cover">`
    pub cover_image: bool,
}

impl CoverCandidate {
    /// Every manifest entry, sorted by href. rbook keeps the manifest in a
    /// hash map, so this is what gives the scan a stable order.
    pub fn from_manifest(epub: &Epub) -> Vec<Self> {
        let mut candidates: Vec<Self> = epub
            .manifest()
            .entries()
            .map(|entry| Self {
                id: entry.id().to_string(),
                href: entry.href().as_str().to_string(),
                media_type: entry.media_type().to_string(),
                filename: entry.href().name().decode().into_owned(),
                cover_image: entry.properties().has_property("cover-image"),
            })
            .collect();
        candidates.sort_by(|a, b| a.href.cmp(&b.href));
        candidates
    }

    fn is_image(&self) -> bool {
        self.media_type.to_ascii_lowercase().starts_with("image/")
    }
}

/// Find and read the cover image.
///
/// Tried in order: the conventional cover ids; the entry tagged
/// `cover-image`; any image whose href mentions a cover. A candidate whose
/// bytes cannot be read is skipped. `None` means the book has no cover,
/// which is not an error.
pub fn resolve_cover(
    candidates: &[CoverCandidate],
    mut read: impl FnMut(&CoverCandidate) -> Result<Vec<u8>>,
) -> Option<CoverImage> {
    let images = || candidates.iter().filter(|c| c.is_image());

    for wanted in COVER_IDS {
        for candidate in images().filter(|c| normalize_id(&c.id) == wanted) {
            if let Some(cover) = try_read(candidate, &mut read) {
                return Some(cover);
            }
        }
    }

    for candidate in images().filter(|c| c.cover_image) {
        if let Some(cover) = try_read(candidate, &mut read) {
            return Some(cover);
        }
    }

    for candidate in images().filter(|c| {
        let href = c.href.to_lowercase();
        COVER_HREF_HINTS.iter().any(|hint| href.contains(hint))
    }) {
        if let Some(cover) = try_read(candidate, &mut read) {
            return Some(cover);
        }
    }

    tracing::debug!("No cover image found in manifest");
    None
}

fn normalize_id(id: &str) -> String {
    id.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn try_read(
    candidate: &CoverCandidate,
    read: &mut impl FnMut(&CoverCandidate) -> Result<Vec<u8>>,
) -> Option<CoverImage> {
    match read(candidate) {
        Ok(data) if !data.is_empty() => {
            let filename = if candidate.filename.trim().is_empty() {
                "cover.bin".to_string()
            } else {
                candidate.filename.clone()
            };
            Some(CoverImage::new(data, candidate.media_type.clone(), filename))
        }
        Ok(_) => {
            tracing::warn!(href = %candidate.href, "Cover candidate is empty");
            None
        }
        Err(err) => {
            tracing::warn!(href = %candidate.href, "Failed to read cover candidate: {err}");
            None
        }
    }
}
