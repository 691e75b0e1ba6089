//! Per-page raster store.
//!
//! Maps page numbers to encoded bitmaps for the lifetime of an annotation
//! view. The whole mapping travels to the notes API as one JSON blob: an
//! ordered list of `[page_number, data_url]` pairs.

use crate::raster::{RasterResult, RasterSnapshot, Surface};
use std::collections::BTreeMap;

/// In-memory mapping of page number to raster snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRasterStore {
    pages: BTreeMap<u32, RasterSnapshot>,
}

impl PageRasterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the surface into the entry for `page`.
    ///
    /// A blank surface removes the entry instead: absence means "no
    /// annotation on this page".
    pub fn flush(&mut self, page: u32, surface: &Surface) -> RasterResult<()> {
        if surface.is_blank() {
            if self.pages.remove(&page).is_some() {
                log::debug!("Page {} is blank, dropped its raster", page);
            }
            return Ok(());
        }
        let snapshot = surface.snapshot()?;
        self.pages.insert(page, snapshot);
        Ok(())
    }

    /// Clear the surface and draw the stored raster for `page`, if any.
    ///
    /// Returns whether a raster was drawn.
    pub fn restore(&self, page: u32, surface: &mut Surface) -> RasterResult<bool> {
        surface.clear();
        match self.pages.get(&page) {
            Some(snapshot) => {
                surface.draw_snapshot(snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Blank the surface and forget the raster for `page`.
    pub fn clear(&mut self, page: u32, surface: &mut Surface) {
        surface.clear();
        self.pages.remove(&page);
    }

    pub fn get(&self, page: u32) -> Option<&RasterSnapshot> {
        self.pages.get(&page)
    }

    pub fn insert(&mut self, page: u32, snapshot: RasterSnapshot) {
        self.pages.insert(page, snapshot);
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    /// Annotated page numbers in ascending order.
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &RasterSnapshot)> {
        self.pages.iter().map(|(page, snapshot)| (*page, snapshot))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Serialize the whole mapping as `[[page, "data:image/png;base64,..."], ...]`.
    pub fn serialize_all(&self) -> serde_json::Result<String> {
        let pairs: Vec<(u32, &str)> = self
            .pages
            .iter()
            .map(|(page, snapshot)| (*page, snapshot.as_str()))
            .collect();
        serde_json::to_string(&pairs)
    }

    /// Strict parse of a serialized mapping.
    ///
    /// Entries for page 0 are skipped; later duplicates overwrite earlier ones.
    pub fn try_deserialize_all(blob: &str) -> serde_json::Result<Self> {
        let pairs: Vec<(u32, String)> = serde_json::from_str(blob)?;
        let mut store = Self::new();
        for (page, url) in pairs {
            if page == 0 {
                log::warn!("Ignoring drawing entry for invalid page 0");
                continue;
            }
            store.pages.insert(page, RasterSnapshot::from_data_url(url));
        }
        Ok(store)
    }

    /// Parse a serialized mapping, failing soft.
    ///
    /// An empty blob yields an empty store. A malformed blob is logged and
    /// also yields an empty store so the annotation view still opens.
    pub fn deserialize_all(blob: &str) -> Self {
        if blob.trim().is_empty() {
            return Self::new();
        }
        match Self::try_deserialize_all(blob) {
            Ok(store) => store,
            Err(e) => {
                log::warn!("Failed to parse drawing data: {}", e);
                Self::new()
            }
        }
    }
}
