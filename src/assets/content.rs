use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("no content for workshop {0}")]
    MissingWorkshop(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One row of the gallery: a primary image flanked by two detail images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GallerySet {
    pub primary: String,
    pub details: [String; 2],
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkshopContent {
    #[serde(default)]
    pub sets: Vec<GallerySet>,
    #[serde(default)]
    pub background: Option<String>,
}

/// Gallery documents keyed by workshop (fragment) index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentLibrary {
    #[serde(default)]
    workshops: BTreeMap<usize, WorkshopContent>,
}

impl ContentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, content: WorkshopContent) {
        self.workshops.insert(index, content);
    }

    pub fn workshop(&self, index: usize) -> Result<&WorkshopContent, ContentError> {
        self.workshops
            .get(&index)
            .ok_or(ContentError::MissingWorkshop(index))
    }

    pub fn len(&self) -> usize {
        self.workshops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workshops.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ContentError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "workshops": {
            "0": {
                "background": "backgrounds/ceramics.jpg",
                "sets": [
                    {
                        "primary": "ceramics/kiln.jpg",
                        "details": ["ceramics/glaze.jpg", "ceramics/wheel.jpg"],
                        "title": "Kiln",
                        "subtitle": "Firing at dawn"
                    }
                ]
            },
            "3": { "sets": [] }
        }
    }"#;

    #[test]
    fn parses_numeric_workshop_keys() {
        let library = ContentLibrary::from_json(SAMPLE).unwrap();
        assert_eq!(library.len(), 2);
        let ceramics = library.workshop(0).unwrap();
        assert_eq!(ceramics.sets.len(), 1);
        assert_eq!(ceramics.sets[0].details[1], "ceramics/wheel.jpg");
        assert_eq!(ceramics.background.as_deref(), Some("backgrounds/ceramics.jpg"));
        assert!(library.workshop(3).unwrap().background.is_none());
    }

    #[test]
    fn missing_workshop_is_reported() {
        let library = ContentLibrary::from_json(SAMPLE).unwrap();
        assert!(matches!(
            library.workshop(7),
            Err(ContentError::MissingWorkshop(7))
        ));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(matches!(
            ContentLibrary::from_json("{\"workshops\": 3}"),
            Err(ContentError::Json(_))
        ));
    }
}
