use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Atelier Portal".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// One mirror shard, standing for one workshop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentConfig {
    pub category_key: String,
    pub model: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl FragmentConfig {
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.category_key.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundShape {
    #[default]
    Sphere,
    Plane,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub default: String,
    pub shape: BackgroundShape,
    pub by_category: BTreeMap<String, String>,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            default: "backgrounds/default.jpg".to_string(),
            shape: BackgroundShape::Sphere,
            by_category: BTreeMap::new(),
        }
    }
}

impl BackgroundConfig {
    /// Image path for `key`, falling back to the default for `None` or unknown keys.
    pub fn path_for(&self, key: Option<&str>) -> &str {
        key.and_then(|key| self.by_category.get(key))
            .map(String::as_str)
            .unwrap_or(self.default.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeColors {
    /// Overlay color when entering a workshop through its fragment.
    pub portal: [f32; 3],
    /// Overlay color when navigating back out of a gallery.
    pub back: [f32; 3],
}

impl Default for FadeColors {
    fn default() -> Self {
        Self {
            portal: [1.0, 1.0, 1.0],
            back: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceConfig {
    pub window: WindowConfig,
    pub asset_root: PathBuf,
    pub content_path: Option<PathBuf>,
    pub mirror_model: String,
    pub fragments: Vec<FragmentConfig>,
    pub backgrounds: BackgroundConfig,
    pub fades: FadeColors,
}

const DEFAULT_WORKSHOPS: [(&str, &str); 8] = [
    ("ceramics", "Ceramics"),
    ("weaving", "Weaving"),
    ("woodwork", "Woodwork"),
    ("glass", "Glassblowing"),
    ("goldsmith", "Goldsmithing"),
    ("bookbinding", "Bookbinding"),
    ("marquetry", "Marquetry"),
    ("forge", "Forge"),
];

impl Default for ExperienceConfig {
    fn default() -> Self {
        let fragments = DEFAULT_WORKSHOPS
            .iter()
            .enumerate()
            .map(|(index, (key, name))| FragmentConfig {
                category_key: (*key).to_string(),
                model: format!("models/fragment_{index}.glb"),
                display_name: Some((*name).to_string()),
            })
            .collect();
        let by_category = DEFAULT_WORKSHOPS
            .iter()
            .map(|(key, _)| ((*key).to_string(), format!("backgrounds/{key}.jpg")))
            .collect();
        Self {
            window: WindowConfig::default(),
            asset_root: PathBuf::from("assets"),
            content_path: None,
            mirror_model: "models/mirror.glb".to_string(),
            fragments,
            backgrounds: BackgroundConfig {
                by_category,
                ..BackgroundConfig::default()
            },
            fades: FadeColors::default(),
        }
    }
}

impl ExperienceConfig {
    pub fn fragment(&self, index: usize) -> Option<&FragmentConfig> {
        self.fragments.get(index)
    }
}

pub fn save_config_to_file(config: &ExperienceConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_config_from_file(path: &Path) -> Result<ExperienceConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: ExperienceConfig = serde_json::from_str(&json)?;
    Ok(config)
}
