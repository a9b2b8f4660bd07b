//! Demo settings.
//!
//! Defaults describe the stock scene; `LUMEN_ASSETS` and `LUMEN_MODEL`
//! override where the assets live and which model is loaded.

use std::path::PathBuf;

pub const ASSETS_VAR: &str = "LUMEN_ASSETS";
pub const MODEL_VAR: &str = "LUMEN_MODEL";

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Directory the relative paths below resolve against.
    pub asset_root: PathBuf,
    pub model: PathBuf,
    pub container_diffuse: String,
    pub container_specular: String,
    /// Directory of the container textures, relative to `asset_root`.
    pub texture_dir: PathBuf,
    pub clear_colour: wgpu::Color,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "lumen-ngin".to_string(),
            width: 960,
            height: 720,
            asset_root: PathBuf::from("resources"),
            model: PathBuf::from("models/trunk.obj"),
            container_diffuse: "container2.png".to_string(),
            container_specular: "container2_specular.png".to_string(),
            texture_dir: PathBuf::from("textures"),
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.1,
                a: 1.0,
            },
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the variables;
    /// empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let lookup = |key| lookup(key).filter(|value: &String| !value.is_empty());
        if let Some(root) = lookup(ASSETS_VAR) {
            config.asset_root = PathBuf::from(root);
        }
        if let Some(model) = lookup(MODEL_VAR) {
            config.model = PathBuf::from(model);
        }
        config
    }

    /// The model file; absolute model paths are taken as they are.
    pub fn model_path(&self) -> PathBuf {
        self.asset_root.join(&self.model)
    }

    pub fn texture_directory(&self) -> PathBuf {
        self.asset_root.join(&self.texture_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_trunk_model() {
        let config = DemoConfig::default();
        assert_eq!(config.model_path(), PathBuf::from("resources/models/trunk.obj"));
        assert_eq!(config.texture_directory(), PathBuf::from("resources/textures"));
        assert_eq!((config.width, config.height), (960, 720));
    }

    #[test]
    fn lookup_overrides_asset_root_and_model() {
        let config = DemoConfig::from_lookup(|key| match key {
            ASSETS_VAR => Some("/srv/assets".to_string()),
            MODEL_VAR => Some("models/backpack.gltf".to_string()),
            _ => None,
        });
        assert_eq!(
            config.model_path(),
            PathBuf::from("/srv/assets/models/backpack.gltf")
        );
    }

    #[test]
    fn empty_values_are_ignored() {
        let config = DemoConfig::from_lookup(|_| Some(String::new()));
        assert_eq!(config, DemoConfig::default());
    }

    #[test]
    fn absolute_model_path_wins() {
        let config = DemoConfig::from_lookup(|key| {
            (key == MODEL_VAR).then(|| "/tmp/scene.obj".to_string())
        });
        assert_eq!(config.model_path(), PathBuf::from("/tmp/scene.obj"));
    }
}
