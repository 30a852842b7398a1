//! Application settings.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! title = "Picking"
//! width = 800
//! move_speed = 4.0
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::color::Color;
use crate::error::ConfigError;

/// Window, camera and control settings for the runner and demos.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Degrees of rotation per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    /// Units per second.
    pub move_speed: f32,
    /// Degrees per second.
    pub rotate_speed: f32,
    pub texture_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Trireme".to_string(),
            width: 1280,
            height: 720,
            clear_color: [0.6, 0.6, 0.6, 1.0],
            fov_degrees: 75.0,
            near: 1e-4,
            far: 1e10,
            mouse_sensitivity: 0.25,
            move_speed: 10.0,
            rotate_speed: 500.0,
            texture_path: "cubetexture.png".to_string(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color.to_array();
        self
    }

    pub fn fov_degrees(mut self, fov: f32) -> Self {
        self.fov_degrees = fov;
        self
    }

    pub fn clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn texture_path(mut self, path: impl Into<String>) -> Self {
        self.texture_path = path.into();
        self
    }

    pub fn background(&self) -> Color {
        Color::from(self.clear_color)
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.title, "Trireme");
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.mouse_sensitivity, 0.25);
    }

    #[test]
    fn toml_overrides_only_named_keys() {
        let config = AppConfig::from_toml_str(
            r#"
            title = "Picking"
            width = 800
            move_speed = 4.0
            clear_color = [0.0, 0.0, 0.0, 1.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.title, "Picking");
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 720);
        assert_eq!(config.move_speed, 4.0);
        assert_eq!(config.background(), Color::BLACK);
        assert_eq!(config.rotate_speed, 500.0);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml_str("width = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::from_toml_file("/nonexistent/trireme.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn builder_methods_chain() {
        let config = AppConfig::new()
            .title("Demo")
            .size(640, 480)
            .fov_degrees(60.0)
            .clip_planes(0.1, 100.0)
            .clear_color(Color::WHITE);
        assert_eq!(config.title, "Demo");
        assert!((config.aspect() - 4.0 / 3.0).abs() < 1e-6);
        assert_eq!((config.near, config.far), (0.1, 100.0));
        assert_eq!(config.clear_color, [1.0, 1.0, 1.0, 1.0]);
    }
}
