use std::path::PathBuf;

use glam::Vec3;

use crate::story::{
    actor::Actor,
    choreography::{story_transitions, Transition},
    scroll::{CaptionAlign, Section},
};

pub const ASSET_DIR_ENV: &str = "GEOSTORY_ASSET_DIR";

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vec3::new(-3.0, 0.0, 30.0),
            target: Vec3::new(-3.0, 0.0, 0.0),
            fov_y_degrees: 75.0,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoryConfig {
    pub asset_dir: PathBuf,
    pub camera: CameraConfig,
    /// Seconds per tween.
    pub transition_duration: f32,
    /// Earth spin in radians per second.
    pub earth_spin: f32,
    /// Pixels scrolled per mouse wheel line.
    pub scroll_step: f32,
    pub sections: Vec<Section>,
    pub trigger_start: String,
    pub opening: Actor,
    pub transitions: Vec<Transition>,
}

impl StoryConfig {
    /// Defaults, with the asset directory taken from the environment when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = std::env::var_os(ASSET_DIR_ENV) {
            config.asset_dir = PathBuf::from(dir);
            log::info!("Using assets from {}", config.asset_dir.display());
        }

        config
    }

    pub fn asset(&self, file_name: &str) -> PathBuf {
        self.asset_dir.join(file_name)
    }

    pub fn shader_dir(&self) -> PathBuf {
        self.asset_dir.join("shaders")
    }
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            camera: CameraConfig::default(),
            transition_duration: 1.0,
            // 0.005 rad per frame at 60 Hz
            earth_spin: 0.3,
            scroll_step: 60.0,
            sections: vec![
                Section::new(
                    "intro",
                    "Colombia",
                    "A country shaped by the collision of three tectonic plates. Scroll down.",
                ),
                Section::new(
                    "cordilleras",
                    "Las cordilleras",
                    "The Andes split into three ranges as they enter Colombia: the Western, \
                     Central and Eastern cordilleras.",
                )
                .with_align(CaptionAlign::Left),
                Section::new(
                    "placas",
                    "Placas tectónicas",
                    "The Nazca plate slides beneath South America while the Caribbean plate \
                     presses from the north, lifting the mountains a little every year.",
                )
                .with_align(CaptionAlign::Left),
                Section::new(
                    "left",
                    "Monserrate",
                    "Rising over Bogotá at 3,152 metres, Monserrate is a remnant of the \
                     Eastern cordillera's uplift.",
                )
                .with_align(CaptionAlign::Right),
                Section::new(
                    "regreso",
                    "De regreso",
                    "Back to the globe, where it all began.",
                )
                .with_height(1.5)
                .with_align(CaptionAlign::Center),
            ],
            trigger_start: "top center".to_string(),
            opening: Actor::Earth,
            transitions: story_transitions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_transition_has_a_section() {
        let config = StoryConfig::default();

        for transition in &config.transitions {
            assert!(
                config
                    .sections
                    .iter()
                    .any(|section| section.class == transition.section),
                "no section for {}",
                transition.section
            );
        }
    }

    #[test]
    fn assets_resolve_under_the_asset_dir() {
        let config = StoryConfig {
            asset_dir: PathBuf::from("/srv/story"),
            ..StoryConfig::default()
        };

        assert_eq!(config.asset("earth.jpg"), PathBuf::from("/srv/story/earth.jpg"));
        assert_eq!(config.shader_dir(), PathBuf::from("/srv/story/shaders"));
    }
}
