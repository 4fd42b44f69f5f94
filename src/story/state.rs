use std::time::Instant;

use anyhow::Context;
use glam::Vec3;

use crate::{
    animation::Tweens,
    asset_pipeline::{
        images::load_texture_or,
        materials::{MaterialOverride, PbrMaterialData, TextureData},
        primitives::uv_sphere,
        starfield::starfield,
    },
    assets::{AssetLoader, LoadedModel, ModelRequest},
    camera::Camera,
    config::StoryConfig,
    material_manager::MaterialManager,
    model::Model,
    scene_graph::{object3d::Object3D, scene::Scene},
    story::{
        actor::{Actor, Cast, Pose},
        choreography::Choreographer,
        scroll::{PageLayout, ScrollTriggers, TriggerStart},
    },
};

const EARTH_RADIUS: f32 = 10.0;
const PLATES_RADIUS: f32 = 5.0;
const SPHERE_SEGMENTS: u32 = 64;

const LANDMARK_COLOR: u32 = 0xaba196;

fn opening_pose(actor: Actor) -> Pose {
    match actor {
        Actor::Earth => Pose::at(Vec3::new(20.0, 0.0, 0.0)),
        Actor::Landmark => Pose::IDENTITY.with_scale(0.1),
        Actor::Plates | Actor::Country => Pose::IDENTITY,
    }
}

pub struct StoryState {
    pub config: StoryConfig,
    pub camera: Camera,
    pub start_time: Instant,
    pub scene: Scene,
    pub materials: MaterialManager,
    pub cast: Cast,
    pub tweens: Tweens<Cast>,
    pub choreographer: Choreographer,
    pub triggers: ScrollTriggers,
    pub layout: PageLayout,
    pub scroll: f32,
    pub show_debug: bool,
    /// Taken by the renderer when it creates the background pass.
    pub backdrop: Option<TextureData>,
    loader: AssetLoader,
}

impl StoryState {
    pub fn new(config: StoryConfig, viewport_height: f32) -> anyhow::Result<Self> {
        let camera = Camera::from_config(&config.camera);

        let choreographer = Choreographer::new(
            config.opening,
            config.transitions.clone(),
            config.transition_duration,
        )
        .context("Invalid transition chain")?;

        let start: TriggerStart = config
            .trigger_start
            .parse()
            .context("Invalid trigger start")?;
        let triggers = ScrollTriggers::new(
            &config.sections,
            choreographer
                .transitions()
                .iter()
                .map(|transition| transition.section.as_str()),
            start,
        )?;

        let layout = PageLayout::new(&config.sections, viewport_height);

        let opening = config.opening;
        let mut cast = Cast::new(|actor| (opening_pose(actor), actor == opening));

        let mut scene = Scene::new();
        for actor in Actor::ALL {
            let root = scene.add_object(Object3D::named(actor.name()));
            cast.attach(actor, root);
        }

        let mut materials = MaterialManager::new();
        spawn_spheres(&config, &cast, &mut scene, &mut materials);

        let backdrop = load_texture_or(&config.asset("space.jpg"), || {
            starfield(2048, 1024, 4000, &mut rand::thread_rng())
        });

        let mut loader = AssetLoader::new();
        loader.request(ModelRequest {
            actor: Actor::Country,
            path: config.asset("colombia.glb"),
            material_override: None,
        });
        loader.request(ModelRequest {
            actor: Actor::Landmark,
            path: config.asset("Monserrate.glb"),
            material_override: Some(MaterialOverride::from_hex(LANDMARK_COLOR, 0.5, 0.2)),
        });

        cast.sync_to_scene(&mut scene);

        Ok(Self {
            config,
            camera,
            start_time: Instant::now(),
            scene,
            materials,
            cast,
            tweens: Tweens::new(),
            choreographer,
            triggers,
            layout,
            scroll: 0.0,
            show_debug: false,
            backdrop: Some(backdrop),
            loader,
        })
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll_to(self.scroll + delta);
    }

    pub fn scroll_to(&mut self, offset: f32) {
        self.scroll = offset.clamp(0.0, self.layout.max_scroll());
    }

    pub fn scroll_lines(&mut self, lines: f32) {
        self.scroll_by(lines * self.config.scroll_step);
    }

    pub fn scroll_pages(&mut self, pages: f32) {
        self.scroll_by(pages * self.layout.viewport_height());
    }

    pub fn scroll_to_end(&mut self) {
        self.scroll_to(self.layout.max_scroll());
    }

    /// Relays out the page, keeping the same relative scroll position.
    pub fn resize_viewport(&mut self, viewport_height: f32) {
        let progress = self.scroll_progress();

        self.layout = PageLayout::new(&self.config.sections, viewport_height);
        self.scroll_to(progress * self.layout.max_scroll());
    }

    /// How far down the page the reader is, from 0 to 1.
    pub fn scroll_progress(&self) -> f32 {
        match self.layout.max_scroll() {
            max if max > 0.0 => self.scroll / max,
            _ => 0.0,
        }
    }

    pub fn pending_models(&self) -> usize {
        self.loader.pending()
    }

    pub fn update(&mut self, dt: f32) {
        for loaded in self.loader.poll() {
            let actor = loaded.request.actor;
            if let Err(e) = self.spawn_loaded_model(loaded) {
                log::error!("{} will not be shown: {:#}", actor.name(), e);
            }
        }

        for event in self.triggers.update(&self.layout, self.scroll) {
            self.choreographer
                .handle(event, &mut self.cast, &mut self.tweens);
        }

        self.tweens.update(dt, &mut self.cast);

        self.cast.get_mut(Actor::Earth).pose.rotation.y += self.config.earth_spin * dt;

        self.cast.sync_to_scene(&mut self.scene);
    }

    fn spawn_loaded_model(&mut self, loaded: LoadedModel) -> anyhow::Result<()> {
        let LoadedModel {
            request,
            document,
            buffers,
            images,
        } = loaded;
        let file_name = request.file_name();

        self.materials.load_all_materials_from_gltf(
            &file_name,
            &document,
            &images,
            request.material_override,
        );

        let gltf_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .with_context(|| format!("No scenes in {}", file_name))?;

        let root = self
            .cast
            .get(request.actor)
            .object
            .with_context(|| format!("{} has no scene object", request.actor.name()))?;

        let spawned = self.scene.spawn_gltf_scene(
            &self.materials,
            &file_name,
            &buffers,
            &gltf_scene,
            Some(root),
        )?;

        log::info!(
            "Spawned {} ({} root nodes) as {}",
            file_name,
            spawned.len(),
            request.actor.name()
        );

        Ok(())
    }
}

fn spawn_spheres(
    config: &StoryConfig,
    cast: &Cast,
    scene: &mut Scene,
    materials: &mut MaterialManager,
) {
    let earth_material = materials.add_material(
        PbrMaterialData::new("Earth")
            .with_base_color(load_texture_or(&config.asset("earth.jpg"), || {
                TextureData::solid([40, 90, 160, 255])
            }))
            .with_normal(load_texture_or(&config.asset("earthnormal.jpg"), || {
                TextureData::solid([128, 128, 255, 255])
            })),
    );

    let plates_material = materials.add_material(
        PbrMaterialData::new("Plates").with_base_color(load_texture_or(
            &config.asset("tectonic.jpg"),
            || TextureData::solid([150, 110, 70, 255]),
        )),
    );

    let spheres = [
        (Actor::Earth, EARTH_RADIUS, earth_material),
        (Actor::Plates, PLATES_RADIUS, plates_material),
    ];

    for (actor, radius, material) in spheres {
        let sphere = uv_sphere(radius, SPHERE_SEGMENTS, SPHERE_SEGMENTS, Some(material));
        let name = format!("{} sphere", actor.name());
        let parent = cast.get(actor).object;
        scene.spawn_model(name.clone(), Model::from_primitive(name, sphere), parent);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn state() -> StoryState {
        let config = StoryConfig {
            asset_dir: PathBuf::from("does-not-exist"),
            ..StoryConfig::default()
        };
        StoryState::new(config, 800.0).unwrap()
    }

    fn run_frames(state: &mut StoryState, frames: usize) {
        for _ in 0..frames {
            state.update(FRAME);
        }
    }

    fn visible_roots(state: &StoryState) -> Vec<Actor> {
        Actor::ALL
            .into_iter()
            .filter(|actor| {
                let root = state.cast.get(*actor).object.unwrap();
                state.scene.is_visible_in_hierarchy(root)
            })
            .collect()
    }

    #[test]
    fn starts_on_the_spinning_earth() {
        let mut state = state();
        assert_eq!(visible_roots(&state), [Actor::Earth]);
        assert!(state.backdrop.is_some());

        run_frames(&mut state, 60);

        let earth = state.cast.pose(Actor::Earth);
        assert!((earth.rotation.y - 0.3).abs() < 1e-3);
        assert_eq!(earth.position, Vec3::new(20.0, 0.0, 0.0));
    }

    #[test]
    fn scrolling_through_the_page_hands_off_between_actors() {
        let mut state = state();
        let expected = [Actor::Country, Actor::Plates, Actor::Landmark, Actor::Earth];

        for (index, actor) in expected.into_iter().enumerate() {
            let trigger = state.triggers.iter().nth(index).unwrap();
            let offset = trigger.offset(&state.layout);
            state.scroll_to(offset + 1.0);

            run_frames(&mut state, 180);

            assert_eq!(state.triggers.active_count(), index + 1);
            assert_eq!(visible_roots(&state), [actor]);
        }

        state.scroll_to(0.0);
        run_frames(&mut state, 600);

        assert_eq!(visible_roots(&state), [Actor::Earth]);
        let earth = state.cast.pose(Actor::Earth).position;
        assert!((earth - Vec3::new(20.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn flinging_to_the_end_and_back_settles_cleanly() {
        let mut state = state();

        state.scroll_to_end();
        state.update(FRAME);
        state.scroll_to(0.0);
        state.update(FRAME);
        state.scroll_to_end();
        run_frames(&mut state, 300);

        assert_eq!(visible_roots(&state), [Actor::Earth]);
        assert!(state.tweens.is_empty());
    }

    #[test]
    fn scroll_is_clamped_to_the_page() {
        let mut state = state();

        state.scroll_by(-100.0);
        assert_eq!(state.scroll, 0.0);
        assert_eq!(state.scroll_progress(), 0.0);

        state.scroll_pages(100.0);
        assert_eq!(state.scroll, state.layout.max_scroll());
        assert_eq!(state.scroll_progress(), 1.0);

        state.resize_viewport(400.0);
        assert_eq!(state.scroll, state.layout.max_scroll());
    }

    #[test]
    fn unknown_trigger_section_fails_startup() {
        let mut config = StoryConfig::default();
        config.sections.retain(|section| section.class != "placas");

        assert!(StoryState::new(config, 800.0).is_err());
    }
}
