use glam::{EulerRot, Quat, Vec3};

use crate::{
    animation::{Animated, Channel},
    scene_graph::{object3d::ObjectId, scene::Scene},
};

/// The objects that take turns on stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    Earth,
    Plates,
    Country,
    Landmark,
}

impl Actor {
    pub const ALL: [Actor; 4] = [Actor::Earth, Actor::Plates, Actor::Country, Actor::Landmark];

    pub fn name(self) -> &'static str {
        match self {
            Actor::Earth => "Earth",
            Actor::Plates => "Plates",
            Actor::Country => "Country",
            Actor::Landmark => "Landmark",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Position, Euler rotation (XYZ order, radians) and per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActorState {
    pub pose: Pose,
    pub visible: bool,
    /// Root scene object, once the actor's mesh is in the scene.
    pub object: Option<ObjectId>,
}

/// Logical state of every actor. Exists from startup, before any mesh has loaded, so
/// transitions can run against actors whose meshes arrive later or never.
pub struct Cast {
    actors: [ActorState; 4],
}

impl Cast {
    pub fn new(initial: impl Fn(Actor) -> (Pose, bool)) -> Self {
        let actors = Actor::ALL.map(|actor| {
            let (pose, visible) = initial(actor);
            ActorState {
                pose,
                visible,
                object: None,
            }
        });

        Self { actors }
    }

    pub fn get(&self, actor: Actor) -> &ActorState {
        &self.actors[actor.index()]
    }

    pub fn get_mut(&mut self, actor: Actor) -> &mut ActorState {
        &mut self.actors[actor.index()]
    }

    pub fn pose(&self, actor: Actor) -> Pose {
        self.get(actor).pose
    }

    pub fn is_visible(&self, actor: Actor) -> bool {
        self.get(actor).visible
    }

    pub fn set_visible(&mut self, actor: Actor, visible: bool) {
        self.get_mut(actor).visible = visible;
    }

    /// Makes `actor` the only visible actor.
    pub fn show_only(&mut self, actor: Actor) {
        for state in &mut self.actors {
            state.visible = false;
        }
        self.set_visible(actor, true);
    }

    pub fn visible_actors(&self) -> Vec<Actor> {
        Actor::ALL
            .into_iter()
            .filter(|actor| self.is_visible(*actor))
            .collect()
    }

    pub fn attach(&mut self, actor: Actor, object: ObjectId) {
        self.get_mut(actor).object = Some(object);
    }

    /// Writes every attached actor's pose and visibility into its root scene object.
    pub fn sync_to_scene(&self, scene: &mut Scene) {
        for actor in Actor::ALL {
            let state = self.get(actor);
            let Some(object_id) = state.object else {
                continue;
            };

            scene.set_object_transform(
                object_id,
                state.pose.position,
                state.pose.quat(),
                state.pose.scale,
            );
            scene.set_object_visible(object_id, state.visible);
        }
    }
}

impl Animated for Cast {
    type Target = Actor;

    fn channel(&self, actor: Actor, channel: Channel) -> Vec3 {
        let pose = &self.get(actor).pose;
        match channel {
            Channel::Position => pose.position,
            Channel::Rotation => pose.rotation,
            Channel::Scale => pose.scale,
        }
    }

    fn set_channel(&mut self, actor: Actor, channel: Channel, value: Vec3) {
        let pose = &mut self.get_mut(actor).pose;
        match channel {
            Channel::Position => pose.position = value,
            Channel::Rotation => pose.rotation = value,
            Channel::Scale => pose.scale = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_starts_from_initial_state() {
        let cast = Cast::new(|actor| match actor {
            Actor::Earth => (Pose::at(Vec3::new(20.0, 0.0, 0.0)), true),
            Actor::Landmark => (Pose::IDENTITY.with_scale(0.1), false),
            _ => (Pose::IDENTITY, false),
        });

        assert_eq!(cast.visible_actors(), [Actor::Earth]);
        assert_eq!(cast.pose(Actor::Earth).position.x, 20.0);
        assert_eq!(cast.pose(Actor::Landmark).scale, Vec3::splat(0.1));
        assert!(cast.get(Actor::Country).object.is_none());
    }

    #[test]
    fn show_only_hides_everyone_else() {
        let mut cast = Cast::new(|_| (Pose::IDENTITY, true));
        cast.show_only(Actor::Landmark);
        assert_eq!(cast.visible_actors(), [Actor::Landmark]);
    }

    #[test]
    fn channels_map_to_pose_fields() {
        let mut cast = Cast::new(|_| (Pose::IDENTITY, false));
        cast.set_channel(Actor::Plates, Channel::Rotation, Vec3::new(0.0, 3.7, 0.0));
        cast.set_channel(Actor::Plates, Channel::Scale, Vec3::splat(3.0));

        let pose = cast.pose(Actor::Plates);
        assert_eq!(pose.rotation.y, 3.7);
        assert_eq!(pose.scale, Vec3::splat(3.0));
        assert_eq!(pose.position, Vec3::ZERO);
    }

    #[test]
    fn euler_rotation_applies_x_first_like_xyz_order() {
        let pose = Pose {
            rotation: Vec3::new(std::f32::consts::FRAC_PI_2, 0.0, 0.0),
            ..Pose::IDENTITY
        };

        let rotated = pose.quat() * Vec3::Y;
        assert!((rotated - Vec3::Z).length() < 1e-5);
    }
}
