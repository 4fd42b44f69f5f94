use std::f32::consts::PI;

use crate::{
    animation::{Channel, Ease, Tweens, Vec3Target},
    story::{
        actor::{Actor, Cast},
        scroll::{TriggerEvent, TriggerKind},
    },
};

/// Destination for any subset of an actor's pose channels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PoseTarget {
    pub position: Vec3Target,
    pub rotation: Vec3Target,
    pub scale: Vec3Target,
}

impl PoseTarget {
    pub fn position(mut self, position: Vec3Target) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Vec3Target) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = Vec3Target::splat(scale);
        self
    }
}

/// A hand-off between two actors, bound to the page section that triggers it.
///
/// Scrolling into the section moves `outgoing` off to its `exit` position, then swaps
/// visibility and brings `incoming` to its `featured` pose. Scrolling back out returns
/// `incoming` through `retreat` and, once it is out of the way, brings `outgoing` back to
/// `rest`.
#[derive(Debug, Clone)]
pub struct Transition {
    pub section: String,
    pub outgoing: Actor,
    pub incoming: Actor,
    pub exit: Vec3Target,
    pub featured: PoseTarget,
    pub retreat: PoseTarget,
    pub rest: Vec3Target,
}

/// Rotation that turns a Y-up model so it faces the camera upright.
const FACE_CAMERA: Vec3Target = Vec3Target::xyz(3.0 * PI / 2.0, PI, PI);

/// The four hand-offs of the story, in page order.
pub fn story_transitions() -> Vec<Transition> {
    let off_stage = Vec3Target::xz(30.0, 30.0);
    let featured = Vec3Target::x(25.0);
    let back_to_origin = Vec3Target::x(0.0);
    let resting = Vec3Target::xz(20.0, 0.0);

    vec![
        Transition {
            section: "cordilleras".to_string(),
            outgoing: Actor::Earth,
            incoming: Actor::Country,
            exit: off_stage,
            featured: PoseTarget::default()
                .rotation(FACE_CAMERA)
                .scale(3.0)
                .position(featured),
            retreat: PoseTarget::default()
                .rotation(Vec3Target::splat(0.0))
                .scale(1.0)
                .position(back_to_origin),
            rest: resting,
        },
        Transition {
            section: "placas".to_string(),
            outgoing: Actor::Country,
            incoming: Actor::Plates,
            exit: off_stage,
            featured: PoseTarget::default()
                .rotation(Vec3Target::y(3.7))
                .scale(3.0)
                .position(featured),
            retreat: PoseTarget::default()
                .rotation(Vec3Target::splat(0.0))
                .scale(1.0)
                .position(back_to_origin),
            rest: resting,
        },
        Transition {
            section: "left".to_string(),
            outgoing: Actor::Plates,
            incoming: Actor::Landmark,
            exit: off_stage,
            featured: PoseTarget::default()
                .position(Vec3Target::xyz(-30.0, -10.0, 10.0))
                .rotation(FACE_CAMERA),
            retreat: PoseTarget::default()
                .rotation(Vec3Target::splat(0.0))
                .position(back_to_origin),
            rest: resting,
        },
        Transition {
            section: "regreso".to_string(),
            outgoing: Actor::Landmark,
            incoming: Actor::Earth,
            exit: Vec3Target::xyz(-60.0, -10.0, 30.0),
            featured: PoseTarget::default()
                .position(Vec3Target::xyz(-3.0, 0.0, 0.0))
                .scale(0.6),
            retreat: PoseTarget::default()
                .scale(1.0)
                .position(Vec3Target::xyz(30.0, 0.0, 30.0)),
            rest: Vec3Target::xyz(-30.0, -10.0, 10.0),
        },
    ]
}

/// Runs the transition for each trigger event. Trigger `n` drives `transitions[n]`, and
/// tweens started for it are tagged with group `n`.
pub struct Choreographer {
    opening: Actor,
    transitions: Vec<Transition>,
    duration: f32,
}

impl Choreographer {
    /// Transitions must form a chain starting at `opening`: each one hands off from the
    /// actor the previous one brought in.
    pub fn new(opening: Actor, transitions: Vec<Transition>, duration: f32) -> anyhow::Result<Self> {
        let mut on_stage = opening;
        for transition in &transitions {
            anyhow::ensure!(
                transition.outgoing == on_stage,
                "Transition {:?} hands off from {} but {} is on stage",
                transition.section,
                transition.outgoing.name(),
                on_stage.name()
            );
            anyhow::ensure!(
                transition.incoming != transition.outgoing,
                "Transition {:?} hands off {} to itself",
                transition.section,
                transition.incoming.name()
            );
            on_stage = transition.incoming;
        }

        Ok(Self {
            opening,
            transitions,
            duration,
        })
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn opening(&self) -> Actor {
        self.opening
    }

    /// The actor left on stage once `active_count` transitions have played forward.
    pub fn featured_actor(&self, active_count: usize) -> Actor {
        match active_count.checked_sub(1) {
            Some(index) => self
                .transitions
                .get(index)
                .or(self.transitions.last())
                .map_or(self.opening, |transition| transition.incoming),
            None => self.opening,
        }
    }

    pub fn handle(&self, event: TriggerEvent, cast: &mut Cast, tweens: &mut Tweens<Cast>) {
        let Some(transition) = self.transitions.get(event.trigger) else {
            log::warn!("No transition for trigger {}", event.trigger);
            return;
        };

        self.settle(event.trigger, cast, tweens);

        match event.kind {
            TriggerKind::Enter => {
                log::info!(
                    "Entering {}: {} -> {}",
                    transition.section,
                    transition.outgoing.name(),
                    transition.incoming.name()
                );
                self.play_forward(event.trigger, transition, tweens);
            }
            TriggerKind::LeaveBack => {
                log::info!(
                    "Leaving {} upwards: {} -> {}",
                    transition.section,
                    transition.incoming.name(),
                    transition.outgoing.name()
                );
                self.play_backward(event.trigger, transition, tweens);
            }
        }
    }

    // Work left over from the same transition is abandoned where it stands, the new
    // direction picks up from the current values. Work from other transitions is run to
    // completion so its visibility swaps land before this transition's.
    fn settle(&self, group: usize, cast: &mut Cast, tweens: &mut Tweens<Cast>) {
        let killed = tweens.kill_where(|tween| tween.group_id() == Some(group));
        if killed > 0 {
            log::debug!("Killed {} in-flight tweens of transition {}", killed, group);
        }

        tweens.finish_where(cast, |tween| {
            tween.group_id().is_some_and(|other| other != group)
        });
    }

    fn play_forward(&self, group: usize, transition: &Transition, tweens: &mut Tweens<Cast>) {
        let duration = self.duration;
        let incoming = transition.incoming;
        let featured = transition.featured;

        tweens
            .to(transition.outgoing, Channel::Position, transition.exit)
            .duration(duration)
            .ease(Ease::Power2InOut)
            .group(group)
            .on_complete(move |cast, tweens| {
                cast.show_only(incoming);
                start_pose(tweens, incoming, featured, duration, group);
            });
    }

    fn play_backward(&self, group: usize, transition: &Transition, tweens: &mut Tweens<Cast>) {
        let duration = self.duration;
        let incoming = transition.incoming;
        let outgoing = transition.outgoing;
        let rest = transition.rest;
        let retreat = transition.retreat;

        start_pose(
            tweens,
            incoming,
            PoseTarget {
                position: Vec3Target::default(),
                ..retreat
            },
            duration,
            group,
        );

        tweens
            .to(incoming, Channel::Position, retreat.position)
            .duration(duration)
            .ease(Ease::Power2InOut)
            .group(group)
            .on_complete(move |cast, tweens| {
                tweens
                    .to(outgoing, Channel::Position, rest)
                    .duration(duration)
                    .ease(Ease::Power2InOut)
                    .group(group);
                cast.show_only(outgoing);
            });
    }
}

// Rotation, scale and position tweens started together with the default ease
fn start_pose(
    tweens: &mut Tweens<Cast>,
    actor: Actor,
    pose: PoseTarget,
    duration: f32,
    group: usize,
) {
    let channels = [
        (Channel::Rotation, pose.rotation),
        (Channel::Scale, pose.scale),
        (Channel::Position, pose.position),
    ];

    for (channel, target) in channels {
        if target.is_empty() {
            continue;
        }

        tweens
            .to(actor, channel, target)
            .duration(duration)
            .group(group);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::story::actor::Pose;

    fn opening_cast() -> Cast {
        Cast::new(|actor| match actor {
            Actor::Earth => (Pose::at(Vec3::new(20.0, 0.0, 0.0)), true),
            Actor::Landmark => (Pose::IDENTITY.with_scale(0.1), false),
            _ => (Pose::IDENTITY, false),
        })
    }

    fn choreographer() -> Choreographer {
        Choreographer::new(Actor::Earth, story_transitions(), 1.0).unwrap()
    }

    fn event(trigger: usize, kind: TriggerKind) -> TriggerEvent {
        TriggerEvent { trigger, kind }
    }

    fn run_until_idle(cast: &mut Cast, tweens: &mut Tweens<Cast>) {
        for _ in 0..1000 {
            if tweens.is_empty() {
                return;
            }
            tweens.update(1.0 / 60.0, cast);
        }
        panic!("tweens never settled");
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    #[test]
    fn transitions_must_chain() {
        let mut transitions = story_transitions();
        transitions.swap(1, 2);
        assert!(Choreographer::new(Actor::Earth, transitions, 1.0).is_err());
        assert!(Choreographer::new(Actor::Plates, story_transitions(), 1.0).is_err());
    }

    #[test]
    fn each_section_features_one_actor() {
        let choreographer = choreographer();
        let mut cast = opening_cast();
        let mut tweens = Tweens::new();

        let expected = [Actor::Country, Actor::Plates, Actor::Landmark, Actor::Earth];
        for (trigger, actor) in expected.into_iter().enumerate() {
            choreographer.handle(event(trigger, TriggerKind::Enter), &mut cast, &mut tweens);
            run_until_idle(&mut cast, &mut tweens);

            assert_eq!(cast.visible_actors(), [actor]);
            assert_eq!(choreographer.featured_actor(trigger + 1), actor);
        }
    }

    #[test]
    fn country_arrives_at_its_featured_pose() {
        let choreographer = choreographer();
        let mut cast = opening_cast();
        let mut tweens = Tweens::new();

        choreographer.handle(event(0, TriggerKind::Enter), &mut cast, &mut tweens);

        // Halfway through the exit only Earth has moved
        tweens.update(0.5, &mut cast);
        assert_eq!(cast.visible_actors(), [Actor::Earth]);
        assert_eq!(cast.pose(Actor::Country).scale, Vec3::ONE);

        run_until_idle(&mut cast, &mut tweens);

        let earth = cast.pose(Actor::Earth);
        assert!(approx(earth.position, Vec3::new(30.0, 0.0, 30.0)));

        let country = cast.pose(Actor::Country);
        assert!(approx(country.position, Vec3::new(25.0, 0.0, 0.0)));
        assert!(approx(country.rotation, Vec3::new(3.0 * PI / 2.0, PI, PI)));
        assert!(approx(country.scale, Vec3::splat(3.0)));
    }

    #[test]
    fn scrolling_back_restores_the_previous_actor() {
        let choreographer = choreographer();
        let mut cast = opening_cast();
        let mut tweens = Tweens::new();

        choreographer.handle(event(0, TriggerKind::Enter), &mut cast, &mut tweens);
        run_until_idle(&mut cast, &mut tweens);
        choreographer.handle(event(0, TriggerKind::LeaveBack), &mut cast, &mut tweens);

        // The visibility swap happens as soon as the country is back at the origin
        tweens.update(1.0, &mut cast);
        assert_eq!(cast.visible_actors(), [Actor::Earth]);
        assert!(!tweens.is_empty());

        run_until_idle(&mut cast, &mut tweens);

        assert!(approx(cast.pose(Actor::Earth).position, Vec3::new(20.0, 0.0, 0.0)));
        let country = cast.pose(Actor::Country);
        assert!(approx(country.position, Vec3::ZERO));
        assert!(approx(country.rotation, Vec3::ZERO));
        assert!(approx(country.scale, Vec3::ONE));
    }

    #[test]
    fn leaving_the_landmark_brings_the_plates_back() {
        let choreographer = choreographer();
        let mut cast = opening_cast();
        let mut tweens = Tweens::new();

        for trigger in 0..3 {
            choreographer.handle(event(trigger, TriggerKind::Enter), &mut cast, &mut tweens);
        }
        run_until_idle(&mut cast, &mut tweens);
        assert_eq!(cast.visible_actors(), [Actor::Landmark]);

        choreographer.handle(event(2, TriggerKind::LeaveBack), &mut cast, &mut tweens);
        run_until_idle(&mut cast, &mut tweens);

        assert_eq!(cast.visible_actors(), [Actor::Plates]);
        assert!(approx(cast.pose(Actor::Plates).position, Vec3::new(20.0, 0.0, 0.0)));
        // The landmark keeps its own scale through the round trip
        assert!(approx(cast.pose(Actor::Landmark).scale, Vec3::splat(0.1)));
    }

    #[test]
    fn reversing_mid_flight_abandons_the_exit() {
        let choreographer = choreographer();
        let mut cast = opening_cast();
        let mut tweens = Tweens::new();

        choreographer.handle(event(0, TriggerKind::Enter), &mut cast, &mut tweens);
        tweens.update(0.3, &mut cast);
        choreographer.handle(event(0, TriggerKind::LeaveBack), &mut cast, &mut tweens);
        run_until_idle(&mut cast, &mut tweens);

        assert_eq!(cast.visible_actors(), [Actor::Earth]);
        assert!(approx(cast.pose(Actor::Earth).position, Vec3::new(20.0, 0.0, 0.0)));
        assert_eq!(cast.pose(Actor::Country).scale, Vec3::ONE);
    }

    #[test]
    fn jumping_through_every_section_lands_on_the_last() {
        let choreographer = choreographer();
        let mut cast = opening_cast();
        let mut tweens = Tweens::new();

        for trigger in 0..4 {
            choreographer.handle(event(trigger, TriggerKind::Enter), &mut cast, &mut tweens);
            assert_eq!(cast.visible_actors().len(), 1);
        }
        run_until_idle(&mut cast, &mut tweens);
        assert_eq!(cast.visible_actors(), [Actor::Earth]);
        assert!(approx(cast.pose(Actor::Earth).position, Vec3::new(-3.0, 0.0, 0.0)));

        for trigger in (0..4).rev() {
            choreographer.handle(event(trigger, TriggerKind::LeaveBack), &mut cast, &mut tweens);
            assert_eq!(cast.visible_actors().len(), 1);
        }
        run_until_idle(&mut cast, &mut tweens);
        assert_eq!(cast.visible_actors(), [Actor::Earth]);
        assert!(approx(cast.pose(Actor::Earth).position, Vec3::new(20.0, 0.0, 0.0)));
    }

    #[test]
    fn random_scrolling_keeps_one_actor_on_stage() {
        let choreographer = choreographer();
        let mut rng = StdRng::seed_from_u64(0x6e0);

        for _ in 0..20 {
            let mut cast = opening_cast();
            let mut tweens = Tweens::new();
            let mut active = 0;

            for _ in 0..40 {
                let target = rng.gen_range(0..=4);

                while active < target {
                    choreographer.handle(event(active, TriggerKind::Enter), &mut cast, &mut tweens);
                    active += 1;
                }
                while active > target {
                    active -= 1;
                    choreographer.handle(
                        event(active, TriggerKind::LeaveBack),
                        &mut cast,
                        &mut tweens,
                    );
                }

                for _ in 0..rng.gen_range(0..90) {
                    tweens.update(1.0 / 60.0, &mut cast);
                    assert_eq!(cast.visible_actors().len(), 1);
                }
            }

            run_until_idle(&mut cast, &mut tweens);
            assert_eq!(
                cast.visible_actors(),
                [choreographer.featured_actor(active)]
            );
        }
    }
}
