use glam::Vec3;

use crate::animation::easing::Ease;

/// Which transform property of a target a tween drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Position,
    Rotation,
    Scale,
}

/// Anything with vector channels that tweens can read and write.
pub trait Animated {
    type Target: Copy + Eq + std::fmt::Debug;

    fn channel(&self, target: Self::Target, channel: Channel) -> Vec3;
    fn set_channel(&mut self, target: Self::Target, channel: Channel, value: Vec3);
}

/// Per-axis tween destination. Axes left as `None` are not animated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3Target {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

impl Vec3Target {
    pub const fn x(x: f32) -> Self {
        Self {
            x: Some(x),
            y: None,
            z: None,
        }
    }

    pub const fn y(y: f32) -> Self {
        Self {
            x: None,
            y: Some(y),
            z: None,
        }
    }

    pub const fn xz(x: f32, z: f32) -> Self {
        Self {
            x: Some(x),
            y: None,
            z: Some(z),
        }
    }

    pub const fn xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    pub const fn splat(value: f32) -> Self {
        Self::xyz(value, value, value)
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    /// Takes the targeted axes from `self` and the rest from `current`.
    pub fn resolve(&self, current: Vec3) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(current.x),
            self.y.unwrap_or(current.y),
            self.z.unwrap_or(current.z),
        )
    }

    /// Takes the targeted axes from `animated` and the rest from `current`.
    fn merge(&self, current: Vec3, animated: Vec3) -> Vec3 {
        Vec3::new(
            if self.x.is_some() { animated.x } else { current.x },
            if self.y.is_some() { animated.y } else { current.y },
            if self.z.is_some() { animated.z } else { current.z },
        )
    }
}

pub type OnComplete<C> = Box<dyn FnOnce(&mut C, &mut Tweens<C>)>;

pub struct Tween<C: Animated> {
    target: C::Target,
    channel: Channel,
    to: Vec3Target,
    // Captured from the live value on the first tick
    from: Option<Vec3>,
    duration: f32,
    elapsed: f32,
    ease: Ease,
    group: Option<usize>,
    on_complete: Option<OnComplete<C>>,
}

impl<C: Animated> Tween<C> {
    pub const DEFAULT_DURATION: f32 = 0.5;

    fn new(target: C::Target, channel: Channel, to: Vec3Target) -> Self {
        Self {
            target,
            channel,
            to,
            from: None,
            duration: Self::DEFAULT_DURATION,
            elapsed: 0.0,
            ease: Ease::default(),
            group: None,
            on_complete: None,
        }
    }

    pub fn duration(&mut self, seconds: f32) -> &mut Self {
        self.duration = seconds.max(0.0);
        self
    }

    pub fn ease(&mut self, ease: Ease) -> &mut Self {
        self.ease = ease;
        self
    }

    pub fn group(&mut self, group: usize) -> &mut Self {
        self.group = Some(group);
        self
    }

    pub fn on_complete(
        &mut self,
        callback: impl FnOnce(&mut C, &mut Tweens<C>) + 'static,
    ) -> &mut Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn target(&self) -> C::Target {
        self.target
    }

    pub fn group_id(&self) -> Option<usize> {
        self.group
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn start_value(&mut self, context: &C) -> Vec3 {
        *self
            .from
            .get_or_insert_with(|| context.channel(self.target, self.channel))
    }

    fn advance(&mut self, dt: f32, context: &mut C) {
        let from = self.start_value(context);
        self.elapsed += dt;

        if self.is_finished() {
            self.write_end(from, context);
            return;
        }

        let progress = self.ease.apply(self.elapsed / self.duration);
        let value = from.lerp(self.to.resolve(from), progress);
        let current = context.channel(self.target, self.channel);
        context.set_channel(self.target, self.channel, self.to.merge(current, value));
    }

    fn seek_end(&mut self, context: &mut C) {
        let from = self.start_value(context);
        self.elapsed = self.duration;
        self.write_end(from, context);
    }

    fn write_end(&self, from: Vec3, context: &mut C) {
        let end = self.to.resolve(from);
        let current = context.channel(self.target, self.channel);
        context.set_channel(self.target, self.channel, self.to.merge(current, end));
    }

    fn complete(self, context: &mut C, tweens: &mut Tweens<C>) {
        if let Some(callback) = self.on_complete {
            callback(context, tweens);
        }
    }
}

/// The set of running tweens. Tweens started from completion callbacks begin on the next tick.
pub struct Tweens<C: Animated> {
    active: Vec<Tween<C>>,
}

impl<C: Animated> Tweens<C> {
    // Completion callbacks may start more tweens; bounds the fast-forward loop
    const MAX_SETTLE_PASSES: usize = 64;

    pub fn new() -> Self {
        Self { active: Vec::new() }
    }

    pub fn to(&mut self, target: C::Target, channel: Channel, to: Vec3Target) -> &mut Tween<C> {
        let index = self.active.len();
        self.active.push(Tween::new(target, channel, to));
        &mut self.active[index]
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tween<C>> {
        self.active.iter()
    }

    pub fn update(&mut self, dt: f32, context: &mut C) {
        for tween in &mut self.active {
            tween.advance(dt, context);
        }

        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|tween| tween.is_finished());
        self.active = running;

        for tween in finished {
            tween.complete(context, self);
        }
    }

    /// Drops matching tweens where they stand. Their callbacks never run.
    pub fn kill_where(&mut self, predicate: impl Fn(&Tween<C>) -> bool) -> usize {
        let before = self.active.len();
        self.active.retain(|tween| !predicate(tween));
        before - self.active.len()
    }

    /// Jumps matching tweens to their end values and runs their callbacks, repeating for
    /// matching tweens the callbacks start.
    pub fn finish_where(&mut self, context: &mut C, predicate: impl Fn(&Tween<C>) -> bool) {
        for _ in 0..Self::MAX_SETTLE_PASSES {
            let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
                .into_iter()
                .partition(|tween| predicate(tween));
            self.active = rest;

            if matching.is_empty() {
                return;
            }

            for mut tween in matching {
                tween.seek_end(context);
                tween.complete(context, self);
            }
        }

        log::warn!(
            "Tweens still pending after {} settle passes",
            Self::MAX_SETTLE_PASSES
        );
    }
}

impl<C: Animated> Default for Tweens<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct Rig {
        values: HashMap<(u8, Channel), Vec3>,
        events: Vec<&'static str>,
    }

    impl Animated for Rig {
        type Target = u8;

        fn channel(&self, target: u8, channel: Channel) -> Vec3 {
            self.values
                .get(&(target, channel))
                .copied()
                .unwrap_or(Vec3::ZERO)
        }

        fn set_channel(&mut self, target: u8, channel: Channel, value: Vec3) {
            self.values.insert((target, channel), value);
        }
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn untargeted_axes_are_left_alone() {
        let mut rig = Rig::default();
        rig.set_channel(0, Channel::Position, Vec3::new(1.0, 2.0, 3.0));

        let mut tweens = Tweens::new();
        tweens
            .to(0, Channel::Position, Vec3Target::x(25.0))
            .duration(1.0)
            .ease(Ease::Linear);

        tweens.update(0.5, &mut rig);
        assert!(approx(
            rig.channel(0, Channel::Position),
            Vec3::new(13.0, 2.0, 3.0)
        ));

        // Something else moves y mid-flight; the tween must not stomp on it
        rig.set_channel(0, Channel::Position, Vec3::new(13.0, 9.0, 3.0));
        tweens.update(0.5, &mut rig);
        assert_eq!(rig.channel(0, Channel::Position), Vec3::new(25.0, 9.0, 3.0));
        assert!(tweens.is_empty());
    }

    #[test]
    fn start_value_is_captured_on_first_tick() {
        let mut rig = Rig::default();
        let mut tweens = Tweens::new();
        tweens
            .to(0, Channel::Scale, Vec3Target::splat(3.0))
            .duration(1.0)
            .ease(Ease::Linear);

        rig.set_channel(0, Channel::Scale, Vec3::ONE);
        tweens.update(0.5, &mut rig);

        assert!(approx(rig.channel(0, Channel::Scale), Vec3::splat(2.0)));
    }

    #[test]
    fn callbacks_run_once_and_can_chain() {
        let mut rig = Rig::default();
        let mut tweens = Tweens::new();
        tweens
            .to(0, Channel::Position, Vec3Target::x(1.0))
            .duration(1.0)
            .on_complete(|rig: &mut Rig, tweens| {
                rig.events.push("first");
                tweens
                    .to(1, Channel::Rotation, Vec3Target::y(3.7))
                    .duration(1.0)
                    .on_complete(|rig: &mut Rig, _| rig.events.push("second"));
            });

        tweens.update(1.0, &mut rig);
        assert_eq!(rig.events, ["first"]);
        assert_eq!(tweens.len(), 1);

        tweens.update(0.5, &mut rig);
        assert_eq!(rig.events, ["first"]);

        tweens.update(0.5, &mut rig);
        assert_eq!(rig.events, ["first", "second"]);
        assert_eq!(rig.channel(1, Channel::Rotation), Vec3::new(0.0, 3.7, 0.0));

        tweens.update(1.0, &mut rig);
        assert_eq!(rig.events.len(), 2);
    }

    #[test]
    fn zero_duration_completes_on_next_tick() {
        let mut rig = Rig::default();
        let mut tweens = Tweens::new();
        tweens
            .to(2, Channel::Position, Vec3Target::xz(30.0, 30.0))
            .duration(0.0)
            .on_complete(|rig: &mut Rig, _| rig.events.push("done"));

        tweens.update(0.0, &mut rig);
        assert_eq!(rig.events, ["done"]);
        assert_eq!(rig.channel(2, Channel::Position), Vec3::new(30.0, 0.0, 30.0));
    }

    #[test]
    fn kill_drops_callbacks() {
        let mut rig = Rig::default();
        let mut tweens = Tweens::new();
        tweens
            .to(0, Channel::Position, Vec3Target::x(10.0))
            .duration(1.0)
            .group(1)
            .on_complete(|rig: &mut Rig, _| rig.events.push("killed"));
        tweens
            .to(0, Channel::Scale, Vec3Target::splat(2.0))
            .duration(1.0)
            .group(2);

        tweens.update(0.5, &mut rig);
        assert_eq!(tweens.kill_where(|tween| tween.group_id() == Some(1)), 1);

        tweens.update(1.0, &mut rig);
        assert!(rig.events.is_empty());
        assert!(rig.channel(0, Channel::Position).x < 10.0);
        assert_eq!(rig.channel(0, Channel::Scale), Vec3::splat(2.0));
    }

    #[test]
    fn finish_fast_forwards_through_chained_tweens() {
        let mut rig = Rig::default();
        let mut tweens = Tweens::new();
        tweens
            .to(0, Channel::Position, Vec3Target::x(30.0))
            .duration(1.0)
            .group(0)
            .on_complete(|rig: &mut Rig, tweens| {
                rig.events.push("exit");
                tweens
                    .to(1, Channel::Position, Vec3Target::x(25.0))
                    .duration(1.0)
                    .group(0)
                    .on_complete(|rig: &mut Rig, _| rig.events.push("featured"));
            });
        tweens
            .to(3, Channel::Position, Vec3Target::x(-1.0))
            .duration(1.0)
            .group(5);

        tweens.finish_where(&mut rig, |tween| tween.group_id() == Some(0));

        assert_eq!(rig.events, ["exit", "featured"]);
        assert_eq!(rig.channel(1, Channel::Position).x, 25.0);
        assert_eq!(tweens.len(), 1);
        assert_eq!(tweens.iter().next().map(|tween| tween.target()), Some(3));
    }
}
