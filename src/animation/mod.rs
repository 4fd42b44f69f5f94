pub mod easing;
pub mod tween;

pub use easing::Ease;
pub use tween::{Animated, Channel, Tween, Tweens, Vec3Target};
