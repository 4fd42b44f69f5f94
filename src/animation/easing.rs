/// Easing curves, named after the GSAP power family they reproduce.
/// `PowerN` raises progress to the power N + 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    Linear,
    Power1In,
    #[default]
    Power1Out,
    Power1InOut,
    Power2In,
    Power2Out,
    Power2InOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Ease::Linear => t,
            Ease::Power1In => ease_in(t, 2),
            Ease::Power1Out => ease_out(t, 2),
            Ease::Power1InOut => ease_in_out(t, 2),
            Ease::Power2In => ease_in(t, 3),
            Ease::Power2Out => ease_out(t, 3),
            Ease::Power2InOut => ease_in_out(t, 3),
        }
    }
}

fn ease_in(t: f32, exponent: i32) -> f32 {
    t.powi(exponent)
}

fn ease_out(t: f32, exponent: i32) -> f32 {
    1.0 - (1.0 - t).powi(exponent)
}

fn ease_in_out(t: f32, exponent: i32) -> f32 {
    if t < 0.5 {
        ease_in(t * 2.0, exponent) / 2.0
    } else {
        1.0 - ease_in((1.0 - t) * 2.0, exponent) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 7] = [
        Ease::Linear,
        Ease::Power1In,
        Ease::Power1Out,
        Ease::Power1InOut,
        Ease::Power2In,
        Ease::Power2Out,
        Ease::Power2InOut,
    ];

    #[test]
    fn curves_hit_endpoints() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6, "{ease:?}");
        }
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(Ease::Power2InOut.apply(-3.0), 0.0);
        assert!((Ease::Power2InOut.apply(7.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn in_out_curves_are_symmetric() {
        for ease in [Ease::Power1InOut, Ease::Power2InOut] {
            assert!((ease.apply(0.5) - 0.5).abs() < 1e-6);
            let a = ease.apply(0.2);
            let b = ease.apply(0.8);
            assert!((a + b - 1.0).abs() < 1e-6, "{ease:?}");
        }
    }

    #[test]
    fn power2_in_out_matches_cubic() {
        // 4t^3 on the first half
        assert!((Ease::Power2InOut.apply(0.25) - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn out_curves_lead_linear() {
        assert!(Ease::Power1Out.apply(0.3) > 0.3);
        assert!(Ease::Power1In.apply(0.3) < 0.3);
    }
}
