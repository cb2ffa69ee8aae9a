//! Piecewise-linear brightness curve.
//!
//! The curve is defined by breakpoints of (illuminance, brightness). Between
//! two neighbouring breakpoints the brightness is interpolated linearly and
//! truncated to a whole percent. Outside the configured domain the curve is
//! flat: readings below the first breakpoint get its brightness, readings
//! above the last breakpoint get the last brightness. The last segment's
//! slope is never extrapolated.

use heapless::Vec;

use crate::errors::Error;

/// Maximum number of breakpoints a curve can hold.
pub const MAX_BREAKPOINTS: usize = 32;

/// Highest brightness percentage.
pub const MAX_BRIGHTNESS: u8 = 100;

/// One vertex of the brightness curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    /// Ambient illuminance in lux
    pub lux: f64,
    /// Brightness in percent
    pub brightness: u8,
}

impl Breakpoint {
    pub const fn new(lux: f64, brightness: u8) -> Self {
        Self { lux, brightness }
    }
}

impl From<(f64, u8)> for Breakpoint {
    fn from((lux, brightness): (f64, u8)) -> Self {
        Self::new(lux, brightness)
    }
}

/// A validated brightness curve.
///
/// Breakpoints are kept sorted by illuminance and no two of them share the
/// same illuminance, so evaluation can never divide by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    points: Vec<Breakpoint, MAX_BREAKPOINTS>,
}

impl Curve {
    /// Build a curve from breakpoints in any order.
    pub fn new(points: &[Breakpoint]) -> Result<Self, Error> {
        Self::collect(points.iter().copied())
    }

    /// Build a curve from `(lux, brightness)` pairs in any order.
    pub fn from_steps(steps: &[(f64, u8)]) -> Result<Self, Error> {
        Self::collect(steps.iter().copied().map(Breakpoint::from))
    }

    fn collect(points: impl Iterator<Item = Breakpoint>) -> Result<Self, Error> {
        let mut sorted: Vec<Breakpoint, MAX_BREAKPOINTS> = Vec::new();
        for point in points {
            if !point.lux.is_finite() || point.lux < 0.0 {
                return Err(Error::InvalidIlluminance);
            }
            if point.brightness > MAX_BRIGHTNESS {
                return Err(Error::BrightnessOutOfRange);
            }
            sorted.push(point).map_err(|_| Error::TooManyBreakpoints)?;
        }
        if sorted.is_empty() {
            return Err(Error::EmptyCurve);
        }

        sorted.sort_unstable_by(|a, b| a.lux.total_cmp(&b.lux));
        if sorted.windows(2).any(|pair| pair[0].lux == pair[1].lux) {
            return Err(Error::DuplicateIlluminance);
        }

        Ok(Self { points: sorted })
    }

    /// The breakpoints, sorted by illuminance.
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.points
    }

    /// Target brightness for the given illuminance.
    pub fn evaluate(&self, lux: f64) -> u8 {
        let first = self.points[0];
        if lux.is_nan() {
            return first.brightness;
        }

        match self.points.iter().position(|p| lux <= p.lux) {
            // Above the domain (or a single breakpoint)
            None => self.points[self.points.len() - 1].brightness,
            // At or below the domain
            Some(0) => first.brightness,
            Some(i) if lux == self.points[i].lux => self.points[i].brightness,
            Some(i) => {
                let lo = self.points[i - 1];
                let hi = self.points[i];
                let b = f64::from(lo.brightness)
                    + (f64::from(hi.brightness) - f64::from(lo.brightness)) * (lux - lo.lux)
                        / (hi.lux - lo.lux);
                b as u8
            }
        }
    }
}

impl AsRef<Curve> for Curve {
    fn as_ref(&self) -> &Curve {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn curve(steps: &[(f64, u8)]) -> Curve {
        Curve::from_steps(steps).unwrap()
    }

    #[test]
    fn test_empty_curve() {
        assert_eq!(Curve::from_steps(&[]), Err(Error::EmptyCurve));
    }

    #[test]
    fn test_single_value_curve() {
        let curve = curve(&[(50.0, 42)]);
        assert_eq!(42, curve.evaluate(-10.0));
        assert_eq!(42, curve.evaluate(0.0));
        assert_eq!(42, curve.evaluate(50.0));
        assert_eq!(42, curve.evaluate(100.0));
    }

    #[test]
    fn test_double_value_curve() {
        let curve = curve(&[(50.0, 30), (250.0, 80)]);
        assert_eq!(30, curve.evaluate(0.0));
        assert_eq!(30, curve.evaluate(20.0));
        assert_eq!(30, curve.evaluate(50.0));
        // 42.5 truncated
        assert_eq!(42, curve.evaluate(100.0));
        assert_eq!(55, curve.evaluate(150.0));
        // 67.5 truncated
        assert_eq!(67, curve.evaluate(200.0));
        assert_eq!(80, curve.evaluate(250.0));
        assert_eq!(80, curve.evaluate(300.0));
    }

    #[test]
    fn test_multi_value_curve() {
        let curve = curve(&[(0.0, 0), (100.0, 20), (150.0, 50), (250.0, 100)]);
        let expected = [
            (0.0, 0),
            (25.0, 5),
            (50.0, 10),
            (75.0, 15),
            (100.0, 20),
            (125.0, 35),
            (150.0, 50),
            (160.0, 55),
            (170.0, 60),
            (200.0, 75),
            (240.0, 95),
            (250.0, 100),
            (300.0, 100),
        ];
        for (lux, brightness) in expected {
            assert_eq!(brightness, curve.evaluate(lux), "lux={}", lux);
        }
    }

    #[test]
    fn test_unordered_value_curve() {
        let curve = curve(&[
            (10.0, 10),
            (100.0, 100),
            (0.0, 0),
            (40.0, 40),
            (80.0, 80),
            (60.0, 60),
        ]);
        for i in 0..=10u8 {
            assert_eq!(10 * i, curve.evaluate(f64::from(10 * i)));
        }
        let lux: std::vec::Vec<f64> = curve.breakpoints().iter().map(|p| p.lux).collect();
        assert_eq!(lux, [0.0, 10.0, 40.0, 60.0, 80.0, 100.0]);
    }

    #[test]
    fn test_from_breakpoints() {
        let curve = Curve::new(&[
            Breakpoint::new(240.0, 100),
            Breakpoint::new(0.0, 10),
            Breakpoint::from((120.0, 40)),
        ])
        .unwrap();
        assert_eq!(
            curve.breakpoints(),
            [
                Breakpoint::new(0.0, 10),
                Breakpoint::new(120.0, 40),
                Breakpoint::new(240.0, 100),
            ]
        );
        assert_eq!(25, curve.evaluate(60.0));
        assert_eq!(70, curve.evaluate(180.0));
        assert_eq!(curve, Curve::from_steps(&[(0.0, 10), (120.0, 40), (240.0, 100)]).unwrap());
    }

    #[test]
    fn test_from_breakpoints_invalid() {
        assert_eq!(Curve::new(&[]), Err(Error::EmptyCurve));
        assert_eq!(
            Curve::new(&[Breakpoint::new(10.0, 50), Breakpoint::new(10.0, 50)]),
            Err(Error::DuplicateIlluminance)
        );
        assert_eq!(
            Curve::new(&[Breakpoint::new(10.0, 50), Breakpoint::new(5.0, 120)]),
            Err(Error::BrightnessOutOfRange)
        );
    }

    #[test]
    fn test_reference_curve() {
        let curve = curve(&[(0.0, 10), (240.0, 100)]);
        assert_eq!(10, curve.evaluate(0.0));
        assert_eq!(100, curve.evaluate(240.0));
        assert_eq!(55, curve.evaluate(120.0));
        assert_eq!(10, curve.evaluate(-5.0));
        assert_eq!(100, curve.evaluate(1000.0));
    }

    #[test]
    fn test_decreasing_segment() {
        let curve = curve(&[(0.0, 80), (100.0, 40)]);
        assert_eq!(60, curve.evaluate(50.0));
        // 79.6 truncated
        assert_eq!(79, curve.evaluate(1.0));
    }

    #[test]
    fn test_fractional_breakpoints_hit_exactly() {
        let curve = curve(&[(0.1, 3), (0.3, 7), (0.7, 90)]);
        assert_eq!(3, curve.evaluate(0.1));
        assert_eq!(7, curve.evaluate(0.3));
        assert_eq!(90, curve.evaluate(0.7));
    }

    #[test]
    fn test_nan_reading() {
        let curve = curve(&[(0.0, 10), (240.0, 100)]);
        assert_eq!(10, curve.evaluate(f64::NAN));
    }

    #[test]
    fn test_duplicate_illuminance() {
        assert_eq!(
            Curve::from_steps(&[(10.0, 50), (10.0, 80)]),
            Err(Error::DuplicateIlluminance)
        );
        // Duplicates are detected after sorting
        assert_eq!(
            Curve::from_steps(&[(10.0, 50), (200.0, 90), (10.0, 80)]),
            Err(Error::DuplicateIlluminance)
        );
    }

    #[test]
    fn test_invalid_breakpoints() {
        assert_eq!(
            Curve::from_steps(&[(-1.0, 50)]),
            Err(Error::InvalidIlluminance)
        );
        assert_eq!(
            Curve::from_steps(&[(f64::NAN, 50)]),
            Err(Error::InvalidIlluminance)
        );
        assert_eq!(
            Curve::from_steps(&[(f64::INFINITY, 50)]),
            Err(Error::InvalidIlluminance)
        );
        assert_eq!(
            Curve::from_steps(&[(0.0, 101)]),
            Err(Error::BrightnessOutOfRange)
        );
    }

    #[test]
    fn test_too_many_breakpoints() {
        let steps: std::vec::Vec<(f64, u8)> =
            (0..=MAX_BREAKPOINTS).map(|i| (i as f64, 50)).collect();
        assert_eq!(Curve::from_steps(&steps), Err(Error::TooManyBreakpoints));
        assert!(Curve::from_steps(&steps[..MAX_BREAKPOINTS]).is_ok());
    }

    /// Curves with unique integer illuminance and arbitrary brightness.
    fn any_curve() -> impl Strategy<Value = Curve> {
        prop::collection::btree_map(0u32..10_000, 0u8..=MAX_BRIGHTNESS, 1..MAX_BREAKPOINTS)
            .prop_map(|steps| {
                let steps: std::vec::Vec<(f64, u8)> =
                    steps.into_iter().map(|(lux, b)| (f64::from(lux), b)).collect();
                Curve::from_steps(&steps).unwrap()
            })
    }

    /// Curves whose brightness never decreases with illuminance.
    fn monotonic_curve() -> impl Strategy<Value = Curve> {
        (
            prop::collection::btree_set(0u32..10_000, 1..MAX_BREAKPOINTS),
            prop::collection::vec(0u8..=MAX_BRIGHTNESS, MAX_BREAKPOINTS),
        )
            .prop_map(|(lux, mut brightness)| {
                brightness.truncate(lux.len());
                brightness.sort_unstable();
                let steps: std::vec::Vec<(f64, u8)> = lux
                    .into_iter()
                    .map(f64::from)
                    .zip(brightness)
                    .collect();
                Curve::from_steps(&steps).unwrap()
            })
    }

    proptest! {
        #[test]
        fn clamps_below_domain(curve in any_curve(), below in 0.0f64..10_000.0) {
            let first = curve.breakpoints()[0];
            prop_assert_eq!(curve.evaluate(first.lux - below), first.brightness);
        }

        #[test]
        fn clamps_above_domain(curve in any_curve(), above in 0.0f64..10_000.0) {
            let last = *curve.breakpoints().last().unwrap();
            prop_assert_eq!(curve.evaluate(last.lux + above), last.brightness);
        }

        #[test]
        fn breakpoints_are_exact(curve in any_curve()) {
            for point in curve.breakpoints() {
                prop_assert_eq!(curve.evaluate(point.lux), point.brightness);
            }
        }

        #[test]
        fn stays_in_range(curve in any_curve(), lux in -100.0f64..20_000.0) {
            prop_assert!(curve.evaluate(lux) <= MAX_BRIGHTNESS);
        }

        #[test]
        fn monotonic_curve_is_monotonic(
            curve in monotonic_curve(),
            a in -100.0f64..11_000.0,
            b in -100.0f64..11_000.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(curve.evaluate(lo) <= curve.evaluate(hi));
        }
    }
}
