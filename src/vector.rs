//! A small 2D vector. Angles are in degrees everywhere outside of this module.

use core::ops;
use serde::{Deserialize, Serialize};

pub fn rad_to_deg(radians: f64) -> f64 {
    radians * (180. / core::f64::consts::PI)
}

pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * (core::f64::consts::PI / 180.)
}

/// A point or direction in the track plane.
///
/// Methods taking `&mut self` mutate in place and return `&mut Self` so they chain.
/// The operator impls and the `*ed` methods return a new vector instead.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0., y: 0. };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&mut self, other: Self) -> &mut Self {
        self.x += other.x;
        self.y += other.y;
        self
    }

    pub fn sub(&mut self, other: Self) -> &mut Self {
        self.x -= other.x;
        self.y -= other.y;
        self
    }

    pub fn mult(&mut self, scalar: f64) -> &mut Self {
        self.x *= scalar;
        self.y *= scalar;
        self
    }

    pub fn div(&mut self, scalar: f64) -> &mut Self {
        self.x /= scalar;
        self.y /= scalar;
        self
    }

    /// Rotate counter-clockwise by `deg` degrees
    pub fn rotate(&mut self, deg: f64) -> &mut Self {
        let (sn, cs) = deg_to_rad(deg).sin_cos();
        let x = self.x * cs - self.y * sn;
        self.y = self.x * sn + self.y * cs;
        self.x = x;
        self
    }

    /// Scale to unit length. The zero vector is left untouched.
    pub fn normalize(&mut self) -> &mut Self {
        let mag = self.mag();
        if mag > 0. {
            self.div(mag);
        }
        self
    }

    pub fn rotated(mut self, deg: f64) -> Self {
        self.rotate(deg);
        self
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Angle to the positive x axis in degrees, within (-180, 180]
    pub fn heading(&self) -> f64 {
        let h = rad_to_deg(self.y.atan2(self.x));
        if h <= -180. {
            h + 360.
        } else {
            h
        }
    }

    pub fn mag(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dist(&self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Absolute difference of the two headings, in radians
    pub fn angle_between(&self, other: Self) -> f64 {
        (self.y.atan2(self.x) - other.y.atan2(other.x)).abs()
    }

    pub fn lerp(&self, other: Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl ops::Add for Vector2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl ops::AddAssign for Vector2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl ops::Sub for Vector2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl ops::SubAssign for Vector2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl ops::Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl ops::Div<f64> for Vector2 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl ops::Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assert_f64_approx;

    #[test]
    fn test_arithmetic_chain() {
        let mut v = Vector2::new(10., 10.);
        v.mult(5.).rotate(90.).sub(Vector2::new(1., 2.));
        assert_f64_approx!(v.x, -51., 1e-9);
        assert_f64_approx!(v.y, 48., 1e-9);
    }

    #[test]
    fn test_operators_leave_operands() {
        let a = Vector2::new(5., 10.);
        let b = a * 5.;
        assert_eq!(a, Vector2::new(5., 10.));
        assert_eq!(b, Vector2::new(25., 50.));
        assert_eq!(a - b, Vector2::new(-20., -40.));
        assert_eq!(-(a + b), Vector2::new(-30., -60.));
    }

    #[test]
    fn test_div_halves_mag() {
        let mut v = Vector2::new(10., 10.);
        let before = v.mag();
        v.div(2.);
        assert_f64_approx!(before, v.mag() * 2.);
    }

    #[test]
    fn test_rotate_quarters() {
        let mut v = Vector2::new(10., 0.);
        for (x, y) in [(0., 10.), (-10., 0.), (0., -10.), (10., 0.)] {
            v.rotate(90.);
            assert_f64_approx!(v.x, x, 1e-9);
            assert_f64_approx!(v.y, y, 1e-9);
        }
    }

    #[test]
    fn test_heading() {
        assert_f64_approx!(Vector2::new(10., 0.).heading(), 0.);
        assert_f64_approx!(Vector2::new(0., -10.).heading(), -90.);
        assert_f64_approx!(Vector2::new(-10., 0.).heading(), 180.);
        assert_f64_approx!(Vector2::new(0., 10.).heading(), 90.);
        assert_f64_approx!(Vector2::new(-1., -0.).heading(), 180.);
        assert_f64_approx!(Vector2::new(1., -0.01).heading(), -0.57294, 1e-4);
        assert_f64_approx!(Vector2::new(-1., 0.01).heading(), 179.42706, 1e-4);
        assert_f64_approx!(Vector2::new(-1., -0.01).heading(), -179.42706, 1e-4);
    }

    #[test]
    fn test_rotate_heading_inverse() {
        let mut h = -179.5;
        while h <= 180. {
            let v = Vector2::new(1., 0.).rotated(h);
            let diff = (v.heading() - h).rem_euclid(360.);
            assert!(
                diff < 1e-9 || 360. - diff < 1e-9,
                "heading {} after rotating by {h}",
                v.heading()
            );

            let back = Vector2::new(3., -4.).rotated(h).rotated(-h);
            assert_f64_approx!(back.x, 3., 1e-9);
            assert_f64_approx!(back.y, -4., 1e-9);
            h += 7.25;
        }
    }

    #[test]
    fn test_normalize() {
        for v in [Vector2::new(10., 5.), Vector2::new(-5., 20.)] {
            assert_f64_approx!(v.normalized().mag(), 1., 1e-12);
        }
        assert_eq!(Vector2::ZERO.normalized(), Vector2::ZERO);
    }

    #[test]
    fn test_angle_between() {
        let deg = |a: Vector2, b: Vector2| rad_to_deg(a.angle_between(b));
        assert_f64_approx!(deg(Vector2::new(-1., 0.), Vector2::new(1., 0.)), 180.);
        assert_f64_approx!(deg(Vector2::new(1., 0.), Vector2::new(0., -1.)), 90.);
        assert_f64_approx!(deg(Vector2::new(1., 0.), Vector2::new(1., -1.)), 45., 1e-9);
        assert_f64_approx!(deg(Vector2::new(2., -1.), Vector2::new(1., 0.)), 26.565, 1e-3);
    }

    #[test]
    fn test_lerp_dist() {
        let a = Vector2::new(0., 0.);
        let b = Vector2::new(10., 0.);
        assert_eq!(a.lerp(b, 0.9), Vector2::new(9., 0.));
        assert_f64_approx!(a.dist(Vector2::new(3., 4.)), 5.);
    }
}
