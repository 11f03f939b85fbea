//! Direction cosines: unit vectors on the sky sphere.
//!
//! Every pointing direction the alignment engine handles, whether it comes from a
//! catalog position or from the mount's encoders, is carried as a
//! [`DirectionVector`]. Frame changes are then plain 3x3 matrix products, and the
//! sky triangulation works on ordinary points in space.
//!
//! # Spherical conventions
//!
//! Two independent choices decide how a pair of angles maps onto a vector:
//!
//! - [`AzimuthDirection`]: whether the azimuthal angle grows anti-clockwise
//!   (from +X toward +Y, like right ascension) or clockwise (from +X toward -Y,
//!   like compass azimuth or hour angle).
//! - [`PolarDirection`]: whether the polar angle is an elevation above the XY
//!   plane (like altitude or declination) or a colatitude measured from +Z.
//!
//! ```text
//! anti-clockwise, from plane:  x = cos(p)cos(a)   y =  cos(p)sin(a)   z = sin(p)
//! clockwise,      from plane:  x = cos(p)cos(a)   y = -cos(p)sin(a)   z = sin(p)
//! anti-clockwise, from axis:   x = sin(p)cos(a)   y =  sin(p)sin(a)   z = cos(p)
//! clockwise,      from axis:   x = sin(p)cos(a)   y = -sin(p)sin(a)   z = cos(p)
//! ```
//!
//! The horizontal frame used for the "actual" side of the alignment is the
//! clockwise / from-plane combination: +X points at the north horizon, +Y at the
//! west horizon and +Z at the zenith, which keeps the frame right-handed.
//!
//! ```
//! use celestial_alignment::vector::{AzimuthDirection, DirectionVector, PolarDirection};
//! use std::f64::consts::FRAC_PI_2;
//!
//! let east = DirectionVector::from_spherical(
//!     FRAC_PI_2,
//!     AzimuthDirection::Clockwise,
//!     0.0,
//!     PolarDirection::FromAzimuthalPlane,
//! );
//! assert!((east.y + 1.0).abs() < 1e-15);
//! ```

use std::fmt;

/// Sense in which the azimuthal angle increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AzimuthDirection {
    /// From +X toward -Y.
    Clockwise,
    /// From +X toward +Y.
    AntiClockwise,
}

/// Reference for the polar angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolarDirection {
    /// Elevation above the XY plane, `[-π/2, π/2]`.
    FromAzimuthalPlane,
    /// Angle away from the +Z axis, `[0, π]`.
    FromPolarAxis,
}

/// A pointing direction as Cartesian direction cosines.
///
/// Nominally of unit length. The arithmetic helpers do not renormalise, so a
/// vector produced by a matrix product should be passed through
/// [`normalize`](Self::normalize) before it is read back as angles.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl DirectionVector {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The straight-down direction `(0, 0, -1)` of the horizontal frame.
    #[inline]
    pub fn nadir() -> Self {
        Self::new(0.0, 0.0, -1.0)
    }

    /// The straight-up direction `(0, 0, 1)`.
    #[inline]
    pub fn zenith() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// Builds a unit vector from spherical angles given in radians.
    ///
    /// See the module documentation for the four sign conventions.
    pub fn from_spherical(
        azimuth: f64,
        azimuth_direction: AzimuthDirection,
        polar: f64,
        polar_direction: PolarDirection,
    ) -> Self {
        let azimuth = match azimuth_direction {
            AzimuthDirection::AntiClockwise => azimuth,
            AzimuthDirection::Clockwise => -azimuth,
        };
        let (sin_az, cos_az) = libm::sincos(azimuth);
        let (sin_p, cos_p) = libm::sincos(polar);
        match polar_direction {
            PolarDirection::FromAzimuthalPlane => {
                Self::new(cos_p * cos_az, cos_p * sin_az, sin_p)
            }
            PolarDirection::FromPolarAxis => Self::new(sin_p * cos_az, sin_p * sin_az, cos_p),
        }
    }

    /// Inverse of [`from_spherical`](Self::from_spherical), returning
    /// `(azimuth, polar)` in radians.
    ///
    /// Azimuth is in `(-π, π]`. The vector is assumed to be normalised; `z` is
    /// clamped to `[-1, 1]` so rounding noise cannot push `asin`/`acos` out of
    /// their domain.
    pub fn to_spherical(
        &self,
        azimuth_direction: AzimuthDirection,
        polar_direction: PolarDirection,
    ) -> (f64, f64) {
        let azimuth = match azimuth_direction {
            AzimuthDirection::AntiClockwise => libm::atan2(self.y, self.x),
            AzimuthDirection::Clockwise => libm::atan2(-self.y, self.x),
        };
        let z = self.z.clamp(-1.0, 1.0);
        let polar = match polar_direction {
            PolarDirection::FromAzimuthalPlane => libm::asin(z),
            PolarDirection::FromPolarAxis => libm::acos(z),
        };
        (azimuth, polar)
    }

    /// Horizontal direction from altitude and azimuth in degrees.
    ///
    /// Azimuth is measured from north through east.
    pub fn from_altitude_azimuth(altitude: f64, azimuth: f64) -> Self {
        Self::from_spherical(
            azimuth.to_radians(),
            AzimuthDirection::Clockwise,
            altitude.to_radians(),
            PolarDirection::FromAzimuthalPlane,
        )
    }

    /// Returns `(altitude, azimuth)` in degrees, azimuth in `[0, 360)`.
    pub fn to_altitude_azimuth(&self) -> (f64, f64) {
        let (az, alt) =
            self.to_spherical(AzimuthDirection::Clockwise, PolarDirection::FromAzimuthalPlane);
        (alt.to_degrees(), wrap_degrees(az.to_degrees()))
    }

    /// Equatorial direction from right ascension (hours) and declination (degrees).
    pub fn from_equatorial(right_ascension: f64, declination: f64) -> Self {
        Self::from_spherical(
            (right_ascension * 15.0).to_radians(),
            AzimuthDirection::AntiClockwise,
            declination.to_radians(),
            PolarDirection::FromAzimuthalPlane,
        )
    }

    /// Returns `(right_ascension_hours, declination_degrees)`, RA in `[0, 24)`.
    pub fn to_equatorial(&self) -> (f64, f64) {
        let (ra, dec) =
            self.to_spherical(AzimuthDirection::AntiClockwise, PolarDirection::FromAzimuthalPlane);
        (wrap_degrees(ra.to_degrees()) / 15.0, dec.to_degrees())
    }

    /// Mount-frame direction from local hour angle (hours) and declination (degrees).
    ///
    /// Hour angle grows westward, so the azimuthal sense is clockwise.
    pub fn from_local_hour_angle_declination(hour_angle: f64, declination: f64) -> Self {
        Self::from_spherical(
            (hour_angle * 15.0).to_radians(),
            AzimuthDirection::Clockwise,
            declination.to_radians(),
            PolarDirection::FromAzimuthalPlane,
        )
    }

    /// Returns `(hour_angle_hours, declination_degrees)`, hour angle in `[0, 24)`.
    pub fn to_local_hour_angle_declination(&self) -> (f64, f64) {
        let (ha, dec) =
            self.to_spherical(AzimuthDirection::Clockwise, PolarDirection::FromAzimuthalPlane);
        (wrap_degrees(ha.to_degrees()) / 15.0, dec.to_degrees())
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product `self × other` (right-hand rule).
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[inline]
    pub fn minus(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    #[inline]
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    #[inline]
    pub fn length(&self) -> f64 {
        libm::sqrt(self.x * self.x + self.y * self.y + self.z * self.z)
    }

    /// Euclidean distance between the tips of two vectors.
    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        self.minus(other).length()
    }

    /// Returns the unit vector pointing the same way.
    ///
    /// Callers are responsible for passing a non-zero vector. A zero vector is
    /// returned unchanged rather than turned into NaNs.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len == 0.0 {
            *self
        } else {
            Self::new(self.x / len, self.y / len, self.z / len)
        }
    }

    /// Rotates the reference frame about the Y axis by `angle` degrees.
    ///
    /// This is the passive convention: turning the frame by `+θ` turns the vector
    /// by `-θ` within it, so `(0, 0, 1)` becomes `(-sin θ, 0, cos θ)`.
    pub fn rotate_around_y(&self, angle: f64) -> Self {
        let (s, c) = libm::sincos(angle.to_radians());
        Self::new(self.x * c - self.z * s, self.y, self.x * s + self.z * c)
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

pub(crate) fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = libm::fmod(deg, 360.0);
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

impl std::ops::Add for DirectionVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for DirectionVector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.minus(&rhs)
    }
}

impl std::ops::Mul<f64> for DirectionVector {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        self.scale(factor)
    }
}

impl std::ops::Neg for DirectionVector {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl fmt::Display for DirectionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.9}, {:.9}, {:.9})", self.x, self.y, self.z)
    }
}
