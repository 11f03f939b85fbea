//! Equatorial ⇄ horizontal conversion for an observing site.
//!
//! Sidereal time follows the IAU 1982 expression for GMST in terms of UT1
//! (Meeus, *Astronomical Algorithms*, eq. 12.4). Refraction, precession and
//! nutation are the caller's business; coordinates are taken as already apparent.
//!
//! Azimuth is measured from north through east. Hour angle is `LST - RA` and
//! grows westward.

use crate::entry::ReferencePosition;
use crate::vector::{wrap_degrees, DirectionVector};

pub const J2000_JD: f64 = 2_451_545.0;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

/// Greenwich mean sidereal time in degrees, `[0, 360)`.
pub fn greenwich_mean_sidereal_time(jd: f64) -> f64 {
    let d = jd - J2000_JD;
    let t = d / DAYS_PER_JULIAN_CENTURY;
    let gmst = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    wrap_degrees(gmst)
}

/// Local mean sidereal time in degrees for an east-positive longitude.
pub fn local_sidereal_time(jd: f64, longitude: f64) -> f64 {
    wrap_degrees(greenwich_mean_sidereal_time(jd) + longitude)
}

/// Converts RA/Dec (both degrees) to `(altitude, azimuth)` in degrees.
pub fn equatorial_to_horizontal(
    right_ascension: f64,
    declination: f64,
    position: &ReferencePosition,
    jd: f64,
) -> (f64, f64) {
    let ha = (local_sidereal_time(jd, position.longitude) - right_ascension).to_radians();
    let dec = declination.to_radians();
    let lat = position.latitude.to_radians();

    let (sin_ha, cos_ha) = libm::sincos(ha);
    let (sin_dec, cos_dec) = libm::sincos(dec);
    let (sin_lat, cos_lat) = libm::sincos(lat);

    let sin_alt = (sin_dec * sin_lat + cos_dec * cos_lat * cos_ha).clamp(-1.0, 1.0);
    let alt = libm::asin(sin_alt);
    let az = libm::atan2(-cos_dec * sin_ha, sin_dec * cos_lat - cos_dec * sin_lat * cos_ha);

    (alt.to_degrees(), wrap_degrees(az.to_degrees()))
}

/// Converts altitude/azimuth (degrees) to `(right_ascension, declination)` in degrees.
pub fn horizontal_to_equatorial(
    altitude: f64,
    azimuth: f64,
    position: &ReferencePosition,
    jd: f64,
) -> (f64, f64) {
    let (sin_alt, cos_alt) = libm::sincos(altitude.to_radians());
    let (sin_az, cos_az) = libm::sincos(azimuth.to_radians());
    let (sin_lat, cos_lat) = libm::sincos(position.latitude.to_radians());

    let sin_dec = (sin_alt * sin_lat + cos_alt * cos_lat * cos_az).clamp(-1.0, 1.0);
    let dec = libm::asin(sin_dec);
    let ha = libm::atan2(-sin_az * cos_alt, sin_alt * cos_lat - cos_alt * sin_lat * cos_az);

    let ra = local_sidereal_time(jd, position.longitude) - ha.to_degrees();
    (wrap_degrees(ra), dec.to_degrees())
}

/// Horizontal-frame direction of a catalog position. RA in hours.
pub fn actual_direction(
    right_ascension: f64,
    declination: f64,
    position: &ReferencePosition,
    jd: f64,
) -> DirectionVector {
    let (alt, az) = equatorial_to_horizontal(right_ascension * 15.0, declination, position, jd);
    DirectionVector::from_altitude_azimuth(alt, az)
}

/// Catalog position `(ra_hours, dec_degrees)` of a horizontal-frame direction.
pub fn celestial_position(
    direction: &DirectionVector,
    position: &ReferencePosition,
    jd: f64,
) -> (f64, f64) {
    let (alt, az) = direction.to_altitude_azimuth();
    let (ra, dec) = horizontal_to_equatorial(alt, az, position, jd);
    (ra / 15.0, dec)
}
