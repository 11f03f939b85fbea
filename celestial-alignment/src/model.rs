//! Immutable alignment model built from a set of sync points.
//!
//! The strategy depends on how many sync points there are:
//!
//! | points | strategy |
//! |---|---|
//! | 0 | fixed frame rotation about Y chosen from the mount-alignment hint |
//! | 1-3 | one matrix mapping a three-vector basis in the actual frame onto the matching apparent basis; missing basis vectors are synthesised |
//! | 4+ | both frames are triangulated by a convex hull and every facet carries its own matrix |
//!
//! The "actual" frame is the local horizontal frame computed from catalog
//! coordinates; the "apparent" frame is whatever frame the mount reports its
//! pointing in. Forward queries go actual → apparent, backward queries the
//! other way.
//!
//! A model is never mutated after [`AlignmentModel::build`] returns; callers
//! rebuild and replace it.

use crate::config::AlignmentConfig;
use crate::entry::{CalibrationEntry, MountAlignment, ReferencePosition};
use crate::error::{Error, Result};
use crate::hull::{ConvexHull, HullStats};
use crate::intersect::ray_intersects_triangle;
use crate::matrix::Matrix3;
use crate::site;
use crate::vector::DirectionVector;
use tracing::{debug, warn};

/// Hull vertex index of the synthetic nadir point.
pub const NADIR_INDEX: usize = 0;

/// Which transform resolved a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSource {
    /// Zero-point frame rotation.
    Rotation,
    /// The single fitted matrix of a one to three point model.
    Direct,
    /// Facet matrix, by position in [`AlignmentModel::actual_facets`] or
    /// [`AlignmentModel::apparent_facets`].
    Facet(usize),
    /// Matrix fitted on the fly from the three nearest sync points (entry indices).
    NearestNeighbours([usize; 3]),
}

/// One triangle of a triangulated frame and its local transform.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Facet {
    /// Calibration entry indices of the corners.
    pub entries: [usize; 3],
    pub matrix: Matrix3,
}

#[derive(Debug, Clone)]
enum Strategy {
    Rotation,
    Direct {
        forward: Matrix3,
        backward: Matrix3,
    },
    Triangulated(Box<Triangulation>),
}

#[derive(Debug, Clone)]
struct Triangulation {
    actual: Vec<DirectionVector>,
    apparent: Vec<DirectionVector>,
    actual_facets: Vec<Facet>,
    apparent_facets: Vec<Facet>,
    actual_stats: Option<HullStats>,
    apparent_stats: Option<HullStats>,
}

#[derive(Debug, Clone)]
pub struct AlignmentModel {
    position: Option<ReferencePosition>,
    alignment: MountAlignment,
    config: AlignmentConfig,
    point_count: usize,
    strategy: Strategy,
}

impl Default for AlignmentModel {
    fn default() -> Self {
        Self::empty()
    }
}

impl AlignmentModel {
    /// Model with no sync points and no site, as it stands before the first build.
    pub fn empty() -> Self {
        Self {
            position: None,
            alignment: MountAlignment::Zenith,
            config: AlignmentConfig::default(),
            point_count: 0,
            strategy: Strategy::Rotation,
        }
    }

    /// Fits a model to `entries`.
    ///
    /// Any sync point needs a site to place it in the horizontal frame, so a
    /// non-empty entry list without `position` fails with
    /// [`Error::NoReferencePosition`]. That is the only failure: four or more
    /// points whose directions give no hull (all coplanar with the nadir, for
    /// example) get no facets on that side, and every query there resolves
    /// through the nearest sync points.
    pub fn build(
        entries: &[CalibrationEntry],
        position: Option<ReferencePosition>,
        alignment: MountAlignment,
        config: &AlignmentConfig,
    ) -> Result<Self> {
        let strategy = if entries.is_empty() {
            Strategy::Rotation
        } else {
            let site = position.ok_or(Error::NoReferencePosition)?;
            let actual: Vec<DirectionVector> = entries
                .iter()
                .map(|e| {
                    site::actual_direction(
                        e.right_ascension,
                        e.declination,
                        &site,
                        e.observation_julian_date,
                    )
                })
                .collect();
            let apparent: Vec<DirectionVector> =
                entries.iter().map(|e| e.apparent_direction.normalize()).collect();

            if entries.len() <= 3 {
                direct_strategy(&actual, &apparent, &site, alignment, config)
            } else {
                Strategy::Triangulated(Box::new(triangulate(actual, apparent, config)))
            }
        };

        Ok(Self {
            position,
            alignment,
            config: *config,
            point_count: entries.len(),
            strategy,
        })
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn position(&self) -> Option<&ReferencePosition> {
        self.position.as_ref()
    }

    pub fn mount_alignment(&self) -> MountAlignment {
        self.alignment
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        match self.strategy {
            Strategy::Rotation => "rotation",
            Strategy::Direct { .. } => "direct",
            Strategy::Triangulated(_) => "triangulated",
        }
    }

    pub fn forward_matrix(&self) -> Option<&Matrix3> {
        match &self.strategy {
            Strategy::Direct { forward, .. } => Some(forward),
            _ => None,
        }
    }

    pub fn backward_matrix(&self) -> Option<&Matrix3> {
        match &self.strategy {
            Strategy::Direct { backward, .. } => Some(backward),
            _ => None,
        }
    }

    pub fn actual_facets(&self) -> &[Facet] {
        match &self.strategy {
            Strategy::Triangulated(t) => &t.actual_facets,
            _ => &[],
        }
    }

    pub fn apparent_facets(&self) -> &[Facet] {
        match &self.strategy {
            Strategy::Triangulated(t) => &t.apparent_facets,
            _ => &[],
        }
    }

    /// Statistics of the actual and apparent hulls of a triangulated model.
    /// `None` on a side whose points gave no hull.
    pub fn hull_stats(&self) -> Option<(Option<HullStats>, Option<HullStats>)> {
        match &self.strategy {
            Strategy::Triangulated(t) => Some((t.actual_stats, t.apparent_stats)),
            _ => None,
        }
    }

    /// Maps a horizontal-frame direction into the mount frame.
    pub fn actual_to_apparent(
        &self,
        direction: &DirectionVector,
    ) -> Result<(DirectionVector, MatrixSource)> {
        let direction = direction.normalize();
        let (out, source) = match &self.strategy {
            Strategy::Rotation => {
                let angle = self.rotation_angle(true)?;
                (direction.rotate_around_y(angle), MatrixSource::Rotation)
            }
            Strategy::Direct { forward, .. } => (forward * direction, MatrixSource::Direct),
            Strategy::Triangulated(t) => {
                let (matrix, source) = resolve(
                    &direction,
                    &t.actual,
                    &t.apparent,
                    &t.actual_facets,
                    &self.config,
                );
                (matrix * direction, source)
            }
        };
        Ok((out.normalize(), source))
    }

    /// Maps a mount-frame direction into the horizontal frame.
    pub fn apparent_to_actual(
        &self,
        direction: &DirectionVector,
    ) -> Result<(DirectionVector, MatrixSource)> {
        let direction = direction.normalize();
        let (out, source) = match &self.strategy {
            Strategy::Rotation => {
                let angle = self.rotation_angle(false)?;
                (direction.rotate_around_y(angle), MatrixSource::Rotation)
            }
            Strategy::Direct { backward, .. } => (backward * direction, MatrixSource::Direct),
            Strategy::Triangulated(t) => {
                let (matrix, source) = resolve(
                    &direction,
                    &t.apparent,
                    &t.actual,
                    &t.apparent_facets,
                    &self.config,
                );
                (matrix * direction, source)
            }
        };
        Ok((out.normalize(), source))
    }

    /// Mount direction for a catalog position (RA in hours, Dec in degrees) at `jd`.
    pub fn transform_celestial_to_mount(
        &self,
        right_ascension: f64,
        declination: f64,
        jd: f64,
    ) -> Result<DirectionVector> {
        let site = self.position.as_ref().ok_or(Error::NoReferencePosition)?;
        let actual = site::actual_direction(right_ascension, declination, site, jd);
        Ok(self.actual_to_apparent(&actual)?.0)
    }

    /// Catalog position `(ra_hours, dec_degrees)` the mount is pointing at, at `jd`.
    pub fn transform_mount_to_celestial(
        &self,
        direction: &DirectionVector,
        jd: f64,
    ) -> Result<(f64, f64)> {
        let site = self.position.as_ref().ok_or(Error::NoReferencePosition)?;
        let (actual, _) = self.apparent_to_actual(direction)?;
        Ok(site::celestial_position(&actual, site, jd))
    }

    /// Y-axis frame rotation of the zero-point model, in degrees.
    ///
    /// Forward turns the horizontal frame so the mount's polar axis, assumed to
    /// point at the elevated celestial pole, becomes +Z. Backward undoes it.
    fn rotation_angle(&self, forward: bool) -> Result<f64> {
        let lat = self.position.ok_or(Error::NoReferencePosition)?.latitude;
        let angle = match self.alignment {
            MountAlignment::Zenith => 0.0,
            MountAlignment::NorthCelestialPole => 90.0 - lat,
            MountAlignment::SouthCelestialPole => -90.0 - lat,
        };
        Ok(if forward { angle } else { -angle })
    }
}

/// Horizontal-frame and mount-frame directions of the mount's reference axis.
fn reference_axis(
    site: &ReferencePosition,
    alignment: MountAlignment,
) -> (DirectionVector, DirectionVector) {
    let actual = match alignment {
        MountAlignment::Zenith => DirectionVector::zenith(),
        MountAlignment::NorthCelestialPole => {
            DirectionVector::from_altitude_azimuth(site.latitude, 0.0)
        }
        MountAlignment::SouthCelestialPole => {
            DirectionVector::from_altitude_azimuth(-site.latitude, 180.0)
        }
    };
    (actual, DirectionVector::zenith())
}

fn direct_strategy(
    actual: &[DirectionVector],
    apparent: &[DirectionVector],
    site: &ReferencePosition,
    alignment: MountAlignment,
    config: &AlignmentConfig,
) -> Strategy {
    let (mut from, mut to) = (actual.to_vec(), apparent.to_vec());
    if from.len() == 1 {
        let (a, b) = reference_axis(site, alignment);
        from.push(a);
        to.push(b);
    }
    if from.len() == 2 {
        from.push(from[0].cross(&from[1]).normalize());
        to.push(to[0].cross(&to[1]).normalize());
    }

    let forward = basis_transform(
        [&from[0], &from[1], &from[2]],
        [&to[0], &to[1], &to[2]],
        config,
    );
    let backward = forward.inverse_or_identity(config.singular_tolerance);
    Strategy::Direct { forward, backward }
}

/// Matrix taking each `from[i]` onto `to[i]`.
fn basis_transform(
    from: [&DirectionVector; 3],
    to: [&DirectionVector; 3],
    config: &AlignmentConfig,
) -> Matrix3 {
    let alpha = Matrix3::from_columns(from[0], from[1], from[2]);
    let beta = Matrix3::from_columns(to[0], to[1], to[2]);
    beta * alpha.inverse_or_identity(config.singular_tolerance)
}

fn triangulate(
    actual: Vec<DirectionVector>,
    apparent: Vec<DirectionVector>,
    config: &AlignmentConfig,
) -> Triangulation {
    let (actual_facets, actual_stats) = facets_of("actual", &actual, &apparent, config);
    let (apparent_facets, apparent_stats) = facets_of("apparent", &apparent, &actual, config);

    debug!(
        actual_facets = actual_facets.len(),
        apparent_facets = apparent_facets.len(),
        "triangulated sync points"
    );

    Triangulation {
        actual,
        apparent,
        actual_facets,
        apparent_facets,
        actual_stats,
        apparent_stats,
    }
}

/// Hull facets over `from` (plus the nadir), each mapping `from` onto `to`.
///
/// A degenerate point set yields no facets and no stats.
fn facets_of(
    frame: &str,
    from: &[DirectionVector],
    to: &[DirectionVector],
    config: &AlignmentConfig,
) -> (Vec<Facet>, Option<HullStats>) {
    let mut points = Vec::with_capacity(from.len() + 1);
    points.push(DirectionVector::nadir());
    points.extend_from_slice(from);

    let hull = match ConvexHull::build(&points, config.hull_scale_factor) {
        Ok(hull) => hull,
        Err(e) => {
            warn!(frame, points = from.len(), error = %e, "no hull, queries use nearest sync points");
            return (Vec::new(), None);
        }
    };

    let facets = hull
        .faces()
        .iter()
        .filter(|f| !f.contains(NADIR_INDEX))
        .map(|f| {
            let entries = f.vertices.map(|v| v - 1);
            let matrix = basis_transform(entries.map(|i| &from[i]), entries.map(|i| &to[i]), config);
            Facet { entries, matrix }
        })
        .collect();
    (facets, Some(hull.stats()))
}

/// Finds the transform for `direction` on the `from` side of a triangulation.
fn resolve(
    direction: &DirectionVector,
    from: &[DirectionVector],
    to: &[DirectionVector],
    facets: &[Facet],
    config: &AlignmentConfig,
) -> (Matrix3, MatrixSource) {
    let ray = direction.scale(config.ray_scale);
    let hit = facets.iter().position(|f| {
        let [a, b, c] = f.entries.map(|i| &from[i]);
        ray_intersects_triangle(&ray, a, b, c, config.intersection_epsilon)
    });
    if let Some(i) = hit {
        return (facets[i].matrix, MatrixSource::Facet(i));
    }

    let nearest = nearest_three(from, direction);
    debug!(?nearest, "no facet hit, using nearest sync points");
    let matrix = basis_transform(nearest.map(|i| &from[i]), nearest.map(|i| &to[i]), config);
    (matrix, MatrixSource::NearestNeighbours(nearest))
}

/// Indices of the three points closest to `target`. `points` holds at least three.
fn nearest_three(points: &[DirectionVector], target: &DirectionVector) -> [usize; 3] {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a]
            .distance(target)
            .total_cmp(&points[b].distance(target))
    });
    [order[0], order[1], order[2]]
}

#[cfg(test)]
mod tests {
    use super::*;

    const JD: f64 = 2_460_000.5;

    fn site() -> ReferencePosition {
        ReferencePosition::new(52.0, -1.5)
    }

    /// Entry whose mount direction equals its true horizontal direction.
    fn perfect_entry(ra: f64, dec: f64) -> CalibrationEntry {
        let v = site::actual_direction(ra, dec, &site(), JD);
        CalibrationEntry::new(JD, ra, dec, v)
    }

    /// Entry whose mount direction is its horizontal direction turned by `m`.
    fn skewed_entry(ra: f64, dec: f64, m: &Matrix3) -> CalibrationEntry {
        let v = site::actual_direction(ra, dec, &site(), JD);
        CalibrationEntry::new(JD, ra, dec, m * v)
    }

    fn small_rotation() -> Matrix3 {
        let (s, c) = libm::sincos(2.0_f64.to_radians());
        Matrix3::from_rows([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    fn build(entries: &[CalibrationEntry], alignment: MountAlignment) -> AlignmentModel {
        AlignmentModel::build(entries, Some(site()), alignment, &AlignmentConfig::default())
            .unwrap()
    }

    #[test]
    fn empty_model_has_no_position() {
        let model = AlignmentModel::empty();
        assert_eq!(model.point_count(), 0);
        assert_eq!(model.strategy_name(), "rotation");
        assert!(matches!(
            model.actual_to_apparent(&DirectionVector::zenith()),
            Err(Error::NoReferencePosition)
        ));
    }

    #[test]
    fn entries_without_position_fail() {
        let e = perfect_entry(3.0, 40.0);
        let r = AlignmentModel::build(&[e], None, MountAlignment::Zenith, &AlignmentConfig::default());
        assert!(matches!(r, Err(Error::NoReferencePosition)));
    }

    #[test]
    fn zero_points_zenith_is_identity() {
        let model = build(&[], MountAlignment::Zenith);
        let v = DirectionVector::from_altitude_azimuth(35.0, 120.0);
        let (out, source) = model.actual_to_apparent(&v).unwrap();
        assert_eq!(source, MatrixSource::Rotation);
        assert!(out.distance(&v) < 1e-15);
    }

    #[test]
    fn zero_points_ncp_puts_pole_at_z() {
        let model = build(&[], MountAlignment::NorthCelestialPole);
        let pole = DirectionVector::from_altitude_azimuth(site().latitude, 0.0);
        let (out, _) = model.actual_to_apparent(&pole).unwrap();
        assert!(out.distance(&DirectionVector::zenith()) < 1e-12);
        let (back, _) = model.apparent_to_actual(&out).unwrap();
        assert!(back.distance(&pole) < 1e-12);
    }

    #[test]
    fn zero_points_scp_puts_pole_at_z() {
        let south = ReferencePosition::new(-31.0, 149.0);
        let model = AlignmentModel::build(
            &[],
            Some(south),
            MountAlignment::SouthCelestialPole,
            &AlignmentConfig::default(),
        )
        .unwrap();
        let pole = DirectionVector::from_altitude_azimuth(31.0, 180.0);
        let (out, _) = model.actual_to_apparent(&pole).unwrap();
        assert!(out.distance(&DirectionVector::zenith()) < 1e-12);
    }

    #[test]
    fn one_perfect_point_is_identity() {
        for alignment in [
            MountAlignment::Zenith,
            MountAlignment::NorthCelestialPole,
            MountAlignment::SouthCelestialPole,
        ] {
            let entry = perfect_entry(4.0, 30.0);
            let model = build(&[entry.clone()], alignment);
            assert_eq!(model.strategy_name(), "direct");
            let (out, source) = model.actual_to_apparent(&entry.apparent_direction).unwrap();
            assert_eq!(source, MatrixSource::Direct);
            assert!(out.distance(&entry.apparent_direction) < 1e-9);
        }
    }

    #[test]
    fn two_points_recover_rotation() {
        let m = small_rotation();
        let entries = [skewed_entry(2.0, 50.0, &m), skewed_entry(7.0, 20.0, &m)];
        let model = build(&entries, MountAlignment::Zenith);
        assert!(model.forward_matrix().unwrap().max_difference(&m) < 1e-9);
    }

    #[test]
    fn three_points_recover_rotation_and_inverse() {
        let m = small_rotation();
        let entries = [
            skewed_entry(2.0, 50.0, &m),
            skewed_entry(7.0, 20.0, &m),
            skewed_entry(11.0, 70.0, &m),
        ];
        let model = build(&entries, MountAlignment::Zenith);
        let f = model.forward_matrix().unwrap();
        let b = model.backward_matrix().unwrap();
        assert!(f.max_difference(&m) < 1e-9);
        assert!((f * b).max_difference(&Matrix3::identity()) < 1e-12);
    }

    #[test]
    fn three_coincident_points_substitute_identity_inverse() {
        let e = perfect_entry(5.0, 45.0);
        let v = e.apparent_direction;
        let model = build(&[e.clone(), e.clone(), e], MountAlignment::Zenith);
        // alpha is singular, so forward = beta * I.
        let expected = Matrix3::from_columns(&v, &v, &v);
        assert!(model.forward_matrix().unwrap().max_difference(&expected) < 1e-15);
        assert_eq!(model.backward_matrix().unwrap(), &Matrix3::identity());
    }

    #[test]
    fn nearest_three_orders_by_distance() {
        let pts = [
            DirectionVector::new(1.0, 0.0, 0.0),
            DirectionVector::new(0.0, 1.0, 0.0),
            DirectionVector::new(0.0, 0.0, 1.0),
            DirectionVector::new(0.7, 0.7, 0.0).normalize(),
        ];
        let target = DirectionVector::new(0.9, 0.4, 0.0).normalize();
        assert_eq!(nearest_three(&pts, &target), [3, 0, 1]);
    }

    #[test]
    fn facets_skip_the_nadir() {
        let entries: Vec<_> = [(1.0, 60.0), (6.0, 30.0), (12.0, 10.0), (17.0, 40.0), (21.0, 75.0)]
            .iter()
            .map(|&(ra, dec)| perfect_entry(ra, dec))
            .collect();
        let model = build(&entries, MountAlignment::Zenith);
        assert_eq!(model.strategy_name(), "triangulated");
        assert!(!model.actual_facets().is_empty());
        for f in model.actual_facets().iter().chain(model.apparent_facets()) {
            assert!(f.entries.iter().all(|&i| i < entries.len()));
            assert!(f.matrix.max_difference(&Matrix3::identity()) < 1e-9);
        }
        let (actual, apparent) = model.hull_stats().unwrap();
        let (actual, apparent) = (actual.unwrap(), apparent.unwrap());
        assert_eq!(actual.faces, 2 * actual.vertices - 4);
        assert_eq!(apparent.faces, 2 * apparent.vertices - 4);
    }

    #[test]
    fn one_point_matches_zero_point_rotation_off_sync() {
        let queries = [
            DirectionVector::from_altitude_azimuth(15.0, 40.0),
            DirectionVector::from_altitude_azimuth(55.0, 200.0),
            DirectionVector::from_altitude_azimuth(-20.0, 300.0),
        ];
        for alignment in [
            MountAlignment::Zenith,
            MountAlignment::NorthCelestialPole,
            MountAlignment::SouthCelestialPole,
        ] {
            let rotation = build(&[], alignment);
            let sky = site::actual_direction(4.0, 30.0, &site(), JD);
            let (mount, _) = rotation.actual_to_apparent(&sky).unwrap();
            let model = build(&[CalibrationEntry::new(JD, 4.0, 30.0, mount)], alignment);

            for q in &queries {
                let (expected, _) = rotation.actual_to_apparent(q).unwrap();
                let (out, source) = model.actual_to_apparent(q).unwrap();
                assert_eq!(source, MatrixSource::Direct);
                assert!(out.distance(&expected) < 1e-12, "{:?} {}", alignment, out.distance(&expected));

                let (back, _) = model.apparent_to_actual(&expected).unwrap();
                assert!(back.distance(q) < 1e-12, "{:?}", alignment);
            }
        }
    }

    #[test]
    fn degenerate_points_get_no_facets() {
        // Coplanar with the nadir: every direction has y = 0.
        let entries: Vec<_> = [(10.0, 0.0), (40.0, 0.0), (70.0, 0.0), (30.0, 180.0)]
            .iter()
            .map(|&(alt, az)| {
                let v = DirectionVector::from_altitude_azimuth(alt, az);
                let v = DirectionVector::new(v.x, 0.0, v.z);
                let (ra, dec) = site::celestial_position(&v, &site(), JD);
                CalibrationEntry::new(JD, ra, dec, v)
            })
            .collect();
        let model = build(&entries, MountAlignment::Zenith);
        assert_eq!(model.strategy_name(), "triangulated");
        assert!(model.actual_facets().is_empty());
        assert!(model.apparent_facets().is_empty());
        assert_eq!(model.hull_stats(), Some((None, None)));

        let (_, source) = model.actual_to_apparent(&DirectionVector::zenith()).unwrap();
        assert!(matches!(source, MatrixSource::NearestNeighbours(_)));
    }
}
