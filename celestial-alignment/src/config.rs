use crate::hull::DEFAULT_SCALE_FACTOR;
use crate::intersect::DEFAULT_EPSILON;
use crate::matrix::DEFAULT_SINGULAR_TOLERANCE;

/// Numerical tunables of the alignment engine.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentConfig {
    /// Fixed-point quantisation factor for hull vertices.
    pub hull_scale_factor: f64,
    /// Parallel-ray and forward-distance threshold of the facet search.
    pub intersection_epsilon: f64,
    /// `|det|` below which a basis matrix is treated as singular.
    pub singular_tolerance: f64,
    /// Query vectors are stretched by this factor so they cross the hull surface.
    pub ray_scale: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            hull_scale_factor: DEFAULT_SCALE_FACTOR,
            intersection_epsilon: DEFAULT_EPSILON,
            singular_tolerance: DEFAULT_SINGULAR_TOLERANCE,
            ray_scale: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AlignmentConfig::default();
        assert_eq!(c.hull_scale_factor, 1e6);
        assert_eq!(c.intersection_epsilon, 1e-12);
        assert_eq!(c.singular_tolerance, 1e-12);
        assert_eq!(c.ray_scale, 2.0);
    }
}
