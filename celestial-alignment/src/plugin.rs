use crate::clock::{JulianClock, SystemClock};
use crate::config::AlignmentConfig;
use crate::entry::{CalibrationEntry, MountAlignment, ReferencePosition};
use crate::error::{Error, Result};
use crate::model::AlignmentModel;
use crate::vector::DirectionVector;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub const BUILT_IN_PLUGIN_NAME: &str = "built-in";

/// An alignment engine a driver can switch between.
pub trait MathPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Rebuilds the engine from the given sync points.
    fn initialise(
        &self,
        entries: &[CalibrationEntry],
        position: Option<ReferencePosition>,
    ) -> Result<()>;

    /// Mount direction for RA (hours) / Dec (degrees) at now + `julian_offset` days.
    fn transform_celestial_to_mount(
        &self,
        right_ascension: f64,
        declination: f64,
        julian_offset: f64,
    ) -> Result<DirectionVector>;

    /// `(ra_hours, dec_degrees)` for a mount direction at now + `julian_offset` days.
    fn transform_mount_to_celestial(
        &self,
        direction: &DirectionVector,
        julian_offset: f64,
    ) -> Result<(f64, f64)>;
}

/// The standard engine: direct basis fits for up to three points, hull
/// triangulation beyond that.
///
/// `initialise` builds a complete [`AlignmentModel`] before publishing it with
/// one atomic pointer swap. Queries run against whichever snapshot was current
/// when they started and never see a half-built model. A failed build leaves
/// the previous snapshot in place.
pub struct BuiltInMathPlugin {
    model: ArcSwap<AlignmentModel>,
    alignment: AtomicU8,
    config: AlignmentConfig,
    clock: Arc<dyn JulianClock>,
}

impl Default for BuiltInMathPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltInMathPlugin {
    pub fn new() -> Self {
        Self::with_config(AlignmentConfig::default())
    }

    pub fn with_config(config: AlignmentConfig) -> Self {
        Self {
            model: ArcSwap::from_pointee(AlignmentModel::empty()),
            alignment: AtomicU8::new(MountAlignment::Zenith.into()),
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn JulianClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the hint used by the next `initialise` with fewer than two points.
    pub fn set_mount_alignment(&self, alignment: MountAlignment) {
        self.alignment.store(alignment.into(), Ordering::Release);
    }

    pub fn mount_alignment(&self) -> MountAlignment {
        MountAlignment::try_from(self.alignment.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Current model snapshot.
    pub fn model(&self) -> Arc<AlignmentModel> {
        self.model.load_full()
    }

    fn julian_date(&self, offset: f64) -> f64 {
        self.clock.julian_date() + offset
    }
}

impl MathPlugin for BuiltInMathPlugin {
    fn name(&self) -> &str {
        BUILT_IN_PLUGIN_NAME
    }

    fn description(&self) -> &str {
        "Direct basis fit for 1-3 sync points, convex hull triangulation for 4 or more"
    }

    fn initialise(
        &self,
        entries: &[CalibrationEntry],
        position: Option<ReferencePosition>,
    ) -> Result<()> {
        let model =
            match AlignmentModel::build(entries, position, self.mount_alignment(), &self.config) {
                Ok(m) => m,
                Err(e) => {
                    warn!(points = entries.len(), error = %e, "alignment model rebuild failed");
                    return Err(e);
                }
            };
        info!(
            points = model.point_count(),
            strategy = model.strategy_name(),
            alignment = model.mount_alignment().as_str(),
            "alignment model published"
        );
        self.model.store(Arc::new(model));
        Ok(())
    }

    fn transform_celestial_to_mount(
        &self,
        right_ascension: f64,
        declination: f64,
        julian_offset: f64,
    ) -> Result<DirectionVector> {
        let model = self.model.load();
        model.transform_celestial_to_mount(
            right_ascension,
            declination,
            self.julian_date(julian_offset),
        )
    }

    fn transform_mount_to_celestial(
        &self,
        direction: &DirectionVector,
        julian_offset: f64,
    ) -> Result<(f64, f64)> {
        let model = self.model.load();
        model.transform_mount_to_celestial(direction, self.julian_date(julian_offset))
    }
}

pub type PluginConstructor = fn() -> Box<dyn MathPlugin>;

fn built_in() -> Box<dyn MathPlugin> {
    Box::new(BuiltInMathPlugin::new())
}

/// Explicit table of available alignment engines.
#[derive(Default)]
pub struct PluginRegistry {
    entries: Vec<(String, PluginConstructor)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(BUILT_IN_PLUGIN_NAME, built_in);
        registry
    }

    /// Adds or replaces the constructor registered under `name`.
    pub fn register(&mut self, name: &str, constructor: PluginConstructor) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = constructor,
            None => self.entries.push((name.to_string(), constructor)),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn MathPlugin>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ctor)| ctor())
            .ok_or_else(|| Error::UnknownPlugin(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::site;

    const JD: f64 = 2_460_100.25;

    fn plugin() -> BuiltInMathPlugin {
        BuiltInMathPlugin::new().with_clock(Arc::new(FixedClock(JD)))
    }

    fn site() -> ReferencePosition {
        ReferencePosition::new(47.0, 8.5)
    }

    #[test]
    fn fresh_plugin_has_empty_model() {
        let p = plugin();
        assert_eq!(p.model().point_count(), 0);
        assert_eq!(p.mount_alignment(), MountAlignment::Zenith);
        assert!(matches!(
            p.transform_celestial_to_mount(1.0, 2.0, 0.0),
            Err(Error::NoReferencePosition)
        ));
    }

    #[test]
    fn mount_alignment_is_stored() {
        let p = plugin();
        p.set_mount_alignment(MountAlignment::SouthCelestialPole);
        assert_eq!(p.mount_alignment(), MountAlignment::SouthCelestialPole);
        p.initialise(&[], Some(site())).unwrap();
        assert_eq!(p.model().mount_alignment(), MountAlignment::SouthCelestialPole);
    }

    #[test]
    fn failed_initialise_keeps_previous_model() {
        let p = plugin();
        p.initialise(&[], Some(site())).unwrap();
        let before = p.model();

        let entry = CalibrationEntry::new(JD, 3.0, 40.0, DirectionVector::zenith());
        assert!(matches!(p.initialise(&[entry], None), Err(Error::NoReferencePosition)));
        assert!(Arc::ptr_eq(&before, &p.model()));
    }

    #[test]
    fn offset_moves_the_query_time() {
        let p = plugin();
        p.initialise(&[], Some(site())).unwrap();
        let later = p.transform_celestial_to_mount(5.0, 20.0, 0.1).unwrap();
        let expected = site::actual_direction(5.0, 20.0, &site(), JD + 0.1);
        assert!(later.distance(&expected) < 1e-12);
    }

    #[test]
    fn snapshot_survives_republish() {
        let p = plugin();
        p.initialise(&[], Some(site())).unwrap();
        let held = p.model();
        let entry = CalibrationEntry::new(
            JD,
            3.0,
            40.0,
            site::actual_direction(3.0, 40.0, &site(), JD),
        );
        p.initialise(&[entry], Some(site())).unwrap();
        assert_eq!(held.point_count(), 0);
        assert_eq!(p.model().point_count(), 1);
    }

    #[test]
    fn registry_creates_builtin() {
        let registry = PluginRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["built-in"]);
        let p = registry.create("built-in").unwrap();
        assert_eq!(p.name(), "built-in");
        assert!(!p.description().is_empty());
    }

    #[test]
    fn registry_rejects_unknown_name() {
        let registry = PluginRegistry::with_builtin();
        match registry.create("nearest-star") {
            Err(Error::UnknownPlugin(name)) => assert_eq!(name, "nearest-star"),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("unknown plugin was created"),
        }
    }

    #[test]
    fn register_replaces_existing_entry() {
        let mut registry = PluginRegistry::with_builtin();
        registry.register("built-in", built_in);
        assert_eq!(registry.names().len(), 1);
    }
}
