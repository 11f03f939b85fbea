use crate::error::{Error, Result};
use crate::vector::DirectionVector;

/// Rough geometry of the mount, used only while fewer than two sync points exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MountAlignment {
    #[default]
    Zenith,
    NorthCelestialPole,
    SouthCelestialPole,
}

impl MountAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            MountAlignment::Zenith => "zenith",
            MountAlignment::NorthCelestialPole => "ncp",
            MountAlignment::SouthCelestialPole => "scp",
        }
    }
}

impl From<MountAlignment> for u8 {
    fn from(alignment: MountAlignment) -> Self {
        match alignment {
            MountAlignment::Zenith => 0,
            MountAlignment::NorthCelestialPole => 1,
            MountAlignment::SouthCelestialPole => 2,
        }
    }
}

impl TryFrom<u8> for MountAlignment {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(MountAlignment::Zenith),
            1 => Ok(MountAlignment::NorthCelestialPole),
            2 => Ok(MountAlignment::SouthCelestialPole),
            other => Err(Error::InvalidMountAlignment(other)),
        }
    }
}

impl std::str::FromStr for MountAlignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "zenith" => Ok(MountAlignment::Zenith),
            "ncp" | "north" | "north_celestial_pole" => Ok(MountAlignment::NorthCelestialPole),
            "scp" | "south" | "south_celestial_pole" => Ok(MountAlignment::SouthCelestialPole),
            _ => Err(Error::Parse(format!("unknown mount alignment: {}", s))),
        }
    }
}

/// Observing site. Degrees, longitude positive east.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferencePosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl ReferencePosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One sync point: where a star really is, and where the mount said it was
/// pointing when the star was centred.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationEntry {
    pub observation_julian_date: f64,
    /// Decimal hours.
    pub right_ascension: f64,
    /// Decimal degrees.
    pub declination: f64,
    pub apparent_direction: DirectionVector,
    /// Caller data carried alongside the entry, never interpreted here.
    pub private_data: Vec<u8>,
}

impl CalibrationEntry {
    pub fn new(
        observation_julian_date: f64,
        right_ascension: f64,
        declination: f64,
        apparent_direction: DirectionVector,
    ) -> Self {
        Self {
            observation_julian_date,
            right_ascension,
            declination,
            apparent_direction,
            private_data: Vec::new(),
        }
    }

    pub fn with_private_data(mut self, data: Vec<u8>) -> Self {
        self.private_data = data;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_alignment_wire_values() {
        for a in [
            MountAlignment::Zenith,
            MountAlignment::NorthCelestialPole,
            MountAlignment::SouthCelestialPole,
        ] {
            assert_eq!(MountAlignment::try_from(u8::from(a)).unwrap(), a);
        }
    }

    #[test]
    fn mount_alignment_rejects_unknown_value() {
        match MountAlignment::try_from(7) {
            Err(Error::InvalidMountAlignment(7)) => {}
            other => panic!("expected InvalidMountAlignment, got {:?}", other),
        }
    }

    #[test]
    fn mount_alignment_from_str() {
        assert_eq!("NCP".parse::<MountAlignment>().unwrap(), MountAlignment::NorthCelestialPole);
        assert_eq!("scp".parse::<MountAlignment>().unwrap(), MountAlignment::SouthCelestialPole);
        assert_eq!("Zenith".parse::<MountAlignment>().unwrap(), MountAlignment::Zenith);
        assert!("polaris".parse::<MountAlignment>().is_err());
    }

    #[test]
    fn default_alignment_is_zenith() {
        assert_eq!(MountAlignment::default(), MountAlignment::Zenith);
    }

    #[test]
    fn entry_carries_private_data() {
        let e = CalibrationEntry::new(2451545.0, 5.5, 20.0, DirectionVector::zenith())
            .with_private_data(vec![1, 2, 3]);
        assert_eq!(e.private_data, vec![1, 2, 3]);
        assert_eq!(e.right_ascension, 5.5);
    }
}
