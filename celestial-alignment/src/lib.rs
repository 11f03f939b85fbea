pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod hull;
pub mod intersect;
pub mod matrix;
pub mod model;
pub mod parser;
pub mod plugin;
pub mod site;
pub mod vector;

pub use config::AlignmentConfig;
pub use entry::{CalibrationEntry, MountAlignment, ReferencePosition};
pub use error::{Error, Result};
pub use matrix::Matrix3;
pub use model::{AlignmentModel, MatrixSource};
pub use plugin::{BuiltInMathPlugin, MathPlugin, PluginRegistry};
pub use vector::DirectionVector;
