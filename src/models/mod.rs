pub mod config;
pub mod geometry;

pub use config::{ConfigFile, EngraveConfig, OutputTarget, BUILTIN_FILTERS};
pub use geometry::{
    ArtifactClass, ColorMode, Colorant, ColorantSet, Convention, ImageGeometry, OutputFormat,
};
