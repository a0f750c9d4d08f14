#![forbid(unsafe_code)]

pub mod compositor;
pub mod config;
pub mod density;
pub mod drag;
pub mod fonts;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod overlay;
pub mod packer;
pub mod paths;
pub mod raster;
pub mod schedule;
pub mod svg;
pub mod theme;
pub mod view;

pub use compositor::{Compositor, Frame, FrameState, FrameStats, compose};
pub use config::RenderConfig;
pub use density::{Density, Thresholds, Tier, classify};
pub use model::{
    Connection, EdgeLoad, GraphDescription, Occupant, StateSnapshot, ZoneKind, ZoneNode,
};
pub use view::{ViewMessage, ViewOptions};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid snapshot payload: {0}")]
    Payload(String),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0}")]
    Config(String),
    #[error("failed to parse SVG: {0}")]
    Raster(#[from] resvg::usvg::Error),
    #[error("failed to encode PNG: {0}")]
    Encode(String),
    #[error("failed to convert to PDF: {0}")]
    Pdf(String),
    #[error("cannot allocate a {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
