#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod interchange;
pub mod layout;
pub mod layout_dump;
pub mod logging;
pub mod model;
pub mod render;
pub mod store;
pub mod text_metrics;
pub mod theme;

pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use layout::{Layout, compute_layout};
pub use model::{FamilyGraph, Gender, Person, RelationKind, Relationship};
pub use render::render_svg;
pub use store::{FamilyStore, StoreError};
pub use theme::Theme;

#[cfg(feature = "cli")]
pub use cli::run;
