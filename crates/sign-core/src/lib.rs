pub mod config;
pub mod debounce;
pub mod history;
pub mod layout;
pub mod model;
pub mod surface;
pub mod tracker;

pub use config::Config;
pub use debounce::Debouncer;
pub use history::{HistoryEntry, SnapshotHistory};
pub use layout::{HostMetrics, SurfaceSize};
pub use model::*;
pub use surface::{Surface, SurfaceError};
pub use tracker::{StrokeTracker, TrackedSample, WidthModel};
