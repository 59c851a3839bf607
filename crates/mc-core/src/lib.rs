pub mod config;
pub mod discover;
pub mod paths;
pub mod probe;
pub mod project;
pub mod projection;
pub mod registry;
pub mod viewport;

pub use config::{Config, ConfigError};
pub use discover::{DiscoverError, DiscoveredProject};
pub use probe::{ShellProbes, StatusProbes};
pub use project::{
    CommitTimes, DeployState, FieldGroup, GitStatus, HostingStatus, LanguageInfo, Project,
    ProjectKind, ProjectMarkers, StatusUpdate,
};
pub use registry::{Registry, Stats};
pub use viewport::{Motion, MotionPrefix, Viewport};
