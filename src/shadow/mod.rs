//! The shadow area: store lifecycle and per-file recording.

pub mod archive;
pub mod exclude;
pub mod file;
pub mod lifecycle;

pub use archive::unpack;
pub use file::{shadow_file, ShadowOutcome};
pub use lifecycle::{
    activate, create, deactivate, ensure_current, is_active, restage_archive, rotate_on_commit,
};
