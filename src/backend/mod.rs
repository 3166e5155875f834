//! Launch registry backed by a hosted PostgREST API

pub mod registry;

pub use registry::{LaunchRecord, LaunchRegistry, RegistryError, LAUNCH_COLUMNS};
