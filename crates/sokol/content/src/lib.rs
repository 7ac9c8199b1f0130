//! Data-driven content for the Sokol engine.
//!
//! This crate reads Sokol content from a data directory:
//! - Components with slots, stat layers and system configs (RON)
//! - Blueprints describing prebuilt trees (RON)
//! - Language tables per locale (TOML)
//! - Engine configuration (TOML)
//!
//! Loaded content is served through [`ContentPlatform`], an implementation of
//! [`SokolPlatform`](sokol_core::SokolPlatform). The file loaders sit behind the
//! default `loaders` feature.

#[cfg(feature = "loaders")]
pub mod loaders;
pub mod platform;

#[cfg(feature = "loaders")]
pub use loaders::{
    BlueprintLoader, ComponentDef, ComponentLoader, ConfigLoader, ContentFactory, FactoryContext,
    LangLoader, LoadResult, SlotDef, SokolConfig, SystemTypes,
};
pub use platform::{ContentPlatform, LangTable};
