#![forbid(unsafe_code)]

//! `folio-core` implements the interactive behaviors of the folio portfolio
//! site independently of any browser binding.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes DOM events,
//!   viewport sizes and visibility changes as [`PageEvent`]s.
//! - **Deterministic time**: the host reports monotonic time explicitly and
//!   wakes the runtime at [`Site::next_deadline`].
//! - **One seam to the document**: every read and mutation goes through the
//!   [`Page`] trait, implemented over `web-sys` by `folio-web` and in memory
//!   by [`MemoryPage`].
//!
//! This crate intentionally does not bind to `wasm-bindgen`; `folio-web`
//! wraps it for the browser.

pub mod config;
pub mod copy;
pub mod effects;
pub mod host;
pub mod links;
pub mod memory;
pub mod nav;
pub mod page;
pub mod reveal;
pub mod scroll;
pub mod site;
pub mod timer;
pub mod viewport;

pub use config::{ConfigError, SiteConfig};
pub use copy::ClipboardError;
pub use host::{Dispatch, HostRequest, IntersectionEntry, ObserverGroup, PageEvent};
pub use memory::MemoryPage;
pub use nav::MenuState;
pub use page::{ElementId, Page, Rect};
pub use scroll::ScrollMetrics;
pub use site::Site;
pub use viewport::ViewportMode;
