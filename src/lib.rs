// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. image::ImageError)
    clippy::module_name_repetitions
)]

//! # Livemark
//!
//! The decision engine behind a live-preview markdown editor.
//!
//! Livemark decides, for every markdown element, whether the host editor
//! should show its raw syntax or a rendered replacement:
//! - Syntax markers revealed only where the cursor is
//! - Inline and block math, typeset through a memoising cache
//! - Editable tables, with a per-table source-mode toggle
//! - Images loaded in the background
//! - Links and `[[wiki]]` links
//! - Highlighted fenced code blocks with click mapping
//!
//! ## Architecture
//!
//! Livemark uses The Elm Architecture (TEA) pattern:
//! - **Session**: document, selection and interaction state
//! - **Message**: edits, pointer events and toggles
//! - **Update**: classify the operation, rebuild what it invalidated
//! - **View**: sorted overlay instructions for the host to draw
//!
//! ## Modules
//!
//! - [`session`]: Host-facing state and update loop
//! - [`document`]: Text storage and the typed parse tree
//! - [`preview`]: Overlay builders, one per element family
//! - [`visibility`]: Source-versus-rendered policy
//! - [`interaction`]: Drag and live-preview state
//! - [`classify`]: When an operation invalidates an overlay set
//! - [`changes`]: Edit operations and position mapping
//! - [`view`]: Embedded views and their HTML
//! - [`table`]: Pipe-table parsing and serialization
//! - [`render`]: Math typesetting and its cache
//! - [`highlight`]: Syntax highlighting
//! - [`image`]: Image loading

pub mod changes;
pub mod classify;
pub mod config;
pub mod document;
pub mod highlight;
pub mod image;
pub mod interaction;
pub mod overlay;
pub mod perf;
pub mod preview;
pub mod render;
pub mod selection;
pub mod session;
pub mod table;
pub mod view;
pub mod visibility;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::changes::{Change, ChangeSet, EditOperation, Effect};
    pub use crate::document::Document;
    pub use crate::overlay::{Overlay, OverlaySet};
    pub use crate::preview::PreviewOptions;
    pub use crate::selection::{Selection, SelectionRange};
    pub use crate::session::{Message, Session};
    pub use crate::view::View;
}
