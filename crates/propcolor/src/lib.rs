//! PropColor - studio model material and skin appending library.
//!
//! This crate provides a unified interface to the PropColor crates for
//! recoloring props: each color becomes a new material and a skin family
//! that selects it.
//!
//! # Crates
//!
//! - [`propcolor_common`] - Common utilities (bounds-checked binary reading)
//! - [`propcolor_mdl`] - Studio model (`.mdl`) parsing and rebuilding
//!
//! # Example
//!
//! ```no_run
//! use propcolor::prelude::*;
//!
//! let mut model = StudioModel::load("models/props/crate01.mdl")?;
//! let skin = model.skin_families().len();
//!
//! model.add_material_with_skin("models/props/colored/crate01_255_0_0")?;
//! model.save("models/props/colored/crate01.mdl")?;
//! println!("Red crate is skin {}", skin);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use propcolor_common as common;
pub use propcolor_mdl as mdl;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use propcolor_common::BinaryReader;
    pub use propcolor_mdl::{
        directory_of, ModelSummary, StudioHeader, StudioModel, StudioTexture, TextureTables,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
