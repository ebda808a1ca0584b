//! Studio model (`.mdl`) parser and material appender.
//!
//! Studio models reference their materials through three tables: texture
//! descriptors naming each material, texture search directories, and skin
//! families mapping each texture reference to a slot. This crate loads a
//! model, appends new materials and skin families, and writes a new file
//! without disturbing any of the original data.
//!
//! # File Format
//!
//! All integers are little-endian and structures are packed:
//! - 408 bytes: [`StudioHeader`], starting with the `IDST` signature
//! - Texture descriptors: 64 bytes each, name offsets relative to the record
//! - Texture directory table: absolute `i32` offsets to directory strings
//! - Skin table: `numskinfamilies * numskinref` `i16` slot indices
//! - Surface property: a null-terminated string
//! - Key values: a length-delimited text blob
//!
//! # Rebuilding
//!
//! Appends never edit tables in place. The original file is copied verbatim
//! and fresh copies of the texture, directory, skin and string tables are
//! laid out after its end, with the header re-pointed at them.
//!
//! # Example
//!
//! ```no_run
//! use propcolor_mdl::StudioModel;
//!
//! let mut model = StudioModel::load("crate01.mdl")?;
//! println!("Textures: {:?}", model.texture_names());
//!
//! // One new skin per color variant
//! model.add_materials_with_skins(&["props/colored/crate01_red", "props/colored/crate01_blue"])?;
//! model.save("crate01_colored.mdl")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod header;
mod layout;
mod model;
mod summary;
mod texture;

pub use error::{Error, Result};
pub use header::StudioHeader;
pub use layout::{directory_of, Layout, TextureTables};
pub use model::StudioModel;
pub use summary::ModelSummary;
pub use texture::StudioTexture;
