//! Relayout of the appended texture, skin and string tables.
//!
//! A rebuild never moves existing data. The original file is copied as-is and
//! a fresh copy of every table the header points at is appended after it:
//!
//! ```text
//! | original bytes | texture records | texture names | dir offsets | dir names |
//! | skin table | surface property | key values |
//! ```
//!
//! All offsets are planned before anything is written, because records near
//! the front of the region point at strings near the back.

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::debug;
use zerocopy::IntoBytes;

use crate::{Error, Result, StudioHeader, StudioTexture};

/// The ordered contents of the tables a rebuild writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureTables {
    /// Texture names in slot order.
    pub names: Vec<String>,
    /// Texture search directories.
    pub dirs: Vec<String>,
    /// Skin families, each one texture slot per skin reference.
    pub families: Vec<Vec<i16>>,
}

impl TextureTables {
    /// Append a material and register its directory if it is new.
    ///
    /// Returns the texture slot the material was given.
    pub fn push_material(&mut self, material_path: &str) -> usize {
        self.names.push(material_path.to_string());

        if let Some(dir) = directory_of(material_path) {
            if !self.dirs.iter().any(|existing| existing == dir) {
                self.dirs.push(dir.to_string());
            }
        }

        self.names.len() - 1
    }

    /// Append a skin family whose every reference resolves to `slot`.
    ///
    /// The combined skin table must stay addressable with 32-bit offsets;
    /// a larger `num_skin_ref` fails with [`Error::LayoutOverflow`] before
    /// anything is allocated.
    pub fn push_solid_skin(&mut self, slot: usize, num_skin_ref: usize) -> Result<()> {
        let index = i16::try_from(slot).map_err(|_| Error::SlotIndexOverflow(slot))?;

        let table_size = self
            .families
            .iter()
            .map(Vec::len)
            .sum::<usize>()
            .saturating_add(num_skin_ref)
            .saturating_mul(2);
        if i32::try_from(table_size).is_err() {
            return Err(Error::LayoutOverflow(table_size));
        }

        self.families.push(vec![index; num_skin_ref]);
        Ok(())
    }

    /// Length shared by every skin family, or an error naming the first
    /// family that differs. `None` when there are no families.
    pub fn skin_ref_count(&self) -> Result<Option<usize>> {
        let Some(expected) = self.families.first().map(Vec::len) else {
            return Ok(None);
        };

        for (family, entries) in self.families.iter().enumerate() {
            if entries.len() != expected {
                return Err(Error::InconsistentSkinFamilyLength {
                    family,
                    expected,
                    actual: entries.len(),
                });
            }
        }

        Ok(Some(expected))
    }
}

/// The directory component of a material path.
///
/// Everything before the last `/` or `\`; `None` when the path has no
/// separator.
///
/// ```
/// use propcolor_mdl::directory_of;
///
/// assert_eq!(directory_of("props/colored/crate_red"), Some("props/colored"));
/// assert_eq!(directory_of("models\\props\\crate"), Some("models\\props"));
/// assert_eq!(directory_of("crate"), None);
/// ```
pub fn directory_of(material_path: &str) -> Option<&str> {
    material_path
        .rfind(['/', '\\'])
        .map(|pos| &material_path[..pos])
}

/// Absolute offsets of every appended region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub texture_offset: usize,
    pub texture_name_offset: usize,
    pub dir_table_offset: usize,
    pub dir_name_offset: usize,
    pub skin_offset: usize,
    pub surface_prop_offset: usize,
    pub key_value_offset: usize,
    pub total_size: usize,
}

impl Layout {
    /// Plan the appended region starting at `start`.
    pub fn plan(start: usize, tables: &TextureTables, surface_prop: &str, key_values: &[u8]) -> Self {
        let texture_offset = start;
        let texture_name_offset = texture_offset + tables.names.len() * StudioTexture::SIZE;
        let dir_table_offset = texture_name_offset + strings_size(&tables.names);
        let dir_name_offset = dir_table_offset + tables.dirs.len() * 4;
        let skin_offset = dir_name_offset + strings_size(&tables.dirs);

        let skin_entries: usize = tables.families.iter().map(Vec::len).sum();
        let surface_prop_offset = skin_offset + skin_entries * 2;
        let key_value_offset = surface_prop_offset + surface_prop.len() + 1;
        let total_size = key_value_offset + key_values.len() + 1;

        Self {
            texture_offset,
            texture_name_offset,
            dir_table_offset,
            dir_name_offset,
            skin_offset,
            surface_prop_offset,
            key_value_offset,
            total_size,
        }
    }
}

/// Size of a run of null-terminated strings.
fn strings_size(strings: &[String]) -> usize {
    strings.iter().map(|s| s.len() + 1).sum()
}

/// Convert a planned offset to the on-disk `i32`.
fn offset(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::LayoutOverflow(value))
}

/// Everything a rebuild reads.
#[derive(Debug)]
pub(crate) struct Relayout<'a> {
    /// The original file, copied verbatim to the front of the output.
    pub original: &'a [u8],
    pub header: &'a StudioHeader,
    /// Records of the original texture slots, carried over by slot.
    pub textures: &'a [StudioTexture],
    pub tables: &'a TextureTables,
    pub surface_prop: &'a str,
    pub key_values: &'a [u8],
}

impl Relayout<'_> {
    /// Produce the rebuilt file.
    pub fn build(&self) -> Result<Vec<u8>> {
        let num_skin_ref = self.tables.skin_ref_count()?;
        let layout = Layout::plan(
            self.original.len(),
            self.tables,
            self.surface_prop,
            self.key_values,
        );
        offset(layout.total_size)?;

        debug!(
            original_size = self.original.len(),
            total_size = layout.total_size,
            textures = self.tables.names.len(),
            dirs = self.tables.dirs.len(),
            families = self.tables.families.len(),
            "planned model relayout"
        );

        let mut output = Vec::with_capacity(layout.total_size);
        output.extend_from_slice(self.original);

        // Texture records
        let mut name_offset = layout.texture_name_offset;
        for (slot, name) in self.tables.names.iter().enumerate() {
            let record_offset = layout.texture_offset + slot * StudioTexture::SIZE;
            let mut texture = self
                .textures
                .get(slot)
                .copied()
                .unwrap_or_else(StudioTexture::appended);
            texture.name_index = offset(name_offset)? - offset(record_offset)?;

            output.extend_from_slice(texture.as_bytes());
            name_offset += name.len() + 1;
        }

        // Texture names
        debug_assert_eq!(output.len(), layout.texture_name_offset);
        write_strings(&mut output, &self.tables.names);

        // Directory offsets
        debug_assert_eq!(output.len(), layout.dir_table_offset);
        let mut dir_offset = layout.dir_name_offset;
        for dir in &self.tables.dirs {
            output.write_i32::<LittleEndian>(offset(dir_offset)?)?;
            dir_offset += dir.len() + 1;
        }

        // Directory names
        debug_assert_eq!(output.len(), layout.dir_name_offset);
        write_strings(&mut output, &self.tables.dirs);

        // Skin table, family-major
        debug_assert_eq!(output.len(), layout.skin_offset);
        for family in &self.tables.families {
            for &slot in family {
                output.write_i16::<LittleEndian>(slot)?;
            }
        }

        debug_assert_eq!(output.len(), layout.surface_prop_offset);
        output.extend_from_slice(self.surface_prop.as_bytes());
        output.push(0);

        debug_assert_eq!(output.len(), layout.key_value_offset);
        output.extend_from_slice(self.key_values);
        output.push(0);

        debug_assert_eq!(output.len(), layout.total_size);

        let mut header = *self.header;
        header.length = offset(layout.total_size)?;
        header.num_textures = offset(self.tables.names.len())?;
        header.texture_index = offset(layout.texture_offset)?;
        header.num_cd_textures = offset(self.tables.dirs.len())?;
        header.cd_texture_index = offset(layout.dir_table_offset)?;
        header.skin_index = offset(layout.skin_offset)?;
        header.num_skin_families = offset(self.tables.families.len())?;
        if let Some(num_skin_ref) = num_skin_ref {
            header.num_skin_ref = offset(num_skin_ref)?;
        }
        header.surface_prop_index = offset(layout.surface_prop_offset)?;
        header.key_value_index = offset(layout.key_value_offset)?;
        header.key_value_size = offset(self.key_values.len())?;

        output[..StudioHeader::SIZE].copy_from_slice(header.as_bytes());

        Ok(output)
    }
}

fn write_strings(output: &mut Vec<u8>, strings: &[String]) {
    for s in strings {
        output.extend_from_slice(s.as_bytes());
        output.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> TextureTables {
        TextureTables {
            names: vec!["brick".to_string(), "metal".to_string()],
            dirs: vec!["models/props".to_string()],
            families: vec![vec![0, 1]],
        }
    }

    #[test]
    fn test_push_material_dedups_directory() {
        let mut tables = tables();

        assert_eq!(tables.push_material("models/props/crate_red"), 2);
        assert_eq!(tables.push_material("models/colored/crate_blue"), 3);
        assert_eq!(tables.push_material("flat"), 4);

        assert_eq!(tables.dirs, vec!["models/props", "models/colored"]);
        assert_eq!(tables.names.len(), 5);
    }

    #[test]
    fn test_push_solid_skin() {
        let mut tables = tables();
        tables.push_solid_skin(2, 2).unwrap();

        assert_eq!(tables.families, vec![vec![0, 1], vec![2, 2]]);
        assert!(matches!(
            tables.push_solid_skin(40_000, 2),
            Err(Error::SlotIndexOverflow(40_000))
        ));
    }

    #[test]
    fn test_push_solid_skin_too_large() {
        let mut tables = tables();

        assert!(matches!(
            tables.push_solid_skin(2, 1 << 30),
            Err(Error::LayoutOverflow(_))
        ));
        assert!(matches!(
            tables.push_solid_skin(2, usize::MAX),
            Err(Error::LayoutOverflow(_))
        ));
        assert_eq!(tables.families, vec![vec![0, 1]]);
    }

    #[test]
    fn test_skin_ref_count() {
        let mut tables = tables();
        assert_eq!(tables.skin_ref_count().unwrap(), Some(2));

        tables.families.push(vec![1, 1, 1]);
        assert!(matches!(
            tables.skin_ref_count(),
            Err(Error::InconsistentSkinFamilyLength {
                family: 1,
                expected: 2,
                actual: 3
            })
        ));

        assert_eq!(TextureTables::default().skin_ref_count().unwrap(), None);
    }

    #[test]
    fn test_plan_offsets() {
        let layout = Layout::plan(1000, &tables(), "metal", b"ab");

        assert_eq!(layout.texture_offset, 1000);
        assert_eq!(layout.texture_name_offset, 1000 + 2 * 64);
        // "brick\0metal\0"
        assert_eq!(layout.dir_table_offset, 1128 + 12);
        assert_eq!(layout.dir_name_offset, 1140 + 4);
        // "models/props\0"
        assert_eq!(layout.skin_offset, 1144 + 13);
        assert_eq!(layout.surface_prop_offset, 1157 + 4);
        assert_eq!(layout.key_value_offset, 1161 + 6);
        assert_eq!(layout.total_size, 1167 + 3);
    }

    #[test]
    fn test_directory_of() {
        assert_eq!(directory_of("a/b\\c"), Some("a/b"));
        assert_eq!(directory_of("/root"), Some(""));
        assert_eq!(directory_of(""), None);
    }
}
