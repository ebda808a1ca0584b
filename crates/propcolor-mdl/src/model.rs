//! Studio model loading, appending and saving.

use std::fs;
use std::io::Write;
use std::path::Path;

use propcolor_common::BinaryReader;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::layout::{Relayout, TextureTables};
use crate::{Error, Result, StudioHeader, StudioTexture};

/// A loaded studio model.
///
/// Holds the original file bytes, the tables parsed out of them and, once an
/// append has been made, the rebuilt file. The original bytes are never
/// modified; every append produces a new buffer with the extra tables placed
/// after the end of the original data.
///
/// A model can be rebuilt once. To append again, save the result and load it
/// into a new `StudioModel`.
#[derive(Debug, Clone)]
pub struct StudioModel {
    /// The original file contents.
    data: Vec<u8>,
    header: StudioHeader,
    /// Original texture records, indexed by slot.
    textures: Vec<StudioTexture>,
    texture_names: Vec<String>,
    texture_dirs: Vec<String>,
    skin_families: Vec<Vec<i16>>,
    surface_prop: String,
    key_values: Vec<u8>,
    /// The rebuilt file, present after an append.
    rebuilt: Option<Vec<u8>>,
}

impl StudioModel {
    /// Read a model from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;

        debug!(path = %path.display(), size = data.len(), "loading model");
        Self::parse(data)
    }

    /// Parse a model from its raw bytes.
    ///
    /// Fails if the signature is not an accepted studio model tag or the
    /// header is truncated. Tables whose count or offset is not positive
    /// are treated as absent, and strings that point outside the file are
    /// read as empty.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        let mut reader = BinaryReader::new(&data);

        // Check magic before anything else
        if reader.expect_any_magic(&StudioHeader::ACCEPTED_MAGIC).is_err() {
            return Err(Error::InvalidMagic {
                actual: data[..data.len().min(4)].to_vec(),
            });
        }

        if data.len() < StudioHeader::SIZE {
            return Err(Error::TruncatedHeader {
                expected: StudioHeader::SIZE,
                actual: data.len(),
            });
        }

        reader.seek(0);
        let header: StudioHeader = reader.read_struct()?;

        let (textures, texture_names) = parse_textures(&data, &header);
        let texture_dirs = parse_texture_dirs(&data, &header);
        let skin_families = parse_skin_families(&data, &header);

        let surface_prop = if header.surface_prop_index > 0 {
            read_string(&data, header.surface_prop_index as usize)
        } else {
            String::new()
        };

        let key_values = parse_key_values(&data, &header);

        debug!(
            name = %header.name(),
            textures = texture_names.len(),
            dirs = texture_dirs.len(),
            families = skin_families.len(),
            "parsed model"
        );

        Ok(Self {
            data,
            header,
            textures,
            texture_names,
            texture_dirs,
            skin_families,
            surface_prop,
            key_values,
            rebuilt: None,
        })
    }

    /// The header as read from the original file.
    pub fn header(&self) -> &StudioHeader {
        &self.header
    }

    /// Texture names in slot order.
    pub fn texture_names(&self) -> &[String] {
        &self.texture_names
    }

    /// Texture search directories.
    pub fn texture_dirs(&self) -> &[String] {
        &self.texture_dirs
    }

    /// Skin families, each one texture slot per skin reference.
    pub fn skin_families(&self) -> &[Vec<i16>] {
        &self.skin_families
    }

    /// Texture references per skin family, as declared by the header.
    pub fn num_skin_ref(&self) -> usize {
        usize::try_from(self.header.num_skin_ref).unwrap_or(0)
    }

    /// The surface property name, empty if absent.
    pub fn surface_prop(&self) -> &str {
        &self.surface_prop
    }

    /// The raw key-value blob, empty if absent.
    pub fn key_values(&self) -> &[u8] {
        &self.key_values
    }

    /// The original file contents.
    pub fn original_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The rebuilt file, if an append has been made.
    pub fn rebuilt_bytes(&self) -> Option<&[u8]> {
        self.rebuilt.as_deref()
    }

    /// Whether an append has been rebuilt into a new file.
    pub fn is_modified(&self) -> bool {
        self.rebuilt.is_some()
    }

    /// The tables as parsed, as a starting point for [`rebuild`](Self::rebuild).
    pub fn tables(&self) -> TextureTables {
        TextureTables {
            names: self.texture_names.clone(),
            dirs: self.texture_dirs.clone(),
            families: self.skin_families.clone(),
        }
    }

    /// Append one material without touching the skin families.
    pub fn add_material(&mut self, material_path: &str) -> Result<()> {
        self.ensure_not_rebuilt()?;

        let mut tables = self.tables();
        tables.push_material(material_path);

        self.rebuild(tables)
    }

    /// Append one material plus a skin family that uses it for every slot.
    pub fn add_material_with_skin(&mut self, material_path: &str) -> Result<()> {
        self.ensure_not_rebuilt()?;

        let mut tables = self.tables();
        let slot = tables.push_material(material_path);
        tables.push_solid_skin(slot, self.num_skin_ref())?;

        self.rebuild(tables)
    }

    /// Append several materials, each with its own solid skin family.
    ///
    /// The skin family appended for `material_paths[i]` references slot
    /// `texture_names().len() + i`.
    pub fn add_materials_with_skins<S: AsRef<str>>(&mut self, material_paths: &[S]) -> Result<()> {
        self.ensure_not_rebuilt()?;

        let mut tables = self.tables();
        let first_slot = tables.names.len();

        for path in material_paths {
            tables.push_material(path.as_ref());
        }

        for i in 0..material_paths.len() {
            tables.push_solid_skin(first_slot + i, self.num_skin_ref())?;
        }

        self.rebuild(tables)
    }

    /// Rebuild the file with the given tables.
    ///
    /// The append helpers go through here. Callers supplying their own
    /// tables must keep existing entries in place and every skin family the
    /// same length; unequal families are rejected.
    pub fn rebuild(&mut self, tables: TextureTables) -> Result<()> {
        self.ensure_not_rebuilt()?;

        let rebuilt = Relayout {
            original: &self.data,
            header: &self.header,
            textures: &self.textures,
            tables: &tables,
            surface_prop: &self.surface_prop,
            key_values: &self.key_values,
        }
        .build()?;

        debug!(
            original_size = self.data.len(),
            rebuilt_size = rebuilt.len(),
            "rebuilt model"
        );

        self.rebuilt = Some(rebuilt);
        Ok(())
    }

    /// Write the rebuilt file to `path`.
    ///
    /// Fails with [`Error::NoChanges`] if nothing was appended. The data is
    /// written to a uniquely named temporary file in the destination
    /// directory and persisted over `path`, so an existing file is either
    /// fully replaced or left as it was.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let Some(rebuilt) = &self.rebuilt else {
            return Err(Error::NoChanges);
        };

        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Dropping an unpersisted NamedTempFile removes it
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(rebuilt)?;
        temp.persist(path).map_err(|e| e.error)?;

        info!(path = %path.display(), size = rebuilt.len(), "saved model");
        Ok(())
    }

    fn ensure_not_rebuilt(&self) -> Result<()> {
        if self.rebuilt.is_some() {
            return Err(Error::AlreadyRebuilt);
        }
        Ok(())
    }
}

/// Read a null-terminated string at an absolute offset, or an empty string
/// if it does not lie within the file.
fn read_string(data: &[u8], offset: usize) -> String {
    match BinaryReader::new_at(data, offset).read_cstring_lossy() {
        Ok(s) => s.into_owned(),
        Err(e) => {
            warn!(offset, error = %e, "string read out of range");
            String::new()
        }
    }
}

/// Convert a header count/offset pair to `usize`, or `None` if the table
/// is absent.
fn table(count: i32, offset: i32) -> Option<(usize, usize)> {
    if count > 0 && offset > 0 {
        Some((count as usize, offset as usize))
    } else {
        None
    }
}

/// Number of whole `entry_size` entries that fit between `base` and the end
/// of the file, capped at `count`.
fn entries_in_range(data: &[u8], base: usize, count: usize, entry_size: usize) -> usize {
    let available = data.len().saturating_sub(base) / entry_size.max(1);
    if available < count {
        warn!(offset = base, count, available, "table runs past end of file");
    }
    count.min(available)
}

fn parse_textures(data: &[u8], header: &StudioHeader) -> (Vec<StudioTexture>, Vec<String>) {
    let Some((count, base)) = table(header.num_textures, header.texture_index) else {
        return (Vec::new(), Vec::new());
    };
    let count = entries_in_range(data, base, count, StudioTexture::SIZE);

    let mut reader = BinaryReader::new_at(data, base);
    let mut textures = Vec::with_capacity(count);
    let mut names = Vec::with_capacity(count);

    for slot in 0..count {
        let record_offset = reader.position();
        let texture: StudioTexture = match reader.read_struct() {
            Ok(texture) => texture,
            Err(_) => break,
        };

        let name = match texture.name_offset(record_offset) {
            Some(offset) => read_string(data, offset),
            None => {
                warn!(slot, "texture name offset out of range");
                String::new()
            }
        };

        textures.push(texture);
        names.push(name);
    }

    (textures, names)
}

fn parse_texture_dirs(data: &[u8], header: &StudioHeader) -> Vec<String> {
    let Some((count, base)) = table(header.num_cd_textures, header.cd_texture_index) else {
        return Vec::new();
    };
    let count = entries_in_range(data, base, count, 4);

    let mut reader = BinaryReader::new_at(data, base);
    let mut dirs = Vec::with_capacity(count);

    for index in 0..count {
        let Ok(offset) = reader.read_i32() else {
            break;
        };

        if offset >= 0 {
            dirs.push(read_string(data, offset as usize));
        } else {
            warn!(index, offset, "negative texture directory offset");
            dirs.push(String::new());
        }
    }

    dirs
}

fn parse_skin_families(data: &[u8], header: &StudioHeader) -> Vec<Vec<i16>> {
    let Some((count, base)) = table(header.num_skin_families, header.skin_index) else {
        return Vec::new();
    };
    let num_skin_ref = usize::try_from(header.num_skin_ref).unwrap_or(0);
    if num_skin_ref == 0 {
        warn!(families = count, "skin families declared without skin references");
        return Vec::new();
    }
    let count = entries_in_range(data, base, count, num_skin_ref * 2);

    let mut reader = BinaryReader::new_at(data, base);
    let mut families = Vec::with_capacity(count);

    for _ in 0..count {
        let family = (0..num_skin_ref)
            .map(|_| reader.read_i16())
            .collect::<std::result::Result<Vec<_>, _>>();

        match family {
            Ok(family) => families.push(family),
            Err(_) => break,
        }
    }

    families
}

fn parse_key_values(data: &[u8], header: &StudioHeader) -> Vec<u8> {
    let Some((size, offset)) = table(header.key_value_size, header.key_value_index) else {
        return Vec::new();
    };

    let mut reader = BinaryReader::new_at(data, offset);
    match reader.read_bytes(size) {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            warn!(offset, size, error = %e, "key values out of range");
            reader.remaining_bytes().to_vec()
        }
    }
}
