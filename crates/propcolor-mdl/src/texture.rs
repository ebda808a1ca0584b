//! Texture descriptor record.

use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

/// One texture slot (`mstudiotexture_t`).
///
/// The name offset is relative to the start of the record itself, unlike the
/// absolute offsets used by the rest of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct StudioTexture {
    /// Name offset, relative to this record.
    pub name_index: i32,
    pub flags: i32,
    pub used: i32,
    pub unused1: i32,
    /// Runtime material pointer, zero on disk.
    pub material: i32,
    /// Runtime material pointer, zero on disk.
    pub client_material: i32,
    pub unused: [i32; 10],
}

const _: () = assert!(std::mem::size_of::<StudioTexture>() == StudioTexture::SIZE);

impl StudioTexture {
    /// Size of one record in bytes.
    pub const SIZE: usize = 64;

    /// A zeroed record marked as used, for newly appended slots.
    pub fn appended() -> Self {
        let mut texture = Self::new_zeroed();
        texture.used = 1;
        texture
    }

    /// Absolute offset of this record's name, given the record's own offset.
    pub fn name_offset(&self, record_offset: usize) -> Option<usize> {
        let relative = self.name_index as i64;
        usize::try_from(record_offset as i64 + relative).ok()
    }
}
