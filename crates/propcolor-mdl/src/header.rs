//! Studio model header structure.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Studio model file header (`studiohdr_t`).
///
/// Sits at offset 0 of every `.mdl` file. Most fields describe geometry and
/// animation tables that this crate carries through untouched; only the
/// texture, texture directory, skin, surface property and key-value fields
/// are read and rewritten.
///
/// Index fields are absolute file offsets unless noted otherwise.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct StudioHeader {
    /// Signature, `IDST` on disk.
    pub id: [u8; 4],
    /// Format version (44-49 for shipped Source games).
    pub version: i32,
    /// Checksum shared with the `.vvd`/`.vtx` companions.
    pub checksum: i32,
    /// Internal model name, null padded.
    pub name: [u8; 64],
    /// Total file length in bytes.
    pub length: i32,
    pub eye_position: [f32; 3],
    pub illum_position: [f32; 3],
    pub hull_min: [f32; 3],
    pub hull_max: [f32; 3],
    pub view_bbmin: [f32; 3],
    pub view_bbmax: [f32; 3],
    pub flags: i32,
    pub num_bones: i32,
    pub bone_index: i32,
    pub num_bone_controllers: i32,
    pub bone_controller_index: i32,
    pub num_hitbox_sets: i32,
    pub hitbox_set_index: i32,
    pub num_local_anim: i32,
    pub local_anim_index: i32,
    pub num_local_seq: i32,
    pub local_seq_index: i32,
    pub activity_list_version: i32,
    pub events_indexed: i32,
    /// Number of texture descriptor records.
    pub num_textures: i32,
    /// Offset of the first texture descriptor.
    pub texture_index: i32,
    /// Number of texture search directories.
    pub num_cd_textures: i32,
    /// Offset of the directory string-offset table.
    pub cd_texture_index: i32,
    /// Texture references per skin family.
    pub num_skin_ref: i32,
    /// Number of skin families.
    pub num_skin_families: i32,
    /// Offset of the flat `i16` skin table.
    pub skin_index: i32,
    pub num_body_parts: i32,
    pub body_part_index: i32,
    pub num_local_attachments: i32,
    pub local_attachment_index: i32,
    pub num_local_nodes: i32,
    pub local_node_index: i32,
    pub local_node_name_index: i32,
    pub num_flex_desc: i32,
    pub flex_desc_index: i32,
    pub num_flex_controllers: i32,
    pub flex_controller_index: i32,
    pub num_flex_rules: i32,
    pub flex_rule_index: i32,
    pub num_ik_chains: i32,
    pub ik_chain_index: i32,
    pub num_mouths: i32,
    pub mouth_index: i32,
    pub num_local_pose_parameters: i32,
    pub local_pose_param_index: i32,
    /// Offset of the surface property string.
    pub surface_prop_index: i32,
    /// Offset of the key-value text blob.
    pub key_value_index: i32,
    /// Length of the key-value blob, excluding any terminator.
    pub key_value_size: i32,
    pub num_local_ik_autoplay_locks: i32,
    pub local_ik_autoplay_lock_index: i32,
    pub mass: f32,
    pub contents: i32,
    pub num_include_models: i32,
    pub include_model_index: i32,
    /// Runtime pointer slot, zero on disk.
    pub virtual_model: i32,
    pub anim_block_name_index: i32,
    pub num_anim_blocks: i32,
    pub anim_block_index: i32,
    /// Runtime pointer slot, zero on disk.
    pub anim_block_model: i32,
    pub bone_table_by_name_index: i32,
    pub vertex_base: i32,
    pub index_base: i32,
    pub const_directional_light_dot: u8,
    pub root_lod: u8,
    pub num_allowed_root_lods: u8,
    pub unused1: u8,
    pub unused4: i32,
    pub num_flex_controller_ui: i32,
    pub flex_controller_ui_index: i32,
    pub vert_anim_fixed_point_scale: f32,
    pub unused3: i32,
    /// Offset of the secondary header, zero when absent.
    pub studiohdr2_index: i32,
    pub unused2: i32,
}

const _: () = assert!(std::mem::size_of::<StudioHeader>() == StudioHeader::SIZE);

impl StudioHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 408;

    /// Canonical signature as stored on disk.
    pub const MAGIC: [u8; 4] = *b"IDST";

    /// Byte-swapped signature, accepted for files written by tools that
    /// stored the tag as a big-endian integer.
    pub const MAGIC_SWAPPED: [u8; 4] = *b"TSDI";

    /// All accepted signatures.
    pub const ACCEPTED_MAGIC: [[u8; 4]; 2] = [Self::MAGIC, Self::MAGIC_SWAPPED];

    /// The internal model name up to its first null byte.
    pub fn name(&self) -> String {
        let name = self.name;
        let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
        String::from_utf8_lossy(&name[..end]).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::FromZeros;

    #[test]
    fn test_field_offsets() {
        let mut header = StudioHeader::new_zeroed();
        header.length = 0x11;
        header.num_textures = 0x22;
        header.num_skin_ref = 0x33;
        header.surface_prop_index = 0x44;
        header.key_value_size = 0x55;

        let bytes = header.as_bytes();
        assert_eq!(bytes.len(), StudioHeader::SIZE);
        assert_eq!(bytes[76], 0x11);
        assert_eq!(bytes[204], 0x22);
        assert_eq!(bytes[220], 0x33);
        assert_eq!(bytes[308], 0x44);
        assert_eq!(bytes[316], 0x55);
    }

    #[test]
    fn test_name() {
        let mut header = StudioHeader::new_zeroed();
        header.name[..16].copy_from_slice(b"props/crate.mdl\0");

        assert_eq!(header.name(), "props/crate.mdl");
    }
}
