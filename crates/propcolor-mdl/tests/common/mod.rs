//! Synthetic studio model files for integration tests.

#![allow(dead_code)]

pub const HEADER_SIZE: usize = 408;
pub const TEXTURE_SIZE: usize = 64;

pub const VERSION: usize = 4;
pub const NAME: usize = 12;
pub const LENGTH: usize = 76;
pub const NUM_TEXTURES: usize = 204;
pub const TEXTURE_INDEX: usize = 208;
pub const NUM_CD_TEXTURES: usize = 212;
pub const CD_TEXTURE_INDEX: usize = 216;
pub const NUM_SKIN_REF: usize = 220;
pub const NUM_SKIN_FAMILIES: usize = 224;
pub const SKIN_INDEX: usize = 228;
pub const SURFACE_PROP_INDEX: usize = 308;
pub const KEY_VALUE_INDEX: usize = 312;
pub const KEY_VALUE_SIZE: usize = 316;

/// Header fields a rebuild is allowed to rewrite.
pub const PATCHED_FIELDS: [usize; 11] = [
    LENGTH,
    NUM_TEXTURES,
    TEXTURE_INDEX,
    NUM_CD_TEXTURES,
    CD_TEXTURE_INDEX,
    NUM_SKIN_REF,
    NUM_SKIN_FAMILIES,
    SKIN_INDEX,
    SURFACE_PROP_INDEX,
    KEY_VALUE_INDEX,
    KEY_VALUE_SIZE,
];

/// Flags written into every texture record by the builder.
pub const TEXTURE_FLAGS: i32 = 0x40;

/// Bytes standing in for bone and mesh data the tools never decode.
pub const OPAQUE_BLOCK: [u8; 24] = [0xAB; 24];

pub fn read_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

pub fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes(data[offset..offset + 2].try_into().unwrap())
}

pub fn read_cstr(data: &[u8], offset: usize) -> String {
    let end = data[offset..].iter().position(|&b| b == 0).unwrap();
    String::from_utf8(data[offset..offset + end].to_vec()).unwrap()
}

fn write_i32(data: &mut [u8], offset: usize, value: i32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Builds a minimal but well-formed studio model.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    magic: [u8; 4],
    textures: Vec<String>,
    dirs: Vec<String>,
    num_skin_ref: i32,
    families: Vec<Vec<i16>>,
    surface_prop: Option<String>,
    key_values: Option<Vec<u8>>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self {
            magic: *b"IDST",
            textures: Vec::new(),
            dirs: Vec::new(),
            num_skin_ref: 0,
            families: Vec::new(),
            surface_prop: None,
            key_values: None,
        }
    }

    pub fn magic(mut self, magic: &[u8; 4]) -> Self {
        self.magic = *magic;
        self
    }

    pub fn texture(mut self, name: &str) -> Self {
        self.textures.push(name.to_string());
        self
    }

    pub fn dir(mut self, dir: &str) -> Self {
        self.dirs.push(dir.to_string());
        self
    }

    pub fn num_skin_ref(mut self, num_skin_ref: i32) -> Self {
        self.num_skin_ref = num_skin_ref;
        self
    }

    pub fn family(mut self, family: &[i16]) -> Self {
        self.families.push(family.to_vec());
        self
    }

    pub fn surface_prop(mut self, surface_prop: &str) -> Self {
        self.surface_prop = Some(surface_prop.to_string());
        self
    }

    pub fn key_values(mut self, key_values: &[u8]) -> Self {
        self.key_values = Some(key_values.to_vec());
        self
    }

    /// Layout: header, opaque block, texture records, texture names,
    /// directory table, directory names, skin table, surface property,
    /// key values, opaque block.
    pub fn build(&self) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE];
        data[..4].copy_from_slice(&self.magic);
        write_i32(&mut data, VERSION, 48);
        data[NAME..NAME + 10].copy_from_slice(b"crate01.md");

        data.extend_from_slice(&OPAQUE_BLOCK);

        if !self.textures.is_empty() {
            let texture_index = data.len();
            let names_start = texture_index + self.textures.len() * TEXTURE_SIZE;
            let mut name_offset = names_start;

            for (slot, name) in self.textures.iter().enumerate() {
                let record_offset = texture_index + slot * TEXTURE_SIZE;
                let mut record = [0u8; TEXTURE_SIZE];
                record[..4].copy_from_slice(&((name_offset - record_offset) as i32).to_le_bytes());
                record[4..8].copy_from_slice(&TEXTURE_FLAGS.to_le_bytes());
                data.extend_from_slice(&record);
                name_offset += name.len() + 1;
            }

            for name in &self.textures {
                data.extend_from_slice(name.as_bytes());
                data.push(0);
            }

            write_i32(&mut data, NUM_TEXTURES, self.textures.len() as i32);
            write_i32(&mut data, TEXTURE_INDEX, texture_index as i32);
        }

        if !self.dirs.is_empty() {
            let table_offset = data.len();
            let mut dir_offset = table_offset + self.dirs.len() * 4;

            for dir in &self.dirs {
                data.extend_from_slice(&(dir_offset as i32).to_le_bytes());
                dir_offset += dir.len() + 1;
            }
            for dir in &self.dirs {
                data.extend_from_slice(dir.as_bytes());
                data.push(0);
            }

            write_i32(&mut data, NUM_CD_TEXTURES, self.dirs.len() as i32);
            write_i32(&mut data, CD_TEXTURE_INDEX, table_offset as i32);
        }

        write_i32(&mut data, NUM_SKIN_REF, self.num_skin_ref);
        if !self.families.is_empty() {
            let skin_index = data.len();
            for family in &self.families {
                for slot in family {
                    data.extend_from_slice(&slot.to_le_bytes());
                }
            }

            write_i32(&mut data, NUM_SKIN_FAMILIES, self.families.len() as i32);
            write_i32(&mut data, SKIN_INDEX, skin_index as i32);
        }

        if let Some(surface_prop) = &self.surface_prop {
            let offset = data.len();
            data.extend_from_slice(surface_prop.as_bytes());
            data.push(0);
            write_i32(&mut data, SURFACE_PROP_INDEX, offset as i32);
        }

        if let Some(key_values) = &self.key_values {
            let offset = data.len();
            data.extend_from_slice(key_values);
            write_i32(&mut data, KEY_VALUE_INDEX, offset as i32);
            write_i32(&mut data, KEY_VALUE_SIZE, key_values.len() as i32);
        }

        data.extend_from_slice(&OPAQUE_BLOCK);

        let length = data.len() as i32;
        write_i32(&mut data, LENGTH, length);
        data
    }
}

/// Two textures, one two-slot skin family.
pub fn brick_metal() -> ModelBuilder {
    ModelBuilder::new()
        .texture("brick")
        .texture("metal")
        .dir("models/props")
        .num_skin_ref(2)
        .family(&[0, 0])
        .surface_prop("metal")
        .key_values(b"mdlkeyvalues\n{\n prop_data { \"base\" \"Metal.Medium\" }\n}\n")
}
