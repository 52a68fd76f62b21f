//! Element-kind descriptor and a byte buffer sized by it.
//!
//! Vertex attributes, index lists and similar GPU-bound arrays differ only in
//! their primitive element type. Instead of one container per type, an
//! `ElementBuffer` stores raw bytes and an `ElementKind` says how to read them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AtlasError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ElementKind {
    pub fn byte_size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::F32 | Self::F64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    fn encode(self, value: f64, out: &mut [u8]) {
        // `as` saturates float-to-int casts, which is the clamping we want.
        match self {
            Self::I8 => out.copy_from_slice(bytemuck::bytes_of(&(value as i8))),
            Self::U8 => out.copy_from_slice(bytemuck::bytes_of(&(value as u8))),
            Self::I16 => out.copy_from_slice(bytemuck::bytes_of(&(value as i16))),
            Self::U16 => out.copy_from_slice(bytemuck::bytes_of(&(value as u16))),
            Self::I32 => out.copy_from_slice(bytemuck::bytes_of(&(value as i32))),
            Self::U32 => out.copy_from_slice(bytemuck::bytes_of(&(value as u32))),
            Self::F32 => out.copy_from_slice(bytemuck::bytes_of(&(value as f32))),
            Self::F64 => out.copy_from_slice(bytemuck::bytes_of(&value)),
        }
    }

    fn decode(self, bytes: &[u8]) -> f64 {
        match self {
            Self::I8 => bytemuck::pod_read_unaligned::<i8>(bytes) as f64,
            Self::U8 => bytemuck::pod_read_unaligned::<u8>(bytes) as f64,
            Self::I16 => bytemuck::pod_read_unaligned::<i16>(bytes) as f64,
            Self::U16 => bytemuck::pod_read_unaligned::<u16>(bytes) as f64,
            Self::I32 => bytemuck::pod_read_unaligned::<i32>(bytes) as f64,
            Self::U32 => bytemuck::pod_read_unaligned::<u32>(bytes) as f64,
            Self::F32 => bytemuck::pod_read_unaligned::<f32>(bytes) as f64,
            Self::F64 => bytemuck::pod_read_unaligned::<f64>(bytes),
        }
    }
}

impl FromStr for ElementKind {
    type Err = AtlasError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "i8" | "byte" => Ok(Self::I8),
            "u8" | "ubyte" | "unsigned_byte" => Ok(Self::U8),
            "i16" | "short" => Ok(Self::I16),
            "u16" | "ushort" | "unsigned_short" => Ok(Self::U16),
            "i32" | "int" => Ok(Self::I32),
            "u32" | "uint" | "unsigned_int" => Ok(Self::U32),
            "f32" | "float" => Ok(Self::F32),
            "f64" | "double" => Ok(Self::F64),
            other => Err(AtlasError::InvalidConfig(format!(
                "unknown element kind '{other}'"
            ))),
        }
    }
}

/// Growable array of `kind` elements grouped `components` at a time
/// (e.g. 3 for xyz positions), kept in native byte order.
#[derive(Debug, Clone)]
pub struct ElementBuffer {
    kind: ElementKind,
    components: usize,
    bytes: Vec<u8>,
    dirty: bool,
}

impl ElementBuffer {
    pub fn new(kind: ElementKind, components: usize) -> Self {
        Self {
            kind,
            components: components.max(1),
            bytes: Vec::new(),
            dirty: false,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> usize {
        self.kind.byte_size() * self.components
    }

    /// Number of elements (not vertices).
    pub fn len(&self) -> usize {
        self.bytes.len() / self.kind.byte_size()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.len() / self.components
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Appends `values`, converting each to the element kind. Returns the
    /// number of elements written.
    pub fn push(&mut self, values: &[f64]) -> usize {
        let size = self.kind.byte_size();
        let start = self.bytes.len();
        self.bytes.resize(start + values.len() * size, 0);
        for (chunk, &v) in self.bytes[start..].chunks_exact_mut(size).zip(values) {
            self.kind.encode(v, chunk);
        }
        self.dirty = true;
        values.len()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        let size = self.kind.byte_size();
        let start = index.checked_mul(size)?;
        self.bytes
            .get(start..start + size)
            .map(|b| self.kind.decode(b))
    }

    /// Adds `value` to every element from `start` on (used to rebase index
    /// lists when meshes are concatenated).
    pub fn increment(&mut self, start: usize, value: f64) {
        let size = self.kind.byte_size();
        let from = start.saturating_mul(size).min(self.bytes.len());
        let kind = self.kind;
        for chunk in self.bytes[from..].chunks_exact_mut(size) {
            let v = kind.decode(chunk) + value;
            kind.encode(v, chunk);
        }
        self.dirty = true;
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.dirty = true;
    }

    /// True when the contents changed since the last `mark_clean`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
