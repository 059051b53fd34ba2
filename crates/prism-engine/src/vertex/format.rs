/// Per-attribute component format.
///
/// All formats are 32-bit floats; the variant encodes the component count
/// (scalar through vec4). This mirrors how shaders declare their inputs.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttributeFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl AttributeFormat {
    /// Number of components (1..=4).
    #[inline]
    pub const fn components(self) -> u32 {
        match self {
            AttributeFormat::Float32 => 1,
            AttributeFormat::Float32x2 => 2,
            AttributeFormat::Float32x3 => 3,
            AttributeFormat::Float32x4 => 4,
        }
    }

    /// Size of one attribute of this format, in bytes.
    #[inline]
    pub const fn size(self) -> u32 {
        self.components() * 4
    }
}

/// One attribute of an interleaved vertex.
///
/// `slot` is the shader input location the attribute binds to
/// (`layout(location = N)` in GLSL, `@location(N)` in WGSL).
/// `offset` is the byte position of the attribute within one vertex.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub slot: u32,
    pub format: AttributeFormat,
    pub offset: u32,
}

impl VertexAttribute {
    /// Byte range occupied by this attribute within one vertex.
    #[inline]
    pub(crate) fn byte_range(&self) -> std::ops::Range<u32> {
        self.offset..self.offset + self.format.size()
    }
}
