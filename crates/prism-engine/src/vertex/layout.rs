use thiserror::Error;

use super::{AttributeFormat, VertexAttribute};

/// Errors produced while validating an attribute layout.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum LayoutError {
    /// The layout describes no bytes at all.
    #[error("vertex layout has no attributes")]
    Empty,

    /// Explicit stride of zero; vertex counting would divide by zero.
    #[error("vertex layout stride is zero")]
    ZeroStride,

    /// An attribute extends past the end of the vertex.
    #[error("attribute at slot {slot} ends past the vertex stride")]
    OutOfBounds { slot: u32 },

    /// Two attributes occupy overlapping byte ranges.
    #[error("attributes at slots {slot} and {other} overlap")]
    Overlap { slot: u32, other: u32 },

    /// Two attributes bind the same shader slot.
    #[error("shader slot {slot} is bound by more than one attribute")]
    DuplicateSlot { slot: u32 },
}

/// Interleaved vertex layout: ordered attributes + stride.
///
/// Invariants (validated at construction):
/// - `offset + size(format) <= stride` for every attribute
/// - attribute byte ranges do not overlap
/// - shader slots are unique
///
/// Packed layouts ([`VertexLayout::packed`]) additionally guarantee that the
/// stride equals the sum of attribute sizes, with offsets assigned in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: u32,
}

impl VertexLayout {
    /// Builds a packed layout from `(slot, format)` pairs in declaration
    /// order. Offsets and stride are computed automatically.
    pub fn packed(attributes: &[(u32, AttributeFormat)]) -> Result<Self, LayoutError> {
        if attributes.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut offset = 0;
        let mut out = Vec::with_capacity(attributes.len());
        for &(slot, format) in attributes {
            out.push(VertexAttribute { slot, format, offset });
            offset += format.size();
        }

        Self::with_attributes(&out, offset)
    }

    /// Builds a layout from explicit attributes and stride, for manual
    /// control over offsets (e.g. deliberate padding between attributes).
    pub fn with_attributes(
        attributes: &[VertexAttribute],
        stride: u32,
    ) -> Result<Self, LayoutError> {
        if attributes.is_empty() {
            return Err(LayoutError::Empty);
        }
        if stride == 0 {
            return Err(LayoutError::ZeroStride);
        }

        for (i, attr) in attributes.iter().enumerate() {
            if attr.byte_range().end > stride {
                return Err(LayoutError::OutOfBounds { slot: attr.slot });
            }

            for prior in &attributes[..i] {
                if prior.slot == attr.slot {
                    return Err(LayoutError::DuplicateSlot { slot: attr.slot });
                }

                let a = attr.byte_range();
                let b = prior.byte_range();
                if a.start < b.end && b.start < a.end {
                    return Err(LayoutError::Overlap {
                        slot: attr.slot,
                        other: prior.slot,
                    });
                }
            }
        }

        Ok(Self {
            attributes: attributes.to_vec(),
            stride,
        })
    }

    /// Byte distance between consecutive vertices.
    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Attributes in declaration order.
    #[inline]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Derives the vertex count for a buffer of `byte_len` bytes.
    ///
    /// A length that is not a stride multiple is truncated (a trailing
    /// partial vertex is never drawn) and reported once per call at warn
    /// level.
    pub fn vertex_count(&self, byte_len: usize) -> u32 {
        let stride = self.stride as usize;
        if byte_len % stride != 0 {
            log::warn!(
                "vertex buffer length {byte_len} is not a multiple of stride {stride}; \
                 truncating to {} whole vertices",
                byte_len / stride
            );
        }
        (byte_len / stride) as u32
    }
}
