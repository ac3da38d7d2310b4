//! Error type shared across the rendering core.

/// Errors reported at the drawing and font call boundaries.
///
/// Saturation conditions (ring eviction on append, viewport truncation)
/// are normal operation and never surface here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DrawError {
    /// Sprite footprint exceeds the framebuffer bounds
    OutOfBounds,
    /// Character code outside the font's glyph range
    InvalidGlyph,
    /// Font with zero-sized glyph dimensions
    InvalidDimensions,
}
