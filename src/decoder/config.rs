/// Enhancement applied to each candidate crop before it reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    /// Sigma of the unsharp-mask blur
    pub unsharp_sigma: f32,
    /// Unsharp weight: `(1 + amount) * crop - amount * blur`
    pub unsharp_amount: f32,
    /// Pixels at or above this are "bright" in the contrast retry
    pub contrast_midpoint: u8,
    /// Added to bright pixels in the contrast retry
    pub bright_offset: u8,
    /// Subtracted from dark pixels in the contrast retry
    pub dark_offset: u8,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            unsharp_sigma: 10.0,
            unsharp_amount: 0.5,
            contrast_midpoint: 0x80,
            bright_offset: 0x10,
            dark_offset: 0x5a,
        }
    }
}
