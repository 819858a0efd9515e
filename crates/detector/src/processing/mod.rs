pub mod post;
pub mod pre;

/// Parameters of the letterbox applied to the original image; inverting them
/// maps network-input pixels back to original pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxTransform {
    pub orig_width: u32,
    pub orig_height: u32,
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl LetterboxTransform {
    /// Map a network-input x coordinate back onto the original image, clamped.
    #[inline]
    pub fn invert_x(&self, x: f32) -> f32 {
        ((x - self.offset_x) / self.scale)
            .max(0.0)
            .min(self.orig_width as f32)
    }

    #[inline]
    pub fn invert_y(&self, y: f32) -> f32 {
        ((y - self.offset_y) / self.scale)
            .max(0.0)
            .min(self.orig_height as f32)
    }
}
