//! Per-sprite alpha masks and pixel-exact collision
//!
//! Bounding boxes give candidate pairs; the mask test confirms that two
//! visually non-transparent regions actually touch. Masks are built once
//! from the texture provider's pixel buffer and never mutate afterwards.

use serde::{Deserialize, Serialize};

use crate::Aabb;

/// Per-pixel opacity samples for one sprite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelMask {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl PixelMask {
    /// Build a mask from a texture's alpha channel, row-major.
    pub fn from_alpha(width: u32, height: u32, alpha: Vec<u8>) -> Self {
        debug_assert_eq!(alpha.len(), (width * height) as usize);
        Self {
            width,
            height,
            alpha,
        }
    }

    /// Fully opaque mask (alpha = 255 everywhere).
    pub fn opaque(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![255; (width * height) as usize],
        }
    }

    /// Fully transparent mask.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            alpha: vec![0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Alpha at a sprite-local offset; out-of-range offsets read as
    /// transparent (a resized paddle can outgrow its mask).
    #[inline]
    pub fn alpha_at(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return 0;
        }
        self.alpha[(y as u32 * self.width + x as u32) as usize]
    }
}

/// Pixel-exact overlap test between two sprites.
///
/// Walks every pixel of the boxes' intersection rectangle and reports a hit
/// as soon as both masks are non-transparent at the same point.
pub fn pixels_intersect(rect_a: &Aabb, mask_a: &PixelMask, rect_b: &Aabb, mask_b: &PixelMask) -> bool {
    let top = rect_a.top().max(rect_b.top()) as i32;
    let bottom = rect_a.bottom().min(rect_b.bottom()) as i32;
    let left = rect_a.left().max(rect_b.left()) as i32;
    let right = rect_a.right().min(rect_b.right()) as i32;

    let (ax, ay) = (rect_a.left() as i32, rect_a.top() as i32);
    let (bx, by) = (rect_b.left() as i32, rect_b.top() as i32);

    for y in top..bottom {
        for x in left..right {
            if mask_a.alpha_at(x - ax, y - ay) != 0 && mask_b.alpha_at(x - bx, y - by) != 0 {
                return true;
            }
        }
    }

    false
}
