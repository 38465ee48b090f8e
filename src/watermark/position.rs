//! Anchor resolution for watermark placement.
//!
//! Maps one of the nine grid positions, plus pixel offsets, to the absolute
//! coordinate where a watermark's origin is placed.
//!
//! # Example
//!
//! ```
//! use watermarking::watermark::position::{resolve, Anchor, AnchorPosition};
//!
//! let anchor = resolve(800, 600, Some(AnchorPosition::BottomRight), 200.0, 200.0);
//! assert_eq!(anchor, Anchor::new(600.0, 400.0));
//!
//! // Absent positions fall back to the center formula.
//! assert_eq!(resolve(800, 600, None, 200.0, 200.0), Anchor::new(600.0, 500.0));
//! ```

use std::fmt;

/// The nine supported placement positions.
///
/// Discriminants match the integer codes accepted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnchorPosition {
    TopLeft = 1,
    TopCenter = 2,
    TopRight = 3,
    LeftCenter = 4,
    #[default]
    Center = 5,
    RightCenter = 6,
    BottomLeft = 7,
    BottomCenter = 8,
    BottomRight = 9,
}

impl AnchorPosition {
    pub const ALL: [AnchorPosition; 9] = [
        AnchorPosition::TopLeft,
        AnchorPosition::TopCenter,
        AnchorPosition::TopRight,
        AnchorPosition::LeftCenter,
        AnchorPosition::Center,
        AnchorPosition::RightCenter,
        AnchorPosition::BottomLeft,
        AnchorPosition::BottomCenter,
        AnchorPosition::BottomRight,
    ];

    /// Look up a position by its integer code (1-9).
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }

    /// Like [`from_code`](Self::from_code), but absent or unknown codes become `Center`.
    pub fn from_code_or_center(code: Option<i32>) -> Self {
        code.and_then(Self::from_code).unwrap_or_default()
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for AnchorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnchorPosition::TopLeft => "top-left",
            AnchorPosition::TopCenter => "top-center",
            AnchorPosition::TopRight => "top-right",
            AnchorPosition::LeftCenter => "left-center",
            AnchorPosition::Center => "center",
            AnchorPosition::RightCenter => "right-center",
            AnchorPosition::BottomLeft => "bottom-left",
            AnchorPosition::BottomCenter => "bottom-center",
            AnchorPosition::BottomRight => "bottom-right",
        };
        f.write_str(name)
    }
}

/// Resolved placement coordinate in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Integer pixel coordinate, truncated toward zero.
    pub fn to_pixel(self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

/// Resolve the anchor coordinate for a position on a `width` x `height` image.
///
/// `TopCenter` and `BottomCenter` share the `Center` horizontal formula
/// (`width / 2 + offset_x`), so they sit right of true center by `offset_x`.
pub fn resolve(
    width: u32,
    height: u32,
    position: Option<AnchorPosition>,
    offset_x: f32,
    offset_y: f32,
) -> Anchor {
    let w = width as f32;
    let h = height as f32;

    match position.unwrap_or_default() {
        // Top row
        AnchorPosition::TopLeft => Anchor::new(offset_x, offset_y),
        AnchorPosition::TopCenter => Anchor::new(w / 2.0 + offset_x, offset_y),
        AnchorPosition::TopRight => Anchor::new(w - offset_x, offset_y),

        // Middle row
        AnchorPosition::LeftCenter => Anchor::new(offset_x, h / 2.0 + offset_y),
        AnchorPosition::Center => Anchor::new(w / 2.0 + offset_x, h / 2.0 + offset_y),
        AnchorPosition::RightCenter => Anchor::new(w - offset_x, h / 2.0 + offset_y),

        // Bottom row
        AnchorPosition::BottomLeft => Anchor::new(offset_x, h - offset_y),
        AnchorPosition::BottomCenter => Anchor::new(w / 2.0 + offset_x, h - offset_y),
        AnchorPosition::BottomRight => Anchor::new(w - offset_x, h - offset_y),
    }
}
