//! Coordinate mathematics between natural image space and screen space.
//!
//! The natural space is the pixel grid of the original image. The screen
//! space is the pixel grid of the container the image is rendered in. The
//! two are related by a per-axis scale and nothing else.

use serde::{Deserialize, Serialize};

/// A 2D point. Which space it lives in is decided by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp the point into `[0, size.width] x [0, size.height]`.
    pub fn clamp_to(&self, size: Size) -> Point {
        Point::new(
            self.x.max(0.0).min(size.width.max(0.0)),
            self.y.max(0.0).min(size.height.max(0.0)),
        )
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True if both dimensions are finite and strictly positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// An axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a normalized rectangle from two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Scale pair relating natural and screen coordinates.
///
/// Recomputed from live dimensions before every use. When the natural
/// dimensions are not known yet, both factors are 1 and `is_scaled()` is
/// false; callers must not persist coordinates produced by such a transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale_x: f64,
    pub scale_y: f64,
    scaled: bool,
}

impl Transform {
    /// Create a transform from explicit scale factors.
    ///
    /// Non-finite or non-positive factors yield the identity.
    pub fn new(scale_x: f64, scale_y: f64) -> Self {
        if scale_x.is_finite() && scale_y.is_finite() && scale_x > 0.0 && scale_y > 0.0 {
            Self {
                scale_x,
                scale_y,
                scaled: true,
            }
        } else {
            Self::identity()
        }
    }

    /// The pass-through transform used while the image is not loaded.
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            scaled: false,
        }
    }

    /// Derive the transform from rendered and natural image dimensions.
    pub fn from_dimensions(rendered: Size, natural: Option<Size>) -> Self {
        match natural {
            Some(natural) if natural.is_usable() && rendered.is_usable() => Self::new(
                rendered.width / natural.width,
                rendered.height / natural.height,
            ),
            _ => Self::identity(),
        }
    }

    /// Whether this transform was derived from real image dimensions.
    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    /// Natural → screen.
    pub fn to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.scale_x, p.y * self.scale_y)
    }

    /// Screen → natural.
    pub fn to_natural(&self, p: Point) -> Point {
        Point::new(p.x / self.scale_x, p.y / self.scale_y)
    }

    /// Convert a screen-space displacement to natural space.
    pub fn delta_to_natural(&self, d: Point) -> Point {
        self.to_natural(d)
    }

    /// Natural-space rectangle → screen-space rectangle.
    pub fn rect_to_screen(&self, r: Rect) -> Rect {
        Rect::new(
            r.x * self.scale_x,
            r.y * self.scale_y,
            r.width * self.scale_x,
            r.height * self.scale_y,
        )
    }

    /// Screen-space rectangle → natural-space rectangle.
    pub fn rect_to_natural(&self, r: Rect) -> Rect {
        Rect::new(
            r.x / self.scale_x,
            r.y / self.scale_y,
            r.width / self.scale_x,
            r.height / self.scale_y,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Live dimensions of the editing surface, as reported by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Size of the container that receives pointer events.
    pub container: Size,
    /// Size the image is currently rendered at.
    pub rendered: Size,
    /// Pixel size of the source image, unknown until it has decoded.
    pub natural: Option<Size>,
}

impl Viewport {
    /// Viewport whose image fills the container exactly.
    pub fn filled(container: Size, natural: Option<Size>) -> Self {
        Self {
            container,
            rendered: container,
            natural,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_dimensions(self.rendered, self.natural)
    }
}
