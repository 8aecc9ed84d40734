//! Move and resize math for existing regions.
//!
//! Inputs arrive from the box handles in screen space and are converted to
//! natural space through the inverse transform. Results stay inside the
//! image when its natural size is known.

use crate::geometry::{Point, Rect, Size, Transform};

/// Which part of a region's frame is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeHandle {
    Top,
    Right,
    Bottom,
    Left,
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl ResizeHandle {
    pub fn all() -> &'static [ResizeHandle] {
        &[
            ResizeHandle::Top,
            ResizeHandle::Right,
            ResizeHandle::Bottom,
            ResizeHandle::Left,
            ResizeHandle::TopLeft,
            ResizeHandle::TopRight,
            ResizeHandle::BottomRight,
            ResizeHandle::BottomLeft,
        ]
    }

    fn moves_left(&self) -> bool {
        matches!(self, ResizeHandle::Left | ResizeHandle::TopLeft | ResizeHandle::BottomLeft)
    }

    fn moves_right(&self) -> bool {
        matches!(self, ResizeHandle::Right | ResizeHandle::TopRight | ResizeHandle::BottomRight)
    }

    fn moves_top(&self) -> bool {
        matches!(self, ResizeHandle::Top | ResizeHandle::TopLeft | ResizeHandle::TopRight)
    }

    fn moves_bottom(&self) -> bool {
        matches!(
            self,
            ResizeHandle::Bottom | ResizeHandle::BottomLeft | ResizeHandle::BottomRight
        )
    }
}

/// Translate `rect` by a screen-space delta, keeping its size.
pub fn translate(
    rect: Rect,
    screen_delta: Point,
    transform: &Transform,
    image: Option<Size>,
) -> Rect {
    let delta = transform.delta_to_natural(screen_delta);
    let mut x = rect.x + delta.x;
    let mut y = rect.y + delta.y;

    if let Some(image) = image.filter(Size::is_usable) {
        x = clamp_origin(x, rect.width, image.width);
        y = clamp_origin(y, rect.height, image.height);
    }

    Rect::new(x, y, rect.width, rect.height)
}

/// Move the edges selected by `handle` by a screen-space delta.
///
/// Edges never cross: each dragged edge stops `min_extent` natural pixels
/// short of the opposite one.
pub fn resize(
    rect: Rect,
    handle: ResizeHandle,
    screen_delta: Point,
    transform: &Transform,
    min_extent: f64,
    image: Option<Size>,
) -> Rect {
    let delta = transform.delta_to_natural(screen_delta);
    let image = image.filter(Size::is_usable);
    let (mut xmin, mut ymin, mut xmax, mut ymax) = (rect.x, rect.y, rect.right(), rect.bottom());

    if handle.moves_left() {
        xmin = (xmin + delta.x).min(xmax - min_extent);
        if image.is_some() {
            xmin = xmin.max(0.0);
        }
    }
    if handle.moves_right() {
        xmax = (xmax + delta.x).max(xmin + min_extent);
        if let Some(image) = image {
            xmax = xmax.min(image.width);
        }
    }
    if handle.moves_top() {
        ymin = (ymin + delta.y).min(ymax - min_extent);
        if image.is_some() {
            ymin = ymin.max(0.0);
        }
    }
    if handle.moves_bottom() {
        ymax = (ymax + delta.y).max(ymin + min_extent);
        if let Some(image) = image {
            ymax = ymax.min(image.height);
        }
    }

    Rect::new(xmin, ymin, xmax - xmin, ymax - ymin)
}

/// Convert a final screen-space frame reported by the presentation layer.
pub fn place(screen: Rect, transform: &Transform, min_extent: f64) -> Rect {
    let natural = transform.rect_to_natural(screen);
    Rect::new(
        natural.x,
        natural.y,
        natural.width.max(min_extent),
        natural.height.max(min_extent),
    )
}

fn clamp_origin(origin: f64, extent: f64, limit: f64) -> f64 {
    if extent >= limit {
        0.0
    } else {
        origin.clamp(0.0, limit - extent)
    }
}
