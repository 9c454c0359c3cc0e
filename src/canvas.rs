//! The drawing surface the layout stages write to.
//!
//! Coordinates are millimetres with the origin at the top-left of the page.
//! Text `y` is the baseline; rectangle and image `y` is the top edge.

use std::sync::Arc;

use crate::assets::RasterImage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::gray(0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    pub const fn gray(v: u8) -> Self {
        Color { r: v, g: v, b: v }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Horizontal anchoring of a text run relative to its `x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in points.
    pub size: f32,
    pub weight: Weight,
    pub color: Color,
    pub align: Align,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        TextStyle {
            size,
            weight: Weight::Regular,
            color: Color::BLACK,
            align: Align::Left,
        }
    }

    pub const fn bold(size: f32) -> Self {
        TextStyle {
            weight: Weight::Bold,
            ..TextStyle::regular(size)
        }
    }

    pub const fn color(self, color: Color) -> Self {
        TextStyle { color, ..self }
    }

    pub const fn right(self) -> Self {
        TextStyle {
            align: Align::Right,
            ..self
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    pub subject: String,
    pub author: String,
    pub creator: String,
}

/// Capability set of a rendering surface.
pub trait Canvas {
    fn set_metadata(&mut self, meta: Metadata);
    fn text(&mut self, x: f32, y: f32, text: &str, style: TextStyle);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color);
    fn image(&mut self, image: Arc<RasterImage>, rect: Rect);
    fn page_height(&self) -> f32;
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextOp {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub style: TextStyle,
}

#[derive(Clone, Debug)]
pub enum DrawOp {
    Text(TextOp),
    FillRect { rect: Rect, color: Color },
    StrokeRect { rect: Rect, color: Color },
    Image { image: Arc<RasterImage>, rect: Rect },
}

/// In-memory display list for one page. Every output sink serialises this.
#[derive(Clone, Debug)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub metadata: Metadata,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn new(width: f32, height: f32) -> Self {
        Page {
            width,
            height,
            metadata: Metadata::default(),
            ops: Vec::new(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn find_text(&self, text: &str) -> Option<&TextOp> {
        self.texts().find(|t| t.text == text)
    }

    pub fn fills(&self) -> impl Iterator<Item = (&Rect, &Color)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::FillRect { rect, color } => Some((rect, color)),
            _ => None,
        })
    }

    pub fn strokes(&self) -> impl Iterator<Item = (&Rect, &Color)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::StrokeRect { rect, color } => Some((rect, color)),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = (&Arc<RasterImage>, &Rect)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image { image, rect } => Some((image, rect)),
            _ => None,
        })
    }

    /// Same text, shapes and styles at the same positions. Images compare by
    /// placement and pixel dimensions.
    pub fn same_layout(&self, other: &Page) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.metadata == other.metadata
            && self.ops.len() == other.ops.len()
            && self.ops.iter().zip(&other.ops).all(|(a, b)| match (a, b) {
                (DrawOp::Text(a), DrawOp::Text(b)) => a == b,
                (
                    DrawOp::FillRect { rect: ra, color: ca },
                    DrawOp::FillRect { rect: rb, color: cb },
                )
                | (
                    DrawOp::StrokeRect { rect: ra, color: ca },
                    DrawOp::StrokeRect { rect: rb, color: cb },
                ) => ra == rb && ca == cb,
                (
                    DrawOp::Image { image: ia, rect: ra },
                    DrawOp::Image { image: ib, rect: rb },
                ) => ra == rb && ia.width == ib.width && ia.height == ib.height,
                _ => false,
            })
    }
}

impl Canvas for Page {
    fn set_metadata(&mut self, meta: Metadata) {
        self.metadata = meta;
    }

    fn text(&mut self, x: f32, y: f32, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Text(TextOp {
            x,
            y,
            text: text.to_string(),
            style,
        }));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::StrokeRect { rect, color });
    }

    fn image(&mut self, image: Arc<RasterImage>, rect: Rect) {
        self.ops.push(DrawOp::Image { image, rect });
    }

    fn page_height(&self) -> f32 {
        self.height
    }
}
