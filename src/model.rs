//! Decoded image model
//!
//! Everything the assembler produces: document metrics, guides, the layer
//! tree and the merged composite. Pixel samples and the thumbnail raster
//! are left out of the serialized form.

use serde::Serialize;

use crate::pixels::Bitmap;
use crate::psd::resources::Orientation;
use crate::psd::ColorMode;

/// Resolution assumed when a document carries no resolution info
pub const DEFAULT_RESOLUTION: f32 = 72.0;

/// A decoded document
#[derive(Debug, Clone, Serialize)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub depth: u16,
    pub channels: u16,
    pub color_mode: ColorMode,
    /// Horizontal resolution in pixels per inch
    pub horizontal_resolution: f32,
    /// Vertical resolution in pixels per inch
    pub vertical_resolution: f32,
    /// Embedded ICC profile, kept opaque
    #[serde(skip)]
    pub icc_profile: Option<Vec<u8>>,
    #[serde(skip)]
    pub thumbnail: Option<image::RgbImage>,
    pub guides: Vec<Guide>,
    /// Root layers, top-most first
    pub layers: Vec<Layer>,
    pub merged_image: Option<Bitmap>,
}

impl Image {
    /// Depth-first walk over every layer in the tree
    pub fn walk_layers(&self) -> impl Iterator<Item = &Layer> {
        let mut pending: Vec<&Layer> = self.layers.iter().rev().collect();
        std::iter::from_fn(move || {
            let layer = pending.pop()?;
            pending.extend(layer.children.iter().rev());
            Some(layer)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Guide {
    pub orientation: Orientation,
    /// Position in pixels
    pub position: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Image,
    Group,
    Adjustment,
    Shape,
    Text,
}

impl LayerKind {
    /// Word used for generated names such as `<Layer 2>`
    pub fn label(self) -> &'static str {
        match self {
            LayerKind::Image => "Layer",
            LayerKind::Group => "Group",
            LayerKind::Adjustment => "Adjustment",
            LayerKind::Shape => "Shape",
            LayerKind::Text => "Text",
        }
    }
}

/// Pixel rectangle in document coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    pub bounds: Rect,
    /// Layer opacity in `0.0..=1.0`
    pub opacity: f32,
    pub blend_mode: BlendMode,
    /// Not clipped to the layer below
    pub clip_base: bool,
    /// Expanded in the layers panel (groups only)
    pub open: bool,
    pub visible: bool,
    pub image: Option<Bitmap>,
    pub shape: Option<ShapeInfo>,
    pub text: Option<TextInfo>,
    pub effects: Option<Effects>,
    /// Group members, top-most first
    pub children: Vec<Layer>,
}

/// Layer and effect blend modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    PassThrough,
    #[default]
    Normal,
    Dissolve,
    Darken,
    Multiply,
    ColorBurn,
    LinearBurn,
    DarkerColor,
    Lighten,
    Screen,
    ColorDodge,
    LinearDodge,
    LighterColor,
    Overlay,
    SoftLight,
    HardLight,
    VividLight,
    LinearLight,
    PinLight,
    HardMix,
    Difference,
    Exclusion,
    Subtract,
    Divide,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// Map a layer record key (`mul `) or descriptor enum value (`Mltp`)
    ///
    /// Unknown keys map to [`BlendMode::Normal`].
    pub fn from_key(key: &str) -> Self {
        match key {
            "pass" => BlendMode::PassThrough,
            "norm" | "Nrml" => BlendMode::Normal,
            "diss" | "Dslv" => BlendMode::Dissolve,
            "dark" | "Drkn" => BlendMode::Darken,
            "mul " | "Mltp" => BlendMode::Multiply,
            "idiv" | "CBrn" => BlendMode::ColorBurn,
            "lbrn" | "linearBurn" => BlendMode::LinearBurn,
            "dkCl" | "darkerColor" => BlendMode::DarkerColor,
            "lite" | "Lghn" => BlendMode::Lighten,
            "scrn" | "Scrn" => BlendMode::Screen,
            "div " | "CDdg" => BlendMode::ColorDodge,
            "lddg" | "linearDodge" => BlendMode::LinearDodge,
            "lgCl" | "lighterColor" => BlendMode::LighterColor,
            "over" | "Ovrl" => BlendMode::Overlay,
            "sLit" | "SftL" => BlendMode::SoftLight,
            "hLit" | "HrdL" => BlendMode::HardLight,
            "vLit" | "vividLight" => BlendMode::VividLight,
            "lLit" | "linearLight" => BlendMode::LinearLight,
            "pLit" | "pinLight" => BlendMode::PinLight,
            "hMix" | "hardMix" => BlendMode::HardMix,
            "diff" | "Dfrn" => BlendMode::Difference,
            "smud" | "Xclu" => BlendMode::Exclusion,
            "fsub" | "blendSubtraction" => BlendMode::Subtract,
            "fdiv" | "blendDivide" => BlendMode::Divide,
            "hue " | "H   " => BlendMode::Hue,
            "sat " | "Strt" => BlendMode::Saturation,
            "colr" | "Clr " => BlendMode::Color,
            "lum " | "Lmns" => BlendMode::Luminosity,
            _ => BlendMode::Normal,
        }
    }
}

/// Non-premultiplied color, components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Effects {
    pub shadows: Vec<Shadow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowKind {
    Inner,
    Outer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shadow {
    pub kind: ShadowKind,
    /// Blur radius in pixels
    pub blur: f32,
    /// Light angle in degrees
    pub angle: f32,
    /// Offset in pixels
    pub distance: f32,
    /// Opacity in `0.0..=1.0`
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub color: Color,
}

/// Vector content of a shape layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeInfo {
    pub style: ShapeStyle,
    pub paths: Vec<SubPath>,
    pub fill_color: Color,
    pub fill_opacity: f32,
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeStyle {
    None,
    Fill,
    Stroke,
    FillAndStroke,
}

impl ShapeStyle {
    pub fn from_flags(fill: bool, stroke: bool) -> Self {
        match (fill, stroke) {
            (true, true) => ShapeStyle::FillAndStroke,
            (true, false) => ShapeStyle::Fill,
            (false, true) => ShapeStyle::Stroke,
            (false, false) => ShapeStyle::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubPath {
    pub kind: PathKind,
    pub op: PathOp,
    pub commands: Vec<PathCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    Open,
    Closed,
}

/// How a sub-path combines with the ones before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathOp {
    Add,
    Subtract,
    Intersect,
    ExclusiveOr,
}

/// Path commands in layer-local pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum PathCommand {
    MoveTo {
        x: f32,
        y: f32,
    },
    LineTo {
        x: f32,
        y: f32,
    },
    CurveTo {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x: f32,
        y: f32,
    },
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub width: f32,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash_offset: f32,
    /// Dash lengths in pixels; empty for a solid stroke
    pub dashes: Vec<f32>,
    pub alignment: Option<StrokeAlignment>,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Bevel,
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeAlignment {
    Inside,
    Center,
    Outside,
}

/// Content and styling of a text layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextInfo {
    pub text: String,
    /// Affine transform as `[xx, xy, yx, yy, tx, ty]`
    pub transform: [f64; 6],
    pub bounds: Option<TextBounds>,
    pub style_runs: Vec<StyleRun>,
    pub paragraph_runs: Vec<ParagraphRun>,
}

/// Text box edges in pixels, relative to the transform origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextBounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Character styling over `start..end` (UTF-16 code units)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleRun {
    pub start: usize,
    pub end: usize,
    pub font: Option<String>,
    /// Font size in points at 72 dpi
    pub font_size: Option<f32>,
    pub color: Option<Color>,
    pub tracking: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParagraphRun {
    pub start: usize,
    pub end: usize,
    pub alignment: TextAlignment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

impl TextAlignment {
    pub fn from_justification(value: i64) -> Self {
        match value {
            1 => TextAlignment::Right,
            2 => TextAlignment::Center,
            3 => TextAlignment::Justify,
            _ => TextAlignment::Left,
        }
    }
}
