//! Shape layers: vector paths, fill and stroke

use indexmap::IndexMap;

use super::color::{color_from_class, descriptor_color, resolve_unit, unit, unit_value};
use crate::model::{
    BlendMode, Color, LineCap, LineJoin, PathCommand, PathKind, PathOp, Rect, ShapeInfo,
    ShapeStyle, Stroke, StrokeAlignment, SubPath, DEFAULT_RESOLUTION,
};
use crate::psd::descriptor::DescriptorValue;
use crate::psd::properties::{property_key, selector, BezierKnot, PathRecordData, ShapeMask};
use crate::psd::{Descriptor, LayerProperty, PropertyData};

/// Maps normalized path coordinates to layer pixels
#[derive(Debug, Clone, Copy)]
pub struct PathTransform {
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl PathTransform {
    /// Scale by the document size, then move to the layer origin
    pub fn new(doc_width: u32, doc_height: u32, bounds: Rect) -> Self {
        Self {
            scale_x: doc_width as f32,
            scale_y: doc_height as f32,
            offset_x: -(bounds.x as f32),
            offset_y: -(bounds.y as f32),
        }
    }

    fn apply(&self, (x, y): (f32, f32)) -> (f32, f32) {
        (x * self.scale_x + self.offset_x, y * self.scale_y + self.offset_y)
    }
}

fn fixed_8_24(v: i32) -> f32 {
    v as f32 / (1 << 24) as f32
}

fn anchor(knot: &BezierKnot) -> (f32, f32) {
    (fixed_8_24(knot.anchor_x), fixed_8_24(knot.anchor_y))
}

fn control_exit(knot: &BezierKnot) -> (f32, f32) {
    (fixed_8_24(knot.control_exit_x), fixed_8_24(knot.control_exit_y))
}

fn control_enter(knot: &BezierKnot) -> (f32, f32) {
    (fixed_8_24(knot.control_enter_x), fixed_8_24(knot.control_enter_y))
}

fn path_op(op: u16) -> PathOp {
    match op {
        0 => PathOp::ExclusiveOr,
        2 => PathOp::Subtract,
        3 => PathOp::Intersect,
        _ => PathOp::Add,
    }
}

/// Segment from `from` to `to`: a line when both controls sit on their anchors
fn segment(from: &BezierKnot, to: &BezierKnot, transform: &PathTransform) -> PathCommand {
    let start = anchor(from);
    let exit = control_exit(from);
    let enter = control_enter(to);
    let end = anchor(to);

    let (x, y) = transform.apply(end);
    if exit == start && enter == end {
        PathCommand::LineTo { x, y }
    } else {
        let (x1, y1) = transform.apply(exit);
        let (x2, y2) = transform.apply(enter);
        PathCommand::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        }
    }
}

struct PathBuilder {
    kind: PathKind,
    op: PathOp,
    commands: Vec<PathCommand>,
    first: Option<BezierKnot>,
    last: Option<BezierKnot>,
}

impl PathBuilder {
    fn finish(mut self, transform: &PathTransform) -> SubPath {
        if self.kind == PathKind::Closed {
            if let (Some(first), Some(last)) = (&self.first, &self.last) {
                self.commands.push(segment(last, first, transform));
            }
            self.commands.push(PathCommand::Close);
        }
        SubPath {
            kind: self.kind,
            op: self.op,
            commands: self.commands,
        }
    }
}

/// Turn path records into sub-paths
///
/// Each length record starts a sub-path; knots before the first length
/// record and non-knot records are ignored.
pub fn build_paths(mask: &ShapeMask, transform: &PathTransform) -> Vec<SubPath> {
    let mut paths = Vec::new();
    let mut current: Option<PathBuilder> = None;

    for record in &mask.records {
        match (record.selector, &record.data) {
            (
                selector::CLOSED_SUBPATH_LENGTH | selector::OPEN_SUBPATH_LENGTH,
                PathRecordData::SubPath { op, .. },
            ) => {
                if let Some(done) = current.take() {
                    paths.push(done.finish(transform));
                }
                let kind = if record.selector == selector::OPEN_SUBPATH_LENGTH {
                    PathKind::Open
                } else {
                    PathKind::Closed
                };
                current = Some(PathBuilder {
                    kind,
                    op: path_op(*op),
                    commands: Vec::new(),
                    first: None,
                    last: None,
                });
            }
            (_, PathRecordData::Knot(knot)) => {
                let Some(path) = current.as_mut() else {
                    continue;
                };
                match &path.last {
                    None => {
                        let (x, y) = transform.apply(anchor(knot));
                        path.commands.push(PathCommand::MoveTo { x, y });
                        path.first = Some(*knot);
                    }
                    Some(last) => {
                        let command = segment(last, knot, transform);
                        path.commands.push(command);
                    }
                }
                path.last = Some(*knot);
            }
            _ => {}
        }
    }

    if let Some(done) = current {
        paths.push(done.finish(transform));
    }
    paths
}

/// Assemble the shape of a layer from its `vmsk`/`vsms` mask
///
/// Returns `None` when neither mask is present.
pub fn extract_shape(
    properties: &IndexMap<String, LayerProperty>,
    transform: &PathTransform,
) -> Option<ShapeInfo> {
    let (mask_key, mask) = [property_key::SHAPE_MASK, property_key::SHAPE_MASK_LEGACY]
        .into_iter()
        .find_map(|key| match &properties.get(key)?.data {
            PropertyData::ShapeMask(mask) => Some((key, mask)),
            _ => None,
        })?;

    let paths = build_paths(mask, transform);
    let stroke_descriptor = match properties.get(property_key::SHAPE_STROKE).map(|p| &p.data) {
        Some(PropertyData::Stroke(stroke)) => Some(&stroke.descriptor),
        _ => None,
    };
    let (style, stroke) = match stroke_descriptor {
        Some(descriptor) => (
            ShapeStyle::from_flags(
                descriptor.get_bool("fillEnabled"),
                descriptor.get_bool("strokeEnabled"),
            ),
            Some(extract_stroke(descriptor)),
        ),
        None => (ShapeStyle::Fill, None),
    };

    Some(ShapeInfo {
        style,
        paths,
        fill_color: fill_color(properties, mask_key),
        fill_opacity: fill_opacity(properties),
        stroke,
    })
}

fn fill_opacity(properties: &IndexMap<String, LayerProperty>) -> f32 {
    match properties.get(property_key::FILL_OPACITY).map(|p| &p.data) {
        Some(PropertyData::FillOpacity(alpha)) => f32::from(*alpha) / 255.0,
        _ => 1.0,
    }
}

/// Solid fill color; `vsms` shapes keep it in `vscg`, `vmsk` shapes in `SoCo`
fn fill_color(properties: &IndexMap<String, LayerProperty>, mask_key: &str) -> Color {
    let descriptor = if mask_key == property_key::SHAPE_MASK_LEGACY {
        match properties.get(property_key::SHAPE_GRAPHICS).map(|p| &p.data) {
            Some(PropertyData::ShapeGraphics(graphics))
                if graphics.key == property_key::SOLID_COLOR =>
            {
                Some(&graphics.descriptor)
            }
            _ => None,
        }
    } else {
        match properties.get(property_key::SOLID_COLOR).map(|p| &p.data) {
            Some(PropertyData::SolidColor(solid)) => Some(&solid.descriptor),
            _ => None,
        }
    };
    descriptor.map_or(Color::BLACK, descriptor_color)
}

fn line_cap(key: Option<&str>) -> LineCap {
    match key {
        Some("strokeStyleRoundCap") => LineCap::Round,
        Some("strokeStyleSquareCap") => LineCap::Square,
        _ => LineCap::Butt,
    }
}

fn line_join(key: Option<&str>) -> LineJoin {
    match key {
        Some("strokeStyleRoundJoin") => LineJoin::Round,
        Some("strokeStyleBevelJoin") => LineJoin::Bevel,
        _ => LineJoin::Miter,
    }
}

fn alignment(key: Option<&str>) -> Option<StrokeAlignment> {
    match key? {
        "strokeStyleAlignInside" => Some(StrokeAlignment::Inside),
        "strokeStyleAlignCenter" => Some(StrokeAlignment::Center),
        "strokeStyleAlignOutside" => Some(StrokeAlignment::Outside),
        _ => None,
    }
}

/// Stroke parameters from a `vstk` descriptor
pub fn extract_stroke(descriptor: &Descriptor) -> Stroke {
    let resolution = descriptor
        .get_f64("strokeStyleResolution")
        .map_or(DEFAULT_RESOLUTION, |r| r as f32);
    let width = unit_value(descriptor, "strokeStyleLineWidth", resolution);

    let dashes = descriptor
        .get_list("strokeStyleLineDashSet")
        .unwrap_or_default()
        .iter()
        .filter_map(|item| match item {
            DescriptorValue::UnitDouble { unit: code, value } if code == unit::NONE => {
                Some((*value as f32) * width)
            }
            DescriptorValue::UnitDouble { unit: code, value } => {
                Some(resolve_unit(code, *value, resolution) as f32)
            }
            DescriptorValue::UnitFloat { unit: code, value } => {
                Some(resolve_unit(code, f64::from(*value), resolution) as f32)
            }
            _ => None,
        })
        .collect();

    let color = descriptor
        .get_descriptor("strokeStyleContent")
        .filter(|content| content.class_id == "solidColorLayer")
        .and_then(|content| content.get_descriptor("Clr "))
        .and_then(color_from_class)
        .unwrap_or(Color::BLACK);

    Stroke {
        width,
        opacity: unit_value(descriptor, "strokeStyleOpacity", resolution),
        blend_mode: descriptor
            .get_enum("strokeStyleBlendMode")
            .map(BlendMode::from_key)
            .unwrap_or_default(),
        cap: line_cap(descriptor.get_enum("strokeStyleLineCapType")),
        join: line_join(descriptor.get_enum("strokeStyleLineJoinType")),
        miter_limit: descriptor
            .get_f64("strokeStyleMiterLimit")
            .map_or(0.0, |v| v as f32),
        dash_offset: unit_value(descriptor, "strokeStyleLineDashOffset", resolution),
        dashes,
        alignment: alignment(descriptor.get_enum("strokeStyleLineAlignment")),
        color,
    }
}
