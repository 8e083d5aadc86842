//! Text layers: content, transform, box and style runs

use super::color::resolve_unit;
use crate::error::TextEngineError;
use crate::model::{Color, ParagraphRun, StyleRun, TextAlignment, TextBounds, TextInfo};
use crate::psd::properties::TypeToolObject;
use crate::psd::Descriptor;
use crate::text::{self as engine, MapProperty, Property};

/// Decode a `TySh` block
///
/// `resolution` is the vertical dpi, used for the text box and font sizes.
pub fn extract_text(
    type_tool: &TypeToolObject,
    resolution: f32,
) -> Result<TextInfo, TextEngineError> {
    let text = type_tool
        .text
        .get_str("Txt ")
        .unwrap_or_default()
        .replace('\r', "\n");

    let (style_runs, paragraph_runs) = match type_tool.text.get_raw("EngineData") {
        Some(data) => {
            let root = engine::parse(data)?;
            (style_runs(&root, resolution), paragraph_runs(&root))
        }
        None => (Vec::new(), Vec::new()),
    };

    Ok(TextInfo {
        text,
        transform: [
            type_tool.xx,
            type_tool.xy,
            type_tool.yx,
            type_tool.yy,
            type_tool.tx,
            type_tool.ty,
        ],
        bounds: text_bounds(&type_tool.text, resolution),
        style_runs,
        paragraph_runs,
    })
}

/// Text box from `boundingBox`, only when all four edges are present
fn text_bounds(text: &Descriptor, resolution: f32) -> Option<TextBounds> {
    let edge = |key: &str| {
        text.get_unit(&format!("boundingBox.{}", key))
            .map(|(code, value)| resolve_unit(code, value, resolution))
    };
    Some(TextBounds {
        left: edge("Left")?,
        top: edge("Top ")?,
        right: edge("Rght")?,
        bottom: edge("Btom")?,
    })
}

/// A run's own sheet, falling back to the document default
struct Sheet<'a> {
    own: Option<&'a MapProperty>,
    default: Option<&'a MapProperty>,
}

impl<'a> Sheet<'a> {
    fn get(&self, path: &str) -> Option<&'a Property> {
        self.own
            .and_then(|sheet| sheet.get(path))
            .or_else(|| self.default.and_then(|sheet| sheet.get(path)))
    }
}

fn default_sheet<'a>(
    root: &'a MapProperty,
    index_path: &str,
    set: &str,
    data: &str,
) -> Option<&'a MapProperty> {
    let index = root.get_i64(index_path)?;
    root.get_map(&format!("ResourceDict.{}[{}].{}", set, index, data))
}

/// Offsets of consecutive runs as `(start, end)` pairs
fn run_spans(lengths: &[i64]) -> Vec<(usize, usize)> {
    let mut pos = 0usize;
    lengths
        .iter()
        .map(|&length| {
            let start = pos;
            pos += usize::try_from(length).unwrap_or(0);
            (start, pos)
        })
        .collect()
}

fn style_runs(root: &MapProperty, resolution: f32) -> Vec<StyleRun> {
    let fonts: Vec<Option<&str>> = root
        .get_list("ResourceDict.FontSet")
        .unwrap_or_default()
        .iter()
        .map(|font| font.as_map().and_then(|font| font.get_str("Name")))
        .collect();
    let default = default_sheet(
        root,
        "ResourceDict.TheNormalStyleSheet",
        "StyleSheetSet",
        "StyleSheetData",
    );
    let styles = root
        .get_list("EngineDict.StyleRun.RunArray")
        .unwrap_or_default();
    let spans = run_spans(&root.get_i64_list("EngineDict.StyleRun.RunLengthArray"));
    let last = spans.len().saturating_sub(1);

    spans
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| {
            let sheet = Sheet {
                own: styles
                    .get(i)
                    .and_then(Property::as_map)
                    .and_then(|style| style.get_map("StyleSheet.StyleSheetData")),
                default,
            };
            // the last run covers the terminating character
            let end = if i == last { end.saturating_sub(1).max(start) } else { end };

            let color = sheet
                .get("FillColor.Values")
                .and_then(Property::as_list)
                .map(|values| values.iter().filter_map(Property::as_f64).collect::<Vec<_>>())
                .and_then(|argb| match argb.as_slice() {
                    [a, r, g, b] => Some(Color::rgba(*r as f32, *g as f32, *b as f32, *a as f32)),
                    _ => None,
                });

            StyleRun {
                start,
                end,
                font: sheet
                    .get("Font")
                    .and_then(Property::as_i64)
                    .and_then(|index| fonts.get(usize::try_from(index).ok()?).copied().flatten())
                    .map(str::to_string),
                font_size: sheet
                    .get("FontSize")
                    .and_then(Property::as_f64)
                    .map(|size| (size / (f64::from(resolution) / 72.0)) as f32),
                color,
                tracking: sheet
                    .get("Tracking")
                    .and_then(Property::as_f64)
                    .map(|tracking| (tracking / 1000.0) as f32),
            }
        })
        .collect()
}

fn paragraph_runs(root: &MapProperty) -> Vec<ParagraphRun> {
    let default = default_sheet(
        root,
        "ResourceDict.TheNormalParagraphSheet",
        "ParagraphSheetSet",
        "Properties",
    );
    let styles = root
        .get_list("EngineDict.ParagraphRun.RunArray")
        .unwrap_or_default();

    run_spans(&root.get_i64_list("EngineDict.ParagraphRun.RunLengthArray"))
        .into_iter()
        .enumerate()
        .map(|(i, (start, end))| {
            let sheet = Sheet {
                own: styles
                    .get(i)
                    .and_then(Property::as_map)
                    .and_then(|style| style.get_map("ParagraphSheet.Properties")),
                default,
            };
            ParagraphRun {
                start,
                end,
                alignment: sheet
                    .get("Justification")
                    .and_then(Property::as_i64)
                    .map(TextAlignment::from_justification)
                    .unwrap_or_default(),
            }
        })
        .collect()
}
