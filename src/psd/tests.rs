//! End-to-end decoding of synthetic documents

#![allow(clippy::unwrap_used)]

use crate::config::DecodeOptions;
use crate::decoder::{accept, decode, Decoder};
use crate::error::{ChunkError, DecodeError};
use crate::model::{
    BlendMode, Color, Image, LayerKind, LineCap, PathCommand, PathKind, PathOp, ShadowKind,
    ShapeStyle,
};
use crate::pixels::compression::reference::{encode_plane, packbits_encode};
use crate::psd::resources::Orientation;
use crate::psd::{ColorMode, Header};
use crate::testutil::{layers_body, Bytes, Desc, DescValue, DocSpec, HeaderSpec, LayerSpec};

const RESOLUTION: u16 = 0x03ED;
const GUIDES: u16 = 0x0408;
const THUMBNAIL: u16 = 0x040C;
const ICC_PROFILE: u16 = 0x040F;

fn decode_default(doc: &DocSpec) -> Image {
    decode(&doc.to_bytes(), &DecodeOptions::default()).unwrap()
}

fn rgb_doc(width: u32, height: u32) -> DocSpec {
    let planes = (width * height * 3) as usize;
    DocSpec::new(HeaderSpec::rgb(width, height)).image(0, vec![0; planes])
}

/// Engine data written one token per line
fn engine_data(lines: &[&str]) -> Vec<u8> {
    let mut data = Vec::new();
    for line in lines {
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
    }
    data
}

fn type_tool(text: &'static str, engine: Vec<u8>) -> Vec<u8> {
    let mut b = Bytes::new();
    b.i16(1);
    for v in [1.0, 0.0, 0.0, 1.0, 5.0, 7.0] {
        b.f64(v);
    }
    b.i16(50).i32(16);
    Desc::new("TxLr")
        .item("Txt ", DescValue::Text(text))
        .item("EngineData", DescValue::Raw(engine))
        .write(&mut b);
    b.i16(1).i32(16);
    Desc::new("warp").write(&mut b);
    b.i32(0).i32(0).i32(0).i32(0);
    b.into_vec()
}

fn rgb_color(r: f64, g: f64, b: f64) -> DescValue {
    DescValue::Obj(
        Desc::new("RGBC")
            .item("Rd  ", DescValue::Doub(r))
            .item("Grn ", DescValue::Doub(g))
            .item("Bl  ", DescValue::Doub(b)),
    )
}

fn effects(descriptor: Desc) -> Vec<u8> {
    let mut b = Bytes::new();
    b.u32(0).u32(16);
    descriptor.write(&mut b);
    b.into_vec()
}

fn thumbnail(format: u32, width: u32, height: u32, jpeg: &[u8]) -> Vec<u8> {
    let mut b = Bytes::new();
    b.u32(format)
        .u32(width)
        .u32(height)
        .u32(width * 3)
        .u32(width * height * 3)
        .u32(jpeg.len() as u32)
        .u16(24)
        .u16(1)
        .raw(jpeg);
    b.into_vec()
}

#[test]
fn test_flat_rgb_document() {
    let doc = DocSpec::new(HeaderSpec::rgb(2, 1)).image(0, vec![10, 20, 30, 40, 255, 0]);
    let image = decode_default(&doc);

    assert_eq!((image.width, image.height), (2, 1));
    assert_eq!(image.depth, 8);
    assert_eq!(image.channels, 3);
    assert_eq!(image.color_mode, ColorMode::Rgb);
    assert_eq!(image.horizontal_resolution, 72.0);
    assert_eq!(image.vertical_resolution, 72.0);
    assert!(image.layers.is_empty());
    assert!(image.guides.is_empty());
    assert!(image.icc_profile.is_none());

    let merged = image.merged_image.unwrap();
    assert_eq!(merged.channels, 3);
    assert!(!merged.has_alpha);
    assert_eq!(merged.sample(1, 0, 0), Some(20.0 / 255.0));
    assert_eq!(merged.sample(0, 0, 2), Some(1.0));
}

#[test]
fn test_accept_probe() {
    let bytes = rgb_doc(1, 1).to_bytes();
    assert!(accept(&bytes));
    assert!(accept(&bytes[..Header::SIZE]));
    assert!(!accept(&bytes[..10]));
    assert!(!accept(b""));

    let mut version_two = bytes.clone();
    version_two[5] = 2;
    assert!(!Decoder::default().accept(&version_two));
}

#[test]
fn test_bad_signature_is_malformed() {
    let mut bytes = rgb_doc(1, 1).to_bytes();
    bytes[0] = b'9';
    let err = decode(&bytes, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Malformed(ChunkError::Mismatch {
            field: "signature",
            ..
        })
    ));
}

#[test]
fn test_truncated_layer_section() {
    let doc = rgb_doc(2, 2).layer(
        LayerSpec::new("cut")
            .bounds(0, 0, 2, 2)
            .channel(0, 0, &[1, 2, 3, 4]),
    );
    let bytes = doc.to_bytes();
    // header, empty color data and resources, layer section length, a few bytes
    let cut = &bytes[..Header::SIZE + 4 + 4 + 4 + 10];
    let err = decode(cut, &DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Malformed(ChunkError::UnexpectedEof { .. })
    ));
}

#[test]
fn test_oversized_layer_bounds_are_malformed() {
    let doc = rgb_doc(1, 1).layer(
        LayerSpec::new("huge")
            .bounds(i32::MIN + 1, i32::MIN + 1, i32::MAX, i32::MAX)
            .channel(0, 0, &[1]),
    );
    let err = decode(&doc.to_bytes(), &DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Malformed(ChunkError::InvalidLength {
            field: "layer width",
            ..
        })
    ));

    let image = decode(&doc.to_bytes(), &DecodeOptions::image_only()).unwrap();
    assert!(image.layers.is_empty());
}

#[test]
fn test_layer_without_enough_channel_data_has_no_raster() {
    let doc = rgb_doc(1, 1).layer(
        LayerSpec::new("sparse")
            .bounds(0, 0, 4000, 4000)
            .channel(0, 0, &[1, 2, 3]),
    );
    let image = decode_default(&doc);

    assert_eq!(image.layers[0].name, "sparse");
    assert_eq!(image.layers[0].bounds.width, 4000);
    assert!(image.layers[0].image.is_none());
}

#[test]
fn test_groups_rebuilt_from_disk_order() {
    let doc = rgb_doc(4, 4)
        .layer(LayerSpec::new("</Layer group>").section(3, None))
        .layer(LayerSpec::new("inside").bounds(0, 0, 1, 1))
        .layer(LayerSpec::new("Folder").section(1, Some("pass")))
        .layer(LayerSpec::new("top"));
    let image = decode_default(&doc);

    let names: Vec<&str> = image.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["top", "Folder"]);

    let folder = &image.layers[1];
    assert_eq!(folder.kind, LayerKind::Group);
    assert_eq!(folder.blend_mode, BlendMode::PassThrough);
    assert!(folder.open);
    assert_eq!(folder.children.len(), 1);
    assert_eq!(folder.children[0].name, "inside");
    assert_eq!(folder.children[0].kind, LayerKind::Image);

    let walked: Vec<&str> = image.walk_layers().map(|l| l.name.as_str()).collect();
    assert_eq!(walked, ["top", "Folder", "inside"]);
}

#[test]
fn test_closed_group_without_section_blend() {
    let mut group = LayerSpec::new("Closed").section(2, None);
    group.blend = "scrn";
    let doc = rgb_doc(1, 1)
        .layer(LayerSpec::new("</Layer group>").section(3, None))
        .layer(group)
        .layer(LayerSpec::new("divider").section(0, None));
    let image = decode_default(&doc);

    assert_eq!(image.layers.len(), 1);
    let group = &image.layers[0];
    assert!(!group.open);
    assert_eq!(group.blend_mode, BlendMode::Screen);
    assert!(group.children.is_empty());
}

#[test]
fn test_layer_record_attributes() {
    let mut layer = LayerSpec::new("").bounds(1, 2, 3, 5);
    layer.blend = "mul ";
    layer.opacity = 51;
    layer.clipping = 1;
    layer.flags = 0x02;
    let doc = rgb_doc(8, 8).layer(layer).layer(LayerSpec::new(""));
    let image = decode_default(&doc);

    assert_eq!(image.layers[0].name, "<Layer 1>");
    let layer = &image.layers[1];
    assert_eq!(layer.name, "<Layer 2>");
    assert_eq!(layer.blend_mode, BlendMode::Multiply);
    assert!((layer.opacity - 0.2).abs() < 1e-6);
    assert!(!layer.clip_base);
    assert!(!layer.visible);
    assert_eq!(
        (layer.bounds.x, layer.bounds.y, layer.bounds.width, layer.bounds.height),
        (2, 1, 3, 2)
    );
    assert!(image.layers[0].visible);
    assert!(image.layers[0].clip_base);
}

#[test]
fn test_layer_pixels() {
    let red: [u8; 4] = [255, 128, 0, 0];
    let green: [u8; 4] = [0, 64, 64, 0];
    let doc = rgb_doc(2, 2).layer(
        LayerSpec::new("pixels")
            .bounds(0, 0, 2, 2)
            .channel(-1, 0, &[255, 255, 0, 0])
            .channel(0, 1, &encode_plane(&red, 2))
            .channel(1, 1, &encode_plane(&green, 2))
            .channel(2, 0, &[9, 9, 9, 9])
            .channel(-2, 0, &[1, 1, 1, 1]),
    );
    let image = decode_default(&doc);

    let bitmap = image.layers[0].image.as_ref().unwrap();
    assert_eq!((bitmap.width, bitmap.height), (2, 2));
    assert_eq!(bitmap.channels, 4);
    assert!(bitmap.has_alpha);
    assert_eq!(bitmap.sample(1, 0, 0), Some(128.0 / 255.0));
    assert_eq!(bitmap.sample(0, 1, 1), Some(64.0 / 255.0));
    assert_eq!(bitmap.sample(1, 1, 2), Some(9.0 / 255.0));
    assert_eq!(bitmap.sample(0, 0, 3), Some(1.0));
    assert_eq!(bitmap.sample(0, 1, 3), Some(0.0));
}

#[test]
fn test_zip_data_is_skipped() {
    let doc = DocSpec::new(HeaderSpec::rgb(1, 1))
        .layer(
            LayerSpec::new("zipped")
                .bounds(0, 0, 1, 1)
                .channel(0, 2, &[0x78, 0x9c, 0x00]),
        )
        .image(3, vec![0x78, 0x9c]);
    let image = decode_default(&doc);

    assert_eq!(image.layers[0].name, "zipped");
    let bitmap = image.layers[0].image.as_ref().unwrap();
    assert_eq!(bitmap.sample(0, 0, 0), Some(0.0));
    assert!(image.merged_image.is_none());
}

#[test]
fn test_rle_composite_with_merged_alpha() {
    let mut header = HeaderSpec::rgb(3, 1);
    header.channels = 4;
    let planes: [[u8; 3]; 4] = [[1, 1, 1], [2, 3, 4], [0, 0, 9], [255, 0, 255]];
    let rows: Vec<Vec<u8>> = planes.iter().map(|row| packbits_encode(row)).collect();
    let mut data = Bytes::new();
    for row in &rows {
        data.u16(row.len() as u16);
    }
    for row in &rows {
        data.raw(row);
    }

    let mut doc = DocSpec::new(header)
        .layer(LayerSpec::new("only"))
        .image(1, data.into_vec());
    doc.merged_alpha = true;

    for options in [DecodeOptions::default(), DecodeOptions::image_only()] {
        let image = decode(&doc.to_bytes(), &options).unwrap();
        let merged = image.merged_image.unwrap();
        assert_eq!(merged.channels, 4);
        assert!(merged.has_alpha);
        assert_eq!(merged.sample(1, 0, 1), Some(3.0 / 255.0));
        assert_eq!(merged.sample(2, 0, 2), Some(9.0 / 255.0));
        assert_eq!(merged.sample(1, 0, 3), Some(0.0));
    }

    doc.merged_alpha = false;
    let merged = decode_default(&doc).merged_image.unwrap();
    assert_eq!(merged.channels, 3);
    assert!(!merged.has_alpha);
}

#[test]
fn test_cmyk_composite_is_inverted() {
    let header = HeaderSpec {
        channels: 4,
        width: 1,
        height: 1,
        depth: 8,
        color_mode: 4,
    };
    let doc = DocSpec::new(header).image(0, vec![0, 255, 255, 0]);
    let image = decode_default(&doc);

    assert_eq!(image.color_mode, ColorMode::Cmyk);
    let merged = image.merged_image.unwrap();
    assert_eq!(merged.channels, 4);
    assert!(!merged.has_alpha);
    assert_eq!(merged.sample(0, 0, 0), Some(1.0));
    assert_eq!(merged.sample(0, 0, 1), Some(0.0));
    assert_eq!(merged.sample(0, 0, 3), Some(1.0));
}

#[test]
fn test_indexed_composite() {
    let header = HeaderSpec {
        channels: 1,
        width: 2,
        height: 1,
        depth: 8,
        color_mode: 2,
    };
    let mut palette = vec![0u8; 768];
    palette[0] = 255; // red of index 0
    palette[256 + 1] = 255; // green of index 1
    let mut doc = DocSpec::new(header).image(0, vec![0, 1]);
    doc.color_data = palette;
    let image = decode_default(&doc);

    assert_eq!(image.color_mode, ColorMode::Indexed);
    let merged = image.merged_image.unwrap();
    assert_eq!(merged.channels, 3);
    assert_eq!(merged.sample(0, 0, 0), Some(1.0));
    assert_eq!(merged.sample(0, 0, 1), Some(0.0));
    assert_eq!(merged.sample(1, 0, 1), Some(1.0));
}

#[test]
fn test_resources() {
    let mut resolution = Bytes::new();
    resolution
        .i32(144 << 16)
        .u16(1)
        .u16(1)
        .i32(300 << 16)
        .u16(1)
        .u16(1);
    let mut guides = Bytes::new();
    guides.i32(1).raw(&[0; 8]).i32(2);
    guides.i32(320).u8(0);
    guides.i32(64).u8(1);

    let doc = rgb_doc(1, 1)
        .resource(0x0400, vec![1, 2, 3, 4, 5])
        .resource(RESOLUTION, resolution.into_vec())
        .resource(GUIDES, guides.into_vec())
        .resource(ICC_PROFILE, vec![7, 8, 9]);
    let image = decode_default(&doc);

    assert_eq!(image.horizontal_resolution, 144.0);
    assert_eq!(image.vertical_resolution, 300.0);
    assert_eq!(image.icc_profile, Some(vec![7, 8, 9]));
    assert_eq!(image.guides.len(), 2);
    assert_eq!(image.guides[0].orientation, Orientation::Vertical);
    assert_eq!(image.guides[0].position, 10.0);
    assert_eq!(image.guides[1].orientation, Orientation::Horizontal);
    assert_eq!(image.guides[1].position, 2.0);

    let image = decode(&doc.to_bytes(), &DecodeOptions::image_only()).unwrap();
    assert!(image.guides.is_empty());
    assert_eq!(image.vertical_resolution, 300.0);
}

#[test]
fn test_thumbnail() {
    let raster = image::RgbImage::from_pixel(4, 3, image::Rgb([200, 10, 10]));
    let mut jpeg = Vec::new();
    raster
        .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
        .unwrap();
    let doc = rgb_doc(1, 1).resource(THUMBNAIL, thumbnail(1, 4, 3, &jpeg));

    assert!(decode_default(&doc).thumbnail.is_none());

    let options = DecodeOptions {
        decode_thumbnail: true,
        ..DecodeOptions::default()
    };
    let decoded = decode(&doc.to_bytes(), &options).unwrap().thumbnail.unwrap();
    assert_eq!(decoded.dimensions(), (4, 3));

    let broken = rgb_doc(1, 1).resource(THUMBNAIL, thumbnail(1, 4, 3, &[1, 2, 3]));
    assert!(decode(&broken.to_bytes(), &options).unwrap().thumbnail.is_none());
}

#[test]
fn test_raw_rgb_thumbnail_is_rejected() {
    let doc = rgb_doc(1, 1).resource(THUMBNAIL, thumbnail(0, 1, 1, &[]));
    let err = decode(&doc.to_bytes(), &DecodeOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Malformed(ChunkError::Mismatch { .. })
    ));
}

#[test]
fn test_drop_shadow() {
    let shadow = Desc::new("DrSh")
        .item("enab", DescValue::Bool(true))
        .item("present", DescValue::Bool(true))
        .item("Md  ", DescValue::Enum("BlnM", "Mltp"))
        .item("Clr ", rgb_color(255.0, 0.0, 0.0))
        .item("Opct", DescValue::Unit("#Prc", 75.0))
        .item("lagl", DescValue::Unit("#Ang", 120.0))
        .item("Dstn", DescValue::Unit("#Pxl", 5.0))
        .item("blur", DescValue::Unit("#Pxl", 3.0));
    let disabled = Desc::new("DrSh").item("enab", DescValue::Bool(false));
    let misfiled = Desc::new("IrSh").item("enab", DescValue::Bool(true));
    let style = Desc::new("null")
        .item("masterFXSwitch", DescValue::Bool(true))
        .item("DrSh", DescValue::Obj(shadow.clone()))
        .item(
            "dropShadowMulti",
            DescValue::List(vec![
                DescValue::Obj(disabled),
                DescValue::Obj(misfiled),
                DescValue::Obj(shadow),
            ]),
        );
    let doc = rgb_doc(1, 1).layer(LayerSpec::new("styled").property("lfx2", effects(style)));
    let image = decode_default(&doc);

    let effects = image.layers[0].effects.as_ref().unwrap();
    assert_eq!(effects.shadows.len(), 2);
    let shadow = &effects.shadows[0];
    assert_eq!(shadow.kind, ShadowKind::Outer);
    assert_eq!(shadow.blend_mode, BlendMode::Multiply);
    assert_eq!(shadow.color, Color::rgb(1.0, 0.0, 0.0));
    assert!((shadow.opacity - 0.75).abs() < 1e-6);
    assert!((shadow.angle - 120.0).abs() < 1e-4);
    assert_eq!(shadow.distance, 5.0);
    assert_eq!(shadow.blur, 3.0);
}

#[test]
fn test_effects_master_switch_and_precedence() {
    let inner = Desc::new("IrSh").item("Dstn", DescValue::Unit("#Pnt", 36.0));
    let multi = Desc::new("null").item("IrSh", DescValue::Obj(inner.clone()));
    let legacy = Desc::new("null").item("DrSh", DescValue::Obj(Desc::new("DrSh")));
    let off = Desc::new("null")
        .item("masterFXSwitch", DescValue::Bool(false))
        .item("IrSh", DescValue::Obj(inner));

    let mut resolution = Bytes::new();
    resolution.i32(144 << 16).u16(1).u16(1).i32(144 << 16).u16(1).u16(1);
    let doc = rgb_doc(1, 1)
        .resource(RESOLUTION, resolution.into_vec())
        .layer(LayerSpec::new("off").property("lfx2", effects(off)))
        .layer(
            LayerSpec::new("both")
                .property("lfx2", effects(legacy))
                .property("lmfx", effects(multi)),
        )
        .layer(LayerSpec::new("plain"));
    let image = decode_default(&doc);

    assert!(image.layers[0].effects.is_none());
    let both = image.layers[1].effects.as_ref().unwrap();
    assert_eq!(both.shadows.len(), 1);
    assert_eq!(both.shadows[0].kind, ShadowKind::Inner);
    assert_eq!(both.shadows[0].distance, 72.0);
    assert_eq!(both.shadows[0].color, Color::BLACK);
    assert!(image.layers[2].effects.as_ref().unwrap().shadows.is_empty());
}

fn corner_knot(b: &mut Bytes, x: i32, y: i32) {
    b.i16(1);
    for _ in 0..3 {
        b.i32(y << 16).i32(x << 16);
    }
}

#[test]
fn test_shape_layer() {
    let mut mask = Bytes::new();
    mask.u32(3).u32(0);
    mask.i16(0).u16(3).u16(1).u16(0).raw(&[0; 18]);
    corner_knot(&mut mask, 16, 16);
    corner_knot(&mut mask, 80, 16);
    corner_knot(&mut mask, 16, 80);

    let mut fill = Bytes::new();
    fill.u32(16);
    Desc::new("null")
        .item("Clr ", rgb_color(0.0, 0.0, 255.0))
        .write(&mut fill);

    let mut stroke = Bytes::new();
    stroke.u32(2);
    Desc::new("strokeStyle")
        .item("strokeEnabled", DescValue::Bool(true))
        .item("fillEnabled", DescValue::Bool(false))
        .item("strokeStyleLineWidth", DescValue::Unit("#Pxl", 4.0))
        .item(
            "strokeStyleLineCapType",
            DescValue::Enum("strokeStyleLineCapType", "strokeStyleRoundCap"),
        )
        .item("strokeStyleOpacity", DescValue::Unit("#Prc", 50.0))
        .item(
            "strokeStyleContent",
            DescValue::Obj(
                Desc::new("solidColorLayer").item("Clr ", rgb_color(255.0, 255.0, 255.0)),
            ),
        )
        .write(&mut stroke);

    let doc = rgb_doc(256, 256).layer(
        LayerSpec::new("")
            .bounds(16, 16, 80, 80)
            .property("SoCo", fill.into_vec())
            .property("vmsk", mask.into_vec())
            .property("vstk", stroke.into_vec())
            .property("iOpa", vec![51, 0, 0, 0]),
    );
    let image = decode_default(&doc);

    let layer = &image.layers[0];
    assert_eq!(layer.kind, LayerKind::Shape);
    assert_eq!(layer.name, "<Shape 1>");
    assert!(layer.image.is_none());

    let shape = layer.shape.as_ref().unwrap();
    assert_eq!(shape.style, ShapeStyle::Stroke);
    assert_eq!(shape.fill_color, Color::rgb(0.0, 0.0, 1.0));
    assert!((shape.fill_opacity - 0.2).abs() < 1e-6);

    assert_eq!(shape.paths.len(), 1);
    let path = &shape.paths[0];
    assert_eq!(path.kind, PathKind::Closed);
    assert_eq!(path.op, PathOp::Add);
    assert_eq!(
        path.commands,
        vec![
            PathCommand::MoveTo { x: 0.0, y: 0.0 },
            PathCommand::LineTo { x: 64.0, y: 0.0 },
            PathCommand::LineTo { x: 0.0, y: 64.0 },
            PathCommand::LineTo { x: 0.0, y: 0.0 },
            PathCommand::Close,
        ]
    );

    let stroke = shape.stroke.as_ref().unwrap();
    assert_eq!(stroke.width, 4.0);
    assert_eq!(stroke.cap, LineCap::Round);
    assert!((stroke.opacity - 0.5).abs() < 1e-6);
    assert_eq!(stroke.color, Color::rgb(1.0, 1.0, 1.0));
    assert!(stroke.dashes.is_empty());
}

#[test]
fn test_text_layer() {
    let engine = engine_data(&[
        "<<",
        "/EngineDict",
        "<<",
        "/StyleRun",
        "<<",
        "/RunArray [",
        "<<",
        "/StyleSheet",
        "<<",
        "/StyleSheetData",
        "<<",
        "/FontSize 24.0",
        ">>",
        ">>",
        ">>",
        "]",
        "/RunLengthArray [ 6 ]",
        ">>",
        ">>",
        ">>",
    ]);
    let doc = rgb_doc(1, 1).layer(
        LayerSpec::new("Title").property("TySh", type_tool("Hello", engine)),
    );
    let image = decode_default(&doc);

    let layer = &image.layers[0];
    assert_eq!(layer.kind, LayerKind::Text);
    let text = layer.text.as_ref().unwrap();
    assert_eq!(text.text, "Hello");
    assert_eq!(text.transform, [1.0, 0.0, 0.0, 1.0, 5.0, 7.0]);
    assert_eq!(text.style_runs.len(), 1);
    assert_eq!((text.style_runs[0].start, text.style_runs[0].end), (0, 5));
    assert_eq!(text.style_runs[0].font_size, Some(24.0));
    assert!(text.paragraph_runs.is_empty());
}

#[test]
fn test_bad_engine_data_fails_decode() {
    let engine = engine_data(&["<<", "/FontSize 1.2.3", ">>"]);
    let doc = rgb_doc(1, 1).layer(LayerSpec::new("t").property("TySh", type_tool("x", engine)));

    let err = decode(&doc.to_bytes(), &DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, DecodeError::TextEngine(_)));

    // not parsed at all when text is off
    let image = decode(&doc.to_bytes(), &DecodeOptions::layer_metadata_only()).unwrap();
    assert_eq!(image.layers[0].kind, LayerKind::Text);
    assert!(image.layers[0].text.is_none());
}

#[test]
fn test_option_presets() {
    let doc = rgb_doc(2, 1)
        .layer(
            LayerSpec::new("pixels")
                .bounds(0, 0, 1, 2)
                .channel(0, 0, &[1, 2])
                .channel(1, 0, &[3, 4])
                .channel(2, 0, &[5, 6]),
        )
        .layer(LayerSpec::new("adjust").property("levl", vec![0, 2]));

    let metadata = decode(&doc.to_bytes(), &DecodeOptions::layer_metadata_only()).unwrap();
    assert_eq!(metadata.layers.len(), 2);
    assert_eq!(metadata.layers[0].kind, LayerKind::Adjustment);
    assert!(metadata.layers[1].image.is_none());
    assert!(metadata.merged_image.is_some());

    let full = decode_default(&doc);
    assert!(full.layers[1].image.is_some());

    let image_only = decode(&doc.to_bytes(), &DecodeOptions::image_only()).unwrap();
    assert!(image_only.layers.is_empty());
    assert!(image_only.merged_image.is_some());
}

#[test]
fn test_deep_document_uses_tagged_layers() {
    let mut header = HeaderSpec::rgb(1, 1);
    header.depth = 16;
    let mut doc = DocSpec::new(header).image(0, vec![0xFF, 0xFF, 0, 0, 0x80, 0x00]);
    doc.global_properties.push((
        "Lr16",
        layers_body(&[LayerSpec::new("deep"), LayerSpec::new("deeper")], false),
    ));
    let image = decode_default(&doc);

    let names: Vec<&str> = image.layers.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["deeper", "deep"]);

    let merged = image.merged_image.unwrap();
    assert_eq!(merged.sample(0, 0, 0), Some(1.0));
    assert_eq!(merged.sample(0, 0, 1), Some(0.0));
}

#[test]
fn test_options_json_round_trip_through_decoder() {
    let options: DecodeOptions = serde_json::from_str(r#"{"decode_layers": false}"#).unwrap();
    let decoder = Decoder::new(options);
    assert!(!decoder.options().decode_layers);

    let doc = rgb_doc(1, 1).layer(LayerSpec::new("hidden"));
    let image = decoder.decode(&doc.to_bytes()).unwrap();
    assert!(image.layers.is_empty());

    let json = serde_json::to_value(&image).unwrap();
    assert_eq!(json["color_mode"], "rgb");
    assert!(json.get("thumbnail").is_none());
}
