//! Units and colors stored in descriptors

use crate::model::Color;
use crate::psd::Descriptor;

const MILLIMETERS_PER_INCH: f64 = 25.4;
const CENTIMETERS_PER_INCH: f64 = 2.54;

/// Unit codes of `UntF` values
pub mod unit {
    pub const PIXELS: &str = "#Pxl";
    pub const POINTS: &str = "#Pnt";
    pub const INCHES: &str = "RrIn";
    pub const MILLIMETERS: &str = "#Mlm";
    pub const CENTIMETERS: &str = "RrCm";
    pub const PERCENT: &str = "#Prc";
    pub const ANGLE: &str = "#Ang";
    pub const NONE: &str = "#Nne";
}

/// Convert a unit value to pixels at `resolution` dpi
///
/// Percentages become fractions and angles become turns (degrees / 360).
/// Unitless and unknown units pass through.
pub fn resolve_unit(unit_code: &str, value: f64, resolution: f32) -> f64 {
    let resolution = f64::from(resolution);
    match unit_code {
        unit::PIXELS => value,
        unit::POINTS => value * resolution / 72.0,
        unit::INCHES => value * resolution,
        unit::MILLIMETERS => value / MILLIMETERS_PER_INCH * resolution,
        unit::CENTIMETERS => value / CENTIMETERS_PER_INCH * resolution,
        unit::PERCENT => value / 100.0,
        unit::ANGLE => value / 360.0,
        _ => value,
    }
}

/// Resolved unit value at `path`, 0 when absent
pub fn unit_value(descriptor: &Descriptor, path: &str, resolution: f32) -> f32 {
    descriptor
        .get_unit(path)
        .map_or(0.0, |(code, value)| resolve_unit(code, value, resolution) as f32)
}

/// Color stored under the `Clr ` key of `descriptor`, black when missing
pub fn descriptor_color(descriptor: &Descriptor) -> Color {
    descriptor
        .get_descriptor("Clr ")
        .and_then(color_from_class)
        .unwrap_or(Color::BLACK)
}

/// Decode a color object (`RGBC`, `HSBC`, `CMYC`, `LbCl` or `Grsc`)
pub fn color_from_class(color: &Descriptor) -> Option<Color> {
    let get = |key: &str| color.get_f64(key).unwrap_or(0.0) as f32;
    let rgb = match color.class_id.as_str() {
        "RGBC" => [get("Rd  ") / 255.0, get("Grn ") / 255.0, get("Bl  ") / 255.0],
        "HSBC" => {
            let hue = color
                .get_unit("H   ")
                .map_or(0.0, |(code, value)| resolve_unit(code, value, 0.0) as f32);
            hsb_to_rgb(hue, get("Strt") / 100.0, get("Brgh") / 100.0)
        }
        "CMYC" => cmyk_to_rgb(
            get("Cyn ") / 100.0,
            get("Mgnt") / 100.0,
            get("Ylw ") / 100.0,
            get("Blck") / 100.0,
        ),
        "LbCl" => lab_to_rgb(get("Lmnc"), get("A   "), get("B   ")),
        "Grsc" => {
            let gray = linear_to_srgb(get("Gry ") / 255.0);
            [gray, gray, gray]
        }
        other => {
            tracing::debug!("Unsupported color class {:?}", other);
            return None;
        }
    };
    let [r, g, b] = rgb.map(|c| c.clamp(0.0, 1.0));
    Some(Color::rgb(r, g, b))
}

/// Hue in turns, saturation and brightness in `0..=1`
fn hsb_to_rgb(hue: f32, saturation: f32, brightness: f32) -> [f32; 3] {
    if saturation <= 0.0 {
        return [brightness; 3];
    }
    let h = (hue - hue.floor()) * 6.0;
    let f = h - h.floor();
    let p = brightness * (1.0 - saturation);
    let q = brightness * (1.0 - saturation * f);
    let t = brightness * (1.0 - saturation * (1.0 - f));
    match h as u32 {
        0 => [brightness, t, p],
        1 => [q, brightness, p],
        2 => [p, brightness, t],
        3 => [p, q, brightness],
        4 => [t, p, brightness],
        _ => [brightness, p, q],
    }
}

/// Naive conversion without a CMYK profile
fn cmyk_to_rgb(c: f32, m: f32, y: f32, k: f32) -> [f32; 3] {
    let k = 1.0 - k;
    [(1.0 - c) * k, (1.0 - m) * k, (1.0 - y) * k]
}

/// CIE L*a*b* (D65) to sRGB
fn lab_to_rgb(l: f32, a: f32, b: f32) -> [f32; 3] {
    const WHITE: [f32; 3] = [0.950_47, 1.0, 1.088_83];
    const DELTA: f32 = 6.0 / 29.0;

    let f_inv = |t: f32| {
        if t > DELTA {
            t * t * t
        } else {
            3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
        }
    };
    let fy = (l + 16.0) / 116.0;
    let x = WHITE[0] * f_inv(fy + a / 500.0);
    let y = WHITE[1] * f_inv(fy);
    let z = WHITE[2] * f_inv(fy - b / 200.0);

    let r = 3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z;
    let g = -0.969_266 * x + 1.876_010_8 * y + 0.041_556 * z;
    let b = 0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z;
    [r, g, b].map(|c| linear_to_srgb(c.clamp(0.0, 1.0)))
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}
