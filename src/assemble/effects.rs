//! Layer effects (shadows)

use super::color::{descriptor_color, unit_value};
use crate::model::{BlendMode, Effects, Shadow, ShadowKind};
use crate::psd::descriptor::DescriptorValue;
use crate::psd::properties::property_key;
use crate::psd::{Descriptor, PropertyData, RawLayer};

const MASTER_SWITCH: &str = "masterFXSwitch";
const ENABLED: &str = "enab";
const PRESENT: &str = "present";

/// Effects block of a layer, `lmfx` taking precedence over `lfx2`
///
/// Returns `None` when the layer has no effects block. With the master
/// switch off the block yields an empty effect list.
pub fn extract_effects(layer: &RawLayer, resolution: f32) -> Option<Effects> {
    let descriptor = [property_key::MULTI_EFFECTS, property_key::EFFECTS]
        .into_iter()
        .find_map(|key| match &layer.property(key)?.data {
            PropertyData::Effects(effects) => Some(&effects.descriptor),
            _ => None,
        })?;

    let mut effects = Effects::default();
    if descriptor.get_bool(MASTER_SWITCH) {
        for kind in [ShadowKind::Inner, ShadowKind::Outer] {
            collect_shadows(descriptor, kind, resolution, &mut effects.shadows);
        }
    }
    Some(effects)
}

fn shadow_keys(kind: ShadowKind) -> (&'static str, &'static str) {
    match kind {
        ShadowKind::Inner => ("IrSh", "innerShadowMulti"),
        ShadowKind::Outer => ("DrSh", "dropShadowMulti"),
    }
}

fn collect_shadows(effects: &Descriptor, kind: ShadowKind, resolution: f32, out: &mut Vec<Shadow>) {
    let (single, multi) = shadow_keys(kind);

    if let Some(descriptor) = effects.get_descriptor(single) {
        out.extend(shadow(descriptor, kind, resolution));
    }

    for item in effects.get_list(multi).unwrap_or_default() {
        if let DescriptorValue::Descriptor(descriptor) = item {
            if descriptor.class_id == single {
                out.extend(shadow(descriptor, kind, resolution));
            }
        }
    }
}

fn shadow(descriptor: &Descriptor, kind: ShadowKind, resolution: f32) -> Option<Shadow> {
    if !descriptor.get_bool(ENABLED) || !descriptor.get_bool(PRESENT) {
        return None;
    }
    Some(Shadow {
        kind,
        blur: unit_value(descriptor, "blur", resolution),
        angle: unit_value(descriptor, "lagl", resolution) * 360.0,
        distance: unit_value(descriptor, "Dstn", resolution),
        opacity: unit_value(descriptor, "Opct", resolution),
        blend_mode: descriptor
            .get_enum("Md  ")
            .map(BlendMode::from_key)
            .unwrap_or_default(),
        color: descriptor_color(descriptor),
    })
}
