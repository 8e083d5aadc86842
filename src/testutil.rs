//! Synthetic document writer used by the tests
//!
//! Builds byte-exact layered documents so tests don't depend on sample
//! files. Writes into a `Vec<u8>` never fail, hence the unwraps.

#![allow(clippy::unwrap_used)]

use byteorder::{BigEndian, WriteBytesExt};

/// Growable big-endian byte buffer
#[derive(Debug, Default, Clone)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.0.write_u16::<BigEndian>(v).unwrap();
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.0.write_i16::<BigEndian>(v).unwrap();
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.0.write_u32::<BigEndian>(v).unwrap();
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.0.write_i32::<BigEndian>(v).unwrap();
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.0.write_f64::<BigEndian>(v).unwrap();
        self
    }

    pub fn raw(&mut self, v: &[u8]) -> &mut Self {
        self.0.extend_from_slice(v);
        self
    }

    /// Four-character code
    pub fn key(&mut self, v: &str) -> &mut Self {
        assert_eq!(v.len(), 4, "key {:?} must be four bytes", v);
        self.raw(v.as_bytes())
    }

    /// UTF-16BE with count prefix and trailing NUL
    pub fn unicode(&mut self, v: &str) -> &mut Self {
        let units: Vec<u16> = v.encode_utf16().collect();
        self.u32(units.len() as u32 + 1);
        for unit in units {
            self.u16(unit);
        }
        self.u16(0)
    }

    /// Length-prefixed id, using the zero-length form for four-byte ids
    pub fn min_string(&mut self, v: &str) -> &mut Self {
        if v.len() == 4 {
            self.u32(0);
        } else {
            self.u32(v.len() as u32);
        }
        self.raw(v.as_bytes())
    }

    /// Pascal string padded so that length byte + text is a multiple of `multiple`
    pub fn pascal(&mut self, v: &str, multiple: usize) -> &mut Self {
        self.u8(v.len() as u8);
        self.raw(v.as_bytes());
        let written = 1 + v.len();
        let padded = written.div_ceil(multiple) * multiple;
        self.raw(&vec![0; padded - written])
    }

    /// `u32` length prefix followed by `body`
    pub fn sized(&mut self, body: &[u8]) -> &mut Self {
        self.u32(body.len() as u32);
        self.raw(body)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

/// Descriptor value for [`Desc`]
#[derive(Debug, Clone)]
pub enum DescValue {
    Bool(bool),
    Long(i32),
    Doub(f64),
    Unit(&'static str, f64),
    Text(&'static str),
    Enum(&'static str, &'static str),
    Obj(Desc),
    List(Vec<DescValue>),
    Raw(Vec<u8>),
}

/// Descriptor writer
#[derive(Debug, Clone)]
pub struct Desc {
    class_id: String,
    items: Vec<(String, DescValue)>,
}

impl Desc {
    pub fn new(class_id: &str) -> Self {
        Self {
            class_id: class_id.to_string(),
            items: Vec::new(),
        }
    }

    pub fn item(mut self, key: &str, value: DescValue) -> Self {
        self.items.push((key.to_string(), value));
        self
    }

    pub fn write(&self, b: &mut Bytes) {
        b.unicode("");
        b.min_string(&self.class_id);
        b.i32(self.items.len() as i32);
        for (key, value) in &self.items {
            b.min_string(key);
            write_value(b, value);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut b = Bytes::new();
        self.write(&mut b);
        b.into_vec()
    }
}

fn write_value(b: &mut Bytes, value: &DescValue) {
    match value {
        DescValue::Bool(v) => {
            b.key("bool").u8(u8::from(*v));
        }
        DescValue::Long(v) => {
            b.key("long").i32(*v);
        }
        DescValue::Doub(v) => {
            b.key("doub").f64(*v);
        }
        DescValue::Unit(unit, v) => {
            b.key("UntF").key(unit).f64(*v);
        }
        DescValue::Text(v) => {
            b.key("TEXT").unicode(v);
        }
        DescValue::Enum(type_id, v) => {
            b.key("enum").min_string(type_id).min_string(v);
        }
        DescValue::Obj(desc) => {
            b.key("Objc");
            desc.write(b);
        }
        DescValue::List(items) => {
            b.key("VlLs").i32(items.len() as i32);
            for item in items {
                write_value(b, item);
            }
        }
        DescValue::Raw(data) => {
            b.key("tdta").sized(data);
        }
    }
}

/// Header fields of a synthetic document
#[derive(Debug, Clone)]
pub struct HeaderSpec {
    pub channels: u16,
    pub width: u32,
    pub height: u32,
    pub depth: u16,
    pub color_mode: u16,
}

impl HeaderSpec {
    pub fn rgb(width: u32, height: u32) -> Self {
        Self {
            channels: 3,
            width,
            height,
            depth: 8,
            color_mode: 3,
        }
    }

    pub fn write(&self, b: &mut Bytes) {
        b.raw(b"8BPS").u16(1).raw(&[0; 6]);
        b.u16(self.channels)
            .u32(self.height)
            .u32(self.width)
            .u16(self.depth)
            .u16(self.color_mode);
    }
}

/// One layer record plus its channel data
#[derive(Debug, Clone)]
pub struct LayerSpec {
    pub name: String,
    pub bounds: (i32, i32, i32, i32),
    pub blend: &'static str,
    pub opacity: u8,
    pub clipping: u8,
    pub flags: u8,
    /// Channel id and payload (compression tag + data)
    pub channels: Vec<(i16, Vec<u8>)>,
    /// Property key and payload
    pub properties: Vec<(&'static str, Vec<u8>)>,
    /// Raw mask adjustment block, written after its length prefix
    pub mask: Vec<u8>,
}

impl LayerSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bounds: (0, 0, 0, 0),
            blend: "norm",
            opacity: 255,
            clipping: 0,
            flags: 0,
            channels: Vec::new(),
            properties: Vec::new(),
            mask: Vec::new(),
        }
    }

    /// Bounds as top, left, bottom, right
    pub fn bounds(mut self, top: i32, left: i32, bottom: i32, right: i32) -> Self {
        self.bounds = (top, left, bottom, right);
        self
    }

    pub fn channel(mut self, id: i16, compression: u16, data: &[u8]) -> Self {
        let mut payload = Bytes::new();
        payload.u16(compression).raw(data);
        self.channels.push((id, payload.into_vec()));
        self
    }

    pub fn property(mut self, key: &'static str, payload: Vec<u8>) -> Self {
        self.properties.push((key, payload));
        self
    }

    /// Section divider property
    pub fn section(self, kind: u32, blend: Option<&str>) -> Self {
        let mut b = Bytes::new();
        b.u32(kind);
        if let Some(blend) = blend {
            b.raw(b"8BIM").key(blend);
        }
        self.property("lsct", b.into_vec())
    }

    fn write_record(&self, b: &mut Bytes) {
        let (top, left, bottom, right) = self.bounds;
        b.i32(top).i32(left).i32(bottom).i32(right);
        b.u16(self.channels.len() as u16);
        for (id, payload) in &self.channels {
            b.i16(*id).u32(payload.len() as u32);
        }
        b.raw(b"8BIM").key(self.blend);
        b.u8(self.opacity).u8(self.clipping).u8(self.flags).u8(0);

        let mut extras = Bytes::new();
        extras.sized(&self.mask);
        extras.u32(0); // blend ranges
        extras.pascal(&self.name, 4);
        for (key, payload) in &self.properties {
            write_property(&mut extras, key, payload);
        }
        b.sized(&extras.into_vec());
    }
}

/// Tagged property block
pub fn write_property(b: &mut Bytes, key: &str, payload: &[u8]) {
    b.raw(b"8BIM").key(key).sized(payload);
}

/// Layer list body: count, records, channel data
pub fn layers_body(layers: &[LayerSpec], merged_alpha: bool) -> Vec<u8> {
    let mut b = Bytes::new();
    let count = layers.len() as i16;
    b.i16(if merged_alpha { -count } else { count });
    for layer in layers {
        layer.write_record(&mut b);
    }
    for layer in layers {
        for (_, payload) in &layer.channels {
            b.raw(payload);
        }
    }
    b.into_vec()
}

/// A whole document
#[derive(Debug, Clone)]
pub struct DocSpec {
    pub header: HeaderSpec,
    pub color_data: Vec<u8>,
    pub resources: Vec<(u16, Vec<u8>)>,
    pub layers: Vec<LayerSpec>,
    pub merged_alpha: bool,
    pub global_properties: Vec<(&'static str, Vec<u8>)>,
    pub compression: u16,
    pub image_data: Vec<u8>,
}

impl DocSpec {
    pub fn new(header: HeaderSpec) -> Self {
        Self {
            header,
            color_data: Vec::new(),
            resources: Vec::new(),
            layers: Vec::new(),
            merged_alpha: false,
            global_properties: Vec::new(),
            compression: 0,
            image_data: Vec::new(),
        }
    }

    pub fn resource(mut self, id: u16, data: Vec<u8>) -> Self {
        self.resources.push((id, data));
        self
    }

    pub fn layer(mut self, layer: LayerSpec) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn image(mut self, compression: u16, data: Vec<u8>) -> Self {
        self.compression = compression;
        self.image_data = data;
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut b = Bytes::new();
        self.header.write(&mut b);
        b.sized(&self.color_data);

        let mut resources = Bytes::new();
        for (id, data) in &self.resources {
            resources.raw(b"8BIM").u16(*id).u8(0).u8(0);
            resources.sized(data);
            if data.len() % 2 == 1 {
                resources.u8(0);
            }
        }
        b.sized(&resources.into_vec());

        let mut info = Bytes::new();
        if !self.layers.is_empty() {
            let mut list = layers_body(&self.layers, self.merged_alpha);
            if list.len() % 2 == 1 {
                list.push(0);
            }
            info.sized(&list);
        } else {
            info.u32(0);
        }
        info.u32(0); // global layer mask info
        for (key, payload) in &self.global_properties {
            write_property(&mut info, key, payload);
        }
        let info = info.into_vec();
        if self.layers.is_empty() && self.global_properties.is_empty() {
            b.u32(0);
        } else {
            b.sized(&info);
        }

        b.u16(self.compression).raw(&self.image_data);
        b.into_vec()
    }
}
