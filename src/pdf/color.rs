// src/pdf/color.rs
use crate::pdf::reader::stream_samples;
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object};

/// Colour spaces whose samples can be turned into Gray or RGB pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// Palette entries are stored in `base`, one byte per component.
    Indexed { base: Box<ColorSpace>, palette: Vec<u8> },
}

impl ColorSpace {
    pub fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
            ColorSpace::Cmyk => 4,
        }
    }

    /// Resolves an image's `/ColorSpace` entry. Lab, Separation and DeviceN
    /// come back as None.
    pub fn resolve(document: &Document, object: &Object) -> Option<Self> {
        match deref(document, object) {
            Object::Name(name) => Self::from_name(name),
            Object::Array(items) => {
                let (family, params) = items.split_first()?;
                match family.as_name().ok()? {
                    b"ICCBased" => {
                        let profile = deref(document, params.first()?).as_stream().ok()?;
                        match profile.dict.get(b"N").and_then(|n| n.as_i64()) {
                            Ok(1) => Some(ColorSpace::Gray),
                            Ok(3) => Some(ColorSpace::Rgb),
                            Ok(4) => Some(ColorSpace::Cmyk),
                            _ => Self::resolve(document, profile.dict.get(b"Alternate").ok()?),
                        }
                    }
                    b"Indexed" | b"I" => {
                        let base = Self::resolve(document, params.first()?)?;
                        if matches!(base, ColorSpace::Indexed { .. }) {
                            return None;
                        }
                        let hival = deref(document, params.get(1)?).as_i64().ok()?;
                        let mut palette = match deref(document, params.get(2)?) {
                            Object::String(bytes, _) => bytes.clone(),
                            Object::Stream(lookup) => stream_samples(lookup).ok()?,
                            _ => return None,
                        };
                        let entries = usize::try_from(hival).ok()?.checked_add(1)?;
                        palette.truncate(entries * base.components());
                        Some(ColorSpace::Indexed { base: Box::new(base), palette })
                    }
                    other => Self::from_name(other),
                }
            }
            _ => None,
        }
    }

    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"DeviceGray" | b"G" | b"CalGray" => Some(ColorSpace::Gray),
            b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(ColorSpace::Rgb),
            b"DeviceCMYK" | b"CMYK" => Some(ColorSpace::Cmyk),
            _ => None,
        }
    }

    fn to_rgb(&self, entry: &[u8]) -> [u8; 3] {
        match self {
            ColorSpace::Gray => [entry[0]; 3],
            ColorSpace::Rgb => [entry[0], entry[1], entry[2]],
            ColorSpace::Cmyk => cmyk_pixel(entry),
            ColorSpace::Indexed { .. } => [0; 3],
        }
    }
}

fn deref<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        other => other,
    }
}

/// Decodes raw image samples into pixels, honouring `/ColorSpace`,
/// `/BitsPerComponent`, `/Decode` and `/ImageMask`. Images without a colour
/// space fall back to guessing the channel count from the sample length.
pub fn decode_image(
    document: &Document,
    dict: &Dictionary,
    width: u32,
    height: u32,
    samples: &[u8],
) -> Option<DynamicImage> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    if pixels == 0 {
        return None;
    }

    let is_mask = dict.get(b"ImageMask").and_then(|m| m.as_bool()).unwrap_or(false);
    let bits = if is_mask {
        1
    } else {
        dict.get(b"BitsPerComponent").and_then(|b| b.as_i64()).unwrap_or(8)
    };
    let bits = usize::try_from(bits).ok().filter(|&b| matches!(b, 1 | 2 | 4 | 8 | 16))?;

    let space = match dict.get(b"ColorSpace") {
        _ if is_mask => ColorSpace::Gray,
        Ok(object) => ColorSpace::resolve(document, object)?,
        Err(_) if bits == 8 => match samples.len() / pixels {
            1 => ColorSpace::Gray,
            3 => ColorSpace::Rgb,
            4 => ColorSpace::Cmyk,
            _ => return None,
        },
        Err(_) => return None,
    };

    let components = space.components();
    let values = unpack_samples(samples, bits, width as usize * components, height as usize)?;
    let max = ((1u32 << bits) - 1) as f32;

    let image = match &space {
        ColorSpace::Indexed { base, palette } => {
            let stride = base.components();
            let entries = palette.len() / stride;
            if entries == 0 {
                return None;
            }
            let (low, high) = decode_ranges(dict, 1, (0.0, max))[0];
            let mut rgb = Vec::with_capacity(pixels * 3);
            for &value in &values {
                let index = (low + value as f32 * (high - low) / max)
                    .round()
                    .clamp(0.0, (entries - 1) as f32) as usize;
                rgb.extend_from_slice(&base.to_rgb(&palette[index * stride..(index + 1) * stride]));
            }
            DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, rgb)?)
        }
        _ => {
            let ranges = decode_ranges(dict, components, (0.0, 1.0));
            let levels: Vec<u8> = values
                .iter()
                .enumerate()
                .map(|(i, &value)| {
                    let (low, high) = ranges[i % components];
                    ((low + value as f32 * (high - low) / max).clamp(0.0, 1.0) * 255.0).round() as u8
                })
                .collect();
            match &space {
                ColorSpace::Gray => DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, levels)?),
                ColorSpace::Rgb => DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, levels)?),
                ColorSpace::Cmyk => {
                    let rgb = levels.chunks_exact(4).flat_map(cmyk_pixel).collect();
                    DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, rgb)?)
                }
                ColorSpace::Indexed { .. } => return None,
            }
        }
    };
    Some(image)
}

/// Splits packed rows into one value per sample. Rows start on a byte boundary.
fn unpack_samples(data: &[u8], bits: usize, per_row: usize, rows: usize) -> Option<Vec<u16>> {
    let row_bytes = (per_row * bits).div_ceil(8);
    if row_bytes == 0 || data.len() < row_bytes.checked_mul(rows)? {
        return None;
    }

    let mut values = Vec::with_capacity(per_row * rows);
    for row in data.chunks_exact(row_bytes).take(rows) {
        match bits {
            8 => values.extend(row.iter().map(|&b| b as u16)),
            16 => values.extend(row.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]]))),
            1 | 2 | 4 => {
                let mask = (1u16 << bits) - 1;
                values.extend((0..per_row).map(|i| {
                    let bit = i * bits;
                    (row[bit / 8] as u16 >> (8 - bits - bit % 8)) & mask
                }));
            }
            _ => return None,
        }
    }
    Some(values)
}

/// Per-component `/Decode` ranges, or `default` when the array is absent or malformed.
fn decode_ranges(dict: &Dictionary, components: usize, default: (f32, f32)) -> Vec<(f32, f32)> {
    let values: Vec<f32> = match dict.get(b"Decode").and_then(|d| d.as_array()) {
        Ok(items) => items
            .iter()
            .filter_map(|item| match item {
                Object::Integer(i) => Some(*i as f32),
                Object::Real(r) => Some(*r as f32),
                _ => None,
            })
            .collect(),
        Err(_) => Vec::new(),
    };

    if values.len() == components * 2 {
        values.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
    } else {
        vec![default; components]
    }
}

fn cmyk_pixel(px: &[u8]) -> [u8; 3] {
    let k = 255 - px[3] as u16;
    [px[0], px[1], px[2]].map(|c| ((255 - c as u16) * k / 255) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_cmyk_conversion() {
        assert_eq!(cmyk_pixel(&[0, 0, 0, 0]), [255, 255, 255]);
        assert_eq!(cmyk_pixel(&[0, 0, 0, 255]), [0, 0, 0]);
        assert_eq!(cmyk_pixel(&[255, 0, 0, 0]), [0, 255, 255]);
    }

    #[test]
    fn test_unpack_pads_rows_to_whole_bytes() {
        // 3 samples of 2 bits, two rows: 0b01_10_11_00 0b11_00_01_00
        let values = unpack_samples(&[0b0110_1100, 0b1100_0100], 2, 3, 2).unwrap();
        assert_eq!(values, vec![1, 2, 3, 3, 0, 1]);
        assert_eq!(unpack_samples(&[0xAB, 0xCD], 16, 1, 1).unwrap(), vec![0xABCD]);
        assert!(unpack_samples(&[0xFF], 8, 2, 1).is_none());
    }

    #[test]
    fn test_resolve_named_and_array_spaces() {
        let document = Document::with_version("1.5");
        assert_eq!(ColorSpace::resolve(&document, &"DeviceCMYK".into()), Some(ColorSpace::Cmyk));
        assert_eq!(
            ColorSpace::resolve(&document, &Object::Array(vec!["CalRGB".into(), Dictionary::new().into()])),
            Some(ColorSpace::Rgb)
        );
        assert_eq!(
            ColorSpace::resolve(&document, &Object::Array(vec!["Separation".into(), "Spot".into()])),
            None
        );
    }

    #[test]
    fn test_indexed_palette_is_cut_to_hival() {
        let document = Document::with_version("1.5");
        let space = Object::Array(vec![
            "Indexed".into(),
            "DeviceGray".into(),
            Object::Integer(1),
            Object::String(vec![0, 128, 255], lopdf::StringFormat::Literal),
        ]);
        assert_eq!(
            ColorSpace::resolve(&document, &space),
            Some(ColorSpace::Indexed { base: Box::new(ColorSpace::Gray), palette: vec![0, 128] })
        );
    }

    #[test]
    fn test_decode_array_must_match_components() {
        let inverted = dictionary! { "Decode" => vec![Object::Integer(1), Object::Integer(0)] };
        assert_eq!(decode_ranges(&inverted, 1, (0.0, 1.0)), vec![(1.0, 0.0)]);
        assert_eq!(decode_ranges(&inverted, 3, (0.0, 1.0)), vec![(0.0, 1.0); 3]);
    }
}
