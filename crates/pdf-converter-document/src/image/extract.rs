// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded image extraction — decode image XObjects and save them as PNG
// files using the `image` crate.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf_converter_core::error::{ConverterError, Result};
use tracing::{debug, info, instrument, warn};

use crate::pdf::PdfReader;
use crate::pdf::fonts::{self, resolve};

/// Form XObjects nested deeper than this are not searched for images.
const MAX_FORM_DEPTH: usize = 8;

/// An image written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub path: PathBuf,
    /// 1-indexed page the image was first found on.
    pub page: u32,
    pub width: u32,
    pub height: u32,
}

/// Extracts every embedded raster image of a document into a folder.
///
/// Files are named `img_<n>.png`, numbered in page order. The counter
/// advances for every image found, so an image that fails to decode leaves
/// a gap in the numbering rather than shifting the names of later images.
pub struct ImageExtractor<'a> {
    reader: &'a PdfReader,
}

impl<'a> ImageExtractor<'a> {
    pub fn new(reader: &'a PdfReader) -> Self {
        Self { reader }
    }

    /// Write all images into `folder`, creating it if needed.
    #[instrument(skip(self), fields(folder = %folder.display()))]
    pub fn extract_to(&self, folder: &Path) -> Result<Vec<ExtractedImage>> {
        std::fs::create_dir_all(folder)?;
        let doc = self.reader.document();

        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut saved = Vec::new();
        let mut index = 0usize;

        for (page_number, page_id) in self.reader.pages() {
            let mut found = Vec::new();
            collect_images(doc, fonts::page_resources(doc, page_id), &mut found, 0);

            for image_id in found {
                if !seen.insert(image_id) {
                    continue;
                }
                let path = folder.join(format!("img_{index}.png"));
                index += 1;

                match decode_xobject(doc, image_id) {
                    Ok(image) => {
                        if let Err(err) = image.save_with_format(&path, ImageFormat::Png) {
                            warn!(path = %path.display(), %err, "cannot save image");
                            continue;
                        }
                        debug!(file = ?path.file_name(), page_number, "image saved");
                        saved.push(ExtractedImage {
                            path,
                            page: page_number,
                            width: image.width(),
                            height: image.height(),
                        });
                    }
                    Err(err) => warn!(?image_id, page_number, %err, "error extracting image"),
                }
            }
        }

        info!(images = saved.len(), attempted = index, "image extraction complete");
        Ok(saved)
    }
}

/// Image XObject ids reachable from a resource dictionary.
fn collect_images(doc: &Document, resources: Option<&Dictionary>, found: &mut Vec<ObjectId>, depth: usize) {
    if depth > MAX_FORM_DEPTH {
        return;
    }
    let Some(xobjects) = resources
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
    else {
        return;
    };

    for (_, obj) in xobjects.iter() {
        let Object::Reference(id) = obj else {
            continue;
        };
        let Ok(stream) = doc.get_object(*id).and_then(Object::as_stream) else {
            continue;
        };
        match subtype(&stream.dict) {
            Some(b"Image") => found.push(*id),
            Some(b"Form") => {
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|res| resolve(doc, res).as_dict().ok());
                collect_images(doc, form_resources, found, depth + 1);
            }
            _ => {}
        }
    }
}

fn subtype(dict: &Dictionary) -> Option<&[u8]> {
    dict.get(b"Subtype").ok().and_then(|s| s.as_name().ok())
}

/// Decode one image XObject into pixels.
fn decode_xobject(doc: &Document, id: ObjectId) -> Result<DynamicImage> {
    let stream = doc
        .get_object(id)
        .and_then(Object::as_stream)
        .map_err(|err| ConverterError::ImageError(format!("object {:?} is not a stream: {}", id, err)))?;
    decode_image(doc, stream)
}

pub(crate) fn decode_image(doc: &Document, stream: &Stream) -> Result<DynamicImage> {
    let dict = &stream.dict;
    if matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true))) {
        return Err(ConverterError::ImageError("stencil masks carry no colour".into()));
    }

    let filters = filter_names(doc, dict);
    match filters.last().map(Vec::as_slice) {
        Some(b"DCTDecode") => {
            let data = if filters.len() > 1 {
                // Strip the outer filters, keeping the JPEG stream itself.
                stream.decompressed_content().map_err(|err| {
                    ConverterError::ImageError(format!("cannot unwrap JPEG stream: {}", err))
                })?
            } else {
                stream.content.clone()
            };
            return image::load_from_memory_with_format(&data, ImageFormat::Jpeg)
                .map_err(|err| ConverterError::ImageError(format!("bad JPEG data: {}", err)));
        }
        Some(b"JPXDecode") => {
            return Err(ConverterError::ImageError("JPEG 2000 images are not supported".into()));
        }
        Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            return Err(ConverterError::ImageError("fax-encoded images are not supported".into()));
        }
        _ => {}
    }

    let width = dimension(dict, b"Width")?;
    let height = dimension(dict, b"Height")?;
    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|b| b.as_i64().ok())
        .unwrap_or(8);
    let samples = fonts::stream_bytes(stream);
    let color_space = dict.get(b"ColorSpace").map(|cs| resolve(doc, cs)).ok();

    raw_to_image(doc, &samples, width, height, bits, color_space)
}

fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter").map(|f| resolve(doc, f)) {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    dict.get(key)
        .ok()
        .and_then(|v| v.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            ConverterError::ImageError(format!("missing /{}", String::from_utf8_lossy(key)))
        })
}

/// Colour models the raw decoder understands.
#[derive(Debug, Clone, PartialEq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    /// Palette lookup into a base model with the given colour table.
    Indexed(Box<ColorModel>, Vec<u8>),
}

impl ColorModel {
    fn components(&self) -> usize {
        match self {
            Self::Gray | Self::Indexed(..) => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }
}

fn color_model(doc: &Document, space: Option<&Object>) -> Result<ColorModel> {
    let unsupported = |what: &str| ConverterError::ImageError(format!("unsupported colour space {what}"));
    match space {
        None => Ok(ColorModel::Gray),
        Some(Object::Name(name)) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorModel::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorModel::Cmyk),
            other => Err(unsupported(&String::from_utf8_lossy(other))),
        },
        Some(Object::Array(items)) => {
            let family = items.first().and_then(|f| f.as_name().ok()).unwrap_or_default();
            match family {
                b"ICCBased" => {
                    let n = items
                        .get(1)
                        .and_then(|profile| resolve(doc, profile).as_stream().ok())
                        .and_then(|profile| profile.dict.get(b"N").ok())
                        .and_then(|n| n.as_i64().ok())
                        .unwrap_or(3);
                    match n {
                        1 => Ok(ColorModel::Gray),
                        4 => Ok(ColorModel::Cmyk),
                        _ => Ok(ColorModel::Rgb),
                    }
                }
                b"Indexed" | b"I" => {
                    let base = color_model(doc, items.get(1).map(|b| resolve(doc, b)))?;
                    let table = match items.get(3).map(|t| resolve(doc, t)) {
                        Some(Object::String(bytes, _)) => bytes.clone(),
                        Some(Object::Stream(s)) => fonts::stream_bytes(s),
                        _ => return Err(unsupported("Indexed without lookup table")),
                    };
                    Ok(ColorModel::Indexed(Box::new(base), table))
                }
                b"CalRGB" => Ok(ColorModel::Rgb),
                b"CalGray" => Ok(ColorModel::Gray),
                other => Err(unsupported(&String::from_utf8_lossy(other))),
            }
        }
        Some(_) => Err(unsupported("of unexpected type")),
    }
}

fn raw_to_image(
    doc: &Document,
    samples: &[u8],
    width: u32,
    height: u32,
    bits: i64,
    space: Option<&Object>,
) -> Result<DynamicImage> {
    let model = color_model(doc, space)?;
    let (w, h) = (width as usize, height as usize);

    if bits == 1 && model == ColorModel::Gray {
        let row_bytes = w.div_ceil(8);
        check_len(samples, sample_len(row_bytes, h, 1)?)?;
        let image = GrayImage::from_fn(width, height, |x, y| {
            let byte = samples[y as usize * row_bytes + x as usize / 8];
            let bit = (byte >> (7 - (x % 8))) & 1;
            image::Luma([if bit == 1 { 255 } else { 0 }])
        });
        return Ok(DynamicImage::ImageLuma8(image));
    }
    if bits != 8 {
        return Err(ConverterError::ImageError(format!(
            "{} bits per component is not supported",
            bits
        )));
    }

    let pixels = sample_len(w, h, 1)?;
    check_len(samples, sample_len(w, h, model.components())?)?;

    let image = match model {
        ColorModel::Gray => GrayImage::from_raw(width, height, samples[..pixels].to_vec())
            .map(DynamicImage::ImageLuma8),
        ColorModel::Rgb => RgbImage::from_raw(width, height, samples[..pixels * 3].to_vec())
            .map(DynamicImage::ImageRgb8),
        ColorModel::Cmyk => {
            let rgb = samples[..pixels * 4].chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
        ColorModel::Indexed(base, table) => {
            const MISSING: [u8; 4] = [0; 4];
            let components = base.components();
            let mut rgb = Vec::with_capacity(pixels * 3);
            for &entry in &samples[..pixels] {
                let start = entry as usize * components;
                let color = table.get(start..start + components).unwrap_or(&MISSING[..components]);
                match *base {
                    ColorModel::Gray => rgb.extend_from_slice(&[color[0]; 3]),
                    ColorModel::Cmyk => rgb.extend(cmyk_to_rgb(color)),
                    _ => rgb.extend_from_slice(color),
                }
            }
            RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
    };

    image.ok_or_else(|| ConverterError::ImageError("sample buffer does not match dimensions".into()))
}

fn cmyk_to_rgb(cmyk: &[u8]) -> [u8; 3] {
    let k = 255 - u16::from(cmyk[3]);
    let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
}

/// Bytes needed for `width × height × components`, refusing dimensions
/// that overflow.
fn sample_len(width: usize, height: usize, components: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(components))
        .ok_or_else(|| ConverterError::ImageError(format!("image dimensions {width}x{height} are too large")))
}

fn check_len(samples: &[u8], needed: usize) -> Result<()> {
    if samples.len() < needed {
        return Err(ConverterError::ImageError(format!(
            "image data too short: {} bytes, expected {}",
            samples.len(),
            needed
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{SampleImages, SampleLine, form_xobject_pdf, sample_pdf_with_images};
    use lopdf::dictionary;

    #[test]
    fn extracts_gray_and_jpeg_images() {
        let bytes = sample_pdf_with_images(
            &[vec![SampleLine::regular("Figure page", 12)]],
            &SampleImages {
                gray: Some((2, 2, vec![0, 255, 255, 0])),
                jpeg: Some((4, 3)),
            },
        );
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let images = ImageExtractor::new(&reader).extract_to(dir.path()).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].path, dir.path().join("img_0.png"));
        assert_eq!((images[0].width, images[0].height), (2, 2));
        assert_eq!((images[1].width, images[1].height), (4, 3));
        assert!(images.iter().all(|img| img.page == 1 && img.path.exists()));

        let decoded = image::open(&images[0].path).unwrap().to_luma8();
        assert_eq!(decoded.get_pixel(1, 0).0, [255]);
        assert_eq!(decoded.get_pixel(0, 0).0, [0]);
    }

    #[test]
    fn form_images_are_deduplicated_and_keep_their_numbers() {
        let reader = PdfReader::from_bytes(&form_xobject_pdf()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let images = ImageExtractor::new(&reader).extract_to(dir.path()).unwrap();

        // The 16 bpc image inside the form fails but still takes img_0; the
        // grayscale image found through the form is saved once even though
        // page 2 paints it again.
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].path, dir.path().join("img_1.png"));
        assert_eq!(images[0].page, 1);
        assert_eq!((images[0].width, images[0].height), (2, 2));
        assert!(!dir.path().join("img_0.png").exists());
        assert!(!dir.path().join("img_2.png").exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn document_without_images_yields_nothing() {
        let bytes = sample_pdf_with_images(&[vec![SampleLine::regular("text", 12)]], &SampleImages::default());
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let images = ImageExtractor::new(&reader).extract_to(&dir.path().join("nested")).unwrap();
        assert!(images.is_empty());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn one_bit_gray_expands_to_black_and_white() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Width" => 3,
                "Height" => 1,
                "BitsPerComponent" => 1,
                "ColorSpace" => "DeviceGray",
            },
            vec![0b1010_0000],
        );
        let image = decode_image(&doc, &stream).unwrap().to_luma8();
        assert_eq!(image.as_raw(), &vec![255, 0, 255]);
    }

    #[test]
    fn indexed_palette_is_resolved() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Width" => 2,
                "Height" => 1,
                "BitsPerComponent" => 8,
                "ColorSpace" => vec![
                    Object::Name(b"Indexed".to_vec()),
                    Object::Name(b"DeviceRGB".to_vec()),
                    Object::Integer(1),
                    Object::string_literal(vec![255u8, 0, 0, 0, 0, 255]),
                ],
            },
            vec![1, 0],
        );
        let image = decode_image(&doc, &stream).unwrap().to_rgb8();
        assert_eq!(image.as_raw(), &vec![0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn cmyk_black_and_white() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), [0, 255, 255]);
    }

    #[test]
    fn short_sample_buffer_is_an_error() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! { "Width" => 4, "Height" => 4, "ColorSpace" => "DeviceRGB" },
            vec![0; 10],
        );
        assert!(matches!(decode_image(&doc, &stream), Err(ConverterError::ImageError(_))));
    }

    #[test]
    fn oversized_dimensions_are_an_error() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Width" => 4_294_967_295i64,
                "Height" => 4_294_967_295i64,
                "BitsPerComponent" => 8,
                "ColorSpace" => "DeviceRGB",
            },
            vec![0; 16],
        );
        assert!(matches!(decode_image(&doc, &stream), Err(ConverterError::ImageError(_))));

        let one_bit = Stream::new(
            dictionary! {
                "Width" => 4_294_967_295i64,
                "Height" => 4_294_967_295i64,
                "BitsPerComponent" => 1,
                "ColorSpace" => "DeviceGray",
            },
            vec![0; 16],
        );
        assert!(matches!(decode_image(&doc, &one_bit), Err(ConverterError::ImageError(_))));
    }

    #[test]
    fn stencil_masks_are_skipped() {
        let doc = Document::with_version("1.5");
        let stream = Stream::new(
            dictionary! { "Width" => 1, "Height" => 1, "ImageMask" => true },
            vec![0],
        );
        assert!(decode_image(&doc, &stream).is_err());
    }
}
