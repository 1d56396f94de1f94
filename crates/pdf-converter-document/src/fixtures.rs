// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small synthetic PDFs for tests, built directly with lopdf.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

/// One line of text on a sample page.
#[derive(Debug, Clone)]
pub struct SampleLine {
    pub text: String,
    pub size: i64,
    pub bold: bool,
}

impl SampleLine {
    pub fn regular(text: &str, size: i64) -> Self {
        Self {
            text: text.to_string(),
            size,
            bold: false,
        }
    }

    pub fn bold(text: &str, size: i64) -> Self {
        Self {
            text: text.to_string(),
            size,
            bold: true,
        }
    }
}

/// Images to embed on the first page of a sample document.
#[derive(Debug, Clone, Default)]
pub struct SampleImages {
    /// Raw 8-bit grayscale samples: `(width, height, pixels)`.
    pub gray: Option<(i64, i64, Vec<u8>)>,
    /// A JPEG-encoded RGB image of the given size.
    pub jpeg: Option<(u32, u32)>,
}

/// A PDF with one page per entry; fonts are inherited from the page tree.
pub fn sample_pdf(pages: &[Vec<SampleLine>]) -> Vec<u8> {
    build(pages, &SampleImages::default())
}

/// A PDF whose first page also draws the given images.
pub fn sample_pdf_with_images(pages: &[Vec<SampleLine>], images: &SampleImages) -> Vec<u8> {
    build(pages, images)
}

/// Write [`sample_pdf`] output to `path`.
pub fn write_sample_pdf(path: &Path, pages: &[Vec<SampleLine>]) -> std::io::Result<()> {
    std::fs::write(path, sample_pdf(pages))
}

fn build(pages: &[Vec<SampleLine>], images: &SampleImages) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let fonts = dictionary! {
        "F1" => regular_id,
        "F2" => bold_id,
    };
    let shared_resources_id = doc.add_object(dictionary! { "Font" => fonts.clone() });

    let mut xobjects = Dictionary::new();
    if let Some((width, height, pixels)) = &images.gray {
        let id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => *width,
                "Height" => *height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            pixels.clone(),
        ));
        xobjects.set("Im1", id);
    }
    if let Some((width, height)) = images.jpeg {
        let rgb = RgbImage::from_fn(width, height, |x, y| image::Rgb([(x * 40) as u8, (y * 40) as u8, 128]));
        let mut jpeg = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut jpeg, ImageFormat::Jpeg)
            .expect("encode fixture jpeg");
        let id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg.into_inner(),
        ));
        xobjects.set("Im2", id);
    }

    let mut kids = Vec::new();
    for (index, lines) in pages.iter().enumerate() {
        let mut operations = Vec::new();
        let mut y = 780;
        for line in lines {
            let font = if line.bold { "F2" } else { "F1" };
            operations.extend(text_ops(font, line.size, y, &line.text));
            y -= line.size + 8;
        }

        let first_with_images = index == 0 && !xobjects.is_empty();
        if first_with_images {
            for name in xobjects.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>() {
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![
                        Object::Integer(100),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(100),
                        Object::Integer(72),
                        Object::Integer(300),
                    ],
                ));
                operations.push(Operation::new("Do", vec![Object::Name(name)]));
                operations.push(Operation::new("Q", vec![]));
            }
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes(&content)));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if first_with_images {
            // A page-level dictionary replaces the inherited one entirely.
            page.set(
                "Resources",
                dictionary! {
                    "Font" => fonts.clone(),
                    "XObject" => xobjects.clone(),
                },
            );
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    finish(doc, pages_id, kids, Some(shared_resources_id))
}

/// A one-page PDF showing `shown` (raw string bytes) in the given font.
pub fn pdf_with_font(font: Dictionary, shown: &[u8]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(font);

    let operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), Object::Integer(12)]),
        Operation::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
        Operation::new("Tj", vec![Object::String(shown.to_vec(), StringFormat::Hexadecimal)]),
        Operation::new("ET", vec![]),
    ];
    let page = page_with(
        &mut doc,
        pages_id,
        operations,
        dictionary! { "Font" => dictionary! { "F1" => font_id } },
    );
    finish(doc, pages_id, vec![page], None)
}

/// A two-page PDF built around a Form XObject.
///
/// Page 1 shows "Before the form", then draws a form that shows "Inside the
/// form" and paints two images: a 16 bits-per-component image that cannot be
/// decoded, followed by a 2x2 grayscale image. Page 2 paints the same
/// grayscale image object again.
pub fn form_xobject_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let gray_image = |bits: i64, samples: Vec<u8>| {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => bits,
            },
            samples,
        )
    };
    let broken_id = doc.add_object(gray_image(16, vec![0; 8]));
    let gray_id = doc.add_object(gray_image(8, vec![0, 255, 255, 0]));

    let form_content = Content {
        operations: [
            text_ops("F1", 12, 700, "Inside the form"),
            paint_ops("Broken", 72, 400),
            paint_ops("Gray", 200, 400),
        ]
        .concat(),
    };
    let form_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(595), Object::Integer(842)],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => dictionary! { "Broken" => broken_id, "Gray" => gray_id },
            },
        },
        content_bytes(&form_content),
    ));

    let first = page_with(
        &mut doc,
        pages_id,
        [
            text_ops("F1", 12, 760, "Before the form"),
            vec![
                Operation::new("q", vec![]),
                Operation::new("Do", vec![Object::Name(b"Fm1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        ]
        .concat(),
        dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => dictionary! { "Fm1" => form_id },
        },
    );
    let second = page_with(
        &mut doc,
        pages_id,
        paint_ops("Again", 72, 500),
        dictionary! { "XObject" => dictionary! { "Again" => gray_id } },
    );
    finish(doc, pages_id, vec![first, second], None)
}

fn text_ops(font: &str, size: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Integer(72), Object::Integer(y)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn paint_ops(name: &str, x: i64, y: i64) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Integer(50),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(50),
                Object::Integer(x),
                Object::Integer(y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Add a page with its own resources and return a reference to it.
fn page_with(doc: &mut Document, pages_id: ObjectId, operations: Vec<Operation>, resources: Dictionary) -> Object {
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes(&content)));
    Object::Reference(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources,
    }))
}

fn content_bytes(content: &Content) -> Vec<u8> {
    content.encode().expect("encode fixture content")
}

/// Write the page tree and catalog, then serialise.
fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<Object>, resources: Option<ObjectId>) -> Vec<u8> {
    let count = kids.len() as i64;
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ],
    };
    if let Some(id) = resources {
        pages.set("Resources", id);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("serialise fixture pdf");
    output
}
