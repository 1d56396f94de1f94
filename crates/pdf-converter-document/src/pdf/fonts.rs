// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font resources — weight detection and string decoding through lopdf's
// font encodings (ToUnicode CMaps first, then the font's `/Encoding`).

use std::collections::HashMap;
use std::rc::Rc;

use lopdf::{Dictionary, Document, Encoding, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::{debug, trace};

/// ForceBold bit in a font descriptor's `/Flags` (bit 19, 1-indexed).
const FLAG_FORCE_BOLD: i64 = 1 << 18;

/// Font resources of a page or form, keyed by resource name (`F1`, ...).
pub(crate) type FontMap = HashMap<Vec<u8>, Rc<FontInfo>>;

/// What the text extractor needs to know about a font.
#[derive(Debug, Default)]
pub(crate) struct FontInfo {
    /// `/BaseFont` with any subset prefix (`ABCDEF+`) removed.
    pub base_font: String,
    pub bold: bool,
    /// Composite (Type0) fonts use two-byte character codes.
    pub two_byte: bool,
    /// Parsed ToUnicode CMap; always `Encoding::UnicodeMapEncoding`.
    to_unicode: Option<Encoding<'static>>,
    /// `{ /Type /Font /Encoding <name> }`, resolved by lopdf on each decode.
    base_encoding: Option<Dictionary>,
}

impl FontInfo {
    pub(crate) fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|name| name.as_name().ok())
            .map(|raw| {
                let name = String::from_utf8_lossy(raw).into_owned();
                match name.split_once('+') {
                    Some((prefix, rest)) if prefix.len() == 6 => rest.to_string(),
                    _ => name,
                }
            })
            .unwrap_or_default();

        let two_byte = matches!(
            dict.get(b"Subtype").ok().and_then(|s| s.as_name().ok()),
            Some(b"Type0")
        );

        let descriptor = font_descriptor(doc, dict);
        let lowered = base_font.to_ascii_lowercase();
        let bold = lowered.contains("bold")
            || lowered.contains("black")
            || lowered.contains("heavy")
            || descriptor.is_some_and(|desc| {
                let flags = desc.get(b"Flags").ok().and_then(|f| f.as_i64().ok()).unwrap_or(0);
                let weight = desc.get(b"FontWeight").ok().and_then(number).unwrap_or(0.0);
                flags & FLAG_FORCE_BOLD != 0 || weight >= 700.0
            });

        Self {
            to_unicode: to_unicode(doc, dict),
            base_encoding: base_encoding(doc, dict, two_byte),
            base_font,
            bold,
            two_byte,
        }
    }

    /// Decode the raw bytes of a string operand into text.
    pub(crate) fn decode(&self, doc: &Document, bytes: &[u8]) -> String {
        if let Some(cmap) = &self.to_unicode {
            match Document::decode_text(cmap, bytes) {
                Ok(text) => return text,
                Err(err) => trace!(%err, font = %self.base_font, "ToUnicode decoding failed"),
            }
        }
        if let Some(dict) = &self.base_encoding {
            match dict
                .get_font_encoding(doc)
                .and_then(|encoding| Document::decode_text(&encoding, bytes))
            {
                Ok(text) => return text,
                Err(err) => trace!(%err, font = %self.base_font, "base encoding cannot decode string"),
            }
        }
        if self.two_byte {
            // Without a usable CMap, Identity-encoded CIDs are often Unicode.
            return bytes
                .chunks(2)
                .filter_map(|pair| {
                    let code = pair.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
                    char::from_u32(code).filter(|c| !c.is_control())
                })
                .collect();
        }
        decode_plain(bytes)
    }
}

/// Text shown without a selected font: a PDF text string (UTF-16BE or UTF-8
/// with a byte-order mark, PDFDocEncoding otherwise).
pub(crate) fn decode_plain(bytes: &[u8]) -> String {
    lopdf::decode_text_string(&Object::String(bytes.to_vec(), StringFormat::Literal))
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

/// The font's ToUnicode CMap, parsed once by lopdf.
fn to_unicode(doc: &Document, font: &Dictionary) -> Option<Encoding<'static>> {
    let stream = font.get(b"ToUnicode").ok()?.clone();
    // Identity-H makes lopdf read the CMap regardless of the font's own /Encoding.
    let identity = dictionary! {
        "Type" => "Font",
        "Encoding" => "Identity-H",
        "ToUnicode" => stream,
    };
    match identity.get_font_encoding(doc) {
        Ok(Encoding::UnicodeMapEncoding(cmap)) => Some(Encoding::UnicodeMapEncoding(cmap)),
        Ok(_) => None,
        Err(err) => {
            debug!(%err, "unreadable ToUnicode CMap, falling back to /Encoding");
            None
        }
    }
}

/// Name of the single-byte (or predefined CMap) encoding to decode with.
///
/// A `/Differences` dictionary contributes its `/BaseEncoding`; simple fonts
/// without any encoding use StandardEncoding. Identity CMaps carry no
/// character information of their own and yield `None`.
fn base_encoding(doc: &Document, font: &Dictionary, two_byte: bool) -> Option<Dictionary> {
    let name = match font.get(b"Encoding").map(|obj| resolve(doc, obj)) {
        Ok(Object::Name(name)) => name.clone(),
        Ok(Object::Dictionary(differences)) => differences
            .get(b"BaseEncoding")
            .and_then(Object::as_name)
            .map_or_else(|_| b"StandardEncoding".to_vec(), <[u8]>::to_vec),
        _ if two_byte => return None,
        _ => b"StandardEncoding".to_vec(),
    };
    if name.starts_with(b"Identity-") {
        return None;
    }
    Some(dictionary! {
        "Type" => "Font",
        "Encoding" => Object::Name(name),
    })
}

/// Collect the fonts declared in a resource dictionary.
pub(crate) fn collect_fonts(doc: &Document, resources: Option<&Dictionary>) -> FontMap {
    let mut fonts = FontMap::new();
    let Some(font_dict) = resources
        .and_then(|res| res.get(b"Font").ok())
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
    else {
        return fonts;
    };

    for (name, obj) in font_dict.iter() {
        if let Ok(dict) = resolve(doc, obj).as_dict() {
            let info = FontInfo::from_dict(doc, dict);
            debug!(
                resource = %String::from_utf8_lossy(name),
                base_font = %info.base_font,
                bold = info.bold,
                "font resolved"
            );
            fonts.insert(name.clone(), Rc::new(info));
        }
    }
    fonts
}

/// The `/Resources` dictionary of a page, following `/Parent` inheritance.
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // Page trees are shallow; the bound guards against malformed cycles.
    for _ in 0..32 {
        if let Ok(res) = node.get(b"Resources") {
            return resolve(doc, res).as_dict().ok();
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow a single indirect reference.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Numeric value of an integer or real object.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Stream payload with filters removed where lopdf knows how.
pub(crate) fn stream_bytes(stream: &Stream) -> Vec<u8> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone())
    } else {
        stream.content.clone()
    }
}

fn font_descriptor<'a>(doc: &'a Document, font: &'a Dictionary) -> Option<&'a Dictionary> {
    if let Ok(desc) = font.get(b"FontDescriptor") {
        return resolve(doc, desc).as_dict().ok();
    }
    // Type0 fonts keep the descriptor on their descendant CIDFont.
    let descendants = font.get(b"DescendantFonts").ok()?;
    let first = resolve(doc, descendants).as_array().ok()?.first()?;
    let cid_font = resolve(doc, first).as_dict().ok()?;
    resolve(doc, cid_font.get(b"FontDescriptor").ok()?).as_dict().ok()
}
