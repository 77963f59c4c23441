//! Content-stream interpreter.
//!
//! Executes the text-showing and state operators of a page (plus nested
//! Form XObjects) and emits one [`GlyphEvent`] per rendered glyph into a
//! [`GlyphSink`], along with marked-content notifications for ActualText
//! spans. Painting operators are ignored; byte offsets still advance
//! through everything that shows text.

use std::collections::HashMap;
use std::rc::Rc;

use textpage_core::config::AnalysisOptions;
use textpage_core::font::FontId;
use textpage_core::page::{GlyphEvent, GlyphState, TextPageBuilder};

use crate::backend::{object_to_f64, page_content, page_geometry, page_resources, resolve};
use crate::error::BackendError;
use crate::fonts::{BaseEncoding, FontWidths, LoadedFont, default_widths, fallback_font, tounicode_from_stream};
use crate::text_state::TextState;
use crate::tokenizer::{Operand, tokenize};

const MAX_FORM_DEPTH: usize = 10;

/// Receiver of interpretation events; implemented by the analysis core's
/// page builder.
pub trait GlyphSink {
    /// Intern a font key, returning the id carried by later events.
    fn register_font(&mut self, key: &str) -> FontId;
    /// One rendered glyph.
    fn glyph(&mut self, ev: &GlyphEvent);
    /// Marked-content begin; `actual_text` is set when the properties
    /// carry an ActualText replacement string.
    fn begin_marked_content(&mut self, actual_text: Option<String>);
    /// Marked-content end at the current text position.
    fn end_marked_content(&mut self, state: &GlyphState, cur_x: f64, cur_y: f64);
}

impl GlyphSink for TextPageBuilder {
    fn register_font(&mut self, key: &str) -> FontId {
        TextPageBuilder::register_font(self, key)
    }

    fn glyph(&mut self, ev: &GlyphEvent) {
        self.add_glyph(ev);
    }

    fn begin_marked_content(&mut self, actual_text: Option<String>) {
        TextPageBuilder::begin_marked_content(self, actual_text);
    }

    fn end_marked_content(&mut self, state: &GlyphState, cur_x: f64, cur_y: f64) {
        TextPageBuilder::end_marked_content(self, state, cur_x, cur_y);
    }
}

struct CurrentFont {
    font: Rc<LoadedFont>,
    id: FontId,
}

/// Interpret one page's content into the sink.
pub fn interpret_page(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
    sink: &mut dyn GlyphSink,
    opts: &AnalysisOptions,
) -> Result<(), BackendError> {
    let geometry = page_geometry(doc, page_id)?;
    let content = page_content(doc, page_id)?;
    let resources = page_resources(doc, page_id);
    let mut ts = TextState::new(geometry.base_ctm());
    interpret_stream(doc, &content, resources, sink, opts, &mut ts, 0)
}

fn interpret_stream(
    doc: &lopdf::Document,
    content: &[u8],
    resources: Option<&lopdf::Dictionary>,
    sink: &mut dyn GlyphSink,
    opts: &AnalysisOptions,
    ts: &mut TextState,
    depth: usize,
) -> Result<(), BackendError> {
    if depth > MAX_FORM_DEPTH {
        return Err(BackendError::Interpreter(format!(
            "form XObject nesting deeper than {MAX_FORM_DEPTH}"
        )));
    }

    let mut fonts: HashMap<String, CurrentFont> = HashMap::new();
    let mut current: Option<(Rc<LoadedFont>, FontId)> = None;

    for op in tokenize(content) {
        match op.name.as_str() {
            "q" => ts.save(),
            "Q" => ts.restore(),
            "cm" => {
                if let Some(m) = six_numbers(&op.operands) {
                    ts.concat(&m);
                }
            }

            "BT" => ts.begin_text(),
            "ET" => ts.end_text(),
            "Tf" => {
                if op.operands.len() >= 2 {
                    let name = match &op.operands[0] {
                        Operand::Name(n) => n.clone(),
                        _ => String::new(),
                    };
                    let size = op.operands[1].as_f64().unwrap_or(0.0);
                    ts.set_font(name.clone(), size);
                    let entry = fonts.entry(name.clone()).or_insert_with(|| {
                        let font = load_font(doc, resources, &name);
                        let id = sink.register_font(&font.key);
                        CurrentFont {
                            font: Rc::new(font),
                            id,
                        }
                    });
                    current = Some((entry.font.clone(), entry.id));
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = two_numbers(&op.operands) {
                    ts.text_move(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = two_numbers(&op.operands) {
                    ts.text_move_set_leading(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = six_numbers(&op.operands) {
                    ts.set_text_matrix(m);
                }
            }
            "T*" => ts.next_line(),
            "TL" => {
                if let Some(v) = first_number(&op.operands) {
                    ts.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = first_number(&op.operands) {
                    ts.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = first_number(&op.operands) {
                    ts.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = first_number(&op.operands) {
                    ts.h_scaling = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = first_number(&op.operands) {
                    ts.rise = v;
                }
            }

            "Tj" => {
                if let Some(bytes) = op.operands.first().and_then(|o| o.as_string_bytes()) {
                    show_text(ts, &current, bytes, sink, opts);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Operand::LiteralString(b) | Operand::HexString(b) => {
                                show_text(ts, &current, b, sink, opts);
                            }
                            Operand::Integer(_) | Operand::Real(_) => {
                                let n = item.as_f64().unwrap_or(0.0);
                                let tx = -n / 1000.0 * ts.font_size * ts.h_scaling;
                                ts.advance(tx);
                            }
                            _ => {}
                        }
                    }
                }
            }
            "'" => {
                ts.next_line();
                if let Some(bytes) = op.operands.first().and_then(|o| o.as_string_bytes()) {
                    show_text(ts, &current, bytes, sink, opts);
                }
            }
            "\"" => {
                if op.operands.len() >= 3 {
                    if let Some(aw) = op.operands[0].as_f64() {
                        ts.word_spacing = aw;
                    }
                    if let Some(ac) = op.operands[1].as_f64() {
                        ts.char_spacing = ac;
                    }
                    ts.next_line();
                    if let Some(bytes) = op.operands[2].as_string_bytes() {
                        show_text(ts, &current, bytes, sink, opts);
                    }
                }
            }

            "BMC" => sink.begin_marked_content(None),
            "BDC" => {
                let actual = op.operands.iter().find_map(|o| match o {
                    Operand::Dictionary(entries) => entries
                        .iter()
                        .find(|(k, _)| k == "ActualText")
                        .and_then(|(_, v)| v.as_string_bytes())
                        .map(decode_pdf_string),
                    _ => None,
                });
                sink.begin_marked_content(actual);
            }
            "EMC" => {
                let state = glyph_state(ts, &current);
                let (cur_x, cur_y) = ts.glyph_origin();
                sink.end_marked_content(&state, cur_x, cur_y);
            }

            "Do" => {
                if let Some(Operand::Name(name)) = op.operands.first() {
                    run_form_xobject(doc, resources, name, sink, opts, ts, depth)?;
                }
            }

            _ => {}
        }
    }
    Ok(())
}

fn first_number(operands: &[Operand]) -> Option<f64> {
    operands.first().and_then(|o| o.as_f64())
}

fn two_numbers(operands: &[Operand]) -> (Option<f64>, Option<f64>) {
    (
        operands.first().and_then(|o| o.as_f64()),
        operands.get(1).and_then(|o| o.as_f64()),
    )
}

fn six_numbers(operands: &[Operand]) -> Option<[f64; 6]> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = [0.0; 6];
    for i in 0..6 {
        m[i] = operands[i].as_f64()?;
    }
    Some(m)
}

/// Decode a PDF text string: UTF-16BE behind a BOM, else the byte
/// encoding shared by PDFDoc strings.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let (s, _) = encoding_rs::UTF_16BE.decode_without_bom_handling(&bytes[2..]);
        s.into_owned()
    } else {
        let (s, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
        s.into_owned()
    }
}

fn glyph_state(ts: &TextState, current: &Option<(Rc<LoadedFont>, FontId)>) -> GlyphState {
    let (ascent, descent, font) = match current {
        Some((f, id)) => (f.ascent, f.descent, *id),
        None => (0.95, -0.35, FontId(0)),
    };
    GlyphState {
        font,
        font_size: ts.transformed_font_size(),
        char_spacing: ts.char_spacing,
        word_spacing: ts.word_spacing,
        h_scaling: ts.h_scaling,
        text_mat: ts.text_linear(),
        ctm: ts.ctm,
        font_mat: ts.font_trans_mat(),
        ascent,
        descent,
    }
}

fn show_text(
    ts: &mut TextState,
    current: &Option<(Rc<LoadedFont>, FontId)>,
    bytes: &[u8],
    sink: &mut dyn GlyphSink,
    opts: &AnalysisOptions,
) {
    let fallback;
    let font: &LoadedFont = match current {
        Some((f, _)) => f.as_ref(),
        None => {
            fallback = fallback_font("__nofont");
            &fallback
        }
    };
    for dc in font.decode_string(bytes, opts) {
        let state = glyph_state(ts, current);
        let (x, y) = ts.glyph_origin();
        let mut tx = dc.width / 1000.0 * ts.font_size + ts.char_spacing;
        if dc.code == 0x20 && dc.byte_len == 1 {
            tx += ts.word_spacing;
        }
        tx *= ts.h_scaling;
        let (dx, dy) = ts.text_delta(tx, 0.0);
        sink.glyph(&GlyphEvent {
            x,
            y,
            dx,
            dy,
            origin_x: 0.0,
            origin_y: 0.0,
            code: dc.code,
            byte_len: dc.byte_len,
            unicode: dc.unicode,
            state,
        });
        ts.advance(tx);
    }
}

fn run_form_xobject(
    doc: &lopdf::Document,
    resources: Option<&lopdf::Dictionary>,
    name: &str,
    sink: &mut dyn GlyphSink,
    opts: &AnalysisOptions,
    ts: &mut TextState,
    depth: usize,
) -> Result<(), BackendError> {
    let Some(res) = resources else {
        return Ok(());
    };
    let stream = (|| -> Option<&lopdf::Stream> {
        let xobjects = resolve(doc, res.get(b"XObject").ok()?).as_dict().ok()?;
        let obj = resolve(doc, xobjects.get(name.as_bytes()).ok()?);
        obj.as_stream().ok()
    })();
    let Some(stream) = stream else {
        return Ok(());
    };
    let is_form = stream
        .dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name_str().ok())
        .map(|s| s == "Form")
        .unwrap_or(false);
    if !is_form {
        return Ok(());
    }

    let content = stream
        .decompressed_content()
        .map_err(|e| BackendError::Interpreter(format!("form content: {e}")))?;
    let form_resources = stream
        .dict
        .get(b"Resources")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
        .or(resources);

    ts.save();
    if let Ok(matrix) = stream.dict.get(b"Matrix") {
        if let Ok(arr) = resolve(doc, matrix).as_array() {
            if arr.len() == 6 {
                let mut m = [0.0; 6];
                for (i, item) in arr.iter().enumerate() {
                    m[i] = object_to_f64(resolve(doc, item)).unwrap_or(if i == 0 || i == 3 {
                        1.0
                    } else {
                        0.0
                    });
                }
                ts.concat(&m);
            }
        }
    }
    let result = interpret_stream(doc, &content, form_resources, sink, opts, ts, depth + 1);
    ts.restore();
    result
}

/// Load the decode tables of one font resource.
fn load_font(
    doc: &lopdf::Document,
    resources: Option<&lopdf::Dictionary>,
    name: &str,
) -> LoadedFont {
    let font_dict = (|| -> Option<&lopdf::Dictionary> {
        let fonts = resolve(doc, resources?.get(b"Font").ok()?).as_dict().ok()?;
        resolve(doc, fonts.get(name.as_bytes()).ok()?).as_dict().ok()
    })();
    let Some(dict) = font_dict else {
        return fallback_font(name);
    };

    let base_name = dict
        .get(b"BaseFont")
        .ok()
        .and_then(|o| o.as_name_str().ok())
        .unwrap_or(name);
    let key = format!("{name}/{base_name}");

    let to_unicode = dict
        .get(b"ToUnicode")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_stream().ok())
        .and_then(|s| s.decompressed_content().ok())
        .and_then(|bytes| tounicode_from_stream(&bytes));

    let subtype = dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name_str().ok())
        .unwrap_or("");

    if subtype == "Type0" {
        let descendant = dict
            .get(b"DescendantFonts")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .and_then(|a| a.first())
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok());
        let (widths, ascent, descent) = match descendant {
            Some(dd) => {
                let (ascent, descent) = font_metrics(doc, dd);
                (cid_widths(doc, dd), ascent, descent)
            }
            None => (
                FontWidths::Cid {
                    default: 1000.0,
                    ranges: Vec::new(),
                },
                0.95,
                -0.35,
            ),
        };
        return LoadedFont {
            key,
            is_cid: true,
            to_unicode,
            base_encoding: BaseEncoding::WinAnsi,
            differences: HashMap::new(),
            widths,
            ascent,
            descent,
        };
    }

    // simple font
    let (ascent, descent) = font_metrics(doc, dict);
    let mut base_encoding = BaseEncoding::WinAnsi;
    let mut differences = HashMap::new();
    if let Ok(enc) = dict.get(b"Encoding") {
        match resolve(doc, enc) {
            lopdf::Object::Name(n) => {
                if n.as_slice() == b"MacRomanEncoding" {
                    base_encoding = BaseEncoding::MacRoman;
                }
            }
            lopdf::Object::Dictionary(enc_dict) => {
                if let Ok(base) = enc_dict.get(b"BaseEncoding") {
                    if base.as_name_str().ok() == Some("MacRomanEncoding") {
                        base_encoding = BaseEncoding::MacRoman;
                    }
                }
                if let Ok(diffs) = enc_dict.get(b"Differences") {
                    if let Ok(arr) = resolve(doc, diffs).as_array() {
                        let mut code = 0u32;
                        for item in arr {
                            match resolve(doc, item) {
                                lopdf::Object::Integer(i) => code = *i as u32,
                                lopdf::Object::Name(n) => {
                                    if let Ok(byte) = u8::try_from(code) {
                                        differences.insert(
                                            byte,
                                            String::from_utf8_lossy(n).into_owned(),
                                        );
                                    }
                                    code += 1;
                                }
                                _ => {}
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let first_char = dict
        .get(b"FirstChar")
        .ok()
        .and_then(|o| resolve(doc, o).as_i64().ok())
        .unwrap_or(0) as u32;
    let widths = dict
        .get(b"Widths")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .map(|arr| {
            let ws: Vec<f64> = arr
                .iter()
                .map(|o| object_to_f64(resolve(doc, o)).unwrap_or(0.0))
                .collect();
            FontWidths::Simple {
                first_char,
                widths: ws,
                missing: missing_width(doc, dict),
            }
        })
        .unwrap_or_else(default_widths);

    LoadedFont {
        key,
        is_cid: false,
        to_unicode,
        base_encoding,
        differences,
        widths,
        ascent,
        descent,
    }
}

fn descriptor<'a>(
    doc: &'a lopdf::Document,
    font_dict: &'a lopdf::Dictionary,
) -> Option<&'a lopdf::Dictionary> {
    resolve(doc, font_dict.get(b"FontDescriptor").ok()?)
        .as_dict()
        .ok()
}

/// Ascent/descent fractions from the font descriptor, with the fallback
/// metrics used when a font carries none.
fn font_metrics(doc: &lopdf::Document, font_dict: &lopdf::Dictionary) -> (f64, f64) {
    let mut ascent = 0.95;
    let mut descent = -0.35;
    if let Some(desc) = descriptor(doc, font_dict) {
        if let Some(a) = desc.get(b"Ascent").ok().and_then(|o| object_to_f64(resolve(doc, o))) {
            if a != 0.0 {
                ascent = a / 1000.0;
            }
        }
        if let Some(d) = desc
            .get(b"Descent")
            .ok()
            .and_then(|o| object_to_f64(resolve(doc, o)))
        {
            if d != 0.0 {
                descent = d / 1000.0;
            }
        }
    }
    (ascent, descent)
}

fn missing_width(doc: &lopdf::Document, font_dict: &lopdf::Dictionary) -> f64 {
    descriptor(doc, font_dict)
        .and_then(|d| d.get(b"MissingWidth").ok())
        .and_then(|o| object_to_f64(resolve(doc, o)))
        .unwrap_or(0.0)
}

/// CID `/W` array: `c [w...]` and `c1 c2 w` forms.
fn cid_widths(doc: &lopdf::Document, descendant: &lopdf::Dictionary) -> FontWidths {
    let default = descendant
        .get(b"DW")
        .ok()
        .and_then(|o| object_to_f64(resolve(doc, o)))
        .unwrap_or(1000.0);
    let mut ranges = Vec::new();
    if let Some(arr) = descendant
        .get(b"W")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
    {
        let mut i = 0;
        while i < arr.len() {
            let Some(first) = object_to_f64(resolve(doc, &arr[i])) else {
                i += 1;
                continue;
            };
            match arr.get(i + 1).map(|o| resolve(doc, o)) {
                Some(lopdf::Object::Array(ws)) => {
                    let widths: Vec<f64> = ws
                        .iter()
                        .map(|o| object_to_f64(resolve(doc, o)).unwrap_or(default))
                        .collect();
                    let lo = first as u32;
                    let hi = lo + widths.len().saturating_sub(1) as u32;
                    ranges.push((lo, hi, widths));
                    i += 2;
                }
                Some(second) => {
                    let hi = object_to_f64(second).unwrap_or(first);
                    let w = arr
                        .get(i + 2)
                        .map(|o| resolve(doc, o))
                        .and_then(object_to_f64)
                        .unwrap_or(default);
                    ranges.push((first as u32, hi as u32, vec![w]));
                    i += 3;
                }
                None => break,
            }
        }
    }
    FontWidths::Cid { default, ranges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{open_bytes, test_support::pdf_with_content};
    use textpage_core::AnalysisOptions;

    fn analyze(content: &str) -> textpage_core::TextPage {
        let bytes = pdf_with_content(content);
        let loaded = open_bytes(&bytes, None, None).unwrap();
        let geom = page_geometry(&loaded.doc, loaded.page_ids[0]).unwrap();
        let opts = AnalysisOptions::default();
        let mut builder = TextPageBuilder::new(geom.width(), geom.height(), opts.clone());
        interpret_page(&loaded.doc, loaded.page_ids[0], &mut builder, &opts).unwrap();
        builder.finish()
    }

    #[test]
    fn simple_tj_extracts_words() {
        let page = analyze("BT /F1 12 Tf 72 720 Td (Hello world) Tj ET");
        assert_eq!(page.page_text(false), "Hello world");
    }

    #[test]
    fn leading_and_t_star_make_lines() {
        let page = analyze("BT /F1 12 Tf 72 720 Td 14 TL (first) Tj T* (second) Tj ET");
        assert_eq!(page.page_text(false), "first\nsecond");
    }

    #[test]
    fn tj_array_kerning_splits_words() {
        let joined = analyze("BT /F1 12 Tf 72 720 Td [(A) (B)] TJ ET");
        assert_eq!(joined.words().len(), 1);
        let split = analyze("BT /F1 12 Tf 72 720 Td [(A) -500 (B)] TJ ET");
        assert_eq!(split.words().len(), 2);
    }

    #[test]
    fn quote_operator_shows_on_next_line() {
        let page = analyze("BT /F1 12 Tf 72 720 Td 14 TL (one) Tj (two) ' ET");
        assert_eq!(page.page_text(false), "one\ntwo");
    }

    #[test]
    fn actual_text_overrides_span() {
        let page = analyze(
            "BT /F1 12 Tf 72 720 Td /Span << /ActualText (fi) >> BDC (xy) Tj EMC ET",
        );
        assert_eq!(page.page_text(false), "fi");
    }

    #[test]
    fn bmc_without_actual_text_is_transparent() {
        let page = analyze("BT /F1 12 Tf 72 720 Td /P BMC (abc) Tj EMC ET");
        assert_eq!(page.page_text(false), "abc");
    }

    #[test]
    fn rotated_text_matrix_tags_words() {
        let page = analyze("BT /F1 12 Tf 0 1 -1 0 300 300 Tm (Up) Tj ET");
        assert_eq!(page.words().len(), 1);
        assert_eq!(page.words()[0].rot, textpage_core::Rotation::R270);
        assert_eq!(page.page_text(false), "Up");
    }

    #[test]
    fn char_spacing_subtracted_from_advances() {
        // 1pt of character spacing widens the advances; subtracting it
        // keeps the glyph run inside one word
        let page = analyze("BT /F1 12 Tf 1 Tc 72 720 Td (abc) Tj ET");
        assert_eq!(page.words().len(), 1);
        assert_eq!(page.page_text(false), "abc");
        assert_eq!(page.words()[0].edges, vec![72.0, 79.0, 86.0, 92.0]);
    }

    #[test]
    fn word_spacing_applies_to_spaces() {
        let page = analyze("BT /F1 12 Tf 4 Tw 72 720 Td (a b) Tj ET");
        assert_eq!(page.page_text(false), "a b");
    }

    #[test]
    fn empty_content_is_empty_page() {
        let page = analyze("");
        assert!(page.is_empty());
    }

    #[test]
    fn graphics_state_nesting_restores_ctm() {
        let page = analyze("q 2 0 0 2 0 0 cm Q BT /F1 12 Tf 72 720 Td (x) Tj ET");
        assert_eq!(page.words().len(), 1);
        // glyph is at unscaled coordinates: q/Q bracketed the cm
        assert!((page.words()[0].rect.x_min - 72.0).abs() < 1e-9);
    }

    #[test]
    fn decode_pdf_string_utf16be() {
        let s = decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42]);
        assert_eq!(s, "AB");
    }

    #[test]
    fn decode_pdf_string_bytes() {
        assert_eq!(decode_pdf_string(b"plain"), "plain");
    }
}
