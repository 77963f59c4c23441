//! Font decode tables: code → Unicode and code → advance width.
//!
//! Simple fonts decode one byte at a time through an embedded ToUnicode
//! CMap, a `/Differences` glyph-name override, or a base encoding
//! (WinAnsi / MacRoman). Identity-H composite fonts consume two-byte
//! codes and rely on ToUnicode for text. Glyph-name lookups go through
//! a process-wide cache behind its own mutex.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use textpage_core::config::AnalysisOptions;

use crate::cmap::{CMap, cached_tounicode};

/// One decoded character from a shown string.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChar {
    /// Character code from the content stream.
    pub code: u32,
    /// Number of bytes the code occupied.
    pub byte_len: usize,
    /// Unicode values (UTF-16 units widened; may hold surrogate halves).
    pub unicode: Vec<u32>,
    /// Advance width in thousandths of text space.
    pub width: f64,
}

/// Width table of a font.
#[derive(Debug, Clone)]
pub enum FontWidths {
    /// `/FirstChar` + `/Widths` array with a fallback for gaps.
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        missing: f64,
    },
    /// CID `/W` ranges over a `/DW` default.
    Cid {
        default: f64,
        ranges: Vec<(u32, u32, Vec<f64>)>,
    },
}

impl FontWidths {
    pub fn width(&self, code: u32) -> f64 {
        match self {
            FontWidths::Simple {
                first_char,
                widths,
                missing,
            } => {
                if code >= *first_char {
                    widths
                        .get((code - first_char) as usize)
                        .copied()
                        .unwrap_or(*missing)
                } else {
                    *missing
                }
            }
            FontWidths::Cid { default, ranges } => {
                for (lo, hi, ws) in ranges {
                    if code >= *lo && code <= *hi {
                        // a single-entry list covers the whole range
                        let idx = if ws.len() == 1 {
                            0
                        } else {
                            (code - lo) as usize
                        };
                        if let Some(w) = ws.get(idx) {
                            return *w;
                        }
                    }
                }
                *default
            }
        }
    }
}

/// Base single-byte encoding of a simple font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    /// WinAnsiEncoding; also the fallback for StandardEncoding.
    WinAnsi,
    MacRoman,
}

impl BaseEncoding {
    fn decode_byte(self, b: u8) -> Option<char> {
        let enc = match self {
            BaseEncoding::WinAnsi => encoding_rs::WINDOWS_1252,
            BaseEncoding::MacRoman => encoding_rs::MACINTOSH,
        };
        let bytes = [b];
        let (s, _) = enc.decode_without_bom_handling(&bytes);
        s.chars().next().filter(|c| *c != '\u{FFFD}')
    }
}

/// Character decoding tables for one font resource.
#[derive(Debug)]
pub struct LoadedFont {
    /// Registry key: resource name plus base font name.
    pub key: String,
    /// Two-byte Identity-H codes.
    pub is_cid: bool,
    pub to_unicode: Option<Arc<CMap>>,
    pub base_encoding: BaseEncoding,
    /// `/Differences` overrides: code → glyph name.
    pub differences: HashMap<u8, String>,
    pub widths: FontWidths,
    /// Ascent as a fraction of the font size.
    pub ascent: f64,
    /// Descent as a fraction of the font size (negative).
    pub descent: f64,
}

impl LoadedFont {
    /// Decode a shown string into characters with widths.
    pub fn decode_string(&self, bytes: &[u8], opts: &AnalysisOptions) -> Vec<DecodedChar> {
        let code_len = if self.is_cid { 2 } else { 1 };
        let mut out = Vec::with_capacity(bytes.len() / code_len);
        let mut i = 0;
        while i < bytes.len() {
            let (code, byte_len) = if code_len == 2 {
                if i + 1 < bytes.len() {
                    (((bytes[i] as u32) << 8) | bytes[i + 1] as u32, 2)
                } else {
                    (bytes[i] as u32, 1)
                }
            } else {
                (bytes[i] as u32, 1)
            };
            let unicode = self.unicode_for(code, opts);
            out.push(DecodedChar {
                code,
                byte_len,
                unicode,
                width: self.widths.width(code),
            });
            i += byte_len;
        }
        out
    }

    fn unicode_for(&self, code: u32, opts: &AnalysisOptions) -> Vec<u32> {
        if let Some(cmap) = &self.to_unicode {
            if let Some(units) = cmap.map(code) {
                return units.into_iter().map(u32::from).collect();
            }
        }
        if !self.is_cid {
            if let Ok(byte) = u8::try_from(code) {
                if let Some(name) = self.differences.get(&byte) {
                    if let Some(c) = glyph_name_to_unicode(name, opts) {
                        return vec![c as u32];
                    }
                    return if opts.map_unknown_char_names {
                        vec![code]
                    } else {
                        vec![0xFFFD]
                    };
                }
                if let Some(c) = self.base_encoding.decode_byte(byte) {
                    return vec![c as u32];
                }
            }
        }
        if opts.map_unknown_char_names {
            vec![code]
        } else {
            vec![0xFFFD]
        }
    }
}

fn glyph_name_cache() -> &'static Mutex<HashMap<String, Option<char>>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Option<char>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Resolve an Adobe glyph name to a Unicode character.
///
/// Handles `uniXXXX` / `uXXXX[XX]` forms and the common-name table
/// through the process-wide cache; purely numeric and `gNN`/`cidNN`
/// subset names (behind the `map_numeric_char_names` toggle) resolve
/// outside the cache since their meaning depends on the toggle.
pub fn glyph_name_to_unicode(name: &str, opts: &AnalysisOptions) -> Option<char> {
    let fixed = {
        let cache = match glyph_name_cache().lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.get(name).copied()
    };
    let fixed = match fixed {
        Some(hit) => hit,
        None => {
            let resolved = resolve_fixed_glyph_name(name);
            let mut cache = match glyph_name_cache().lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            cache.insert(name.to_string(), resolved);
            resolved
        }
    };
    if fixed.is_some() {
        return fixed;
    }

    if opts.map_numeric_char_names {
        let digits = name
            .strip_prefix("cid")
            .or_else(|| name.strip_prefix('g'))
            .unwrap_or(name);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(code) = digits.parse::<u32>() {
                return char::from_u32(code);
            }
        }
    }
    None
}

fn resolve_fixed_glyph_name(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            if let Ok(code) = u32::from_str_radix(hex, 16) {
                return char::from_u32(code);
            }
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            if let Ok(code) = u32::from_str_radix(hex, 16) {
                return char::from_u32(code);
            }
        }
    }
    GLYPH_NAME_MAP
        .binary_search_by_key(&name, |&(n, _)| n)
        .ok()
        .map(|i| GLYPH_NAME_MAP[i].1)
}

/// Common Adobe glyph names, sorted for binary search.
static GLYPH_NAME_MAP: &[(&str, char)] = &[
    ("A", 'A'),
    ("AE", '\u{00C6}'),
    ("Aacute", '\u{00C1}'),
    ("Adieresis", '\u{00C4}'),
    ("Agrave", '\u{00C0}'),
    ("Aring", '\u{00C5}'),
    ("B", 'B'),
    ("C", 'C'),
    ("Ccedilla", '\u{00C7}'),
    ("D", 'D'),
    ("E", 'E'),
    ("Eacute", '\u{00C9}'),
    ("Euro", '\u{20AC}'),
    ("F", 'F'),
    ("G", 'G'),
    ("H", 'H'),
    ("I", 'I'),
    ("J", 'J'),
    ("K", 'K'),
    ("L", 'L'),
    ("M", 'M'),
    ("N", 'N'),
    ("Ntilde", '\u{00D1}'),
    ("O", 'O'),
    ("OE", '\u{0152}'),
    ("Odieresis", '\u{00D6}'),
    ("P", 'P'),
    ("Q", 'Q'),
    ("R", 'R'),
    ("S", 'S'),
    ("T", 'T'),
    ("U", 'U'),
    ("Udieresis", '\u{00DC}'),
    ("V", 'V'),
    ("W", 'W'),
    ("X", 'X'),
    ("Y", 'Y'),
    ("Z", 'Z'),
    ("a", 'a'),
    ("aacute", '\u{00E1}'),
    ("acircumflex", '\u{00E2}'),
    ("adieresis", '\u{00E4}'),
    ("agrave", '\u{00E0}'),
    ("ampersand", '&'),
    ("aring", '\u{00E5}'),
    ("asciicircum", '^'),
    ("asciitilde", '~'),
    ("asterisk", '*'),
    ("at", '@'),
    ("b", 'b'),
    ("backslash", '\\'),
    ("bar", '|'),
    ("braceleft", '{'),
    ("braceright", '}'),
    ("bracketleft", '['),
    ("bracketright", ']'),
    ("bullet", '\u{2022}'),
    ("c", 'c'),
    ("ccedilla", '\u{00E7}'),
    ("colon", ':'),
    ("comma", ','),
    ("d", 'd'),
    ("dagger", '\u{2020}'),
    ("dollar", '$'),
    ("e", 'e'),
    ("eacute", '\u{00E9}'),
    ("ecircumflex", '\u{00EA}'),
    ("egrave", '\u{00E8}'),
    ("eight", '8'),
    ("emdash", '\u{2014}'),
    ("endash", '\u{2013}'),
    ("equal", '='),
    ("exclam", '!'),
    ("f", 'f'),
    ("fi", '\u{FB01}'),
    ("five", '5'),
    ("fl", '\u{FB02}'),
    ("four", '4'),
    ("g", 'g'),
    ("germandbls", '\u{00DF}'),
    ("grave", '`'),
    ("greater", '>'),
    ("h", 'h'),
    ("hyphen", '-'),
    ("i", 'i'),
    ("j", 'j'),
    ("k", 'k'),
    ("l", 'l'),
    ("less", '<'),
    ("m", 'm'),
    ("n", 'n'),
    ("nine", '9'),
    ("ntilde", '\u{00F1}'),
    ("numbersign", '#'),
    ("o", 'o'),
    ("odieresis", '\u{00F6}'),
    ("oe", '\u{0153}'),
    ("one", '1'),
    ("p", 'p'),
    ("parenleft", '('),
    ("parenright", ')'),
    ("percent", '%'),
    ("period", '.'),
    ("plus", '+'),
    ("q", 'q'),
    ("question", '?'),
    ("quotedbl", '"'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("quoteleft", '\u{2018}'),
    ("quoteright", '\u{2019}'),
    ("quotesingle", '\''),
    ("r", 'r'),
    ("s", 's'),
    ("semicolon", ';'),
    ("seven", '7'),
    ("six", '6'),
    ("slash", '/'),
    ("space", ' '),
    ("t", 't'),
    ("three", '3'),
    ("two", '2'),
    ("u", 'u'),
    ("udieresis", '\u{00FC}'),
    ("underscore", '_'),
    ("v", 'v'),
    ("w", 'w'),
    ("x", 'x'),
    ("y", 'y'),
    ("z", 'z'),
    ("zero", '0'),
];

/// Default widths used when a font dictionary carries none.
pub fn default_widths() -> FontWidths {
    FontWidths::Simple {
        first_char: 0,
        widths: Vec::new(),
        missing: 500.0,
    }
}

/// A font with nothing but defaults, for states that draw text before
/// any Tf operator.
pub fn fallback_font(key: &str) -> LoadedFont {
    LoadedFont {
        key: key.to_string(),
        is_cid: false,
        to_unicode: None,
        base_encoding: BaseEncoding::WinAnsi,
        differences: HashMap::new(),
        widths: default_widths(),
        ascent: 0.95,
        descent: -0.35,
    }
}

/// Wrap a raw ToUnicode stream through the process-wide CMap cache.
pub fn tounicode_from_stream(bytes: &[u8]) -> Option<Arc<CMap>> {
    let cmap = cached_tounicode(bytes);
    if cmap.is_empty() { None } else { Some(cmap) }
}
