//! ToUnicode CMap parsing.
//!
//! A ToUnicode CMap maps character codes to UTF-16 code unit sequences
//! via `bfchar` and `bfrange` sections. Parsed CMaps are shared through
//! a process-wide cache keyed by the stream content, guarded by its own
//! mutex.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, OnceLock};

use crate::tokenizer::{Operand, tokenize};

/// A parsed ToUnicode mapping.
#[derive(Debug, Default)]
pub struct CMap {
    single: HashMap<u32, Vec<u16>>,
    ranges: Vec<(u32, u32, Vec<u16>)>,
    /// Code byte width from the codespace ranges (1 or 2).
    code_bytes: usize,
}

impl CMap {
    /// Number of bytes per character code (1 or 2).
    pub fn code_bytes(&self) -> usize {
        if self.code_bytes == 0 { 1 } else { self.code_bytes }
    }

    /// UTF-16 code units for a character code, if mapped.
    pub fn map(&self, code: u32) -> Option<Vec<u16>> {
        if let Some(units) = self.single.get(&code) {
            return Some(units.clone());
        }
        for (lo, hi, start) in &self.ranges {
            if code >= *lo && code <= *hi {
                let mut units = start.clone();
                if let Some(last) = units.last_mut() {
                    *last = last.wrapping_add((code - lo) as u16);
                }
                return Some(units);
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.single.is_empty() && self.ranges.is_empty()
    }
}

fn bytes_to_code(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn bytes_to_utf16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|c| {
            if c.len() == 2 {
                ((c[0] as u16) << 8) | c[1] as u16
            } else {
                c[0] as u16
            }
        })
        .collect()
}

/// Parse a ToUnicode CMap stream.
pub fn parse_tounicode(bytes: &[u8]) -> CMap {
    let mut cmap = CMap::default();
    for op in tokenize(bytes) {
        match op.name.as_str() {
            "endcodespacerange" => {
                for pair in op.operands.chunks(2) {
                    if let [Operand::HexString(lo), Operand::HexString(_)] = pair {
                        cmap.code_bytes = cmap.code_bytes.max(lo.len());
                    }
                }
            }
            "endbfchar" => {
                for pair in op.operands.chunks(2) {
                    if let [Operand::HexString(src), Operand::HexString(dst)] = pair {
                        cmap.code_bytes = cmap.code_bytes.max(src.len());
                        cmap.single
                            .insert(bytes_to_code(src), bytes_to_utf16(dst));
                    }
                }
            }
            "endbfrange" => {
                for triple in op.operands.chunks(3) {
                    match triple {
                        [
                            Operand::HexString(lo),
                            Operand::HexString(hi),
                            Operand::HexString(dst),
                        ] => {
                            cmap.code_bytes = cmap.code_bytes.max(lo.len());
                            cmap.ranges.push((
                                bytes_to_code(lo),
                                bytes_to_code(hi),
                                bytes_to_utf16(dst),
                            ));
                        }
                        [
                            Operand::HexString(lo),
                            Operand::HexString(hi),
                            Operand::Array(dsts),
                        ] => {
                            cmap.code_bytes = cmap.code_bytes.max(lo.len());
                            let lo = bytes_to_code(lo);
                            let hi = bytes_to_code(hi);
                            for (i, dst) in dsts.iter().enumerate() {
                                if let Operand::HexString(dst) = dst {
                                    let code = lo + i as u32;
                                    if code <= hi {
                                        cmap.single.insert(code, bytes_to_utf16(dst));
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    cmap
}

fn cmap_cache() -> &'static Mutex<HashMap<u64, Arc<CMap>>> {
    static CACHE: OnceLock<Mutex<HashMap<u64, Arc<CMap>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Parse a ToUnicode CMap through the process-wide cache.
pub fn cached_tounicode(bytes: &[u8]) -> Arc<CMap> {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    bytes.hash(&mut hasher);
    let key = hasher.finish();

    let mut cache = match cmap_cache().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    cache
        .entry(key)
        .or_insert_with(|| Arc::new(parse_tounicode(bytes)))
        .clone()
}
