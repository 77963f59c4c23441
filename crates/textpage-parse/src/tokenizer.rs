//! Content-stream tokenizer.
//!
//! Splits raw content-stream bytes into operators with their operand
//! stacks. Junk bytes are skipped rather than rejected; a damaged
//! stream yields the operators that could be read.

/// A content-stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Integer(i64),
    Real(f64),
    /// Name object without the leading `/`.
    Name(String),
    /// Literal string `(...)` as raw bytes with escapes resolved.
    LiteralString(Vec<u8>),
    /// Hex string `<...>` as decoded bytes.
    HexString(Vec<u8>),
    Array(Vec<Operand>),
    /// Dictionary `<< ... >>` as key-value pairs.
    Dictionary(Vec<(String, Operand)>),
    Boolean(bool),
    Null,
}

impl Operand {
    /// Numeric value of an Integer or Real operand.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Integer(i) => Some(*i as f64),
            Operand::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// Raw bytes of a literal or hex string operand.
    pub fn as_string_bytes(&self) -> Option<&[u8]> {
        match self {
            Operand::LiteralString(b) | Operand::HexString(b) => Some(b),
            _ => None,
        }
    }
}

/// One operator with the operands that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub operands: Vec<Operand>,
}

/// Tokenize a content stream. Never fails: unreadable constructs are
/// skipped and tokenizing resumes at the next boundary.
pub fn tokenize(input: &[u8]) -> Vec<Operator> {
    let mut ops = Vec::new();
    let mut stack: Vec<Operand> = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        skip_whitespace_and_comments(input, &mut pos);
        if pos >= input.len() {
            break;
        }
        match input[pos] {
            b'(' => {
                let s = parse_literal_string(input, &mut pos);
                stack.push(Operand::LiteralString(s));
            }
            b'<' => {
                if input.get(pos + 1) == Some(&b'<') {
                    let dict = parse_dictionary(input, &mut pos);
                    stack.push(Operand::Dictionary(dict));
                } else {
                    let s = parse_hex_string(input, &mut pos);
                    stack.push(Operand::HexString(s));
                }
            }
            b'[' => {
                pos += 1;
                let arr = parse_array(input, &mut pos);
                stack.push(Operand::Array(arr));
            }
            b'/' => {
                let name = parse_name(input, &mut pos);
                stack.push(Operand::Name(name));
            }
            b'0'..=b'9' | b'+' | b'-' | b'.' => {
                stack.push(parse_number(input, &mut pos));
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'*' | b'\'' | b'"' => {
                let keyword = parse_keyword(input, &mut pos);
                match keyword.as_str() {
                    "true" => stack.push(Operand::Boolean(true)),
                    "false" => stack.push(Operand::Boolean(false)),
                    "null" => stack.push(Operand::Null),
                    "BI" => skip_inline_image(input, &mut pos),
                    _ => ops.push(Operator {
                        name: keyword,
                        operands: std::mem::take(&mut stack),
                    }),
                }
            }
            _ => pos += 1,
        }
    }
    ops
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn skip_whitespace_and_comments(input: &[u8], pos: &mut usize) {
    while *pos < input.len() {
        if is_whitespace(input[*pos]) {
            *pos += 1;
        } else if input[*pos] == b'%' {
            while *pos < input.len() && input[*pos] != b'\n' && input[*pos] != b'\r' {
                *pos += 1;
            }
        } else {
            break;
        }
    }
}

fn parse_literal_string(input: &[u8], pos: &mut usize) -> Vec<u8> {
    *pos += 1;
    let mut out = Vec::new();
    let mut depth = 1u32;
    while *pos < input.len() {
        let b = input[*pos];
        match b {
            b'(' => {
                depth += 1;
                out.push(b);
                *pos += 1;
            }
            b')' => {
                depth -= 1;
                *pos += 1;
                if depth == 0 {
                    return out;
                }
                out.push(b);
            }
            b'\\' => {
                *pos += 1;
                let Some(&esc) = input.get(*pos) else { break };
                match esc {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'(' | b')' | b'\\' => out.push(esc),
                    b'\r' => {
                        // line continuation; swallow an optional LF
                        if input.get(*pos + 1) == Some(&b'\n') {
                            *pos += 1;
                        }
                    }
                    b'\n' => {}
                    b'0'..=b'7' => {
                        let mut val = esc - b'0';
                        for _ in 0..2 {
                            match input.get(*pos + 1) {
                                Some(&d @ b'0'..=b'7') => {
                                    *pos += 1;
                                    val = val.wrapping_mul(8).wrapping_add(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        out.push(val);
                    }
                    _ => out.push(esc),
                }
                *pos += 1;
            }
            _ => {
                out.push(b);
                *pos += 1;
            }
        }
    }
    out
}

fn parse_hex_string(input: &[u8], pos: &mut usize) -> Vec<u8> {
    *pos += 1;
    let mut digits: Vec<u8> = Vec::new();
    while *pos < input.len() && input[*pos] != b'>' {
        let b = input[*pos];
        if b.is_ascii_hexdigit() {
            digits.push(b);
        }
        *pos += 1;
    }
    if *pos < input.len() {
        *pos += 1;
    }
    // an odd final digit counts as if followed by zero
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    digits
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16).unwrap_or(0) as u8;
            let lo = (pair[1] as char).to_digit(16).unwrap_or(0) as u8;
            (hi << 4) | lo
        })
        .collect()
}

fn parse_name(input: &[u8], pos: &mut usize) -> String {
    *pos += 1;
    let start = *pos;
    while *pos < input.len() && !is_whitespace(input[*pos]) && !is_delimiter(input[*pos]) {
        *pos += 1;
    }
    let raw = &input[start..*pos];
    // resolve #xx escapes
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            let hi = (raw[i + 1] as char).to_digit(16);
            let lo = (raw[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push(((hi << 4) | lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn parse_number(input: &[u8], pos: &mut usize) -> Operand {
    let start = *pos;
    if matches!(input[*pos], b'+' | b'-') {
        *pos += 1;
    }
    let mut real = false;
    while *pos < input.len() {
        match input[*pos] {
            b'0'..=b'9' => *pos += 1,
            b'.' if !real => {
                real = true;
                *pos += 1;
            }
            _ => break,
        }
    }
    let text = std::str::from_utf8(&input[start..*pos]).unwrap_or("0");
    if real {
        Operand::Real(text.parse().unwrap_or(0.0))
    } else {
        match text.parse::<i64>() {
            Ok(i) => Operand::Integer(i),
            Err(_) => Operand::Real(text.parse().unwrap_or(0.0)),
        }
    }
}

fn parse_keyword(input: &[u8], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < input.len() && !is_whitespace(input[*pos]) && !is_delimiter(input[*pos]) {
        *pos += 1;
    }
    String::from_utf8_lossy(&input[start..*pos]).into_owned()
}

fn parse_array(input: &[u8], pos: &mut usize) -> Vec<Operand> {
    let mut items = Vec::new();
    loop {
        skip_whitespace_and_comments(input, pos);
        if *pos >= input.len() {
            break;
        }
        match input[*pos] {
            b']' => {
                *pos += 1;
                break;
            }
            b'(' => {
                let s = parse_literal_string(input, pos);
                items.push(Operand::LiteralString(s));
            }
            b'<' => {
                if input.get(*pos + 1) == Some(&b'<') {
                    let dict = parse_dictionary(input, pos);
                    items.push(Operand::Dictionary(dict));
                } else {
                    let s = parse_hex_string(input, pos);
                    items.push(Operand::HexString(s));
                }
            }
            b'[' => {
                *pos += 1;
                let arr = parse_array(input, pos);
                items.push(Operand::Array(arr));
            }
            b'/' => {
                let name = parse_name(input, pos);
                items.push(Operand::Name(name));
            }
            b'0'..=b'9' | b'+' | b'-' | b'.' => items.push(parse_number(input, pos)),
            b'a'..=b'z' | b'A'..=b'Z' => {
                let kw = parse_keyword(input, pos);
                match kw.as_str() {
                    "true" => items.push(Operand::Boolean(true)),
                    "false" => items.push(Operand::Boolean(false)),
                    _ => items.push(Operand::Null),
                }
            }
            _ => *pos += 1,
        }
    }
    items
}

fn parse_dictionary(input: &[u8], pos: &mut usize) -> Vec<(String, Operand)> {
    *pos += 2; // <<
    let mut entries = Vec::new();
    loop {
        skip_whitespace_and_comments(input, pos);
        if *pos >= input.len() {
            break;
        }
        if input[*pos] == b'>' && input.get(*pos + 1) == Some(&b'>') {
            *pos += 2;
            break;
        }
        if input[*pos] != b'/' {
            *pos += 1;
            continue;
        }
        let key = parse_name(input, pos);
        skip_whitespace_and_comments(input, pos);
        if *pos >= input.len() {
            break;
        }
        let value = match input[*pos] {
            b'(' => Operand::LiteralString(parse_literal_string(input, pos)),
            b'<' => {
                if input.get(*pos + 1) == Some(&b'<') {
                    Operand::Dictionary(parse_dictionary(input, pos))
                } else {
                    Operand::HexString(parse_hex_string(input, pos))
                }
            }
            b'[' => {
                *pos += 1;
                Operand::Array(parse_array(input, pos))
            }
            b'/' => Operand::Name(parse_name(input, pos)),
            b'0'..=b'9' | b'+' | b'-' | b'.' => parse_number(input, pos),
            _ => {
                let kw = parse_keyword(input, pos);
                match kw.as_str() {
                    "true" => Operand::Boolean(true),
                    "false" => Operand::Boolean(false),
                    _ => Operand::Null,
                }
            }
        };
        entries.push((key, value));
    }
    entries
}

/// Skip an inline image: scan past `ID` up to the closing `EI`.
fn skip_inline_image(input: &[u8], pos: &mut usize) {
    // find ID
    while *pos + 1 < input.len() {
        if input[*pos] == b'I' && input[*pos + 1] == b'D' {
            *pos += 2;
            break;
        }
        *pos += 1;
    }
    // find EI at a token boundary
    while *pos + 1 < input.len() {
        if input[*pos] == b'E'
            && input[*pos + 1] == b'I'
            && (*pos == 0 || is_whitespace(input[*pos - 1]))
        {
            *pos += 2;
            return;
        }
        *pos += 1;
    }
    *pos = input.len();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_text_operators() {
        let ops = tokenize(b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET");
        let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["BT", "Tf", "Td", "Tj", "ET"]);
        assert_eq!(
            ops[1].operands,
            vec![Operand::Name("F1".into()), Operand::Integer(12)]
        );
        assert_eq!(
            ops[3].operands,
            vec![Operand::LiteralString(b"Hello".to_vec())]
        );
    }

    #[test]
    fn tj_array_with_kerning() {
        let ops = tokenize(b"[(A) -120 (B)] TJ");
        assert_eq!(ops.len(), 1);
        let Operand::Array(items) = &ops[0].operands[0] else {
            panic!("expected array");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[1], Operand::Integer(-120));
    }

    #[test]
    fn hex_string_decodes_with_odd_digit() {
        let ops = tokenize(b"<48656C6C6F> Tj <4> Tj");
        assert_eq!(
            ops[0].operands[0],
            Operand::HexString(b"Hello".to_vec())
        );
        assert_eq!(ops[1].operands[0], Operand::HexString(vec![0x40]));
    }

    #[test]
    fn literal_string_escapes() {
        let ops = tokenize(b"(a\\(b\\)c\\n\\101) Tj");
        assert_eq!(
            ops[0].operands[0],
            Operand::LiteralString(b"a(b)c\nA".to_vec())
        );
    }

    #[test]
    fn nested_parens_balance() {
        let ops = tokenize(b"(a(b)c) Tj");
        assert_eq!(ops[0].operands[0], Operand::LiteralString(b"a(b)c".to_vec()));
    }

    #[test]
    fn real_and_negative_numbers() {
        let ops = tokenize(b"1 0 0 -1 .5 -3.25 cm");
        assert_eq!(ops[0].operands[3], Operand::Integer(-1));
        assert_eq!(ops[0].operands[4], Operand::Real(0.5));
        assert_eq!(ops[0].operands[5], Operand::Real(-3.25));
    }

    #[test]
    fn bdc_dictionary_operand() {
        let ops = tokenize(b"/Span << /ActualText (fi) >> BDC EMC");
        assert_eq!(ops[0].name, "BDC");
        let Operand::Dictionary(entries) = &ops[0].operands[1] else {
            panic!("expected dictionary");
        };
        assert_eq!(entries[0].0, "ActualText");
        assert_eq!(entries[0].1, Operand::LiteralString(b"fi".to_vec()));
    }

    #[test]
    fn name_with_hash_escape() {
        let ops = tokenize(b"/A#20B Do");
        assert_eq!(ops[0].operands[0], Operand::Name("A B".into()));
    }

    #[test]
    fn comments_are_skipped() {
        let ops = tokenize(b"% setup\nBT ET");
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn inline_image_skipped() {
        let ops = tokenize(b"BI /W 1 /H 1 ID \x00\xff EI BT ET");
        let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["BT", "ET"]);
    }

    #[test]
    fn junk_bytes_are_skipped() {
        let ops = tokenize(b"\x01\x02 BT } ET");
        let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["BT", "ET"]);
    }

    #[test]
    fn unterminated_string_yields_partial() {
        let ops = tokenize(b"(never closed");
        assert!(ops.is_empty());
    }
}
