//! Page range parsing: `1,3-5` style, 1-based, clamped to the document.

/// Parse a page range expression into 0-based page indices.
///
/// Accepts comma-separated entries of single pages (`3`) and inclusive
/// spans (`2-5`). `None` or an empty expression yields all pages.
pub fn parse_page_range(expr: Option<&str>, page_count: usize) -> Result<Vec<usize>, String> {
    let Some(expr) = expr.filter(|e| !e.trim().is_empty()) else {
        return Ok((0..page_count).collect());
    };

    let mut pages = Vec::new();
    for part in expr.split(',') {
        let part = part.trim();
        if let Some((lo, hi)) = part.split_once('-') {
            let lo: usize = lo
                .trim()
                .parse()
                .map_err(|_| format!("invalid page number '{lo}'"))?;
            let hi: usize = hi
                .trim()
                .parse()
                .map_err(|_| format!("invalid page number '{hi}'"))?;
            if lo == 0 || hi < lo {
                return Err(format!("invalid page span '{part}'"));
            }
            for p in lo..=hi {
                if p <= page_count {
                    pages.push(p - 1);
                }
            }
        } else {
            let p: usize = part
                .parse()
                .map_err(|_| format!("invalid page number '{part}'"))?;
            if p == 0 {
                return Err("page numbers are 1-based".to_string());
            }
            if p <= page_count {
                pages.push(p - 1);
            }
        }
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_pages() {
        assert_eq!(parse_page_range(None, 3).unwrap(), vec![0, 1, 2]);
        assert_eq!(parse_page_range(Some(""), 2).unwrap(), vec![0, 1]);
    }

    #[test]
    fn single_and_span() {
        assert_eq!(parse_page_range(Some("2"), 5).unwrap(), vec![1]);
        assert_eq!(parse_page_range(Some("2-4"), 5).unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_page_range(Some("1,3-4"), 5).unwrap(), vec![0, 2, 3]);
    }

    #[test]
    fn out_of_range_pages_dropped() {
        assert_eq!(parse_page_range(Some("2-9"), 3).unwrap(), vec![1, 2]);
        assert_eq!(parse_page_range(Some("9"), 3).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn invalid_expressions_fail() {
        assert!(parse_page_range(Some("x"), 3).is_err());
        assert!(parse_page_range(Some("0"), 3).is_err());
        assert!(parse_page_range(Some("4-2"), 9).is_err());
    }
}
