//! In-page substring search with whole-word bounding boxes.
//!
//! Matching follows the conventions of desktop PDF viewers: a query
//! without whitespace matches anywhere inside a word; a multi-word
//! query matches a run of words where the first word *ends with* the
//! first query word, the last *starts with* the last query word and the
//! interior words match exactly. The query and all word text compare
//! under NFKC, uppercased on both sides for case-insensitive search.

use crate::geometry::Rect;
use crate::norm::{fold_upper, nfkc_str};
use crate::page::TextPage;

impl TextPage {
    /// All matches of `keyword` on this page, as whole-word bounding
    /// boxes in fractional page coordinates. Matches spanning several
    /// visual lines emit one rectangle per line.
    pub fn search(&self, keyword: &str, case_sensitive: bool) -> Vec<Rect> {
        let mut result: Vec<Rect> = Vec::new();
        if self.blocks.is_empty() {
            return result;
        }

        let mut query = nfkc_str(keyword);
        if !case_sensitive {
            for c in query.iter_mut() {
                *c = fold_upper(*c);
            }
        }
        let parts: Vec<&[char]> = query
            .split(|c: &char| c.is_ascii_whitespace())
            .filter(|p| !p.is_empty())
            .collect();

        match parts.len() {
            0 => {}
            1 => {
                for w in &self.words {
                    if w.contains(parts[0], case_sensitive) {
                        result.push(w.rect);
                    }
                }
            }
            k => {
                let n = self.words.len();
                let mut i0 = 0;
                'scan: while i0 < n {
                    if !self.words[i0].ends_with(parts[0], case_sensitive) {
                        i0 += 1;
                        continue;
                    }
                    let mut wi = i0 + 1;
                    let mut matched = true;
                    for part in &parts[1..k - 1] {
                        if wi >= n {
                            break 'scan;
                        }
                        if !self.words[wi].text_eq(part, case_sensitive) {
                            matched = false;
                            break;
                        }
                        wi += 1;
                    }
                    if !matched {
                        i0 += 1;
                        continue;
                    }
                    if wi >= n {
                        break;
                    }
                    if !self.words[wi].starts_with(parts[k - 1], case_sensitive) {
                        i0 += 1;
                        continue;
                    }

                    // one rectangle per visual line across the matched run
                    let mut cur = self.words[i0].rect;
                    for w in i0 + 1..=wi {
                        if self.words[w].line == self.words[w - 1].line {
                            cur.absorb(&self.words[w].rect);
                        } else {
                            result.push(cur);
                            cur = self.words[w].rect;
                        }
                    }
                    result.push(cur);

                    i0 = wi + 1;
                }
            }
        }

        result
            .into_iter()
            .map(|r| r.scaled(self.page_width, self.page_height))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::page::test_support::build_page;

    #[test]
    fn single_word_query_matches_substring() {
        let page = build_page(&[("Hello world", 60.0, 80.0)]);
        let hits = page.search("ell", true);
        assert_eq!(hits.len(), 1);
        // whole word box of "Hello": x 60..90
        assert!((hits[0].x_min - 0.1).abs() < 1e-9);
        assert!((hits[0].x_max - 0.15).abs() < 1e-9);
    }

    #[test]
    fn single_word_query_can_match_many_words() {
        let page = build_page(&[("Hello world", 60.0, 80.0)]);
        let hits = page.search("l", true);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn multi_word_query_spans_word_boundary() {
        // "lo wor": "Hello" ends with "lo", "world" starts with "wor";
        // both on one line give one merged rectangle
        let page = build_page(&[("Hello world", 60.0, 80.0)]);
        let hits = page.search("lo wor", true);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].x_min - 60.0 / 600.0).abs() < 1e-9);
        assert!((hits[0].x_max - 126.0 / 600.0).abs() < 1e-9);
    }

    #[test]
    fn three_word_query_requires_exact_interior() {
        let page = build_page(&[("the quick brown fox", 60.0, 80.0)]);
        assert_eq!(page.search("he quick bro", true).len(), 1);
        assert_eq!(page.search("he slow bro", true).len(), 0);
    }

    #[test]
    fn match_across_lines_emits_rect_per_line() {
        let page = build_page(&[("ending", 60.0, 80.0), ("starting", 60.0, 110.0)]);
        let hits = page.search("ing start", true);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn case_sensitivity_respected() {
        let page = build_page(&[("Hello world", 60.0, 80.0)]);
        assert_eq!(page.search("hello", true).len(), 0);
        assert_eq!(page.search("hello", false).len(), 1);
        assert_eq!(page.search("LO WOR", false).len(), 1);
    }

    #[test]
    fn nfkc_makes_ligatures_searchable() {
        let page = build_page(&[("\u{FB01}nal", 60.0, 80.0)]);
        assert_eq!(page.search("final", true).len(), 1);
    }

    #[test]
    fn no_match_returns_empty() {
        let page = build_page(&[("Hello world", 60.0, 80.0)]);
        assert!(page.search("xyz", true).is_empty());
        assert!(page.search("", true).is_empty());
    }

    #[test]
    fn empty_page_returns_empty() {
        let page = build_page(&[]);
        assert!(page.search("anything", true).is_empty());
    }

    #[test]
    fn repeated_matches_found_in_order() {
        let page = build_page(&[("ab ab ab", 60.0, 80.0)]);
        let hits = page.search("ab", true);
        assert_eq!(hits.len(), 3);
        assert!(hits[0].x_min < hits[1].x_min);
        assert!(hits[1].x_min < hits[2].x_min);
    }

    #[test]
    fn whitespace_only_query_matches_nothing() {
        let page = build_page(&[("Hello world", 60.0, 80.0)]);
        assert!(page.search("   ", true).is_empty());
    }
}
