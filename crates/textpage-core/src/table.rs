//! Table detection over formed blocks.
//!
//! A table shows up as four blocks aligned at the corners of a 2x2
//! neighborhood: for a candidate cell the detector locates its nearest
//! right neighbor, nearest lower neighbor and nearest diagonal neighbor,
//! then scores alignment correspondences on both axes. Matching
//! quadruples share a table id; a table's extended boxes are replaced by
//! the common envelope so the reading-order sort treats the table as one
//! region.

use crate::block::BlockBuilder;
use crate::config::AnalysisOptions;
use crate::geometry::Rect;

/// Font size of the block's first word, when any.
fn lead_font_size(blk: &BlockBuilder) -> Option<f64> {
    blk.lines.first().and_then(|l| l.words.first()).map(|w| w.font_size)
}

fn center_x(r: &Rect) -> f64 {
    (r.x_min + r.x_max) / 2.0
}

fn center_y(r: &Rect) -> f64 {
    (r.y_min + r.y_max) / 2.0
}

fn overlap_x(a: &Rect, b: &Rect) -> bool {
    a.x_min <= b.x_max && a.x_max >= b.x_min
}

fn overlap_y(a: &Rect, b: &Rect) -> bool {
    a.y_min <= b.y_max && a.y_max >= b.y_min
}

/// Assign table ids, substitute table envelopes, mark table ends and
/// widen the extended boxes of non-table blocks. Returns the number of
/// tables found.
pub(crate) fn detect_tables(
    blocks: &mut [BlockBuilder],
    primary_lr: bool,
    opts: &AnalysisOptions,
) -> usize {
    let n = blocks.len();
    for blk in blocks.iter_mut() {
        blk.ex = blk.rect;
    }

    let mut num_tables = 0usize;

    for i in 0..n {
        let r1 = blocks[i].rect;

        // nearest neighbors: right with y-overlap, below with x-overlap,
        // and strictly right-and-below
        let mut bx_min0 = f64::MAX;
        let mut by_min0 = f64::MAX;
        let mut bx_min1 = f64::MAX;
        let mut by_min1 = f64::MAX;
        let mut b2: Option<usize> = None;
        let mut b3: Option<usize> = None;
        let mut b4: Option<usize> = None;

        for j in 0..n {
            if j == i {
                continue;
            }
            let r = blocks[j].rect;
            if r.y_min <= r1.y_max
                && r.y_max >= r1.y_min
                && r.x_min > r1.x_max
                && r.x_min < bx_min0
            {
                bx_min0 = r.x_min;
                b2 = Some(j);
            } else if r.x_min <= r1.x_max
                && r.x_max >= r1.x_min
                && r.y_min > r1.y_max
                && r.y_min < by_min0
            {
                by_min0 = r.y_min;
                b3 = Some(j);
            } else if r.x_min > r1.x_max
                && r.x_min < bx_min1
                && r.y_min > r1.y_max
                && r.y_min < by_min1
            {
                bx_min1 = r.x_min;
                by_min1 = r.y_min;
                b4 = Some(j);
            }
        }

        let (Some(i2), Some(i3), Some(i4)) = (b2, b3, b4) else {
            continue;
        };
        let (r2, r3, r4) = (blocks[i2].rect, blocks[i3].rect, blocks[i4].rect);

        // the corners must not collapse: b2/b3 disjoint from each other,
        // b4 clear of b3 in x and of b2 in y, and b4 anchored to b2's
        // column and b3's row
        if overlap_x(&r3, &r4)
            || overlap_y(&r2, &r4)
            || overlap_x(&r2, &r3)
            || overlap_y(&r2, &r3)
            || !(overlap_x(&r4, &r2) && overlap_y(&r4, &r3))
        {
            continue;
        }

        // alignment correspondences, scaled by the smallest lead font
        let mut delta = 0.0;
        if let Some(fs) = lead_font_size(&blocks[i]) {
            delta = fs;
        }
        for k in [i2, i3, i4] {
            if let Some(fs) = lead_font_size(&blocks[k]) {
                delta = delta.min(fs);
            }
        }
        let delta_x = delta * opts.min_col_spacing1;
        let delta_y = delta * opts.max_intra_line_delta;

        let mut corr_x = 0;
        let mut corr_y = 0;
        if (center_x(&r1) - center_x(&r3)).abs() <= delta_x
            && (center_x(&r2) - center_x(&r4)).abs() <= delta_x
        {
            corr_x += 1;
        }
        if (center_y(&r1) - center_y(&r2)).abs() <= delta_y
            && (center_y(&r3) - center_y(&r4)).abs() <= delta_y
        {
            corr_y += 1;
        }
        if (r1.x_min - r3.x_min).abs() <= delta_x && (r2.x_min - r4.x_min).abs() <= delta_x {
            corr_x += 1;
        }
        if (r1.x_max - r3.x_max).abs() <= delta_x && (r2.x_max - r4.x_max).abs() <= delta_x {
            corr_x += 1;
        }
        if (r1.y_min - r2.y_min).abs() <= delta_y && (r3.y_min - r4.y_min).abs() <= delta_y {
            corr_y += 1;
        }
        if (r1.y_max - r2.y_max).abs() <= delta_y && (r3.y_max - r4.y_max).abs() <= delta_y {
            corr_y += 1;
        }

        if corr_x > 0 && corr_y > 0 {
            let mut table_id = -1;
            for k in [i, i2, i3, i4] {
                table_id = table_id.max(blocks[k].table_id);
            }
            if table_id < 0 {
                table_id = num_tables as i32;
                num_tables += 1;
            }
            for k in [i, i2, i3, i4] {
                blocks[k].table_id = table_id;
            }
        }
    }

    // replace member extended boxes by the table envelope and mark the
    // member on the reading-primary side as the table's end
    let mut envelopes = vec![
        Rect::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        num_tables
    ];
    let mut ending: Vec<usize> = vec![0; num_tables];

    for (i, blk) in blocks.iter().enumerate() {
        if blk.table_id < 0 {
            continue;
        }
        let t = blk.table_id as usize;
        if blk.ex.x_min < envelopes[t].x_min {
            envelopes[t].x_min = blk.ex.x_min;
            if !primary_lr {
                ending[t] = i;
            }
        }
        if blk.ex.x_max > envelopes[t].x_max {
            envelopes[t].x_max = blk.ex.x_max;
            if primary_lr {
                ending[t] = i;
            }
        }
        envelopes[t].y_min = envelopes[t].y_min.min(blk.ex.y_min);
        envelopes[t].y_max = envelopes[t].y_max.max(blk.ex.y_max);
    }

    for i in 0..n {
        if blocks[i].table_id < 0 {
            continue;
        }
        let t = blocks[i].table_id as usize;
        let end_rect = blocks[ending[t]].rect;
        if blocks[i].rect.x_min <= end_rect.x_max && blocks[i].rect.x_max >= end_rect.x_min {
            blocks[i].table_end = true;
        }
    }

    for blk in blocks.iter_mut() {
        if blk.table_id >= 0 {
            blk.ex = envelopes[blk.table_id as usize];
        }
    }

    // widen non-table blocks horizontally toward blocks below, bounded by
    // the nearest same-row neighbor on each side
    for i in 0..n {
        if blocks[i].table_id >= 0 {
            continue;
        }
        let r1 = blocks[i].rect;
        let mut x_max = f64::MAX;
        let mut x_min = f64::MIN;
        for j in 0..n {
            if j == i {
                continue;
            }
            let r = blocks[j].rect;
            if r1.y_min <= r.y_max && r1.y_max >= r.y_min {
                if r.x_min < x_max && r.x_min > r1.x_max {
                    x_max = r.x_min;
                }
                if r.x_max > x_min && r.x_max < r1.x_min {
                    x_min = r.x_max;
                }
            }
        }
        for j in 0..n {
            if j == i {
                continue;
            }
            let r = blocks[j].rect;
            if r.x_max > blocks[i].ex.x_max && r.x_max <= x_max && r.y_min >= r1.y_max {
                blocks[i].ex.x_max = r.x_max;
            }
            if r.x_min < blocks[i].ex.x_min && r.x_min >= x_min && r.y_min >= r1.y_max {
                blocks[i].ex.x_min = r.x_min;
            }
        }
    }

    num_tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::test_support::make_word;

    /// A block holding one word covering the given rectangle.
    fn block_at(x0: f64, y0: f64, x1: f64, y1: f64) -> BlockBuilder {
        let opts = AnalysisOptions::default();
        let mut w = make_word(&[('x', x0, x1 - x0)], y1, 10.0);
        w.rect = Rect::new(x0, y0, x1, y1);
        w.base = y1;
        let mut blk = BlockBuilder::new(w, &opts);
        blk.coalesce(&opts);
        blk
    }

    fn two_by_two() -> Vec<BlockBuilder> {
        // Name  Age
        // Alice 30
        vec![
            block_at(10.0, 100.0, 50.0, 112.0),
            block_at(80.0, 100.0, 110.0, 112.0),
            block_at(10.0, 130.0, 52.0, 142.0),
            block_at(80.0, 130.0, 104.0, 142.0),
        ]
    }

    #[test]
    fn aligned_quadruple_becomes_table() {
        let mut blocks = two_by_two();
        let n = detect_tables(&mut blocks, true, &AnalysisOptions::default());
        assert_eq!(n, 1);
        assert!(blocks.iter().all(|b| b.table_id == 0));
    }

    #[test]
    fn table_members_share_envelope() {
        let mut blocks = two_by_two();
        detect_tables(&mut blocks, true, &AnalysisOptions::default());
        let env = Rect::new(10.0, 100.0, 110.0, 142.0);
        for blk in &blocks {
            assert_eq!(blk.ex, env);
        }
    }

    #[test]
    fn right_column_marks_table_end_for_lr() {
        let mut blocks = two_by_two();
        detect_tables(&mut blocks, true, &AnalysisOptions::default());
        assert!(!blocks[0].table_end);
        assert!(blocks[1].table_end);
        assert!(!blocks[2].table_end);
        assert!(blocks[3].table_end);
    }

    #[test]
    fn misaligned_blocks_are_not_a_table() {
        let mut blocks = vec![
            block_at(10.0, 100.0, 50.0, 112.0),
            block_at(80.0, 60.0, 110.0, 112.0),
            block_at(25.0, 130.0, 52.0, 142.0),
            block_at(95.0, 130.0, 104.0, 142.0),
        ];
        let n = detect_tables(&mut blocks, true, &AnalysisOptions::default());
        assert_eq!(n, 0);
        assert!(blocks.iter().all(|b| b.table_id == -1));
    }

    #[test]
    fn three_by_two_grid_joins_one_table() {
        // Name  Age
        // Alice 30
        // Bob   25
        let mut blocks = vec![
            block_at(10.0, 100.0, 50.0, 112.0),
            block_at(80.0, 100.0, 110.0, 112.0),
            block_at(10.0, 130.0, 52.0, 142.0),
            block_at(80.0, 130.0, 104.0, 142.0),
            block_at(10.0, 160.0, 40.0, 172.0),
            block_at(80.0, 160.0, 102.0, 172.0),
        ];
        let n = detect_tables(&mut blocks, true, &AnalysisOptions::default());
        assert_eq!(n, 1);
        assert!(blocks.iter().all(|b| b.table_id == 0));
    }

    #[test]
    fn isolated_blocks_get_widened_ex_toward_lower_neighbors() {
        // heading above a wider paragraph: the heading's extended box
        // grows to the paragraph's width
        let mut blocks = vec![
            block_at(10.0, 50.0, 60.0, 62.0),
            block_at(10.0, 80.0, 200.0, 140.0),
        ];
        let n = detect_tables(&mut blocks, true, &AnalysisOptions::default());
        assert_eq!(n, 0);
        assert_eq!(blocks[0].ex.x_max, 200.0);
        assert_eq!(blocks[1].ex, blocks[1].rect);
    }
}
