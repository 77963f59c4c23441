//! Reading-order sort of blocks.
//!
//! Implements the topological sort from T. M. Breuel, "High Performance
//! Document Layout Analysis" (2003): blocks are pre-sorted by a
//! rotation-aware (xMin, yMin) key, then a depth-first search visits
//! every predecessor under the *before* relation (table rule, Rule 1,
//! Rule 2) ahead of its successors. The relation can be cyclic on
//! pathological layouts; the visited set collapses cycles into the
//! pre-sort order, which keeps the result deterministic for a given
//! input.

use std::cmp::Ordering;

use crate::block::BlockBuilder;
use crate::geometry::Rect;
use crate::rotation::Rotation;

/// Rotation-aware primary-then-secondary block ordering used to seed the
/// depth-first search.
fn cmp_xy_primary_rot(a: &Rect, b: &Rect, primary_rot: Rotation) -> Ordering {
    let (first, second) = match primary_rot {
        Rotation::R0 => (a.x_min - b.x_min, a.y_min - b.y_min),
        Rotation::R90 => (a.y_min - b.y_min, b.x_max - a.x_max),
        Rotation::R180 => (b.x_max - a.x_max, b.y_min - a.y_min),
        Rotation::R270 => (b.y_max - a.y_max, a.x_max - b.x_max),
    };
    let key = if first != 0.0 { first } else { second };
    key.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}

fn overlap_closed_x(a: &Rect, b: &Rect) -> bool {
    (a.x_min <= b.x_min && b.x_min <= a.x_max) || (b.x_min <= a.x_min && a.x_min <= b.x_max)
}

fn overlap_closed_y(a: &Rect, b: &Rect) -> bool {
    (a.y_min <= b.y_min && b.y_min <= a.y_max) || (b.y_min <= a.y_min && a.y_min <= b.y_max)
}

/// Rule 1: `a` is before `b` when their extended boxes overlap along the
/// primary axis and `a` lies earlier on the secondary axis.
fn before_by_rule1(a: &Rect, b: &Rect, primary_rot: Rotation) -> bool {
    let overlap = if primary_rot.is_horizontal() {
        overlap_closed_x(a, b)
    } else {
        overlap_closed_y(a, b)
    };
    overlap
        && match primary_rot {
            Rotation::R0 => a.y_min < b.y_min,
            Rotation::R90 => a.x_max > b.x_max,
            Rotation::R180 => a.y_max > b.y_max,
            Rotation::R270 => a.x_min < b.x_min,
        }
}

/// Rule 2: `a` is before `b` when `b` lies in `a`'s reading direction.
fn before_by_rule2(a: &BlockBuilder, b: &BlockBuilder, primary_lr: bool) -> bool {
    let rot_lr = if primary_lr { a.rot } else { a.rot.flipped() };
    let cmp = match rot_lr {
        Rotation::R0 => a.ex.x_max - b.ex.x_min,
        Rotation::R90 => a.ex.y_min - b.ex.y_max,
        Rotation::R180 => b.ex.x_max - a.ex.x_min,
        Rotation::R270 => b.ex.y_min - a.ex.y_max,
    };
    cmp <= 0.0
}

/// The full *before* relation: is `blocks[j]` before `blocks[i]`?
fn is_before(
    blocks: &[BlockBuilder],
    j: usize,
    i: usize,
    primary_rot: Rotation,
    primary_lr: bool,
) -> bool {
    let (b1, b2) = (&blocks[i], &blocks[j]);

    if b1.table_id >= 0 && b1.table_id == b2.table_id {
        // table rule: a cell is preceded by cells strictly above it, or
        // on the reading-primary side with overlapping vertical range
        let beside = if primary_lr {
            b2.rect.x_max <= b1.rect.x_min
                && b2.rect.y_min <= b1.rect.y_max
                && b2.rect.y_max >= b1.rect.y_min
        } else {
            b2.rect.x_min >= b1.rect.x_max
                && b2.rect.y_min <= b1.rect.y_max
                && b2.rect.y_max >= b1.rect.y_min
        };
        return beside || b2.rect.y_max <= b1.rect.y_min;
    }

    if before_by_rule1(&b2.ex, &b1.ex, primary_rot) {
        return true;
    }
    if before_by_rule2(b2, b1, primary_lr) {
        // no intervening column: a third block k with b1 before k and
        // k before b2 (both by Rule 1) blocks the relation
        for (k, b3) in blocks.iter().enumerate() {
            if k == i || k == j {
                continue;
            }
            if before_by_rule1(&b1.ex, &b3.ex, primary_rot)
                && before_by_rule1(&b3.ex, &b2.ex, primary_rot)
            {
                return false;
            }
        }
        return true;
    }
    false
}

fn visit(
    blocks: &[BlockBuilder],
    scan: &[usize],
    i: usize,
    primary_rot: Rotation,
    primary_lr: bool,
    visited: &mut [bool],
    out: &mut Vec<usize>,
) {
    if visited[i] {
        return;
    }
    visited[i] = true;
    for &j in scan {
        if visited[j] {
            continue;
        }
        if is_before(blocks, j, i, primary_rot, primary_lr) {
            visit(blocks, scan, j, primary_rot, primary_lr, visited, out);
        }
    }
    out.push(i);
}

/// Reorder blocks into reading order and compute per-block primary-axis
/// clearance against their neighbors.
pub(crate) fn sort_reading_order(
    mut blocks: Vec<BlockBuilder>,
    primary_rot: Rotation,
    primary_lr: bool,
    page_width: f64,
    page_height: f64,
) -> Vec<BlockBuilder> {
    compute_pri_clearance(&mut blocks, primary_rot, page_width, page_height);

    let n = blocks.len();
    let mut scan: Vec<usize> = (0..n).collect();
    scan.sort_by(|&a, &b| cmp_xy_primary_rot(&blocks[a].rect, &blocks[b].rect, primary_rot));

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for &i in &scan {
        visit(
            &blocks,
            &scan,
            i,
            primary_rot,
            primary_lr,
            &mut visited,
            &mut order,
        );
    }

    let mut by_pos: Vec<Option<BlockBuilder>> = blocks.drain(..).map(Some).collect();
    order
        .into_iter()
        .map(|i| by_pos[i].take().unwrap())
        .collect()
}

/// For every block, shrink `pri_min`/`pri_max` to the nearest neighbor
/// edge along the primary axis (the free corridor the block sits in).
fn compute_pri_clearance(
    blocks: &mut [BlockBuilder],
    primary_rot: Rotation,
    page_width: f64,
    page_height: f64,
) {
    let extent = if primary_rot.is_horizontal() {
        page_width
    } else {
        page_height
    };
    let rects: Vec<Rect> = blocks.iter().map(|b| b.rect).collect();
    for (i, blk) in blocks.iter_mut().enumerate() {
        blk.pri_min = 0.0;
        blk.pri_max = extent;
        for (j, other) in rects.iter().enumerate() {
            if i == j {
                continue;
            }
            let r = &blk.rect;
            let (sec_overlap, o_lead, o_trail, r_lead, r_trail) = if primary_rot.is_horizontal() {
                (
                    other.y_min < r.y_max && other.y_max > r.y_min,
                    other.x_min,
                    other.x_max,
                    r.x_min,
                    r.x_max,
                )
            } else {
                (
                    other.x_min < r.x_max && other.x_max > r.x_min,
                    other.y_min,
                    other.y_max,
                    r.y_min,
                    r.y_max,
                )
            };
            if !sec_overlap {
                continue;
            }
            if o_lead < r_lead {
                let new_min = o_trail.min(r_lead);
                if new_min > blk.pri_min {
                    blk.pri_min = new_min;
                }
            }
            if o_trail > r_trail {
                let new_max = o_lead.max(r_trail);
                if new_max < blk.pri_max {
                    blk.pri_max = new_max;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisOptions;
    use crate::table::detect_tables;
    use crate::word::test_support::make_word;

    fn block_at(x0: f64, y0: f64, x1: f64, y1: f64) -> BlockBuilder {
        let opts = AnalysisOptions::default();
        let mut w = make_word(&[('x', x0, x1 - x0)], y1, 10.0);
        w.rect = Rect::new(x0, y0, x1, y1);
        w.base = y1;
        let mut blk = BlockBuilder::new(w, &opts);
        blk.coalesce(&opts);
        blk.ex = blk.rect;
        blk
    }

    fn order_of(blocks: Vec<BlockBuilder>) -> Vec<Rect> {
        sort_reading_order(blocks, Rotation::R0, true, 600.0, 800.0)
            .iter()
            .map(|b| b.rect)
            .collect()
    }

    #[test]
    fn single_column_sorts_top_to_bottom() {
        let a = Rect::new(10.0, 100.0, 100.0, 112.0);
        let b = Rect::new(10.0, 200.0, 100.0, 212.0);
        let c = Rect::new(10.0, 300.0, 100.0, 312.0);
        let blocks = vec![
            block_at(c.x_min, c.y_min, c.x_max, c.y_max),
            block_at(a.x_min, a.y_min, a.x_max, a.y_max),
            block_at(b.x_min, b.y_min, b.x_max, b.y_max),
        ];
        assert_eq!(order_of(blocks), vec![a, b, c]);
    }

    #[test]
    fn two_columns_read_column_by_column() {
        // Rule 2's intervening-block check keeps the right column after
        // the whole left column.
        let l1 = Rect::new(10.0, 100.0, 100.0, 112.0);
        let l2 = Rect::new(10.0, 130.0, 100.0, 142.0);
        let r1 = Rect::new(200.0, 100.0, 300.0, 112.0);
        let r2 = Rect::new(200.0, 130.0, 300.0, 142.0);
        let blocks = vec![
            block_at(r2.x_min, r2.y_min, r2.x_max, r2.y_max),
            block_at(l1.x_min, l1.y_min, l1.x_max, l1.y_max),
            block_at(r1.x_min, r1.y_min, r1.x_max, r1.y_max),
            block_at(l2.x_min, l2.y_min, l2.x_max, l2.y_max),
        ];
        assert_eq!(order_of(blocks), vec![l1, l2, r1, r2]);
    }

    #[test]
    fn full_width_heading_comes_first() {
        let head = Rect::new(10.0, 40.0, 300.0, 60.0);
        let l1 = Rect::new(10.0, 100.0, 100.0, 112.0);
        let r1 = Rect::new(200.0, 100.0, 300.0, 112.0);
        let blocks = vec![
            block_at(r1.x_min, r1.y_min, r1.x_max, r1.y_max),
            block_at(l1.x_min, l1.y_min, l1.x_max, l1.y_max),
            block_at(head.x_min, head.y_min, head.x_max, head.y_max),
        ];
        assert_eq!(order_of(blocks), vec![head, l1, r1]);
    }

    #[test]
    fn table_cells_read_row_by_row() {
        // Name Age / Alice 30 as four aligned blocks: without the table
        // rule they would read column-major; the shared envelope plus
        // Rule T forces row-major order.
        let name = Rect::new(10.0, 100.0, 50.0, 112.0);
        let age = Rect::new(80.0, 100.0, 110.0, 112.0);
        let alice = Rect::new(10.0, 130.0, 52.0, 142.0);
        let n30 = Rect::new(80.0, 130.0, 104.0, 142.0);
        let mut blocks = vec![
            block_at(name.x_min, name.y_min, name.x_max, name.y_max),
            block_at(age.x_min, age.y_min, age.x_max, age.y_max),
            block_at(alice.x_min, alice.y_min, alice.x_max, alice.y_max),
            block_at(n30.x_min, n30.y_min, n30.x_max, n30.y_max),
        ];
        let found = detect_tables(&mut blocks, true, &AnalysisOptions::default());
        assert_eq!(found, 1);
        assert_eq!(order_of(blocks), vec![name, age, alice, n30]);
    }

    #[test]
    fn pri_clearance_shrinks_to_neighbors() {
        let mut blocks = vec![
            block_at(100.0, 100.0, 200.0, 112.0),
            block_at(10.0, 100.0, 60.0, 112.0),
            block_at(300.0, 100.0, 400.0, 112.0),
        ];
        compute_pri_clearance(&mut blocks, Rotation::R0, 600.0, 800.0);
        assert_eq!(blocks[0].pri_min, 60.0);
        assert_eq!(blocks[0].pri_max, 300.0);
        assert_eq!(blocks[1].pri_min, 0.0);
        assert_eq!(blocks[1].pri_max, 100.0);
        assert_eq!(blocks[2].pri_min, 200.0);
        assert_eq!(blocks[2].pri_max, 600.0);
    }

    #[test]
    fn empty_block_list_sorts_to_empty() {
        let blocks: Vec<BlockBuilder> = Vec::new();
        let sorted = sort_reading_order(blocks, Rotation::R0, true, 600.0, 800.0);
        assert!(sorted.is_empty());
    }
}
