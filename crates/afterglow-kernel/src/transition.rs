//! Per-generation transition engine.
//!
//! Each cell's next state depends on its own state and on `n`, the number
//! of neighbors currently at `max_state`. Partially decayed neighbors never
//! count.
//!
//! | current state          | next state                                    |
//! |------------------------|-----------------------------------------------|
//! | `max_state`            | `max_state` if `n ∈ survive`, else `max_state - 1` |
//! | `0 < s < max_state`    | `s - 1`, regardless of neighbors              |
//! | `0`                    | `max_state` if `n ∈ born`, else `0`           |

use std::sync::Arc;

use afterglow_common::{wrap_axis, GridSize};
use tracing::trace;

use crate::buffer::SharedPlane;
use crate::dispatch::{RowTask, WorkerDispatcher};
use crate::grid::Grid;
use crate::rule::RuleSpec;

/// Applies the transition rule to one cell.
///
/// States above `max_state` are treated as decaying and still step down by
/// one, so the result never leaves `0..=max_state` once it is there.
#[must_use]
#[inline]
pub fn next_state(rule: &RuleSpec, cell: u8, live_neighbors: u8) -> u8 {
    let max_state = rule.max_state();
    if cell == max_state {
        if rule.survive().contains(live_neighbors) {
            max_state
        } else {
            max_state - 1
        }
    } else if cell > 0 {
        cell - 1
    } else if rule.born().contains(live_neighbors) {
        max_state
    } else {
        0
    }
}

/// Counts the neighbors of `(x, y)` that are at `rule.max_state()`,
/// wrapping toroidally at the edges.
#[must_use]
pub fn count_live_neighbors(
    plane: &SharedPlane,
    size: GridSize,
    rule: &RuleSpec,
    x: usize,
    y: usize,
) -> u8 {
    let rows = wrapped_triple(y, size.height);
    let cols = wrapped_triple(x, size.width);
    count_in_window(plane, size.width, rule, &rows, &cols)
}

/// `[v - 1, v, v + 1]` folded into `[0, len)`.
#[inline]
fn wrapped_triple(value: usize, len: usize) -> [usize; 3] {
    [
        wrap_axis(value as i64 - 1, len),
        value,
        wrap_axis(value as i64 + 1, len),
    ]
}

/// Counts maximal cells among the rule's offsets, with row and column
/// indices already wrapped and indexed by offset + 1.
#[inline]
fn count_in_window(
    plane: &SharedPlane,
    width: usize,
    rule: &RuleSpec,
    rows: &[usize; 3],
    cols: &[usize; 3],
) -> u8 {
    let max_state = rule.max_state();
    let mut count = 0;
    for &(dx, dy) in rule.mode().offsets() {
        let index = rows[(dy + 1) as usize] * width + cols[(dx + 1) as usize];
        if plane.get(index) == max_state {
            count += 1;
        }
    }
    count
}

/// Row task computing one row of the next generation.
///
/// Reads only `current` and writes only its own row of `next`.
#[derive(Debug)]
pub struct TransitionTask {
    rule: Arc<RuleSpec>,
    size: GridSize,
    current: SharedPlane,
    next: SharedPlane,
}

impl TransitionTask {
    /// Creates a task reading the grid's current plane and writing its next plane.
    #[must_use]
    pub fn new(rule: Arc<RuleSpec>, grid: &Grid) -> Self {
        Self {
            rule,
            size: grid.size(),
            current: grid.current().clone(),
            next: grid.next().clone(),
        }
    }
}

impl RowTask for TransitionTask {
    fn run_row(&self, row: usize) {
        let width = self.size.width;
        let rows = wrapped_triple(row, self.size.height);

        for x in 0..width {
            let cols = wrapped_triple(x, width);
            let live = count_in_window(&self.current, width, &self.rule, &rows, &cols);

            let index = row * width + x;
            let cell = self.current.get(index);
            self.next.set(index, next_state(&self.rule, cell, live));
        }
    }
}

/// Advances `grid` by one generation using the worker pool.
///
/// Blocks until every row is written, then swaps the planes.
pub fn step(grid: &mut Grid, rule: &Arc<RuleSpec>, dispatcher: &mut WorkerDispatcher) {
    let task = Arc::new(TransitionTask::new(Arc::clone(rule), grid));
    dispatcher.run_phase(grid.height(), task);
    grid.swap();
    trace!("Transition phase complete");
}
