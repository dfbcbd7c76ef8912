//! Striped broadphase
//!
//! Dynamic bodies are bucketed into horizontal strips ("rows") counted
//! downward from the highest midpoint, and ordered by row then by horizontal
//! midpoint. The sweep walks each row left to right and hands the narrow
//! phase only the pairs that can plausibly touch:
//!
//! - earlier bodies in the same row within reach,
//! - every static body,
//! - bodies in the row directly below within reach.
//!
//! The row above is never consulted, so each vertical neighbour pair is seen
//! exactly once. A job covers one row plus the row below it; jobs starting on
//! even row positions share no bodies, and neither do jobs starting on odd
//! ones, so each parity can run concurrently. The even pass always completes
//! before the odd pass starts.

use crate::body::{Body, BodyKey};
use std::ops::AddAssign;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Horizontal reach of the sweep, in strip heights
pub const NEIGHBOUR_REACH: f32 = 1.0;

/// One dynamic body's slot in the sorted order
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridEntry {
    pub key: BodyKey,
    /// Strip index, 0 = highest
    pub row: usize,
    /// Horizontal midpoint at the last rebuild
    pub x: f32,
    /// Vertical midpoint at the last rebuild
    pub y: f32,
}

/// A contiguous window of the sorted order: one row and, if it exists, the row directly below
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripJob {
    /// First position of the row
    pub start: usize,
    /// First position of the row below (equal to `end` when there is none)
    pub split: usize,
    /// One past the last position of the window
    pub end: usize,
}

impl StripJob {
    /// Number of bodies in the window
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True if the window is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if the window includes a row below
    pub fn has_below(&self) -> bool {
        self.split < self.end
    }
}

/// A pair handed to the narrow phase, indexed within the job window
///
/// The first index is always the body being swept; the second is an earlier
/// body in its row, a body in the row below, or a static body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Candidate {
    /// Two dynamic bodies, both window-local indices
    Dynamic(usize, usize),
    /// Window-local dynamic index and an index into the static list
    Static(usize, usize),
}

/// Pair counts from one sweep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Pairs handed to the narrow phase
    pub candidates: usize,
    /// Pairs the handler reported as in contact
    pub contacts: usize,
}

impl AddAssign for StepStats {
    fn add_assign(&mut self, other: Self) {
        self.candidates += other.candidates;
        self.contacts += other.contacts;
    }
}

impl std::ops::Add for StepStats {
    type Output = Self;
    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

/// Striped spatial index over the dynamic bodies
#[derive(Clone, Debug)]
pub struct Grid {
    strip_height: f32,
    /// Highest midpoint y at the last rebuild
    high: f32,
    entries: Vec<GridEntry>,
    /// Start position of each non-empty row, in order
    row_starts: Vec<usize>,
    /// Row index of each non-empty row, parallel to `row_starts`
    row_ids: Vec<usize>,
}

impl Grid {
    /// Create an empty grid; `strip_height` must be positive
    pub fn new(strip_height: f32) -> Self {
        Self {
            strip_height,
            high: 0.0,
            entries: Vec::new(),
            row_starts: Vec::new(),
            row_ids: Vec::new(),
        }
    }

    pub fn strip_height(&self) -> f32 {
        self.strip_height
    }

    /// Reference height rows are measured down from
    pub fn high(&self) -> f32 {
        self.high
    }

    /// All entries in sorted order
    pub fn entries(&self) -> &[GridEntry] {
        &self.entries
    }

    /// Start position of each non-empty row
    pub fn row_starts(&self) -> &[usize] {
        &self.row_starts
    }

    /// Number of indexed bodies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-empty rows
    pub fn row_count(&self) -> usize {
        self.row_starts.len()
    }

    /// Iterate non-empty rows as `(row index, entries)`
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[GridEntry])> + '_ {
        (0..self.row_starts.len()).map(move |pos| {
            let (start, end) = self.row_bounds(pos);
            (self.row_ids[pos], &self.entries[start..end])
        })
    }

    /// Row a midpoint height falls in, relative to the current reference height
    #[inline]
    pub fn row_of(&self, mid_y: f32) -> usize {
        row_index(self.high, mid_y, self.strip_height)
    }

    /// Re-sort and re-index all dynamic bodies
    ///
    /// Must run after any change to body positions and before the next sweep.
    pub fn rebuild<'a, I>(&mut self, bodies: I)
    where
        I: IntoIterator<Item = (BodyKey, &'a Body)>,
    {
        self.entries.clear();
        self.entries.extend(bodies.into_iter().map(|(key, body)| {
            let mid = body.midpoint();
            GridEntry { key, row: 0, x: mid.x, y: mid.y }
        }));

        self.high = self.entries.iter().map(|e| e.y).reduce(f32::max).unwrap_or(0.0);
        let (high, strip_height) = (self.high, self.strip_height);
        for entry in &mut self.entries {
            entry.row = row_index(high, entry.y, strip_height);
        }

        self.sort();
        self.index();

        log::trace!(
            "grid rebuilt: {} bodies in {} rows (high = {})",
            self.entries.len(),
            self.row_starts.len(),
            self.high
        );
    }

    /// Order entries by row, then by horizontal midpoint
    fn sort(&mut self) {
        self.entries
            .sort_unstable_by(|a, b| a.row.cmp(&b.row).then(a.x.total_cmp(&b.x)));
    }

    /// Record where each row begins
    fn index(&mut self) {
        self.row_starts.clear();
        self.row_ids.clear();
        let mut previous = None;
        for (pos, entry) in self.entries.iter().enumerate() {
            if previous != Some(entry.row) {
                self.row_starts.push(pos);
                self.row_ids.push(entry.row);
                previous = Some(entry.row);
            }
        }
    }

    fn row_bounds(&self, pos: usize) -> (usize, usize) {
        let start = self.row_starts[pos];
        let end = self.row_starts.get(pos + 1).copied().unwrap_or(self.entries.len());
        (start, end)
    }

    /// The job starting at row position `pos`
    pub fn job(&self, pos: usize) -> StripJob {
        let (start, split) = self.row_bounds(pos);
        let below_is_adjacent = pos + 1 < self.row_ids.len() && self.row_ids[pos + 1] == self.row_ids[pos] + 1;
        let end = if below_is_adjacent { self.row_bounds(pos + 1).1 } else { split };
        StripJob { start, split, end }
    }

    /// Jobs of one parity (0 = even row positions, 1 = odd), in order
    ///
    /// Windows of the same parity never overlap.
    pub fn jobs(&self, parity: usize) -> Vec<StripJob> {
        (parity..self.row_starts.len()).step_by(2).map(|pos| self.job(pos)).collect()
    }

    /// Sweep every job sequentially, even pass then odd pass
    ///
    /// `sorted` must hold the bodies in [`Grid::entries`] order. The handler
    /// receives the job window, the window's offset in `sorted`, and the
    /// candidate; it returns whether the pair was in contact.
    pub fn sweep<F>(&self, sorted: &mut [Body], static_count: usize, mut handler: F) -> StepStats
    where
        F: FnMut(&mut [Body], usize, Candidate) -> bool,
    {
        let mut stats = StepStats::default();
        for parity in 0..2 {
            for (job, window) in carve(sorted, self.jobs(parity)) {
                stats += self.sweep_job(window, job, static_count, &mut handler);
            }
        }
        stats
    }

    /// Sweep with each pass's jobs spread over the current rayon pool
    ///
    /// Produces exactly the same body updates as [`Grid::sweep`].
    #[cfg(feature = "parallel")]
    pub fn par_sweep<F>(&self, sorted: &mut [Body], static_count: usize, handler: F) -> StepStats
    where
        F: Fn(&mut [Body], usize, Candidate) -> bool + Sync,
    {
        let mut stats = StepStats::default();
        for parity in 0..2 {
            stats += carve(sorted, self.jobs(parity))
                .into_par_iter()
                .map(|(job, window)| {
                    let mut handler = &handler;
                    self.sweep_job(window, job, static_count, &mut handler)
                })
                .reduce(StepStats::default, |a, b| a + b);
        }
        stats
    }

    fn sweep_job<F>(&self, window: &mut [Body], job: StripJob, static_count: usize, handler: &mut F) -> StepStats
    where
        F: FnMut(&mut [Body], usize, Candidate) -> bool,
    {
        let reach = NEIGHBOUR_REACH * self.strip_height;
        let entries = &self.entries[job.start..job.end];
        let upper = job.split - job.start;
        let len = job.len();

        let mut stats = StepStats::default();
        let mut visit = |candidate| {
            stats.candidates += 1;
            if handler(window, job.start, candidate) {
                stats.contacts += 1;
            }
        };

        let mut left = 0;
        let mut below = upper;
        for i in 0..upper {
            let x = entries[i].x;

            while left < i && entries[left].x < x - reach {
                left += 1;
            }
            for j in left..i {
                visit(Candidate::Dynamic(i, j));
            }

            for s in 0..static_count {
                visit(Candidate::Static(i, s));
            }

            while below < len && entries[below].x < x - reach {
                below += 1;
            }
            let mut j = below;
            while j < len && entries[j].x <= x + reach {
                visit(Candidate::Dynamic(i, j));
                j += 1;
            }
        }
        stats
    }
}

#[inline]
fn row_index(high: f32, mid_y: f32, strip_height: f32) -> usize {
    ((high - mid_y) / strip_height).floor().max(0.0) as usize
}

/// Split `sorted` into the disjoint windows of `jobs`, which must be in ascending order
fn carve(sorted: &mut [Body], jobs: Vec<StripJob>) -> Vec<(StripJob, &mut [Body])> {
    let mut windows = Vec::with_capacity(jobs.len());
    let mut rest = sorted;
    let mut offset = 0;
    for job in jobs {
        let tail = std::mem::take(&mut rest);
        let (_, tail) = tail.split_at_mut(job.start - offset);
        let (window, tail) = tail.split_at_mut(job.len());
        rest = tail;
        offset = job.end;
        windows.push((job, window));
    }
    windows
}

/// Mutable references to two distinct elements, in argument order
///
/// # Panics
/// Panics if `i == j` or either index is out of bounds.
pub fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    assert_ne!(i, j, "pair_mut needs two distinct indices");
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}
