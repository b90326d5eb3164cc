//! Restartable index cursors over the Cartesian product of parameter axes.
//!
//! Three node kinds share the [`RangeIterator`] capability:
//!
//! | Node            | Yields                                             |
//! |-----------------|----------------------------------------------------|
//! | `AxisCounter`   | `0..bound`, once per reset                         |
//! | `ProductCursor` | one tuple per element of its parts' product        |
//! | `PaddedCursor`  | its inner value framed by constant segments        |
//!
//! Products carry from their **first** part: the first axis cycles fastest,
//! so axes of sizes `[2, 3]` yield `[0,0] [1,0] [0,1] [1,1] [0,2] [1,2]`.
//!
//! A tree position can be captured as a flat [`CursorState`] and re-applied to
//! a tree of the same shape, which is how sessions resume mid-sequence.

use serde::{Deserialize, Serialize};

use gs_types::{snapshot_error, GsResult};

/// Value produced by a cursor: a single index or a tuple of nested values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexValue {
    Index(usize),
    Tuple(Vec<IndexValue>),
}

impl IndexValue {
    /// Flat index list, if this is a tuple of plain indices.
    pub fn as_indices(&self) -> Option<Vec<usize>> {
        match self {
            Self::Tuple(items) => items
                .iter()
                .map(|item| match item {
                    Self::Index(i) => Some(*i),
                    Self::Tuple(_) => None,
                })
                .collect(),
            Self::Index(_) => None,
        }
    }
}

/// Shared capability of every cursor node.
pub trait RangeIterator {
    /// Returns the current value and moves past it.
    fn advance(&mut self) -> Option<IndexValue>;

    /// Current value without moving.
    fn get(&self) -> Option<IndexValue>;

    fn has_next(&self) -> bool;

    /// Rewinds to the first value.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// Leaf
// ---------------------------------------------------------------------------

/// Counts `0..bound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisCounter {
    bound: usize,
    pointer: usize,
}

impl AxisCounter {
    pub fn new(bound: usize) -> Self {
        Self { bound, pointer: 0 }
    }

    pub fn bound(&self) -> usize {
        self.bound
    }
}

impl RangeIterator for AxisCounter {
    fn advance(&mut self) -> Option<IndexValue> {
        let current = self.get();
        if current.is_some() {
            self.pointer += 1;
        }
        current
    }

    fn get(&self) -> Option<IndexValue> {
        self.has_next().then_some(IndexValue::Index(self.pointer))
    }

    fn has_next(&self) -> bool {
        self.pointer < self.bound
    }

    fn reset(&mut self) {
        self.pointer = 0;
    }
}

// ---------------------------------------------------------------------------
// Composites
// ---------------------------------------------------------------------------

/// Odometer over an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCursor {
    parts: Vec<Cursor>,
    iterable: bool,
}

impl ProductCursor {
    pub fn new(parts: Vec<Cursor>) -> Self {
        let mut cursor = Self {
            parts,
            iterable: false,
        };
        cursor.reset();
        cursor
    }

    pub fn parts(&self) -> &[Cursor] {
        &self.parts
    }
}

impl RangeIterator for ProductCursor {
    fn advance(&mut self) -> Option<IndexValue> {
        let current = self.get()?;
        for part in &mut self.parts {
            part.advance();
            if part.has_next() {
                return Some(current);
            }
            part.reset();
        }
        // Every part rolled over.
        self.iterable = false;
        Some(current)
    }

    fn get(&self) -> Option<IndexValue> {
        if !self.iterable {
            return None;
        }
        self.parts
            .iter()
            .map(Cursor::get)
            .collect::<Option<Vec<_>>>()
            .map(IndexValue::Tuple)
    }

    fn has_next(&self) -> bool {
        self.iterable
    }

    fn reset(&mut self) {
        for part in &mut self.parts {
            part.reset();
        }
        self.iterable = !self.parts.is_empty() && self.parts.iter().all(Cursor::has_next);
    }
}

/// Frames the inner cursor's value with constant segments.
///
/// `None` omits a segment; `Some(vec![])` splices an empty one. The inner
/// value is inserted as one element, never spread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedCursor {
    inner: Box<Cursor>,
    before: Option<Vec<IndexValue>>,
    after: Option<Vec<IndexValue>>,
}

impl PaddedCursor {
    pub fn new(
        inner: Cursor,
        before: Option<Vec<IndexValue>>,
        after: Option<Vec<IndexValue>>,
    ) -> Self {
        let mut cursor = Self {
            inner: Box::new(inner),
            before,
            after,
        };
        cursor.reset();
        cursor
    }

    fn pad(&self, value: IndexValue) -> IndexValue {
        let mut items = Vec::new();
        if let Some(before) = &self.before {
            items.extend(before.iter().cloned());
        }
        items.push(value);
        if let Some(after) = &self.after {
            items.extend(after.iter().cloned());
        }
        IndexValue::Tuple(items)
    }
}

impl RangeIterator for PaddedCursor {
    fn advance(&mut self) -> Option<IndexValue> {
        let current = self.get()?;
        self.inner.advance();
        Some(current)
    }

    fn get(&self) -> Option<IndexValue> {
        self.inner.get().map(|value| self.pad(value))
    }

    fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Any cursor node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    Axis(AxisCounter),
    Product(ProductCursor),
    Padded(PaddedCursor),
}

/// Flattened position of a cursor tree, in pre-order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CursorState {
    /// One pointer per axis counter.
    pub pointers: Vec<usize>,
    /// One `iterable` flag per product.
    pub live: Vec<bool>,
}

impl Cursor {
    pub fn axis(bound: usize) -> Self {
        Self::Axis(AxisCounter::new(bound))
    }

    pub fn product(parts: impl IntoIterator<Item = Cursor>) -> Self {
        Self::Product(ProductCursor::new(parts.into_iter().collect()))
    }

    pub fn padded(
        inner: Cursor,
        before: Option<Vec<IndexValue>>,
        after: Option<Vec<IndexValue>>,
    ) -> Self {
        Self::Padded(PaddedCursor::new(inner, before, after))
    }

    /// Product of one counter per axis length.
    pub fn grid(lengths: impl IntoIterator<Item = usize>) -> Self {
        Self::product(lengths.into_iter().map(Self::axis))
    }

    pub fn capture(&self) -> CursorState {
        let mut state = CursorState::default();
        self.capture_into(&mut state);
        state
    }

    fn capture_into(&self, state: &mut CursorState) {
        match self {
            Self::Axis(axis) => state.pointers.push(axis.pointer),
            Self::Product(product) => {
                state.live.push(product.iterable);
                for part in &product.parts {
                    part.capture_into(state);
                }
            }
            Self::Padded(padded) => padded.inner.capture_into(state),
        }
    }

    /// Re-applies a captured position. The tree must have the shape the state
    /// was captured from.
    pub fn restore(&mut self, state: &CursorState) -> GsResult<()> {
        let mut pointers = state.pointers.iter().copied();
        let mut live = state.live.iter().copied();
        self.restore_from(&mut pointers, &mut live)?;
        if pointers.next().is_some() || live.next().is_some() {
            return Err(snapshot_error!(
                "cursor state has more entries than the cursor tree"
            ));
        }
        Ok(())
    }

    fn restore_from(
        &mut self,
        pointers: &mut dyn Iterator<Item = usize>,
        live: &mut dyn Iterator<Item = bool>,
    ) -> GsResult<()> {
        match self {
            Self::Axis(axis) => {
                let pointer = pointers
                    .next()
                    .ok_or_else(|| snapshot_error!("cursor state is missing an axis pointer"))?;
                if pointer > axis.bound {
                    return Err(snapshot_error!(
                        "axis pointer {pointer} exceeds bound {}",
                        axis.bound
                    ));
                }
                axis.pointer = pointer;
            }
            Self::Product(product) => {
                product.iterable = live
                    .next()
                    .ok_or_else(|| snapshot_error!("cursor state is missing a product flag"))?;
                for part in &mut product.parts {
                    part.restore_from(pointers, live)?;
                }
            }
            Self::Padded(padded) => padded.inner.restore_from(pointers, live)?,
        }
        Ok(())
    }
}

impl RangeIterator for Cursor {
    fn advance(&mut self) -> Option<IndexValue> {
        match self {
            Self::Axis(c) => c.advance(),
            Self::Product(c) => c.advance(),
            Self::Padded(c) => c.advance(),
        }
    }

    fn get(&self) -> Option<IndexValue> {
        match self {
            Self::Axis(c) => c.get(),
            Self::Product(c) => c.get(),
            Self::Padded(c) => c.get(),
        }
    }

    fn has_next(&self) -> bool {
        match self {
            Self::Axis(c) => c.has_next(),
            Self::Product(c) => c.has_next(),
            Self::Padded(c) => c.has_next(),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Axis(c) => c.reset(),
            Self::Product(c) => c.reset(),
            Self::Padded(c) => c.reset(),
        }
    }
}
