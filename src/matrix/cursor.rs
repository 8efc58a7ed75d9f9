//! Cursors and iterators over the Morton ordered storage of a [`Matrix`].
//!
//! A cursor is a borrowed view of the whole buffer plus a flat position. The
//! position is the element's Morton index, so its `(row, col)` is recovered by
//! decoding the offset rather than being stored alongside it.
//!
//! [`Matrix`]: crate::matrix::Matrix
use std::fmt;
use std::iter::{Enumerate, FusedIterator};
use std::slice;

use glam::UVec2;

use crate::matrix::morton::{decode, decode_uvec2, pack_even, pack_odd};

fn step(pos: usize, n: isize, len: usize) -> usize {
    match pos.checked_add_signed(n) {
        Some(next) if next <= len => next,
        _ => panic!("cursor moved by {n} from offset {pos} leaves storage of {len} elements"),
    }
}

/// Read only cursor. Equality compares the offset only, so two cursors built
/// independently over the same buffer and offset are equal. Addresses are
/// never compared: every element of a zero sized `T` shares one.
pub struct Cursor<'a, T> {
    data: &'a [T],
    pos: usize,
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(data: &'a [T], pos: usize) -> Self {
        debug_assert!(pos <= data.len());
        Self { data, pos }
    }

    /// Elements between the start of storage and this cursor.
    pub fn offset(&self) -> u64 {
        self.pos as u64
    }
    pub fn row(&self) -> u32 {
        pack_odd(self.offset())
    }
    pub fn col(&self) -> u32 {
        pack_even(self.offset())
    }
    pub fn coords(&self) -> (u32, u32) {
        decode(self.offset())
    }
    pub fn uvec2(&self) -> UVec2 {
        decode_uvec2(self.offset())
    }
    pub fn is_end(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Element under the cursor. Panics at the end position.
    pub fn get(&self) -> &'a T {
        assert!(!self.is_end(), "dereferenced a cursor at the end of storage");
        let data = self.data;
        &data[self.pos]
    }
    pub fn try_get(&self) -> Option<&'a T> {
        self.data.get(self.pos)
    }

    pub fn move_next(&mut self) -> &mut Self {
        self.advance(1)
    }
    pub fn move_prev(&mut self) -> &mut Self {
        self.advance(-1)
    }
    /// Jumps `n` elements in storage order. Panics if the result would lie
    /// before the start or past the end position.
    pub fn advance(&mut self, n: isize) -> &mut Self {
        self.pos = step(self.pos, n, self.data.len());
        self
    }
    /// Signed number of steps from `self` to `other`. Both must come from the
    /// same matrix.
    pub fn distance_to(&self, other: &Self) -> isize {
        other.pos as isize - self.pos as isize
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Cursor<'_, T> {}

impl<T> Default for Cursor<'_, T> {
    fn default() -> Self {
        Self { data: &[], pos: 0 }
    }
}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}
impl<T> Eq for Cursor<'_, T> {}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("offset", &self.pos)
            .field("row", &self.row())
            .field("col", &self.col())
            .finish()
    }
}

/// Mutable counterpart of [`Cursor`]. Holds the matrix's storage exclusively,
/// so only one exists at a time and there is never a second mutable cursor to
/// compare against or measure to. Test for the end with [`CursorMut::is_end`],
/// or borrow a read only view with [`CursorMut::as_cursor`].
pub struct CursorMut<'a, T> {
    data: &'a mut [T],
    pos: usize,
}

impl<'a, T> CursorMut<'a, T> {
    pub(crate) fn new(data: &'a mut [T], pos: usize) -> Self {
        debug_assert!(pos <= data.len());
        Self { data, pos }
    }

    pub fn offset(&self) -> u64 {
        self.pos as u64
    }
    pub fn row(&self) -> u32 {
        pack_odd(self.offset())
    }
    pub fn col(&self) -> u32 {
        pack_even(self.offset())
    }
    pub fn coords(&self) -> (u32, u32) {
        decode(self.offset())
    }
    pub fn uvec2(&self) -> UVec2 {
        decode_uvec2(self.offset())
    }
    pub fn is_end(&self) -> bool {
        self.pos == self.data.len()
    }
    /// Steps left before the end position.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn get(&self) -> &T {
        assert!(!self.is_end(), "dereferenced a cursor at the end of storage");
        &self.data[self.pos]
    }
    pub fn get_mut(&mut self) -> &mut T {
        assert!(!self.is_end(), "dereferenced a cursor at the end of storage");
        &mut self.data[self.pos]
    }
    pub fn set(&mut self, value: T) {
        *self.get_mut() = value;
    }

    pub fn move_next(&mut self) -> &mut Self {
        self.advance(1)
    }
    pub fn move_prev(&mut self) -> &mut Self {
        self.advance(-1)
    }
    pub fn advance(&mut self, n: isize) -> &mut Self {
        self.pos = step(self.pos, n, self.data.len());
        self
    }

    /// Read only cursor at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor::new(&*self.data, self.pos)
    }
}

impl<T> Default for CursorMut<'_, T> {
    fn default() -> Self {
        Self {
            data: &mut [],
            pos: 0,
        }
    }
}

impl<T> PartialEq<Cursor<'_, T>> for CursorMut<'_, T> {
    fn eq(&self, other: &Cursor<'_, T>) -> bool {
        self.pos == other.pos
    }
}

impl<T> fmt::Debug for CursorMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorMut")
            .field("offset", &self.pos)
            .field("row", &self.row())
            .field("col", &self.col())
            .finish()
    }
}

/// Storage order iterator yielding `((row, col), &T)`.
#[derive(Clone, Debug)]
pub struct Iter<'a, T> {
    inner: Enumerate<slice::Iter<'a, T>>,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(data: &'a [T]) -> Self {
        Self {
            inner: data.iter().enumerate(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = ((u32, u32), &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(z, item)| (decode(z as u64), item))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(z, item)| (decode(z as u64), item))
    }
}
impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

/// Storage order iterator yielding `((row, col), &mut T)`.
#[derive(Debug)]
pub struct IterMut<'a, T> {
    inner: Enumerate<slice::IterMut<'a, T>>,
}

impl<'a, T> IterMut<'a, T> {
    pub(crate) fn new(data: &'a mut [T]) -> Self {
        Self {
            inner: data.iter_mut().enumerate(),
        }
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = ((u32, u32), &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(z, item)| (decode(z as u64), item))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(z, item)| (decode(z as u64), item))
    }
}
impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}
