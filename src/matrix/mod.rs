//! Square matrix stored in Morton order.
pub mod cursor;
pub mod morton;
mod serial;

use std::fmt;
use std::ops::{Index, IndexMut};

use glam::UVec2;
use log::{debug, trace, warn};

use crate::error::{MatrixError, Result};
use crate::matrix::cursor::{Cursor, CursorMut, Iter, IterMut};
use crate::matrix::morton::{decode, encode, encode_uvec2, is_valid_rank};

// Storage slot for a Morton index. Indices that do not fit a usize map past
// any real buffer so that slice indexing rejects them.
fn slot(index: u64) -> usize {
    usize::try_from(index).unwrap_or(usize::MAX)
}

fn element_count(rank: u32) -> Option<usize> {
    usize::try_from(u64::from(rank) * u64::from(rank)).ok()
}

/// Square `rank x rank` matrix whose elements are laid out in Z-order.
///
/// `rank` is zero or a power of two for the whole life of the value and the
/// storage is never resized. Copies are only made through [`Matrix::duplicate`].
#[derive(PartialEq, Eq)]
pub struct Matrix<T> {
    rank: u32,
    storage: Box<[T]>,
}

impl<T> Matrix<T> {
    /// Rank zero matrix with no storage.
    pub fn empty() -> Self {
        Self {
            rank: 0,
            storage: Box::default(),
        }
    }

    /// Allocates `rank²` default elements.
    ///
    /// # Panics
    /// If `rank` is neither zero nor a power of two.
    pub fn new(rank: u32) -> Self
    where
        T: Default,
    {
        Self::from_fn(rank, |_, _| T::default())
    }

    /// Fallible [`Matrix::new`].
    pub fn try_new(rank: u32) -> Result<Self>
    where
        T: Default,
    {
        Self::try_from_fn(rank, |_, _| T::default())
    }

    /// Builds a matrix by calling `f(row, col)` for every cell, in storage order.
    ///
    /// # Panics
    /// If `rank` is neither zero nor a power of two.
    pub fn from_fn<F>(rank: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> T,
    {
        assert!(
            is_valid_rank(rank),
            "matrix rank {rank} is neither zero nor a power of two"
        );
        let Some(len) = element_count(rank) else {
            panic!("matrix of rank {rank} does not fit in the address space");
        };
        debug!("allocating matrix of rank {rank} ({len} elements)");
        let storage = (0..len)
            .map(|z| {
                let (row, col) = decode(z as u64);
                f(row, col)
            })
            .collect();
        Self { rank, storage }
    }

    /// Fallible [`Matrix::from_fn`]. Reports an invalid rank or a failed
    /// allocation instead of aborting.
    pub fn try_from_fn<F>(rank: u32, mut f: F) -> Result<Self>
    where
        F: FnMut(u32, u32) -> T,
    {
        if !is_valid_rank(rank) {
            return Err(MatrixError::InvalidRank(rank));
        }
        let len = element_count(rank).ok_or(MatrixError::Allocation { rank })?;
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(len)
            .map_err(|_| MatrixError::Allocation { rank })?;
        debug!("allocated matrix of rank {rank} ({len} elements)");
        storage.extend((0..len).map(|z| {
            let (row, col) = decode(z as u64);
            f(row, col)
        }));
        Ok(Self {
            rank,
            storage: storage.into_boxed_slice(),
        })
    }

    /// Takes ownership of elements that are already in Morton order.
    pub fn from_morton_vec(rank: u32, elements: Vec<T>) -> Result<Self> {
        if !is_valid_rank(rank) {
            return Err(MatrixError::InvalidRank(rank));
        }
        let expected = u64::from(rank) * u64::from(rank);
        if elements.len() as u64 != expected {
            return Err(MatrixError::LengthMismatch {
                rank,
                expected,
                actual: elements.len(),
            });
        }
        Ok(Self {
            rank,
            storage: elements.into_boxed_slice(),
        })
    }

    /// Releases the storage, still in Morton order.
    pub fn into_vec(self) -> Vec<T> {
        self.storage.into_vec()
    }

    /// Independent copy with the same rank.
    pub fn duplicate(&self) -> Self
    where
        T: Clone,
    {
        debug!(
            "duplicating matrix of rank {} ({} elements)",
            self.rank,
            self.storage.len()
        );
        Self {
            rank: self.rank,
            storage: self.storage.clone(),
        }
    }

    /// Moves the storage into a new matrix and leaves `self` empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Side length.
    pub fn rank(&self) -> u32 {
        self.rank
    }
    /// Element count, `rank²`.
    pub fn size(&self) -> u64 {
        u64::from(self.rank) * u64::from(self.rank)
    }
    /// True only for rank zero.
    pub fn is_empty(&self) -> bool {
        self.rank == 0
    }

    /// Element at `(row, col)`. Coordinates are not re-validated; for a power
    /// of two rank any coordinate `>= rank` encodes past the end of storage,
    /// so the slice bound check panics.
    #[inline]
    pub fn at(&self, row: u32, col: u32) -> &T {
        &self.storage[slot(encode(row, col))]
    }
    /// Mutable [`Matrix::at`].
    #[inline]
    pub fn at_mut(&mut self, row: u32, col: u32) -> &mut T {
        &mut self.storage[slot(encode(row, col))]
    }
    /// Overwrites `(row, col)`, with the same contract as [`Matrix::at`].
    pub fn set(&mut self, row: u32, col: u32, value: T) {
        *self.at_mut(row, col) = value;
    }

    /// Checked access, `None` when either coordinate is outside the matrix.
    pub fn get(&self, row: u32, col: u32) -> Option<&T> {
        if row < self.rank && col < self.rank {
            self.storage.get(slot(encode(row, col)))
        } else {
            None
        }
    }
    /// Mutable [`Matrix::get`].
    pub fn get_mut(&mut self, row: u32, col: u32) -> Option<&mut T> {
        if row < self.rank && col < self.rank {
            self.storage.get_mut(slot(encode(row, col)))
        } else {
            None
        }
    }

    /// Pointer to the first element. The caller is trusted to stay within
    /// `size()` elements.
    pub fn as_ptr(&self) -> *const T {
        self.storage.as_ptr()
    }
    /// Mutable [`Matrix::as_ptr`].
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.storage.as_mut_ptr()
    }
    /// Storage in Morton order.
    pub fn as_slice(&self) -> &[T] {
        &self.storage
    }
    /// Mutable storage in Morton order.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.storage
    }

    /// Storage reinterpreted as bytes, in Morton order.
    pub fn as_bytes(&self) -> &[u8]
    where
        T: bytemuck::Pod,
    {
        bytemuck::cast_slice(&self.storage)
    }
    /// Mutable [`Matrix::as_bytes`].
    pub fn as_bytes_mut(&mut self) -> &mut [u8]
    where
        T: bytemuck::Pod,
    {
        bytemuck::cast_slice_mut(&mut self.storage)
    }

    /// Cursor at the first element in storage order, `(0, 0)`.
    pub fn begin(&self) -> Cursor<'_, T> {
        Cursor::new(&self.storage, 0)
    }
    /// One past the last element in storage order.
    pub fn end(&self) -> Cursor<'_, T> {
        Cursor::new(&self.storage, self.storage.len())
    }
    /// Mutable cursor at the first element.
    pub fn begin_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::new(&mut self.storage, 0)
    }
    /// Mutable cursor at the end position, for walking backwards.
    pub fn end_mut(&mut self) -> CursorMut<'_, T> {
        let len = self.storage.len();
        CursorMut::new(&mut self.storage, len)
    }
    /// Cursor at `(row, col)`.
    ///
    /// # Panics
    /// If either coordinate is outside the matrix.
    pub fn cursor_at(&self, row: u32, col: u32) -> Cursor<'_, T> {
        assert!(
            row < self.rank && col < self.rank,
            "({row}, {col}) is outside a matrix of rank {}",
            self.rank
        );
        Cursor::new(&self.storage, slot(encode(row, col)))
    }

    /// `((row, col), &T)` pairs in storage order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.storage)
    }
    /// `((row, col), &mut T)` pairs in storage order.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(&mut self.storage)
    }

    /// Overwrites every cell with `value`.
    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        self.storage.fill(value);
    }

    /// Storage of quadrant `q`: 0 top left, 1 top right, 2 bottom left,
    /// 3 bottom right. `None` below rank 2 or for `q > 3`.
    pub fn quadrant(&self, q: usize) -> Option<&[T]> {
        if self.rank < 2 || q > 3 {
            return None;
        }
        let quarter = self.storage.len() / 4;
        Some(&self.storage[q * quarter..(q + 1) * quarter])
    }

    /// All four quadrants as disjoint mutable slices.
    pub fn quadrants_mut(&mut self) -> Option<[&mut [T]; 4]> {
        if self.rank < 2 {
            return None;
        }
        let quarter = self.storage.len() / 4;
        let (top, bottom) = self.storage.split_at_mut(2 * quarter);
        let (q0, q1) = top.split_at_mut(quarter);
        let (q2, q3) = bottom.split_at_mut(quarter);
        Some([q0, q1, q2, q3])
    }

    /// Overwrites every cell with `f(row, col)`, one scoped thread per
    /// quadrant. Each worker owns a contiguous quarter of storage so no
    /// locking is involved.
    pub fn fill_with_par<F>(&mut self, f: F)
    where
        F: Fn(u32, u32) -> T + Sync,
        T: Send,
    {
        if self.rank < 2 {
            warn!("rank {} matrix has no quadrants, filling serially", self.rank);
            for (z, cell) in self.storage.iter_mut().enumerate() {
                let (row, col) = decode(z as u64);
                *cell = f(row, col);
            }
            return;
        }
        let quarter = self.storage.len() / 4;
        let f = &f;
        let outcome = crossbeam::scope(|scope| {
            for (q, chunk) in self.storage.chunks_mut(quarter).enumerate() {
                scope.spawn(move |_| {
                    trace!("filling quadrant {q} ({} elements)", chunk.len());
                    let base = q * quarter;
                    for (i, cell) in chunk.iter_mut().enumerate() {
                        let (row, col) = decode((base + i) as u64);
                        *cell = f(row, col);
                    }
                });
            }
        });
        if let Err(panic) = outcome {
            std::panic::resume_unwind(panic);
        }
    }
}

impl<T> Default for Matrix<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Index<(u32, u32)> for Matrix<T> {
    type Output = T;
    fn index(&self, (row, col): (u32, u32)) -> &T {
        self.at(row, col)
    }
}
impl<T> IndexMut<(u32, u32)> for Matrix<T> {
    fn index_mut(&mut self, (row, col): (u32, u32)) -> &mut T {
        self.at_mut(row, col)
    }
}

// x is the column, y the row.
impl<T> Index<UVec2> for Matrix<T> {
    type Output = T;
    fn index(&self, coords: UVec2) -> &T {
        &self.storage[slot(encode_uvec2(coords))]
    }
}
impl<T> IndexMut<UVec2> for Matrix<T> {
    fn index_mut(&mut self, coords: UVec2) -> &mut T {
        &mut self.storage[slot(encode_uvec2(coords))]
    }
}

impl<'a, T> IntoIterator for &'a Matrix<T> {
    type Item = ((u32, u32), &'a T);
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
impl<'a, T> IntoIterator for &'a mut Matrix<T> {
    type Item = ((u32, u32), &'a mut T);
    type IntoIter = IterMut<'a, T>;
    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}

impl<T: fmt::Debug> fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<&T>> = (0..self.rank)
            .map(|row| (0..self.rank).map(|col| self.at(row, col)).collect())
            .collect();
        f.debug_struct("Matrix")
            .field("rank", &self.rank)
            .field("rows", &rows)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_default_filled() {
        let m: Matrix<u32> = Matrix::new(4);
        assert_eq!(m.rank(), 4);
        assert_eq!(m.size(), 16);
        assert!(m.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn empty_matrix() {
        let m: Matrix<f64> = Matrix::new(0);
        assert_eq!(m.rank(), 0);
        assert_eq!(m.size(), 0);
        assert!(m.is_empty());
        assert_eq!(m.begin(), m.end());
        assert_eq!(m.iter().count(), 0);
        assert!(m.get(0, 0).is_none());
        assert_eq!(Matrix::<f64>::empty(), Matrix::default());
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn new_rejects_bad_rank() {
        let _ = Matrix::<u8>::new(6);
    }

    #[test]
    fn try_new_reports_bad_rank() {
        assert_eq!(
            Matrix::<u8>::try_new(3).unwrap_err(),
            MatrixError::InvalidRank(3)
        );
        assert_eq!(Matrix::<u8>::try_new(8).unwrap().size(), 64);
    }

    #[test]
    fn set_then_at() {
        let mut m: Matrix<i32> = Matrix::new(8);
        m.set(3, 5, 7);
        *m.at_mut(0, 7) = -1;
        m[(7, 0)] = 2;
        assert_eq!(*m.at(3, 5), 7);
        assert_eq!(m[(0, 7)], -1);
        assert_eq!(m.get(7, 0), Some(&2));
        assert_eq!(m.as_slice()[encode(3, 5) as usize], 7);
        assert_eq!(m.as_slice().iter().filter(|&&v| v != 0).count(), 3);
    }

    #[test]
    fn uvec2_index_uses_x_as_column() {
        let mut m: Matrix<u8> = Matrix::new(4);
        m[UVec2::new(3, 1)] = 9;
        assert_eq!(*m.at(1, 3), 9);
    }

    #[test]
    #[should_panic]
    fn at_out_of_range_panics() {
        let m: Matrix<u8> = Matrix::new(4);
        let _ = m.at(0, 4);
    }

    #[test]
    fn get_checks_both_coordinates() {
        let mut m: Matrix<u8> = Matrix::new(2);
        assert!(m.get(2, 0).is_none());
        assert!(m.get(0, 2).is_none());
        assert!(m.get_mut(1, 1).is_some());
    }

    #[test]
    fn from_fn_places_values_by_coordinate() {
        let m = Matrix::from_fn(4, |row, col| row * 4 + col);
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(*m.at(row, col), row * 4 + col);
            }
        }
        assert_eq!(&m.as_slice()[..4], &[0, 1, 4, 5]);
    }

    #[test]
    fn from_morton_vec_checks_length() {
        let err = Matrix::from_morton_vec(2, vec![1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            MatrixError::LengthMismatch {
                rank: 2,
                expected: 4,
                actual: 3
            }
        );
        let m = Matrix::from_morton_vec(2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(*m.at(1, 0), 3);
        assert_eq!(m.into_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn duplicate_is_independent() {
        let mut m = Matrix::from_fn(4, |row, col| (row, col));
        let mut d = m.duplicate();
        assert_eq!(d, m);
        d.set(0, 0, (9, 9));
        assert_eq!(*m.at(0, 0), (0, 0));
        m.set(1, 1, (8, 8));
        assert_eq!(*d.at(1, 1), (1, 1));
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut m = Matrix::from_fn(2, |row, col| row + col);
        let ptr = m.as_ptr();
        let moved = m.take();
        assert!(m.is_empty());
        assert_eq!(m.size(), 0);
        assert_eq!(moved.rank(), 2);
        assert_eq!(moved.as_ptr(), ptr);
    }

    #[test]
    fn cursor_recovers_coordinates() {
        let m = Matrix::from_fn(8, |row, col| (row, col));
        let mut cursor = m.begin();
        let end = m.end();
        let mut steps = 0;
        while cursor != end {
            assert_eq!(*cursor.get(), cursor.coords());
            cursor.move_next();
            steps += 1;
        }
        assert_eq!(steps, m.size());
        assert_eq!(m.begin().distance_to(&end), 64);
        assert_eq!(*m.cursor_at(5, 2).get(), (5, 2));
    }

    #[test]
    fn cursor_mut_updates_matrix() {
        let mut m: Matrix<u32> = Matrix::new(4);
        let mut cursor = m.begin_mut();
        cursor.advance(encode(2, 3) as isize);
        cursor.set(42);
        assert_eq!(cursor.as_cursor().coords(), (2, 3));
        assert_eq!(*m.at(2, 3), 42);
    }

    #[test]
    fn end_mut_walks_backwards() {
        let mut m: Matrix<u32> = Matrix::new(2);
        let mut cursor = m.end_mut();
        let mut next = 0;
        while cursor.remaining() < 4 {
            cursor.move_prev();
            cursor.set(next);
            next += 1;
        }
        assert_eq!(m.as_slice(), &[3, 2, 1, 0]);
    }

    #[test]
    fn iter_mut_sees_every_cell() {
        let mut m: Matrix<u32> = Matrix::new(4);
        for ((row, col), cell) in &mut m {
            *cell = 10 * row + col;
        }
        for ((row, col), cell) in &m {
            assert_eq!(*cell, 10 * row + col);
        }
    }

    #[test]
    fn quadrants_are_contiguous() {
        let mut m = Matrix::from_fn(4, |row, col| (row / 2, col / 2));
        assert_eq!(m.quadrant(0).unwrap(), &[(0, 0); 4]);
        assert_eq!(m.quadrant(1).unwrap(), &[(0, 1); 4]);
        assert_eq!(m.quadrant(2).unwrap(), &[(1, 0); 4]);
        assert_eq!(m.quadrant(3).unwrap(), &[(1, 1); 4]);
        assert!(m.quadrant(4).is_none());
        let [_, top_right, _, _] = m.quadrants_mut().unwrap();
        top_right.fill((7, 7));
        assert_eq!(*m.at(1, 3), (7, 7));
        assert!(Matrix::<u8>::new(1).quadrant(0).is_none());
    }

    #[test]
    fn parallel_fill_matches_serial() {
        let mut m: Matrix<u64> = Matrix::new(32);
        m.fill_with_par(|row, col| u64::from(row) << 32 | u64::from(col));
        assert_eq!(m, Matrix::from_fn(32, |row, col| u64::from(row) << 32 | u64::from(col)));

        let mut single: Matrix<u64> = Matrix::new(1);
        single.fill_with_par(|_, _| 5);
        assert_eq!(*single.at(0, 0), 5);
    }

    #[test]
    fn fill_overwrites_everything() {
        let mut m = Matrix::from_fn(4, |row, col| row + col);
        m.fill(1);
        assert!(m.as_slice().iter().all(|&v| v == 1));
    }

    #[test]
    fn byte_view_follows_storage_order() {
        let mut m: Matrix<u16> = Matrix::new(2);
        m.set(1, 0, 0x0102);
        assert_eq!(m.as_bytes().len(), 8);
        assert_eq!(&m.as_bytes()[4..6], &0x0102u16.to_ne_bytes());
        m.as_bytes_mut()[0..2].copy_from_slice(&7u16.to_ne_bytes());
        assert_eq!(*m.at(0, 0), 7);
    }

    #[test]
    fn debug_prints_rows() {
        let m = Matrix::from_fn(2, |row, col| row * 2 + col);
        assert_eq!(format!("{m:?}"), "Matrix { rank: 2, rows: [[0, 1], [2, 3]] }");
    }
}
