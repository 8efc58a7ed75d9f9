//! Square matrices stored in Morton (Z-order) layout.
//!
//! ```
//! use zmatrix::Matrix;
//!
//! let mut m: Matrix<u32> = Matrix::new(4);
//! m.set(1, 2, 7);
//! assert_eq!(*m.at(1, 2), 7);
//! assert_eq!(m.as_slice()[zmatrix::morton::encode(1, 2) as usize], 7);
//!
//! let mut cursor = m.begin();
//! cursor.advance(6);
//! assert_eq!(cursor.coords(), (1, 2));
//! ```
pub mod error;
pub mod matrix;

pub use error::{MatrixError, Result};
pub use matrix::Matrix;
pub use matrix::cursor::{Cursor, CursorMut, Iter, IterMut};
pub use matrix::morton;
