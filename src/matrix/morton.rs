//! Two dimensional Morton (Z-order) codec.
//!
//! Column bits land on the even positions of the code and row bits on the odd
//! positions, least significant bit first. `encode(1, 2)` is `0b0110`.
use glam::UVec2;

pub trait Morton {
	fn split_by_2(a: u32) -> Self;
	fn encode(row: u32, col: u32) -> Self;
	fn pack_even(&self) -> u32;
	fn pack_odd(&self) -> u32;
	fn decode(&self) -> (u32, u32);
}
pub type MortonCode = u64;
impl Morton for MortonCode {
	fn split_by_2(a: u32) -> Self {
		let mut x: u64 = a.into();
		x = (x | x << 16) & 0x0000ffff0000ffff;
		x = (x | x << 8) & 0x00ff00ff00ff00ff;
		x = (x | x << 4) & 0x0f0f0f0f0f0f0f0f;
		x = (x | x << 2) & 0x3333333333333333;
		x = (x | x << 1) & 0x5555555555555555;
		x
	}
	fn encode(row: u32, col: u32) -> Self {
		Self::split_by_2(col) | Self::split_by_2(row) << 1
	}
	fn pack_even(&self) -> u32 {
		let mut x = self & 0x5555555555555555;
		x = (x | x >> 1) & 0x3333333333333333;
		x = (x | x >> 2) & 0x0f0f0f0f0f0f0f0f;
		x = (x | x >> 4) & 0x00ff00ff00ff00ff;
		x = (x | x >> 8) & 0x0000ffff0000ffff;
		x = (x | x >> 16) & 0x00000000ffffffff;
		x as u32
	}
	fn pack_odd(&self) -> u32 {
		(self >> 1).pack_even()
	}
	fn decode(&self) -> (u32, u32) {
		(self.pack_odd(), self.pack_even())
	}
}

/// Interleaves `row` and `col` into a flat storage index.
///
/// Rank agnostic and unchecked: coordinates outside the caller's matrix give a
/// well defined index that simply lies outside its storage.
#[inline]
pub fn encode(row: u32, col: u32) -> MortonCode {
	<MortonCode as Morton>::encode(row, col)
}

/// Inverse of [`encode`], returning `(row, col)`.
#[inline]
pub fn decode(index: MortonCode) -> (u32, u32) {
	index.decode()
}

/// Column held in the even bits of `index`.
#[inline]
pub fn pack_even(index: MortonCode) -> u32 {
	index.pack_even()
}

/// Row held in the odd bits of `index`.
#[inline]
pub fn pack_odd(index: MortonCode) -> u32 {
	index.pack_odd()
}

/// `x` is the column, `y` the row.
#[inline]
pub fn encode_uvec2(coords: UVec2) -> MortonCode {
	encode(coords.y, coords.x)
}

#[inline]
pub fn decode_uvec2(index: MortonCode) -> UVec2 {
	UVec2::new(index.pack_even(), index.pack_odd())
}

/// Zero or a power of two.
#[inline]
pub fn is_valid_rank(rank: u32) -> bool {
	rank & rank.wrapping_sub(1) == 0
}
