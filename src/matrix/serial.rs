//! bincode support. A matrix is written as its rank followed by the elements
//! in storage order, so decoding needs no reordering.
use bincode::de::Decoder;
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};

use crate::matrix::Matrix;

impl<T: Encode> Encode for Matrix<T> {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.rank.encode(encoder)?;
        self.storage[..].encode(encoder)
    }
}

impl<Context, T: Decode<Context>> Decode<Context> for Matrix<T> {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let rank = u32::decode(decoder)?;
        let elements = Vec::<T>::decode(decoder)?;
        Matrix::from_morton_vec(rank, elements).map_err(|e| DecodeError::OtherString(e.to_string()))
    }
}
