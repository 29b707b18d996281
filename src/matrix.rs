//! Square 32x32 matrices over GF(2).
//!
//! Column `i` of a matrix is stored as a `u32` whose bit `j` is entry
//! `(j, i)`. Addition is XOR and multiplication is AND, so every operation
//! here is plain bit twiddling with no overflow or rounding to worry about.

pub const DIM: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitMatrix {
    columns: [u32; DIM],
}

impl BitMatrix {
    pub fn identity() -> Self {
        Self::from_fn(|column| column)
    }

    pub fn from_columns(columns: [u32; DIM]) -> Self {
        Self { columns }
    }

    pub fn from_rows(rows: [u32; DIM]) -> Self {
        Self {
            columns: transpose(&rows),
        }
    }

    /// Build the matrix of a linear map given its action on each basis vector.
    /// `map` receives `1 << i` and returns column `i`.
    pub fn from_fn(map: impl Fn(u32) -> u32) -> Self {
        let mut columns = [0u32; DIM];
        for (i, column) in columns.iter_mut().enumerate() {
            *column = map(1 << i);
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[u32; DIM] {
        &self.columns
    }

    pub fn rows(&self) -> [u32; DIM] {
        transpose(&self.columns)
    }

    pub fn get(&self, row: usize, column: usize) -> bool {
        (self.columns[column] >> row) & 1 == 1
    }

    /// Matrix-vector product: the XOR of the columns selected by `vector`.
    pub fn mul_vec(&self, vector: u32) -> u32 {
        let mut acc = 0u32;
        let mut rest = vector;
        while rest != 0 {
            let i = rest.trailing_zeros() as usize;
            acc ^= self.columns[i];
            rest &= rest - 1;
        }
        acc
    }

    /// `self * other`, i.e. apply `other` first.
    pub fn mul(&self, other: &BitMatrix) -> BitMatrix {
        let mut columns = [0u32; DIM];
        for (out, column) in columns.iter_mut().zip(other.columns.iter()) {
            *out = self.mul_vec(*column);
        }
        BitMatrix { columns }
    }

    pub fn pow(&self, mut exp: u64) -> BitMatrix {
        let mut result = BitMatrix::identity();
        let mut base = *self;
        while exp > 0 {
            if exp & 1 == 1 {
                result = result.mul(&base);
            }
            base = base.mul(&base);
            exp >>= 1;
        }
        result
    }

    /// Gauss-Jordan elimination on `[A | I]` with row pivoting.
    ///
    /// Returns `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<BitMatrix> {
        let mut rows = self.rows();
        let mut inverse = BitMatrix::identity().rows();

        for column in 0..DIM {
            let bit = 1u32 << column;
            let pivot = (column..DIM).find(|&row| rows[row] & bit != 0)?;
            rows.swap(column, pivot);
            inverse.swap(column, pivot);

            for row in 0..DIM {
                if row != column && rows[row] & bit != 0 {
                    rows[row] ^= rows[column];
                    inverse[row] ^= inverse[column];
                }
            }
        }

        Some(BitMatrix::from_rows(inverse))
    }
}

fn transpose(words: &[u32; DIM]) -> [u32; DIM] {
    let mut out = [0u32; DIM];
    for (i, word) in words.iter().enumerate() {
        for (j, slot) in out.iter_mut().enumerate() {
            if (word >> j) & 1 == 1 {
                *slot |= 1 << i;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // Gray-code encoder: e_i -> e_i + e_{i-1}, i.e. x ^ (x >> 1).
    fn gray_encoder() -> BitMatrix {
        BitMatrix::from_fn(|x| x ^ (x >> 1))
    }

    // x -> x rotated left by one bit.
    fn rotate_left() -> BitMatrix {
        BitMatrix::from_fn(|x| x.rotate_left(1))
    }

    #[test]
    fn identity_is_its_own_inverse() {
        let id = BitMatrix::identity();
        assert_eq!(id.inverse(), Some(id));
        assert_eq!(id.mul_vec(0xA5A5_0F0F), 0xA5A5_0F0F);
    }

    #[test]
    fn rows_and_columns_are_transposes() {
        let m = gray_encoder();
        assert!(m.get(0, 1));
        assert!(m.get(1, 1));
        assert!(!m.get(2, 1));
        assert_eq!(BitMatrix::from_rows(m.rows()), m);
        // Row j of the Gray encoder has bits j and j + 1.
        assert_eq!(m.rows()[0], 0b11);
        assert_eq!(m.rows()[31], 1 << 31);
    }

    #[test]
    fn gray_encoder_inverse_is_prefix_xor() {
        let inverse = gray_encoder().inverse().expect("gray encoder is invertible");
        for (i, column) in inverse.columns().iter().enumerate() {
            let expected = if i == 31 { u32::MAX } else { (1u32 << (i + 1)) - 1 };
            assert_eq!(*column, expected, "column {i}");
        }
        assert_eq!(gray_encoder().mul(&inverse), BitMatrix::identity());
        assert_eq!(inverse.mul(&gray_encoder()), BitMatrix::identity());
    }

    #[test]
    fn rotation_inverse_needs_pivoting() {
        // Every diagonal entry is zero, so elimination has to swap rows.
        let rot = rotate_left();
        let inverse = rot.inverse().expect("permutation is invertible");
        assert_eq!(inverse, BitMatrix::from_fn(|x| x.rotate_right(1)));
    }

    #[test]
    fn powers() {
        let rot = rotate_left();
        assert_eq!(rot.pow(0), BitMatrix::identity());
        assert_eq!(rot.pow(1), rot);
        assert_eq!(rot.pow(32), BitMatrix::identity());
        assert_eq!(rot.pow(37).mul_vec(1), 1 << 5);
    }

    #[test]
    fn singular_matrices_are_rejected() {
        let mut columns = *BitMatrix::identity().columns();
        columns[7] = 0;
        assert_eq!(BitMatrix::from_columns(columns).inverse(), None);

        let mut columns = *BitMatrix::identity().columns();
        columns[3] = columns[4] ^ columns[5];
        columns[5] = columns[3] ^ columns[4];
        assert_eq!(BitMatrix::from_columns(columns).inverse(), None);
    }
}
