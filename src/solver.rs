//! Affine model of CRC32 over a 4-byte patch window, and its solution.
//!
//! For a fixed buffer length, `checksum(buffer with window = R)` equals
//! `constant ^ M * R`, where `R` is the window read as a little-endian `u32`
//! and `M` depends only on how many bytes follow the window.

use log::trace;

use crate::crc32::{self, INITIAL_STATE};
use crate::error::{CoercionError, CoercionResult};
use crate::matrix::BitMatrix;
use crate::types::{ByteBuffer, Checksum, PatchWindow, WINDOW_WIDTH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearModel {
    matrix: BitMatrix,
    constant: Checksum,
    trailing: usize,
}

impl LinearModel {
    /// Model `buffer`'s checksum as a function of the content of `window`.
    /// Whatever currently sits in the window is ignored.
    ///
    /// Column `i` of the matrix equals `checksum(buffer with window = 1 << i)`
    /// XOR `constant`. It is taken as a power of the zero-byte operator rather
    /// than by 32 passes over the trailing bytes; both give the same matrix.
    pub fn build(buffer: &ByteBuffer, window: PatchWindow) -> LinearModel {
        let prefix_state = crc32::update(INITIAL_STATE, buffer.prefix(window));
        let zeroed = crc32::update(prefix_state, &[0u8; WINDOW_WIDTH]);
        let constant = crc32::finalize(crc32::update(zeroed, buffer.trailing(window)));

        // Flipping window bit i flips the register bit i before four zero-byte
        // steps, then every trailing byte adds one more step. Init and output
        // XOR cancel out of the difference.
        let steps = (window.trailing_len() + WINDOW_WIDTH) as u64;
        let matrix = crc32::zero_shift_operator(steps);

        trace!(
            "linear model: offset={} trailing={} constant={}",
            window.offset(),
            window.trailing_len(),
            constant
        );

        LinearModel {
            matrix,
            constant,
            trailing: window.trailing_len(),
        }
    }

    pub fn matrix(&self) -> &BitMatrix {
        &self.matrix
    }

    /// Checksum of the buffer with an all-zero window.
    pub fn constant(&self) -> Checksum {
        self.constant
    }

    /// Checksum the buffer would have with `content` in the window.
    pub fn evaluate(&self, content: u32) -> Checksum {
        Checksum::new(self.constant.value() ^ self.matrix.mul_vec(content))
    }

    /// Window content that makes the buffer checksum to `target`.
    pub fn solve(&self, target: Checksum) -> CoercionResult<u32> {
        let inverse = self
            .matrix
            .inverse()
            .ok_or(CoercionError::SingularLinearSystem {
                trailing: self.trailing,
            })?;
        Ok(inverse.mul_vec(target.value() ^ self.constant.value()))
    }
}

/// Compute the bytes that, written into `window`, give `buffer` the checksum
/// `target`. The buffer itself is not modified.
pub fn solve(
    buffer: &ByteBuffer,
    window: PatchWindow,
    target: Checksum,
) -> CoercionResult<[u8; WINDOW_WIDTH]> {
    // Re-anchor the window on this buffer's length.
    let window = PatchWindow::new(window.offset(), buffer.len())?;
    let model = LinearModel::build(buffer, window);
    let content = model.solve(target)?;
    Ok(content.to_le_bytes())
}
