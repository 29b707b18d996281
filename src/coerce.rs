//! Forcing a buffer's CRC32 to a chosen value.
//!
//! A call walks `compare -> select window -> solve -> splice -> verify`. The
//! only state is the buffer the caller handed over, which comes back inside
//! the [`Correction`].

use log::{debug, error};

use crate::crc32::checksum;
use crate::error::{CoercionError, CoercionResult};
use crate::solver;
use crate::types::{ByteBuffer, Checksum, CoercionMode, Correction, PatchWindow};

pub fn checksums_match(a: &[u8], b: &[u8]) -> bool {
    checksum(a) == checksum(b)
}

/// Make `target_buffer` checksum to the same value as `reference`.
pub fn coerce(
    reference: &[u8],
    target_buffer: ByteBuffer,
    mode: CoercionMode,
) -> CoercionResult<Correction> {
    coerce_to(checksum(reference), target_buffer, mode)
}

/// Make `buffer` checksum to `target`.
pub fn coerce_to(
    target: Checksum,
    mut buffer: ByteBuffer,
    mode: CoercionMode,
) -> CoercionResult<Correction> {
    let current = checksum(buffer.as_slice());
    debug!(
        "comparing checksums: current={current} target={target} len={}",
        buffer.len()
    );
    if current == target {
        return Ok(Correction::AlreadyMatched {
            buffer,
            checksum: current,
        });
    }

    let window = select_window(&mut buffer, mode)?;
    debug!(
        "patch window selected: mode={mode:?} offset={} trailing={}",
        window.offset(),
        window.trailing_len()
    );

    let patch = solver::solve(&buffer, window, target).inspect_err(|e| {
        if matches!(e, CoercionError::SingularLinearSystem { .. }) {
            error!("{e}");
        }
    })?;
    buffer.write_window(window, patch);
    debug!("spliced {} at offset {}", hex::encode(patch), window.offset());

    let checksum = verify(&buffer, target)?;
    Ok(Correction::Corrected {
        buffer,
        window,
        patch,
        checksum,
    })
}

fn select_window(buffer: &mut ByteBuffer, mode: CoercionMode) -> CoercionResult<PatchWindow> {
    match mode {
        CoercionMode::Overwrite => PatchWindow::trailing(buffer.len()),
        CoercionMode::Pad(position) => {
            let offset = position.resolve(buffer.len())?;
            buffer.insert_gap(offset)
        }
    }
}

fn verify(buffer: &ByteBuffer, expected: Checksum) -> CoercionResult<Checksum> {
    let actual = checksum(buffer.as_slice());
    if actual != expected {
        let err = CoercionError::VerificationMismatch { expected, actual };
        error!("{err}");
        return Err(err);
    }
    Ok(actual)
}
