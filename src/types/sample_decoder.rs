//! Packed bit-stream sample decoder: unpacks a big-endian bit stream of
//! `bits_per_sample`-wide unsigned samples into a dense `u32` grid.

use crate::error::{FnResult, FunctionError};
use crate::host::ByteSource;

/// Decode `count` samples of `bits_per_sample` width from `source` into a
/// dense grid of `u32` values. The stream is rewound first, then bulk-read;
/// any 8-bits-per-sample source takes a fast byte-copy path.
pub fn decode_samples(source: &mut dyn ByteSource, bits_per_sample: u32, count: usize) -> FnResult<Vec<u32>> {
    source.rewind()?;

    if bits_per_sample == 8 {
        let mut grid = Vec::with_capacity(count);
        for _ in 0..count {
            let byte = source
                .read_byte()?
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?;
            grid.push(byte as u32);
        }
        return Ok(grid);
    }

    let mut packer = BitPacker::new(source);
    let mut grid = Vec::with_capacity(count);
    for _ in 0..count {
        grid.push(packer.take(bits_per_sample)?);
    }
    Ok(grid)
}

/// Packs incoming bytes into a shift register and emits fixed-width
/// samples, most-significant-bit first, padding the trailing byte with
/// zero bits at end of stream (samples are never requested past `count`,
/// so the padding is never actually read).
struct BitPacker<'a> {
    source: &'a mut dyn ByteSource,
    register: u64,
    bits_available: u32,
}

impl<'a> BitPacker<'a> {
    fn new(source: &'a mut dyn ByteSource) -> Self {
        Self { source, register: 0, bits_available: 0 }
    }

    fn take(&mut self, bits: u32) -> FnResult<u32> {
        if bits == 0 || bits > 32 {
            return Err(FunctionError::range_check("bits-per-sample out of range"));
        }
        while self.bits_available < bits {
            let byte = self.source.read_byte()?.ok_or_else(|| {
                std::io::Error::from(std::io::ErrorKind::UnexpectedEof)
            })?;
            self.register = (self.register << 8) | byte as u64;
            self.bits_available += 8;
        }
        let shift = self.bits_available - bits;
        let mask = (1u64 << bits) - 1;
        let value = (self.register >> shift) & mask;
        self.bits_available = shift;
        self.register &= (1u64 << self.bits_available) - 1;
        Ok(value as u32)
    }
}
