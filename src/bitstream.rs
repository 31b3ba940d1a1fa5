//! Bit-level stream reader over an in-memory EXI buffer.
//!
//! EXI uses MSB-first bit packing (EXI §7.1). Bits within each byte are
//! numbered 7 (most significant, read first) down to 0. The whole input is
//! available up front, so the reader is a plain window over a byte slice.
//!
//! [`BitWriter`] is the mirror image. The decoder never writes; the writer
//! exists to assemble streams by hand in tests and fuzz seeds.

use crate::{Error, Result};

/// Reads individual bits from a byte slice, MSB first (EXI §7.1).
///
/// Bits werden byteweise in einen u64-Akkumulator nachgeladen und per
/// Shift extrahiert. Der Akkumulator ist linksbuendig: Bit 63 ist das
/// aelteste ungelesene Bit, die rechten `64 - accum_bits` Bits sind 0.
#[derive(Clone, Copy)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Naechstes noch nicht geladenes Byte in `data`.
    byte_pos: usize,
    accum: u64,
    /// Anzahl gueltiger Bits im Akkumulator (0..=64).
    accum_bits: u8,
}

/// Gespeicherte Leseposition fuer Rollback (Cookie-Erkennung).
#[derive(Debug, Clone, Copy)]
pub struct BitReaderCheckpoint {
    byte_pos: usize,
    accum: u64,
    accum_bits: u8,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` over the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, byte_pos: 0, accum: 0, accum_bits: 0 }
    }

    #[inline(always)]
    fn refill(&mut self) {
        while self.accum_bits <= 56 && self.byte_pos < self.data.len() {
            self.accum |= u64::from(self.data[self.byte_pos]) << (56 - self.accum_bits);
            self.byte_pos += 1;
            self.accum_bits += 8;
        }
    }

    /// Reads a single bit. Returns `true` for 1, `false` for 0.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        self.refill();
        if self.accum_bits == 0 {
            return Err(Error::PrematureEndOfStream);
        }
        let val = (self.accum >> 63) != 0;
        self.accum <<= 1;
        self.accum_bits -= 1;
        Ok(val)
    }

    /// Reads `n` bits (0..=64) and returns them as a `u64`, MSB first.
    ///
    /// `n = 0` liest nichts und liefert 0. Bei zu wenig Daten bleibt der
    /// Reader unveraendert.
    pub fn read_bits(&mut self, n: u8) -> Result<u64> {
        debug_assert!(n <= 64, "bit count must be 0..=64, got {n}");
        if n == 0 {
            return Ok(0);
        }
        if usize::from(n) > self.remaining_bits() {
            return Err(Error::PrematureEndOfStream);
        }
        self.refill();
        if n <= self.accum_bits {
            let val = self.accum >> (64 - n);
            self.accum = if n < 64 { self.accum << n } else { 0 };
            self.accum_bits -= n;
            return Ok(val);
        }
        // n > 56: Akkumulator leeren und nachladen
        let first = self.accum_bits;
        let high = self.accum >> (64 - first);
        self.accum = 0;
        self.accum_bits = 0;
        let rest = n - first;
        self.refill();
        let low = self.accum >> (64 - rest);
        self.accum <<= rest;
        self.accum_bits -= rest;
        Ok((high << rest) | low)
    }

    /// Reads one octet. Fast path when the accumulator is empty and the
    /// position is on a byte boundary.
    #[inline]
    pub fn read_byte_aligned(&mut self) -> Result<u8> {
        if self.accum_bits == 0 {
            let Some(&byte) = self.data.get(self.byte_pos) else {
                return Err(Error::PrematureEndOfStream);
            };
            self.byte_pos += 1;
            return Ok(byte);
        }
        Ok(self.read_bits(8)? as u8)
    }

    /// Discards unread bits up to the next byte boundary. No-op if already aligned.
    pub fn align_to_byte(&mut self) {
        let discard = self.accum_bits % 8;
        if discard > 0 {
            self.accum <<= discard;
            self.accum_bits -= discard;
        }
    }

    /// Current read position in bits from the start of the buffer.
    pub fn bit_position(&self) -> usize {
        self.byte_pos * 8 - usize::from(self.accum_bits)
    }

    /// Returns the number of bits remaining to be read.
    pub fn remaining_bits(&self) -> usize {
        (self.data.len() - self.byte_pos) * 8 + usize::from(self.accum_bits)
    }

    /// Speichert die aktuelle Leseposition fuer moeglichen Rollback.
    pub fn save_checkpoint(&self) -> BitReaderCheckpoint {
        BitReaderCheckpoint {
            byte_pos: self.byte_pos,
            accum: self.accum,
            accum_bits: self.accum_bits,
        }
    }

    /// Stellt eine zuvor gespeicherte Leseposition wieder her.
    pub fn restore_checkpoint(&mut self, cp: BitReaderCheckpoint) {
        self.byte_pos = cp.byte_pos;
        self.accum = cp.accum;
        self.accum_bits = cp.accum_bits;
    }
}

/// Writes individual bits into a growable byte buffer, MSB first (EXI §7.1).
#[derive(Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    /// Bits des angefangenen Bytes, rechtsbuendig.
    pending: u8,
    pending_bits: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, val: bool) {
        self.pending = (self.pending << 1) | u8::from(val);
        self.pending_bits += 1;
        if self.pending_bits == 8 {
            self.buf.push(self.pending);
            self.pending = 0;
            self.pending_bits = 0;
        }
    }

    /// Writes the lower `n` bits of `val`, MSB first. `n = 0` is a no-op.
    pub fn write_bits(&mut self, val: u64, n: u8) {
        debug_assert!(n <= 64, "bit count must be 0..=64, got {n}");
        for i in (0..n).rev() {
            self.write_bit((val >> i) & 1 == 1);
        }
    }

    /// Writes one octet (8 bits), aligned or not.
    pub fn write_byte(&mut self, val: u8) {
        self.write_bits(u64::from(val), 8);
    }

    /// Pads with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        while self.pending_bits != 0 {
            self.write_bit(false);
        }
    }

    /// Number of bits written so far.
    pub fn bit_position(&self) -> usize {
        self.buf.len() * 8 + usize::from(self.pending_bits)
    }

    /// Finishes the stream, zero-padding the last byte.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.buf
    }
}
