//! Unsigned integers: variable-length 7-bit groups (EXI §7.1.6) and
//! n-bit fixed width (EXI §7.1.9).

use crate::bitstream::BitReader;
use crate::{Error, Result};

/// Decodes a variable-length unsigned integer (EXI §7.1.6).
///
/// Jedes Oktett traegt 7 Datenbits, MSB ist das Fortsetzungsbit. Die
/// niederwertigste Gruppe kommt zuerst.
pub fn decode(reader: &mut BitReader) -> Result<u64> {
    let mut result = 0u64;
    let mut shift: u32 = 0;
    loop {
        let byte = reader.read_byte_aligned()?;
        let data = u64::from(byte & 0x7F);
        // Beim 10. Oktett ist nur Datenbit 0 gueltig und keine Fortsetzung.
        if shift == 63 && (data > 1 || byte & 0x80 != 0) {
            return Err(Error::IntegerOverflow);
        }
        result |= data << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Decodes an `n`-bit unsigned integer (EXI §7.1.9).
///
/// Bit-packed: exactly `n` bits, MSB first. Byte-aligned: the minimum
/// number of bytes holding `n` bits, least significant byte first.
pub fn decode_n_bit(reader: &mut BitReader, n: u8, byte_aligned: bool) -> Result<u64> {
    if !byte_aligned {
        return reader.read_bits(n);
    }
    let mut value = 0u64;
    for i in 0..usize::from(n).div_ceil(8) {
        value |= u64::from(reader.read_byte_aligned()?) << (8 * i);
    }
    Ok(value)
}

/// Decodes a length-like unsigned integer into `usize`.
pub(crate) fn decode_usize(reader: &mut BitReader) -> Result<usize> {
    usize::try_from(decode(reader)?).map_err(|_| Error::IntegerOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_bytes(data: &[u8]) -> Result<u64> {
        decode(&mut BitReader::new(data))
    }

    // EXI §7.1.6: max single-byte value (7 data bits)
    #[test]
    fn single_octet() {
        assert_eq!(decode_bytes(&[0x00]).unwrap(), 0);
        assert_eq!(decode_bytes(&[0x7F]).unwrap(), 127);
    }

    // 128 = low7 0x00 mit Fortsetzung, dann 0x01
    #[test]
    fn two_octets_low_group_first() {
        assert_eq!(decode_bytes(&[0x80, 0x01]).unwrap(), 128);
        assert_eq!(decode_bytes(&[0xFF, 0x7F]).unwrap(), 16383);
    }

    #[test]
    fn u64_max_decodes() {
        let mut data = vec![0xFF; 9];
        data.push(0x01);
        assert_eq!(decode_bytes(&data).unwrap(), u64::MAX);
    }

    #[test]
    fn overflow_in_tenth_octet() {
        let mut data = vec![0xFF; 9];
        data.push(0x02);
        assert_eq!(decode_bytes(&data), Err(Error::IntegerOverflow));
    }

    #[test]
    fn truncated_group_is_premature_end() {
        assert_eq!(decode_bytes(&[0x80]), Err(Error::PrematureEndOfStream));
    }

    #[test]
    fn works_at_unaligned_position() {
        // 1 Bit Versatz, dann 0x05
        let data = [0b0000_0010, 0b1000_0000];
        let mut r = BitReader::new(&data);
        assert!(!r.read_bit().unwrap());
        assert_eq!(decode(&mut r).unwrap(), 5);
    }

    #[test]
    fn n_bit_packed() {
        let data = [0b1010_0000];
        let mut r = BitReader::new(&data);
        assert_eq!(decode_n_bit(&mut r, 3, false).unwrap(), 0b101);
    }

    #[test]
    fn n_bit_byte_aligned_little_endian() {
        let data = [0x34, 0x01];
        let mut r = BitReader::new(&data);
        assert_eq!(decode_n_bit(&mut r, 9, true).unwrap(), 0x0134);
    }

    #[test]
    fn n_bit_zero_width_reads_nothing() {
        let mut r = BitReader::new(&[]);
        assert_eq!(decode_n_bit(&mut r, 0, true).unwrap(), 0);
        assert_eq!(decode_n_bit(&mut r, 0, false).unwrap(), 0);
    }
}
