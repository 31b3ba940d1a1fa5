//! Bitbreiten-Berechnung fuer Event Codes (EXI §6.2) und String-Table-Ids (EXI §7.3).

/// Anzahl Bits um `n` unterschiedliche Werte zu unterscheiden: `⌈log₂(n)⌉`.
///
/// `n = 0` und `n = 1` brauchen kein Bit: ein Event Code Teil mit nur einer
/// Alternative wird weggelassen.
#[inline]
pub fn for_count(n: usize) -> u8 {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as u8
    }
}
