//! Typed content values (EXI §7.1.3, 7.1.4, 7.1.8) and their lexical forms.
//!
//! Schema-less streams carry every value as a string. The typed values
//! exist for the typed callbacks of [`ContentHandler`](crate::decoder::ContentHandler),
//! which the tree builder turns back into text through `Display`.

use std::fmt;

/// Decimal value (EXI §7.1.3).
///
/// `fractional` haelt die Nachkommaziffern in umgekehrter Reihenfolge, wie
/// sie im Stream stehen: "12.34" ist `integral = 12`, `fractional = 43`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    /// True if the value is negative (including minus zero).
    pub negative: bool,
    pub integral: u64,
    pub fractional: u64,
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        write!(f, "{}", self.integral)?;
        if self.fractional > 0 {
            let reversed: String = self.fractional.to_string().chars().rev().collect();
            write!(f, ".{reversed}")?;
        }
        Ok(())
    }
}

/// Float value (EXI §7.1.4): `mantissa × 10^exponent` or a special value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Float {
    Value { mantissa: i64, exponent: i64 },
    Infinity,
    NegativeInfinity,
    NaN,
}

/// Lexical form `mEe` (xsd:double), plain integer when the exponent is 0.
impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infinity => f.write_str("INF"),
            Self::NegativeInfinity => f.write_str("-INF"),
            Self::NaN => f.write_str("NaN"),
            Self::Value { mantissa, exponent: 0 } => write!(f, "{mantissa}"),
            Self::Value { mantissa, exponent } => write!(f, "{mantissa}E{exponent}"),
        }
    }
}

/// Which date/time components a [`DateTime`] carries (EXI §7.1.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeKind {
    GYear,
    GYearMonth,
    Date,
    DateTime,
    GMonth,
    GMonthDay,
    GDay,
    Time,
}

/// Date/time value (EXI §7.1.8).
///
/// `year` ist als Offset von 2000 gespeichert (25 = 2025), `fractional_secs`
/// mit umgekehrten Ziffern wie bei [`Decimal`]. Komponenten die `kind` nicht
/// enthaelt werden ignoriert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub kind: DateTimeKind,
    pub year: i64,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub fractional_secs: Option<u64>,
    pub timezone_offset_minutes: Option<i16>,
}

impl DateTime {
    fn write_time(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        if let Some(frac) = self.fractional_secs {
            let reversed: String = frac.to_string().chars().rev().collect();
            write!(f, ".{reversed}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = self.year + 2000;
        match self.kind {
            DateTimeKind::GYear => write!(f, "{year:04}")?,
            DateTimeKind::GYearMonth => write!(f, "{year:04}-{:02}", self.month)?,
            DateTimeKind::Date => write!(f, "{year:04}-{:02}-{:02}", self.month, self.day)?,
            DateTimeKind::DateTime => {
                write!(f, "{year:04}-{:02}-{:02}T", self.month, self.day)?;
                self.write_time(f)?;
            }
            DateTimeKind::GMonth => write!(f, "--{:02}", self.month)?,
            DateTimeKind::GMonthDay => write!(f, "--{:02}-{:02}", self.month, self.day)?,
            DateTimeKind::GDay => write!(f, "---{:02}", self.day)?,
            DateTimeKind::Time => self.write_time(f)?,
        }
        match self.timezone_offset_minutes {
            None => Ok(()),
            Some(0) => f.write_str("Z"),
            Some(offset) => {
                let sign = if offset < 0 { '-' } else { '+' };
                let abs = offset.unsigned_abs();
                write!(f, "{sign}{:02}:{:02}", abs / 60, abs % 60)
            }
        }
    }
}
