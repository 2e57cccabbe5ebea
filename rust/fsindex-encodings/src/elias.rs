//! Elias gamma and delta codes.
//!
//! For `n >= 1` with `N = floor(log2 n)`:
//!
//! - gamma: `N` zero bits, then `n` in `N + 1` bits (leading one included).
//! - delta: `gamma(N + 1)`, then the low `N` bits of `n`.

use fsindex_common::{Result, error::Error};

use crate::bits::{BitReader, BitWriter};

fn floor_log2(n: u64) -> u32 {
    63 - n.leading_zeros()
}

fn check_positive(n: u64) -> Result<()> {
    if n == 0 {
        return Err(Error::invalid_arg("n", "Elias codes are defined for n >= 1"));
    }
    Ok(())
}

pub fn write_gamma(writer: &mut BitWriter, n: u64) -> Result<()> {
    check_positive(n)?;
    let msb = floor_log2(n);
    writer.write_zeros(msb);
    writer.write_bits(n, msb + 1);
    Ok(())
}

pub fn read_gamma(reader: &mut BitReader<'_>) -> Result<u64> {
    let mut zeros = 0u32;
    while !reader.read_bit()? {
        zeros += 1;
        if zeros > 63 {
            return Err(Error::invalid_format("gamma code", "prefix longer than 63 bits"));
        }
    }
    Ok((1u64 << zeros) | reader.read_bits(zeros)?)
}

pub fn write_delta(writer: &mut BitWriter, n: u64) -> Result<()> {
    check_positive(n)?;
    let msb = floor_log2(n);
    write_gamma(writer, msb as u64 + 1)?;
    writer.write_bits(n, msb);
    Ok(())
}

pub fn read_delta(reader: &mut BitReader<'_>) -> Result<u64> {
    let len = read_gamma(reader)?;
    if len > 64 {
        return Err(Error::invalid_format("delta code", format!("{len}-bit value")));
    }
    let msb = (len - 1) as u32;
    Ok((1u64 << msb) | reader.read_bits(msb)?)
}

/// Number of bits `write_gamma(n)` emits.
pub fn gamma_len(n: u64) -> u32 {
    2 * floor_log2(n.max(1)) + 1
}

/// Number of bits `write_delta(n)` emits.
pub fn delta_len(n: u64) -> u32 {
    let msb = floor_log2(n.max(1));
    gamma_len(msb as u64 + 1) + msb
}
