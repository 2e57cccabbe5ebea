use fsindex_common::{Result, error::Error};

/// Appends bits most-significant first; the last byte is zero padded.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: u64,
}

impl BitWriter {
    pub fn new() -> BitWriter {
        Default::default()
    }

    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    pub fn write_bit(&mut self, bit: bool) {
        let offset = (self.bit_len % 8) as u32;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.bit_len += 1;
    }

    /// Writes the low `count` bits of `value`, highest first.
    pub fn write_bits(&mut self, value: u64, count: u32) {
        debug_assert!(count <= 64);
        for i in (0..count).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    pub fn write_zeros(&mut self, count: u32) {
        for _ in 0..count {
            self.write_bit(false);
        }
    }

    /// Returns the encoded bytes and the number of meaningful bits in them.
    pub fn finish(self) -> (Vec<u8>, u64) {
        (self.bytes, self.bit_len)
    }
}

#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    bit_len: u64,
    pos: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8], bit_len: u64) -> Result<BitReader<'a>> {
        if bit_len > bytes.len() as u64 * 8 {
            return Err(Error::invalid_format(
                "bit stream",
                format!("{bit_len} bits declared, {} bytes present", bytes.len()),
            ));
        }
        Ok(BitReader {
            bytes,
            bit_len,
            pos: 0,
        })
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn remaining(&self) -> u64 {
        self.bit_len - self.pos
    }

    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if pos > self.bit_len {
            return Err(Error::out_of_range(pos, self.bit_len));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        if self.pos >= self.bit_len {
            return Err(Error::invalid_format("bit stream", "unexpected end of stream"));
        }
        let byte = self.bytes[(self.pos / 8) as usize];
        let bit = byte & (0x80 >> (self.pos % 8)) != 0;
        self.pos += 1;
        Ok(bit)
    }

    pub fn read_bits(&mut self, count: u32) -> Result<u64> {
        debug_assert!(count <= 64);
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Ok(value)
    }
}
