//! A minimal forward-only byte cursor used while decoding COSEM PDUs.

use han_core::{HanError, HanResult};

#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn need(&self, n: usize) -> HanResult<()> {
        if self.remaining() < n {
            Err(HanError::Decode(format!(
                "need {} more byte(s), only {} remain",
                n,
                self.remaining()
            )))
        } else {
            Ok(())
        }
    }

    pub fn take(&mut self, n: usize) -> HanResult<&'a [u8]> {
        self.need(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> HanResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> HanResult<u8> {
        self.need(1)?;
        Ok(self.data[self.pos])
    }

    pub fn i8(&mut self) -> HanResult<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn u16(&mut self) -> HanResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> HanResult<i16> {
        let b = self.take(2)?;
        Ok(i16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> HanResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn expect_u8(&mut self, expected: u8, what: &str) -> HanResult<()> {
        let got = self.u8()?;
        if got != expected {
            return Err(HanError::Decode(format!(
                "expected {} to be 0x{:02X}, got 0x{:02X}",
                what, expected, got
            )));
        }
        Ok(())
    }
}
