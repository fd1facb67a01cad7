#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReaderErr {
    #[error("Not enough data to read")]
    NotEnoughData,
}

/// Little-endian byte reader. Any byte iterator is a reader, so a slice can
/// be read with `slice.iter().copied()`.
pub trait ByteReader {
    fn read_u8(&mut self) -> Result<u8, ReaderErr>;

    fn read_u16(&mut self) -> Result<u16, ReaderErr> {
        let b0 = self.read_u8()?;
        let b1 = self.read_u8()?;
        Ok(u16::from_le_bytes([b0, b1]))
    }

    fn read_u32(&mut self) -> Result<u32, ReaderErr> {
        let lo = self.read_u16()?;
        let hi = self.read_u16()?;
        Ok((hi as u32) << 16 | lo as u32)
    }

    /// Reads four bytes without interpreting them, used for magic values and
    /// chunk types.
    fn read_tag(&mut self) -> Result<[u8; 4], ReaderErr> {
        Ok([self.read_u8()?, self.read_u8()?, self.read_u8()?, self.read_u8()?])
    }
}

impl<I> ByteReader for I
    where I: Iterator<Item = u8>
{
    fn read_u8(&mut self) -> Result<u8, ReaderErr> {
        self.next().ok_or(ReaderErr::NotEnoughData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_little_endian() {
        let data = [0x67u8, 0x6c, 0x54, 0x46, 0x02, 0x00, 0x00, 0x00, 0x34, 0x12];
        let mut reader = data.iter().copied();
        assert_eq!(reader.read_tag().unwrap(), *b"glTF");
        assert_eq!(reader.read_u32().unwrap(), 2);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u8(), Err(ReaderErr::NotEnoughData));
    }
}
