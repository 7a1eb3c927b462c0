// Binary image access
//
// All multi-byte values in the supported binaries are big-endian. Code refers
// to memory by RAM address; `Region` translates RAM addresses into offsets in
// the image buffer.

use std::fmt;

use crate::error::EventError;

/// A window of the image that is loaded at a fixed RAM address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub ram_start: u32,
    pub file_offset: usize,
    pub len: usize,
}

impl Region {
    pub const fn new(ram_start: u32, file_offset: usize, len: usize) -> Self {
        Region {
            ram_start,
            file_offset,
            len,
        }
    }

    pub fn ram_end(&self) -> u32 {
        self.ram_start.wrapping_add(self.len as u32)
    }

    pub fn contains_addr(&self, addr: u32) -> bool {
        addr >= self.ram_start && addr < self.ram_end()
    }

    /// Image offset for a RAM address inside this region.
    pub fn to_offset(&self, addr: u32) -> Option<usize> {
        if self.contains_addr(addr) {
            Some(self.file_offset + (addr - self.ram_start) as usize)
        } else {
            None
        }
    }

    /// RAM address for an image offset inside this region.
    pub fn to_addr(&self, offset: usize) -> Option<u32> {
        if offset >= self.file_offset && offset < self.file_offset + self.len {
            Some(self.ram_start + (offset - self.file_offset) as u32)
        } else {
            None
        }
    }
}

/// A range of bytes written into the output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    pub offset: usize,
    pub len: usize,
}

impl Patch {
    pub fn new(offset: usize, len: usize) -> Self {
        Patch { offset, len }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{:#08x}, {:#x}]", self.offset, self.len)
    }
}

/// Mutable byte buffer for the target image with big-endian accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
}

impl Image {
    pub fn new(bytes: Vec<u8>) -> Self {
        Image { bytes }
    }

    pub fn zeroed(len: usize) -> Self {
        Image {
            bytes: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    fn check(&self, offset: usize, len: usize) -> Result<(), EventError> {
        if offset.checked_add(len).map_or(true, |end| end > self.bytes.len()) {
            return Err(EventError::malformed(format!(
                "access of {} bytes at {:#x} is outside the image (len {:#x})",
                len,
                offset,
                self.bytes.len()
            )));
        }
        Ok(())
    }

    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8], EventError> {
        self.check(offset, len)?;
        Ok(&self.bytes[offset..offset + len])
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, EventError> {
        self.check(offset, 1)?;
        Ok(self.bytes[offset])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, EventError> {
        self.check(offset, 2)?;
        Ok(u16::from_be_bytes([self.bytes[offset], self.bytes[offset + 1]]))
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32, EventError> {
        self.check(offset, 4)?;
        Ok(u32::from_be_bytes([
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ]))
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) -> Result<Patch, EventError> {
        self.write_bytes(offset, &[value])
    }

    pub fn write_u16(&mut self, offset: usize, value: u16) -> Result<Patch, EventError> {
        self.write_bytes(offset, &value.to_be_bytes())
    }

    pub fn write_u32(&mut self, offset: usize, value: u32) -> Result<Patch, EventError> {
        self.write_bytes(offset, &value.to_be_bytes())
    }

    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) -> Result<Patch, EventError> {
        self.check(offset, data.len())?;
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(Patch::new(offset, data.len()))
    }

    pub fn fill(&mut self, offset: usize, len: usize, value: u8) -> Result<Patch, EventError> {
        self.check(offset, len)?;
        self.bytes[offset..offset + len].fill(value);
        Ok(Patch::new(offset, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn big_endian_round_trip() {
        let mut image = Image::zeroed(16);
        image.write_u32(4, 0x27BDFFE8).unwrap();
        assert_eq!(image.read_u16(4).unwrap(), 0x27BD);
        assert_eq!(image.read_u16(6).unwrap(), 0xFFE8);
        assert_eq!(image.read_u32(4).unwrap(), 0x27BDFFE8);
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let image = Image::zeroed(4);
        assert!(image.read_u32(1).is_err());
        assert!(image.slice(usize::MAX, 2).is_err());
    }

    #[test]
    fn region_translation() {
        let region = Region::new(0x800F_65E0, 0x2_0000, 0x8000);
        assert_eq!(region.to_offset(0x800F_65E0), Some(0x2_0000));
        assert_eq!(region.to_offset(0x800F_65E4), Some(0x2_0004));
        assert_eq!(region.to_offset(0x800F_65DC), None);
        assert_eq!(region.to_addr(0x2_0010), Some(0x800F_65F0));
        assert_eq!(region.to_addr(0x2_8000), None);
    }
}
