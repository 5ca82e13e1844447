use std::collections::BTreeMap;

use super::MemoryError;

/// Word-addressed data memory.
///
/// Only addresses that were written are stored; reading any other valid
/// address yields zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ram {
    words: BTreeMap<u32, i32>,
    size: u32,
}

impl Ram {
    pub fn new(size: u32) -> Self {
        Self {
            words: BTreeMap::new(),
            size,
        }
    }

    /// Number of addressable words.
    pub const fn size(&self) -> u32 {
        self.size
    }

    fn check_address(&self, address: i64) -> Result<u32, MemoryError> {
        match u32::try_from(address) {
            Ok(addr) if addr < self.size => Ok(addr),
            _ => Err(MemoryError::OutOfBounds {
                address,
                size: self.size,
            }),
        }
    }

    pub fn read(&self, address: i64) -> Result<i32, MemoryError> {
        let addr = self.check_address(address)?;
        Ok(self.words.get(&addr).copied().unwrap_or_default())
    }

    pub fn write(&mut self, address: i64, value: i32) -> Result<(), MemoryError> {
        let addr = self.check_address(address)?;
        self.words.insert(addr, value);
        Ok(())
    }

    /// The written words, by ascending address.
    pub const fn words(&self) -> &BTreeMap<u32, i32> {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritten_reads_are_zero() {
        let mut ram = Ram::new(16);
        assert_eq!(ram.read(3).unwrap(), 0);
        assert!(ram.words().is_empty());

        ram.write(3, -7).unwrap();
        assert_eq!(ram.read(3).unwrap(), -7);
        assert_eq!(ram.words().len(), 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut ram = Ram::new(16);
        assert_eq!(
            ram.read(16),
            Err(MemoryError::OutOfBounds {
                address: 16,
                size: 16
            })
        );
        assert_eq!(
            ram.write(-1, 1),
            Err(MemoryError::OutOfBounds {
                address: -1,
                size: 16
            })
        );
        assert!(ram.words().is_empty());
    }
}
