//! Persistence medium abstraction
//!
//! The settings store saves its active buffer as one image on a medium
//! (EEPROM emulation, a flash sector, battery-backed RAM). Implementations
//! only move bytes; image validation is the store's job.

/// Errors from medium operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MediumError {
    /// No medium is attached or it does not respond
    Unavailable,
    /// Access beyond the medium's capacity
    OutOfRange,
    /// Write or erase failed
    WriteFailed,
}

impl core::fmt::Display for MediumError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MediumError::Unavailable => write!(f, "medium unavailable"),
            MediumError::OutOfRange => write!(f, "access out of range"),
            MediumError::WriteFailed => write!(f, "write failed"),
        }
    }
}

/// Byte-addressable persistent storage
///
/// # Implementations
/// - **Production:** EEPROM or flash sector driver on the target
/// - **Stub:** [`NullMedium`] (nothing persists)
/// - **Testing / RAM retention:** [`RamMedium`]
pub trait SettingsMedium {
    /// Total bytes available
    fn capacity(&self) -> usize;

    /// Fill `buf` with the bytes at `offset`
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), MediumError>;

    /// Store `data` at `offset`
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), MediumError>;
}

impl<M: SettingsMedium + ?Sized> SettingsMedium for &mut M {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), MediumError> {
        (**self).read(offset, buf)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), MediumError> {
        (**self).write(offset, data)
    }
}

/// Medium that stores nothing
///
/// Loading always fails, so a store opened on it starts from defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMedium;

impl SettingsMedium for NullMedium {
    fn capacity(&self) -> usize {
        0
    }

    fn read(&mut self, _offset: usize, _buf: &mut [u8]) -> Result<(), MediumError> {
        Err(MediumError::Unavailable)
    }

    fn write(&mut self, _offset: usize, _data: &[u8]) -> Result<(), MediumError> {
        Err(MediumError::Unavailable)
    }
}

/// In-memory medium of `N` bytes
///
/// Starts in the erased state (all `0xFF`). Supports fault injection for
/// exercising the store's recovery paths.
#[derive(Debug, Clone)]
pub struct RamMedium<const N: usize> {
    data: [u8; N],
    /// Fail the next write without touching the contents
    pub fail_next_write: bool,
    /// Stop after this many bytes of the next write (simulated power loss)
    pub tear_next_write: Option<usize>,
    /// Number of successful writes
    pub write_count: usize,
}

impl<const N: usize> Default for RamMedium<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamMedium<N> {
    pub const fn new() -> Self {
        Self {
            data: [0xFF; N],
            fail_next_write: false,
            tear_next_write: None,
            write_count: 0,
        }
    }

    /// Raw contents
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Flip every bit of one byte
    pub fn corrupt(&mut self, offset: usize) {
        if let Some(byte) = self.data.get_mut(offset) {
            *byte ^= 0xFF;
        }
    }

    /// Return to the erased state
    pub fn erase(&mut self) {
        self.data = [0xFF; N];
    }

    fn range(offset: usize, len: usize) -> Result<core::ops::Range<usize>, MediumError> {
        offset
            .checked_add(len)
            .filter(|&end| end <= N)
            .map(|end| offset..end)
            .ok_or(MediumError::OutOfRange)
    }
}

impl<const N: usize> SettingsMedium for RamMedium<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), MediumError> {
        let range = Self::range(offset, buf.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), MediumError> {
        let range = Self::range(offset, data.len())?;
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(MediumError::WriteFailed);
        }
        if let Some(limit) = self.tear_next_write.take() {
            let torn = limit.min(data.len());
            self.data[offset..offset + torn].copy_from_slice(&data[..torn]);
            return Err(MediumError::WriteFailed);
        }
        self.data[range].copy_from_slice(data);
        self.write_count += 1;
        Ok(())
    }
}
