//! Active/shadow buffer pair

/// Which half of the region is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Half {
    First,
    Second,
}

impl Half {
    fn other(self) -> Self {
        match self {
            Half::First => Half::Second,
            Half::Second => Half::First,
        }
    }
}

/// Two equal halves of a caller-owned region
///
/// Exactly one half is active. Writers only ever get the shadow half;
/// [`swap`](Self::swap) is the single point where the designation flips.
pub struct DoubleBuffer<'b> {
    first: &'b mut [u8],
    second: &'b mut [u8],
    active: Half,
}

impl<'b> DoubleBuffer<'b> {
    /// Split `region` into two halves of `region.len() / 2` bytes
    ///
    /// A trailing odd byte is left unused.
    pub fn new(region: &'b mut [u8]) -> Self {
        let half = region.len() / 2;
        let (first, rest) = region.split_at_mut(half);
        let (second, _) = rest.split_at_mut(half);
        Self {
            first,
            second,
            active: Half::First,
        }
    }

    /// Size of each half in bytes
    pub fn half_len(&self) -> usize {
        self.first.len()
    }

    pub fn active_half(&self) -> Half {
        self.active
    }

    /// The authoritative half
    pub fn active(&self) -> &[u8] {
        match self.active {
            Half::First => &*self.first,
            Half::Second => &*self.second,
        }
    }

    /// The write target for the next mutation
    pub fn shadow_mut(&mut self) -> &mut [u8] {
        match self.active {
            Half::First => &mut *self.second,
            Half::Second => &mut *self.first,
        }
    }

    /// Borrow the active half for reading and the shadow half for writing
    pub fn split(&mut self) -> (&[u8], &mut [u8]) {
        match self.active {
            Half::First => (&*self.first, &mut *self.second),
            Half::Second => (&*self.second, &mut *self.first),
        }
    }

    /// Promote the shadow half to active
    pub fn swap(&mut self) {
        self.active = self.active.other();
    }
}
