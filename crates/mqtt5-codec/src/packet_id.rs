//! Packet identifier allocation.
//!
//! Sessions use the 16-bit instantiation; broker-side fan-out bookkeeping
//! instantiates the allocator over `u32` for a larger id space.

use crate::error::{MqttError, Result};
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// Integer space the allocator draws identifiers from.
pub trait IdSpace: sealed::Sealed + Copy + Eq + Ord + Hash + Display {
    const ZERO: Self;
    /// Usable identifiers: the whole space minus the reserved id 0.
    const CAPACITY: usize;
    fn wrapping_next(self) -> Self;
}

impl IdSpace for u16 {
    const ZERO: Self = 0;
    const CAPACITY: usize = u16::MAX as usize;
    fn wrapping_next(self) -> Self {
        self.wrapping_add(1)
    }
}

impl IdSpace for u32 {
    const ZERO: Self = 0;
    const CAPACITY: usize = u32::MAX as usize;
    fn wrapping_next(self) -> Self {
        self.wrapping_add(1)
    }
}

/// Hands out unique non-zero packet identifiers in increasing order modulo
/// the id space, skipping identifiers still in flight.
#[derive(Debug, Clone, Default)]
pub struct PacketIdAllocator<T: IdSpace = u16> {
    cursor: T,
    in_use: HashSet<T>,
}

impl<T: IdSpace + Default> PacketIdAllocator<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: IdSpace> PacketIdAllocator<T> {
    /// # Errors
    /// `PacketIdExhausted` when every identifier in the space is in flight.
    pub fn acquire(&mut self) -> Result<T> {
        if self.in_use.len() >= T::CAPACITY {
            return Err(MqttError::PacketIdExhausted);
        }

        loop {
            self.cursor = self.cursor.wrapping_next();
            if self.cursor == T::ZERO {
                continue;
            }
            if self.in_use.insert(self.cursor) {
                tracing::trace!(packet_id = %self.cursor, "acquired packet id");
                return Ok(self.cursor);
            }
        }
    }

    /// Releases an identifier. Idempotent: releasing an id that is not in
    /// flight is a no-op, so duplicate acknowledgements are tolerated.
    pub fn release(&mut self, id: T) -> bool {
        let released = self.in_use.remove(&id);
        if released {
            tracing::trace!(packet_id = %id, "released packet id");
        } else {
            tracing::debug!(packet_id = %id, "release of unknown packet id ignored");
        }
        released
    }

    /// Re-arms an identifier restored from a persisted session.
    ///
    /// # Errors
    /// Rejects id 0 and identifiers already in flight.
    pub fn mark_in_use(&mut self, id: T) -> Result<()> {
        if id == T::ZERO {
            return Err(MqttError::ProtocolError(
                "Packet identifier must not be 0".to_string(),
            ));
        }
        if !self.in_use.insert(id) {
            return Err(MqttError::ProtocolError(format!(
                "Packet identifier {id} already in use"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_in_use(&self, id: T) -> bool {
        self.in_use.contains(&id)
    }

    /// Number of identifiers currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_use.len()
    }

    pub fn reset(&mut self) {
        self.in_use.clear();
        self.cursor = T::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut alloc = PacketIdAllocator::<u16>::new();
        assert_eq!(alloc.acquire().unwrap(), 1);
        assert_eq!(alloc.acquire().unwrap(), 2);
        assert_eq!(alloc.acquire().unwrap(), 3);
        assert_eq!(alloc.in_flight(), 3);
    }

    #[test]
    fn test_id_not_reissued_until_released() {
        let mut alloc = PacketIdAllocator::<u16>::new();
        let first = alloc.acquire().unwrap();
        for _ in 0..10 {
            assert_ne!(alloc.acquire().unwrap(), first);
        }

        assert!(alloc.release(first));
        // cursor keeps increasing; the released id comes back only after a
        // full wrap, not immediately
        assert_ne!(alloc.acquire().unwrap(), first);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut alloc = PacketIdAllocator::<u16>::new();
        let id = alloc.acquire().unwrap();
        assert!(alloc.release(id));
        assert!(!alloc.release(id));
        assert!(!alloc.release(999));
    }

    #[test]
    fn test_wrap_skips_zero_and_live_ids() {
        let mut alloc = PacketIdAllocator::<u16>::new();
        for _ in 0..u16::MAX {
            assert_ne!(alloc.acquire().unwrap(), 0);
        }

        // space is full now
        assert!(matches!(
            alloc.acquire(),
            Err(MqttError::PacketIdExhausted)
        ));

        // free exactly one id in the middle; the next acquire must find it
        assert!(alloc.release(42));
        assert_eq!(alloc.acquire().unwrap(), 42);
        assert!(matches!(alloc.acquire(), Err(MqttError::PacketIdExhausted)));
    }

    #[test]
    fn test_mark_in_use_rearms_restored_ids() {
        let mut alloc = PacketIdAllocator::<u16>::new();
        alloc.mark_in_use(7).unwrap();
        assert!(alloc.is_in_use(7));

        // the cursor skips the re-armed id
        for _ in 0..20 {
            assert_ne!(alloc.acquire().unwrap(), 7);
        }

        assert!(alloc.mark_in_use(7).is_err());
        assert!(alloc.mark_in_use(0).is_err());
    }

    #[test]
    fn test_wide_allocator() {
        let mut alloc = PacketIdAllocator::<u32>::new();
        assert_eq!(alloc.acquire().unwrap(), 1);
        alloc.mark_in_use(70_000).unwrap();
        assert!(alloc.is_in_use(70_000));
        assert!(alloc.release(70_000));
    }

    #[test]
    fn test_reset() {
        let mut alloc = PacketIdAllocator::<u16>::new();
        alloc.acquire().unwrap();
        alloc.acquire().unwrap();
        alloc.reset();
        assert_eq!(alloc.in_flight(), 0);
        assert_eq!(alloc.acquire().unwrap(), 1);
    }
}
