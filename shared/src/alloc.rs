use std::collections::HashSet;

use log::warn;
use thiserror::Error;

pub type DoId = u32;
pub type ZoneId = u32;

/// The zone every session always sees. Never allocated, never freed.
pub const UBER_ZONE: ZoneId = 0;

/// Errors from id allocation
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// Every doId in the range has been handed out
    #[error("doId range [{base}, {end}) exhausted")]
    DoIdRangeExhausted { base: DoId, end: DoId },
}

/// Hands out consecutive doIds from a half-open range `[base, end)`.
///
/// Ids are never reused and the allocator never wraps: once the range is
/// spent, every further request errors.
#[derive(Debug, Clone)]
pub struct DoIdAllocator {
    base: DoId,
    end: DoId,
    next: DoId,
}

impl DoIdAllocator {
    pub fn new(base: DoId, end: DoId) -> Self {
        assert!(base <= end, "doId range end precedes base");
        Self { base, end, next: base }
    }

    pub fn allocate(&mut self) -> Result<DoId, AllocError> {
        if self.next >= self.end {
            return Err(AllocError::DoIdRangeExhausted {
                base: self.base,
                end: self.end,
            });
        }
        let id = self.next;
        self.next += 1;
        Ok(id)
    }

    pub fn allocated(&self) -> u32 {
        self.next - self.base
    }

    pub fn remaining(&self) -> u32 {
        self.end - self.next
    }

    pub fn contains(&self, id: DoId) -> bool {
        id >= self.base && id < self.end
    }

    pub fn base(&self) -> DoId {
        self.base
    }

    pub fn end(&self) -> DoId {
        self.end
    }
}

/// Allocates interest zone ids for dynamic regions.
///
/// The UberZone sits outside the allocator entirely: `allocate` never
/// returns it and `deallocate(UBER_ZONE)` is a logged no-op. Freed ids go
/// to a free list and may be reused.
#[derive(Debug)]
pub struct ZoneAllocator {
    next: ZoneId,
    free: Vec<ZoneId>,
    live: HashSet<ZoneId>,
}

impl Default for ZoneAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneAllocator {
    pub fn new() -> Self {
        Self::with_base(1)
    }

    /// Starts handing out ids at `base`.
    pub fn with_base(base: ZoneId) -> Self {
        assert!(base > UBER_ZONE, "zone base collides with the UberZone");
        Self {
            next: base,
            free: Vec::new(),
            live: HashSet::new(),
        }
    }

    pub fn allocate(&mut self) -> ZoneId {
        let zone = match self.free.pop() {
            Some(zone) => zone,
            None => {
                let zone = self.next;
                self.next += 1;
                zone
            }
        };
        self.live.insert(zone);
        zone
    }

    pub fn deallocate(&mut self, zone: ZoneId) {
        if zone == UBER_ZONE {
            warn!("ignoring deallocate of the UberZone");
            return;
        }
        if !self.live.remove(&zone) {
            warn!("deallocate of zone {zone} which is not allocated");
            return;
        }
        self.free.push(zone);
    }

    /// Whether the zone currently exists. The UberZone always does.
    pub fn is_live(&self, zone: ZoneId) -> bool {
        zone == UBER_ZONE || self.live.contains(&zone)
    }

    pub fn num_live(&self) -> usize {
        self.live.len()
    }
}
