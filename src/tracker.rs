//! Sensor slot tracking
//!
//! Maps transient radio messages (identified only by the sensor ID in the
//! payload) onto a small fixed pool of "last known good" readings. Slots are
//! allocated lazily on the first accepted message of an ID, updated in place
//! afterwards, and released only by an explicit clear.

use tracing::debug;

use crate::bresser::types::{DecodeStatus, Slot, CHANNEL_ANY};

/// Fixed-capacity pool of sensor slots with an ID allow/deny policy.
pub struct SlotTracker {
    slots: Vec<Slot>,
    /// IDs never admitted to the pool
    exclude_ids: Vec<u32>,
    /// When non-empty, only these IDs are admitted
    include_ids: Vec<u32>,
}

impl SlotTracker {
    /// Create a pool of `capacity` empty slots.
    ///
    /// The filter lists are fixed for the lifetime of the tracker; they are
    /// read on every allocation but never modified at decode time.
    pub fn new(capacity: usize, exclude_ids: Vec<u32>, include_ids: Vec<u32>) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            slots.push(Slot::empty());
        }

        Self {
            slots,
            exclude_ids,
            include_ids,
        }
    }

    /// Number of slots in the pool.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// All slots, empty ones included.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Find the slot a message with this sensor ID should be written to.
    ///
    /// Policy, evaluated in order:
    /// 1. ID on the exclude-list: denied with `Skip`.
    /// 2. Non-empty include-list without the ID: denied with `Skip`.
    /// 3. A slot already holding the ID: updated in place.
    /// 4. Otherwise the first free slot; none left: denied with `Full`.
    ///
    /// A valid slot of an unrelated sensor is never evicted; pool
    /// exhaustion is a hard denial surfaced to the caller.
    pub fn find_slot(&mut self, id: u32) -> Result<usize, DecodeStatus> {
        if self.exclude_ids.contains(&id) {
            debug!("sensor ID {:08X} excluded", id);
            return Err(DecodeStatus::Skip);
        }

        if !self.include_ids.is_empty() && !self.include_ids.contains(&id) {
            debug!("sensor ID {:08X} not on include-list", id);
            return Err(DecodeStatus::Skip);
        }

        if let Some(i) = self.find_id(id) {
            return Ok(i);
        }

        match self.slots.iter().position(|s| !s.valid) {
            Some(i) => {
                debug!("new sensor {:08X} tracked in slot {}", id, i);
                Ok(i)
            }
            None => {
                debug!("no free slot for sensor {:08X}", id);
                Err(DecodeStatus::Full)
            }
        }
    }

    /// Slot index currently holding `id`, if any.
    pub fn find_id(&self, id: u32) -> Option<usize> {
        self.slots.iter().position(|s| s.valid && s.id == id)
    }

    /// Slot index of the first valid slot with this sensor type and
    /// channel; `CHANNEL_ANY` matches any channel.
    pub fn find_type(&self, s_type: u8, chan: u8) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.valid && s.s_type == s_type && (chan == CHANNEL_ANY || s.chan == chan))
    }

    /// Mutable access for the decoders.
    pub fn slot_mut(&mut self, index: usize) -> &mut Slot {
        &mut self.slots[index]
    }

    /// Reset the validity flags of all slots, or only those holding the
    /// given sensor type. Payload contents are not zeroed.
    pub fn clear_slots(&mut self, s_type: Option<u8>) {
        for slot in &mut self.slots {
            if s_type.map_or(true, |t| slot.s_type == t) {
                slot.invalidate();
            }
        }
    }

    /// At least one slot fully complete.
    pub fn any_complete(&self) -> bool {
        self.slots.iter().any(|s| s.complete)
    }

    /// At least one complete slot of the given sensor type.
    pub fn type_complete(&self, s_type: u8) -> bool {
        self.slots.iter().any(|s| s.complete && s.s_type == s_type)
    }

    /// Every slot in the pool complete.
    pub fn all_complete(&self) -> bool {
        self.slots.iter().all(|s| s.complete)
    }

    /// Count of slots holding at least a partial reading.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.valid).count()
    }
}
