//! The frame registry.
//!
//! Maps [`FrameId`] to [`FrameRecord`]. Records keep their insertion order,
//! which is also the tie-break for point lookups: when frames overlap, the
//! one registered first wins.

use crate::frame::FrameRecord;
use crate::types::{FrameId, Point};

#[derive(Debug, Default)]
pub struct FrameRegistry {
    records: Vec<FrameRecord>,
}

impl FrameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. A record with the same id is replaced in place and
    /// returned.
    pub fn insert(&mut self, record: FrameRecord) -> Option<FrameRecord> {
        match self.position(record.id()) {
            Some(i) => Some(std::mem::replace(&mut self.records[i], record)),
            None => {
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, id: FrameId) -> Option<&FrameRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut FrameRecord> {
        self.records.iter_mut().find(|r| r.id() == id)
    }

    pub fn remove(&mut self, id: FrameId) -> Option<FrameRecord> {
        self.position(id).map(|i| self.records.remove(i))
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.position(id).is_some()
    }

    /// First frame, in insertion order, whose bounds contain `point`.
    pub fn lookup(&self, point: Point) -> Option<FrameId> {
        self.records
            .iter()
            .find(|r| r.geometry().contains(point))
            .map(FrameRecord::id)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FrameRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: FrameId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }
}
