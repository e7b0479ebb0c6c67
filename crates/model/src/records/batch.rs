use crate::{core::field::Field, records::record::Record};

/// Output of the picker for a full-sync page.
#[derive(Debug, Clone, Default)]
pub struct PickedBatch {
    pub target_fields: Vec<Field>,
    pub records: Vec<Record>,
}

impl PickedBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Output of the picker for a single change event.
#[derive(Debug, Clone, Default)]
pub struct PickedRecord {
    pub target_fields: Vec<Field>,
    pub record: Record,
}
