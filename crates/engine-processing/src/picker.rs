use crate::error::SyncError;
use model::{
    core::field::Field,
    records::{
        batch::{PickedBatch, PickedRecord},
        record::Record,
    },
    transform::mapping::{FieldCorrespondence, TableGroup},
};

/// Projects source-shaped records onto the target columns of a table group.
///
/// Only correspondences with both sides carry a value; one-sided entries
/// just declare a column to read or write. Source fields that no
/// correspondence names never reach the output.
#[derive(Debug, Clone)]
pub struct Picker {
    pairs: Vec<(String, String)>,
    source_fields: Vec<Field>,
    target_fields: Vec<Field>,
}

impl Picker {
    pub fn new(group: &TableGroup) -> Result<Self, SyncError> {
        Self::from_mapping(&group.id, &group.field_mapping)
    }

    pub fn from_mapping(
        group_id: &str,
        mapping: &[FieldCorrespondence],
    ) -> Result<Self, SyncError> {
        if mapping.is_empty() {
            return Err(SyncError::EmptyFieldMapping(group_id.to_string()));
        }

        let mut pairs = Vec::new();
        let mut source_fields: Vec<Field> = Vec::new();
        let mut target_fields: Vec<Field> = Vec::new();

        for fc in mapping {
            if let Some(src) = &fc.source {
                push_unique(&mut source_fields, src);
            }
            if let Some(dst) = &fc.target {
                push_unique(&mut target_fields, dst);
            }
            if let (Some(src), Some(dst)) = (&fc.source, &fc.target) {
                pairs.push((src.name.clone(), dst.name.clone()));
            }
        }

        Ok(Self {
            pairs,
            source_fields,
            target_fields,
        })
    }

    pub fn source_fields(&self) -> &[Field] {
        &self.source_fields
    }

    pub fn target_fields(&self) -> &[Field] {
        &self.target_fields
    }

    /// Maps one record. A source field missing from the record is left absent.
    pub fn pick_one(&self, source: &Record) -> Record {
        let mut target = Record::new();
        for (src, dst) in &self.pairs {
            if let Some(value) = source.get(src) {
                target.insert(dst.clone(), value.clone());
            }
        }
        target
    }

    pub fn pick_all(&self, sources: &[Record]) -> PickedBatch {
        PickedBatch {
            target_fields: self.target_fields.clone(),
            records: sources.iter().map(|r| self.pick_one(r)).collect(),
        }
    }

    pub fn pick(&self, source: &Record) -> PickedRecord {
        PickedRecord {
            target_fields: self.target_fields.clone(),
            record: self.pick_one(source),
        }
    }
}

fn push_unique(fields: &mut Vec<Field>, field: &Field) {
    if !fields.iter().any(|f| f.name == field.name) {
        fields.push(field.clone());
    }
}
