use super::convert::ConvertTransform;
use crate::error::TransformError;
use model::{records::record::Record, transform::convert::ConvertRule};
use std::sync::Arc;

/// A per-record value transform. `Err` rejects the record.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, record: Record) -> Result<Record, TransformError>;
}

/// Ordered chain of transforms; the first rejection stops the chain.
#[derive(Clone, Default)]
pub struct TransformPipeline {
    transforms: Vec<Arc<dyn Transform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// One transform per conversion rule, in rule order.
    pub fn from_rules(rules: &[ConvertRule]) -> Self {
        rules
            .iter()
            .cloned()
            .fold(Self::new(), |pipeline, rule| {
                pipeline.add_transform(ConvertTransform::new(rule))
            })
    }

    pub fn add_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn apply(&self, record: Record) -> Result<Record, TransformError> {
        self.transforms
            .iter()
            .try_fold(record, |acc, transform| transform.apply(acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{core::value::Value, transform::convert::ConvertKind};

    struct Tag;

    impl Transform for Tag {
        fn name(&self) -> &str {
            "tag"
        }

        fn apply(&self, mut record: Record) -> Result<Record, TransformError> {
            record.insert("tagged", true);
            Ok(record)
        }
    }

    #[test]
    fn rules_run_in_order() {
        let rules = vec![
            ConvertRule::new("name", ConvertKind::Trim),
            ConvertRule::new("name", ConvertKind::Upper),
            ConvertRule::new(
                "name",
                ConvertKind::Append {
                    value: "!".into(),
                },
            ),
        ];
        let pipeline = TransformPipeline::from_rules(&rules).add_transform(Tag);
        assert_eq!(pipeline.len(), 4);

        let out = pipeline
            .apply(Record::new().with("name", "  ada "))
            .unwrap();
        assert_eq!(out.get("name"), Some(&Value::from("ADA!")));
        assert_eq!(out.get("tagged"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn rejection_stops_the_chain() {
        let rules = vec![
            ConvertRule::new("age", ConvertKind::ToInt).fail_fast(),
            ConvertRule::new("age", ConvertKind::ToString),
        ];
        let pipeline = TransformPipeline::from_rules(&rules).add_transform(Tag);

        let err = pipeline
            .apply(Record::new().with("age", "forty"))
            .unwrap_err();
        assert!(matches!(err, TransformError::Rejected { ref field, .. } if field == "age"));
    }
}
