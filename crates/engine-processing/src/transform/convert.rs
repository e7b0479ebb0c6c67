use super::pipeline::Transform;
use crate::error::TransformError;
use chrono::{
    DateTime, NaiveDate, Utc,
    format::{Item, StrftimeItems},
};
use model::{
    core::value::Value,
    records::record::Record,
    transform::convert::{ConvertKind, ConvertRule},
};
use tracing::warn;
use uuid::Uuid;

/// Applies one [`ConvertRule`] to its field.
///
/// A failed conversion falls back to the rule's default, or removes the field
/// when there is none. Fail-fast rules reject the record instead.
#[derive(Debug, Clone)]
pub struct ConvertTransform {
    rule: ConvertRule,
}

impl ConvertTransform {
    pub fn new(rule: ConvertRule) -> Self {
        Self { rule }
    }
}

impl Transform for ConvertTransform {
    fn name(&self) -> &str {
        kind_name(&self.rule.kind)
    }

    fn apply(&self, mut record: Record) -> Result<Record, TransformError> {
        let rule = &self.rule;
        match convert(&rule.kind, record.get(&rule.name)) {
            Ok(Some(value)) => {
                record.insert(rule.name.clone(), value);
            }
            Ok(None) => {}
            Err(reason) if rule.fail_fast => {
                return Err(TransformError::Rejected {
                    field: rule.name.clone(),
                    rule: kind_name(&rule.kind),
                    reason,
                });
            }
            Err(reason) => {
                let fallback = rule.default_value();
                warn!(
                    field = %rule.name,
                    rule = kind_name(&rule.kind),
                    reason = %reason,
                    fallback = fallback.is_some(),
                    "Conversion failed"
                );
                match fallback {
                    Some(value) => {
                        record.insert(rule.name.clone(), value);
                    }
                    None => {
                        record.remove(&rule.name);
                    }
                }
            }
        }
        Ok(record)
    }
}

pub fn kind_name(kind: &ConvertKind) -> &'static str {
    match kind {
        ConvertKind::Default { .. } => "default",
        ConvertKind::Clear => "clear",
        ConvertKind::Replace { .. } => "replace",
        ConvertKind::Upper => "upper",
        ConvertKind::Lower => "lower",
        ConvertKind::Trim => "trim",
        ConvertKind::Prepend { .. } => "prepend",
        ConvertKind::Append { .. } => "append",
        ConvertKind::ToString => "to_string",
        ConvertKind::ToInt => "to_int",
        ConvertKind::ToFloat => "to_float",
        ConvertKind::ToBool => "to_bool",
        ConvertKind::DateFormat { .. } => "date_format",
        ConvertKind::MapValues { .. } => "map_values",
        ConvertKind::Uuid => "uuid",
        ConvertKind::Timestamp => "timestamp",
    }
}

/// `Ok(None)` leaves the field as it is. Value conversions skip missing or
/// null fields.
fn convert(kind: &ConvertKind, current: Option<&Value>) -> Result<Option<Value>, String> {
    let present = current.filter(|v| !v.is_null());
    match kind {
        ConvertKind::Default { value } => {
            Ok(present.is_none().then(|| Value::from_json(value.clone())))
        }
        ConvertKind::Clear => Ok(current.map(|_| Value::Null)),
        ConvertKind::Uuid => Ok(Some(Value::Uuid(Uuid::new_v4()))),
        ConvertKind::Timestamp => Ok(Some(Value::Timestamp(Utc::now()))),
        other => match present {
            Some(value) => convert_value(other, value).map(Some),
            None => Ok(None),
        },
    }
}

fn convert_value(kind: &ConvertKind, value: &Value) -> Result<Value, String> {
    let text = || {
        value
            .as_string()
            .ok_or_else(|| format!("{value} has no text form"))
    };

    match kind {
        ConvertKind::Replace { from, to } if !from.is_empty() => {
            Ok(Value::String(text()?.replace(from.as_str(), to)))
        }
        ConvertKind::Upper => Ok(Value::String(text()?.to_uppercase())),
        ConvertKind::Lower => Ok(Value::String(text()?.to_lowercase())),
        ConvertKind::Trim => Ok(Value::String(text()?.trim().to_string())),
        ConvertKind::Prepend { value: prefix } => Ok(Value::String(format!("{prefix}{}", text()?))),
        ConvertKind::Append { value: suffix } => Ok(Value::String(format!("{}{suffix}", text()?))),
        ConvertKind::ToString => Ok(Value::String(text()?)),
        ConvertKind::ToInt => value
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| format!("'{value}' is not an integer")),
        ConvertKind::ToFloat => value
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| format!("'{value}' is not a number")),
        ConvertKind::ToBool => value
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| format!("'{value}' is not a boolean")),
        ConvertKind::DateFormat { format } => format_date(value, format),
        ConvertKind::MapValues { values } => Ok(values
            .get(&text()?)
            .map(|mapped| Value::String(mapped.clone()))
            .unwrap_or_else(|| value.clone())),
        _ => Ok(value.clone()),
    }
}

fn format_date(value: &Value, format: &str) -> Result<Value, String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date format '{format}'"));
    }

    let ts: DateTime<Utc> = match value {
        Value::Timestamp(ts) => *ts,
        Value::Date(date) => midnight(*date),
        other => {
            let raw = other
                .as_string()
                .ok_or_else(|| format!("{other} is not a date"))?;
            parse_datetime(&raw).ok_or_else(|| format!("'{raw}' is not a date"))?
        }
    };
    Ok(Value::String(
        ts.format_with_items(items.into_iter()).to_string(),
    ))
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(midnight)
        })
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
