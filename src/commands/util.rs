use nu_protocol::{PipelineData, Record, Span, Value};

/// Normalize any PipelineData into a Vec<Value> of records.
///
/// Handles:
///   - Table (list of records) → pass through
///   - Single record → [record]
///   - List of strings → [{field: s1}, {field: s2}, ...]
///   - Single string → [{field: s}]
///   - Empty/Nothing → []
pub fn normalize_input(input: PipelineData, field: &str, span: Span) -> Vec<Value> {
    match input {
        PipelineData::Value(value, _) => normalize_value(value, field, span),
        other => {
            let values: Vec<Value> = other.into_iter().collect();
            if matches!(values.first(), Some(Value::Record { .. })) {
                values
            } else {
                values
                    .into_iter()
                    .map(|v| wrap_value(v, field, span))
                    .collect()
            }
        }
    }
}

fn normalize_value(value: Value, field: &str, span: Span) -> Vec<Value> {
    match value {
        Value::List { vals, .. } => {
            if matches!(vals.first(), Some(Value::Record { .. })) {
                vals
            } else {
                vals.into_iter().map(|v| wrap_value(v, field, span)).collect()
            }
        }
        Value::Record { .. } => vec![value],
        Value::Nothing { .. } => vec![],
        other => vec![wrap_value(other, field, span)],
    }
}

/// Wrap a non-record value into `{field: v}`.
fn wrap_value(v: Value, field: &str, span: Span) -> Value {
    let mut record = Record::new();
    record.push(field, v);
    Value::record(record, span)
}

/// Append multiple columns to a record Value. Non-records get wrapped first.
pub fn append_columns(row: Value, cols: Vec<(&str, Value)>, span: Span) -> Value {
    let mut record = match row {
        Value::Record { val, .. } => val.into_owned(),
        other => {
            let mut record = Record::new();
            record.push("value", other);
            record
        }
    };
    for (name, value) in cols {
        record.push(name, value);
    }
    Value::record(record, span)
}
