use chrono::{Local, NaiveDateTime};
use serde::Deserialize;

pub type WriteCount = usize;

/// Raw cell value as handed over by a SQL driver.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Text(String),
    /// character, decimal and binary columns may arrive as bytes (MySQL sends them that way)
    RawBytes(Vec<u8>),
    Integer(i64),
    UInteger(u64),
    Float(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    /// driver type without portable mapping, kept as its textual rendering
    Unrecognized(String),
}

/// Portable scalar stored into a document. There is no byte variant on purpose.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    Null,
    String(String),
    Integer(i64),
    UInteger(u64),
    Float(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Unrecognized(String),
}

impl From<NormalizedValue> for ColumnValue {
    fn from(value: NormalizedValue) -> Self {
        match value {
            NormalizedValue::Null => ColumnValue::Null,
            NormalizedValue::String(v) => ColumnValue::Text(v),
            NormalizedValue::Integer(v) => ColumnValue::Integer(v),
            NormalizedValue::UInteger(v) => ColumnValue::UInteger(v),
            NormalizedValue::Float(v) => ColumnValue::Float(v),
            NormalizedValue::Boolean(v) => ColumnValue::Boolean(v),
            NormalizedValue::Timestamp(v) => ColumnValue::Timestamp(v),
            NormalizedValue::Unrecognized(v) => ColumnValue::Unrecognized(v),
        }
    }
}

impl NormalizedValue {
    pub fn to_bson(&self) -> bson::Bson {
        match self {
            NormalizedValue::Null => bson::Bson::Null,
            NormalizedValue::String(v) => bson::Bson::String(v.clone()),
            NormalizedValue::Integer(v) => bson::Bson::Int64(*v),
            // BSON has no unsigned 64 bits type
            NormalizedValue::UInteger(v) => match i64::try_from(*v) {
                Ok(v) => bson::Bson::Int64(v),
                Err(_) => bson::Bson::String(v.to_string()),
            },
            NormalizedValue::Float(v) => bson::Bson::Double(*v),
            NormalizedValue::Boolean(v) => bson::Bson::Boolean(*v),
            NormalizedValue::Timestamp(v) => {
                bson::Bson::DateTime(bson::DateTime::from_millis(v.and_utc().timestamp_millis()))
            }
            NormalizedValue::Unrecognized(v) => bson::Bson::String(v.clone()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            NormalizedValue::Null => serde_json::Value::Null,
            NormalizedValue::String(v) => serde_json::Value::from(v.as_str()),
            NormalizedValue::Integer(v) => serde_json::Value::from(*v),
            NormalizedValue::UInteger(v) => serde_json::Value::from(*v),
            NormalizedValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            NormalizedValue::Boolean(v) => serde_json::Value::from(*v),
            NormalizedValue::Timestamp(v) => {
                serde_json::Value::from(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            NormalizedValue::Unrecognized(v) => serde_json::Value::from(v.as_str()),
        }
    }
}

/// Schema-less document built from one source row.
///
/// Keys are unique and kept in source column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: Vec<(String, NormalizedValue)>,
}

impl Document {
    pub fn with_capacity(capacity: usize) -> Self {
        Document {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// a repeated column name keeps its first position and takes the latest value
    pub fn insert<S: Into<String>>(&mut self, key: S, value: NormalizedValue) {
        let key = key.into();

        match self.fields.iter_mut().find(|(name, _)| *name == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&NormalizedValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_bson(&self) -> bson::Document {
        let mut document = bson::Document::new();
        for (name, value) in &self.fields {
            let _ = document.insert(name.clone(), value.to_bson());
        }

        document
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            let _ = map.insert(name.clone(), value.to_json());
        }

        serde_json::Value::Object(map)
    }
}

/// Bind parameter of a catalog query. The keyword `now` is bound to the local time at execution.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawParamValue")]
pub enum ParamValue {
    Now,
    Null,
    Text(String),
    Integer(i64),
    /// integers above `i64::MAX`
    UInteger(u64),
    Float(f64),
    Boolean(bool),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawParamValue {
    Boolean(bool),
    Integer(i64),
    UInteger(u64),
    Float(f64),
    Text(String),
    Null,
}

impl From<RawParamValue> for ParamValue {
    fn from(raw: RawParamValue) -> Self {
        match raw {
            RawParamValue::Boolean(v) => ParamValue::Boolean(v),
            RawParamValue::Integer(v) => ParamValue::Integer(v),
            RawParamValue::UInteger(v) => ParamValue::UInteger(v),
            RawParamValue::Float(v) => ParamValue::Float(v),
            RawParamValue::Text(v) if v.eq_ignore_ascii_case("now") => ParamValue::Now,
            RawParamValue::Text(v) => ParamValue::Text(v),
            RawParamValue::Null => ParamValue::Null,
        }
    }
}

impl ParamValue {
    pub fn bind(&self, now: NaiveDateTime) -> ColumnValue {
        match self {
            ParamValue::Now => ColumnValue::Timestamp(now),
            ParamValue::Null => ColumnValue::Null,
            ParamValue::Text(v) => ColumnValue::Text(v.clone()),
            ParamValue::Integer(v) => ColumnValue::Integer(*v),
            ParamValue::UInteger(v) => ColumnValue::UInteger(*v),
            ParamValue::Float(v) => ColumnValue::Float(*v),
            ParamValue::Boolean(v) => ColumnValue::Boolean(*v),
        }
    }
}

/// resolve all parameters against a single clock reading
pub fn bind_params(params: &[ParamValue]) -> Vec<ColumnValue> {
    let now = Local::now().naive_local();
    params.iter().map(|param| param.bind(now)).collect()
}

/// One table or named query to transfer
#[derive(Debug, Clone, PartialEq)]
pub enum WorkUnit {
    Table {
        name: String,
        sql: String,
    },
    Query {
        name: String,
        sql: String,
        params: Vec<ParamValue>,
        collection: Option<String>,
    },
}

impl WorkUnit {
    pub fn name(&self) -> &str {
        match self {
            WorkUnit::Table { name, .. } => name.as_str(),
            WorkUnit::Query { name, .. } => name.as_str(),
        }
    }

    pub fn sql(&self) -> &str {
        match self {
            WorkUnit::Table { sql, .. } => sql.as_str(),
            WorkUnit::Query { sql, .. } => sql.as_str(),
        }
    }

    pub fn params(&self) -> &[ParamValue] {
        match self {
            WorkUnit::Table { .. } => &[],
            WorkUnit::Query { params, .. } => params.as_slice(),
        }
    }

    /// destination collection override
    pub fn collection(&self) -> Option<&str> {
        match self {
            WorkUnit::Table { .. } => None,
            WorkUnit::Query { collection, .. } => collection.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkUnit::Table { .. } => "table",
            WorkUnit::Query { .. } => "query",
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::types::{bind_params, ColumnValue, Document, NormalizedValue, ParamValue};

    #[test]
    fn document_keeps_column_order_and_unique_keys() {
        let mut document = Document::default();
        document.insert("id", NormalizedValue::Integer(1));
        document.insert("nome", NormalizedValue::String("Acme".to_string()));
        document.insert("id", NormalizedValue::Integer(2));

        assert_eq!(document.keys().collect::<Vec<_>>(), vec!["id", "nome"]);
        assert_eq!(document.get("id"), Some(&NormalizedValue::Integer(2)));
    }

    #[test]
    fn document_to_bson() {
        let ts = NaiveDate::from_ymd_opt(2023, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        let mut document = Document::default();
        document.insert("id", NormalizedValue::Integer(1));
        document.insert("big", NormalizedValue::UInteger(u64::MAX));
        document.insert("created_at", NormalizedValue::Timestamp(ts));

        let bson = document.to_bson();
        assert_eq!(bson.get_i64("id").unwrap(), 1);
        assert_eq!(bson.get_str("big").unwrap(), u64::MAX.to_string());
        assert_eq!(
            bson.get_datetime("created_at").unwrap().timestamp_millis(),
            ts.and_utc().timestamp_millis()
        );
    }

    #[test]
    fn document_to_json() {
        let mut document = Document::default();
        document.insert("ativo", NormalizedValue::Boolean(true));
        document.insert("nada", NormalizedValue::Null);
        document.insert("nan", NormalizedValue::Float(f64::NAN));

        assert_eq!(
            document.to_json(),
            serde_json::json!({"ativo": true, "nada": null, "nan": null})
        );
    }

    #[test]
    fn parse_params() {
        let params: Vec<ParamValue> =
            serde_yaml::from_str("[now, NOW, 42, 1.5, true, ~, hello]").unwrap();

        assert_eq!(
            params,
            vec![
                ParamValue::Now,
                ParamValue::Now,
                ParamValue::Integer(42),
                ParamValue::Float(1.5),
                ParamValue::Boolean(true),
                ParamValue::Null,
                ParamValue::Text("hello".to_string()),
            ]
        );
    }

    #[test]
    fn parse_large_integer_params() {
        let params: Vec<ParamValue> =
            serde_yaml::from_str("[9223372036854775807, 18446744073709551615]").unwrap();

        assert_eq!(
            params,
            vec![
                ParamValue::Integer(i64::MAX),
                ParamValue::UInteger(u64::MAX),
            ]
        );
        assert_eq!(
            bind_params(&params[1..]),
            vec![ColumnValue::UInteger(u64::MAX)]
        );
    }
}
