use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use crate::error::{BqFlowError, Result};

/// Column types accepted in a field configuration.
///
/// Aliases are folded into a single variant when parsed (`INTEGER`, `INT`, `BIGINT`...
/// all become `INT64`). [`FieldConfig`] keeps the declared spelling for emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BqType {
    String,
    Bytes,
    Float64,
    Bool,
    Timestamp,
    Date,
    Time,
    Datetime,
    Geography,
    Interval,
    Int64,
    Numeric,
    Bignumeric,
    Record,
}

impl BqType {
    pub const SUPPORTED: &'static [&'static str] = &[
        "STRING", "BYTES", "FLOAT", "FLOAT64", "BOOLEAN", "BOOL", "TIMESTAMP", "DATE",
        "TIME", "DATETIME", "GEOGRAPHY", "INTERVAL", "INT", "INT64", "INTEGER", "BIGINT",
        "NUMERIC", "DECIMAL", "BIGNUMERIC", "BIGDECIMAL", "SMALLINT", "TINYINT", "BYTEINT",
        "RECORD", "STRUCT",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BqType::String => "STRING",
            BqType::Bytes => "BYTES",
            BqType::Float64 => "FLOAT64",
            BqType::Bool => "BOOL",
            BqType::Timestamp => "TIMESTAMP",
            BqType::Date => "DATE",
            BqType::Time => "TIME",
            BqType::Datetime => "DATETIME",
            BqType::Geography => "GEOGRAPHY",
            BqType::Interval => "INTERVAL",
            BqType::Int64 => "INT64",
            BqType::Numeric => "NUMERIC",
            BqType::Bignumeric => "BIGNUMERIC",
            BqType::Record => "RECORD",
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, BqType::Record)
    }
}

impl FromStr for BqType {
    type Err = BqFlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "STRING" => Ok(BqType::String),
            "BYTES" => Ok(BqType::Bytes),
            "FLOAT" | "FLOAT64" => Ok(BqType::Float64),
            "BOOLEAN" | "BOOL" => Ok(BqType::Bool),
            "TIMESTAMP" => Ok(BqType::Timestamp),
            "DATE" => Ok(BqType::Date),
            "TIME" => Ok(BqType::Time),
            "DATETIME" => Ok(BqType::Datetime),
            "GEOGRAPHY" => Ok(BqType::Geography),
            "INTERVAL" => Ok(BqType::Interval),
            "INT" | "INT64" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "BYTEINT" => {
                Ok(BqType::Int64)
            }
            "NUMERIC" | "DECIMAL" => Ok(BqType::Numeric),
            "BIGNUMERIC" | "BIGDECIMAL" => Ok(BqType::Bignumeric),
            "RECORD" | "STRUCT" => Ok(BqType::Record),
            other => Err(BqFlowError::UnsupportedType(format!(
                "{} is not a supported type in BigQuery, type should be one of: {}",
                other,
                Self::SUPPORTED.join(", ")
            ))),
        }
    }
}

impl fmt::Display for BqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldMode {
    #[default]
    Nullable,
    Repeated,
    Required,
}

impl FieldMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldMode::Nullable => "NULLABLE",
            FieldMode::Repeated => "REPEATED",
            FieldMode::Required => "REQUIRED",
        }
    }
}

impl FromStr for FieldMode {
    type Err = BqFlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NULLABLE" => Ok(FieldMode::Nullable),
            "REPEATED" => Ok(FieldMode::Repeated),
            "REQUIRED" => Ok(FieldMode::Required),
            other => Err(BqFlowError::UnsupportedMode(format!(
                "{} is not a supported mode in BigQuery, mode should be one of: NULLABLE, REPEATED, REQUIRED",
                other
            ))),
        }
    }
}

impl fmt::Display for FieldMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Per-column configuration of a table produced by a transformation or view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "RawFieldConfig")]
pub struct FieldConfig {
    pub name: String,
    /// Type as written, e.g. `INTEGER`; emitted unchanged.
    #[serde(rename = "TYPE")]
    pub declared_type: String,
    #[serde(skip)]
    pub field_type: BqType,
    pub mode: FieldMode,
    pub description: Option<String>,
    pub is_encrypted: bool,
    pub has_pii: bool,
    pub is_transformed: bool,
    pub keyset_name: Option<String>,
    pub keyset_column_id: Option<String>,
    pub original_type: Option<String>,
    pub derives_from: Option<String>,
    pub fields: Vec<FieldConfig>,
}

/// Wire shape of a field before validation. Lowercase keys are accepted as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawFieldConfig {
    #[serde(alias = "name")]
    name: String,
    #[serde(alias = "type")]
    r#type: String,
    #[serde(alias = "mode")]
    mode: String,
    #[serde(default, alias = "description")]
    description: Option<String>,
    #[serde(default, alias = "is_encrypted")]
    is_encrypted: bool,
    #[serde(default, alias = "has_pii")]
    has_pii: bool,
    #[serde(default, alias = "is_transformed")]
    is_transformed: bool,
    #[serde(default, alias = "keyset_name")]
    keyset_name: Option<String>,
    #[serde(default, alias = "keyset_column_id")]
    keyset_column_id: Option<String>,
    #[serde(default, alias = "original_type")]
    original_type: Option<String>,
    #[serde(default, alias = "derives_from")]
    derives_from: Option<String>,
    #[serde(default, alias = "fields")]
    fields: Option<Vec<FieldConfig>>,
}

impl TryFrom<RawFieldConfig> for FieldConfig {
    type Error = BqFlowError;

    fn try_from(raw: RawFieldConfig) -> Result<Self> {
        let mut field = FieldConfig::with_fields(
            raw.name,
            &raw.r#type,
            &raw.mode,
            raw.fields.unwrap_or_default(),
        )?;
        field.description = raw.description;
        field.is_encrypted = raw.is_encrypted;
        field.has_pii = raw.has_pii;
        field.is_transformed = raw.is_transformed;
        field.keyset_name = raw.keyset_name;
        field.keyset_column_id = raw.keyset_column_id;
        field.original_type = raw.original_type;
        field.derives_from = raw.derives_from;
        Ok(field)
    }
}

impl FieldConfig {
    pub fn new(name: impl Into<String>, field_type: &str, mode: &str) -> Result<Self> {
        Self::with_fields(name, field_type, mode, Vec::new())
    }

    /// Builds a field, nested or not. Checks run in order: type is supported, only
    /// RECORD/STRUCT may declare sub-fields, RECORD/STRUCT must declare sub-fields, mode
    /// is supported.
    pub fn with_fields(
        name: impl Into<String>,
        field_type: &str,
        mode: &str,
        fields: Vec<FieldConfig>,
    ) -> Result<Self> {
        let name = name.into();
        let parsed_type: BqType = field_type.parse()?;

        if !fields.is_empty() && !parsed_type.is_record() {
            return Err(BqFlowError::UnsupportedType(format!(
                "the field {} defines some sub fields but its type is neither RECORD nor STRUCT",
                name
            )));
        }

        if parsed_type.is_record() && fields.is_empty() {
            return Err(BqFlowError::UnsupportedType(format!(
                "the field {} is a {} but it does not define any sub field",
                name, field_type
            )));
        }

        let mode: FieldMode = mode.parse()?;

        Ok(Self {
            name,
            declared_type: field_type.to_string(),
            field_type: parsed_type,
            mode,
            description: None,
            is_encrypted: false,
            has_pii: false,
            is_transformed: false,
            keyset_name: None,
            keyset_column_id: None,
            original_type: None,
            derives_from: None,
            fields,
        })
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn encrypted(mut self) -> Self {
        self.is_encrypted = true;
        self
    }

    pub fn with_pii(mut self) -> Self {
        self.has_pii = true;
        self
    }

    pub fn transformed(mut self) -> Self {
        self.is_transformed = true;
        self
    }

    pub fn with_keyset(mut self, keyset_name: impl Into<String>, column_id: impl Into<String>) -> Self {
        self.keyset_name = Some(keyset_name.into());
        self.keyset_column_id = Some(column_id.into());
        self
    }

    pub fn with_original_type(mut self, original_type: impl Into<String>) -> Self {
        self.original_type = Some(original_type.into());
        self
    }

    pub fn with_derives_from(mut self, source: impl Into<String>) -> Self {
        self.derives_from = Some(source.into());
        self
    }

    pub fn to_dict(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Unlike nested deserialization, this keeps the typed validation error.
    pub fn from_dict(value: &serde_json::Value) -> Result<Self> {
        let raw: RawFieldConfig = serde_json::from_value(value.clone())?;
        Self::try_from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_aliases_fold() {
        assert_eq!("INTEGER".parse::<BqType>().unwrap(), BqType::Int64);
        assert_eq!("STRUCT".parse::<BqType>().unwrap(), BqType::Record);
        assert_eq!("BOOLEAN".parse::<BqType>().unwrap(), BqType::Bool);
        assert_eq!("DECIMAL".parse::<BqType>().unwrap(), BqType::Numeric);
    }

    #[test]
    fn test_unsupported_type() {
        let err = FieldConfig::new("field1", "STRING3", "NULLABLE").unwrap_err();
        assert!(matches!(err, BqFlowError::UnsupportedType(_)));
    }

    #[test]
    fn test_unsupported_mode() {
        let err = FieldConfig::new("field1", "STRING", "BOGUS").unwrap_err();
        assert!(matches!(err, BqFlowError::UnsupportedMode(_)));
    }

    #[test]
    fn test_type_checked_before_mode() {
        let err = FieldConfig::new("field1", "STRING3", "BOGUS").unwrap_err();
        assert!(matches!(err, BqFlowError::UnsupportedType(_)));
    }

    #[test]
    fn test_record_requires_fields() {
        let err = FieldConfig::with_fields("field1", "RECORD", "NULLABLE", vec![]).unwrap_err();
        assert!(matches!(err, BqFlowError::UnsupportedType(_)));
        let err = FieldConfig::new("field1", "STRUCT", "NULLABLE").unwrap_err();
        assert!(matches!(err, BqFlowError::UnsupportedType(_)));
    }

    #[test]
    fn test_scalar_rejects_fields() {
        let child = FieldConfig::new("level1", "STRING", "NULLABLE").unwrap();
        let err = FieldConfig::with_fields("field1", "STRING", "NULLABLE", vec![child]).unwrap_err();
        assert!(matches!(err, BqFlowError::UnsupportedType(_)));
    }

    #[test]
    fn test_nested_record() {
        let inner = FieldConfig::with_fields(
            "level1",
            "RECORD",
            "NULLABLE",
            vec![FieldConfig::new("level2", "STRING", "NULLABLE").unwrap()],
        )
        .unwrap();
        let top = FieldConfig::with_fields(
            "top_level",
            "RECORD",
            "REPEATED",
            vec![FieldConfig::new("level1_name", "STRING", "NULLABLE").unwrap(), inner],
        )
        .unwrap();

        assert_eq!(top.fields.len(), 2);
        assert_eq!(top.fields[1].fields[0].name, "level2");
        assert_eq!(top.mode, FieldMode::Repeated);
    }

    #[test]
    fn test_to_dict_keeps_field_order() {
        let top = FieldConfig::with_fields(
            "address",
            "STRUCT",
            "NULLABLE",
            vec![
                FieldConfig::new("street", "STRING", "NULLABLE").unwrap(),
                FieldConfig::new("city", "STRING", "REQUIRED").unwrap(),
            ],
        )
        .unwrap();

        let dict = top.to_dict().unwrap();
        assert_eq!(dict["TYPE"], "STRUCT");
        assert_eq!(dict["FIELDS"][0]["NAME"], "street");
        assert_eq!(dict["FIELDS"][1]["NAME"], "city");
        assert_eq!(dict["FIELDS"][1]["MODE"], "REQUIRED");
    }

    #[test]
    fn test_from_dict_lowercase_keys() {
        let field = FieldConfig::from_dict(&json!({
            "name": "email",
            "type": "STRING",
            "mode": "NULLABLE",
            "has_pii": true
        }))
        .unwrap();

        assert_eq!(field.name, "email");
        assert!(field.has_pii);
        assert!(field.fields.is_empty());
    }

    #[test]
    fn test_from_dict_rejects_invalid_type() {
        let err = FieldConfig::from_dict(&json!({"NAME": "f", "TYPE": "VARCHAR", "MODE": "NULLABLE"}))
            .unwrap_err();
        assert!(matches!(err, BqFlowError::UnsupportedType(_)));
    }

    #[test]
    fn test_alias_spelling_kept() {
        let stored = json!({"NAME": "id", "TYPE": "INTEGER", "MODE": "REQUIRED"});
        let field = FieldConfig::from_dict(&stored).unwrap();
        assert_eq!(field.field_type, BqType::Int64);

        let dict = field.to_dict().unwrap();
        assert_eq!(dict["TYPE"], "INTEGER");
        assert_eq!(FieldConfig::from_dict(&dict).unwrap(), field);
    }

    #[test]
    fn test_metadata_roundtrip() {
        let field = FieldConfig::new("email", "STRING", "NULLABLE")
            .unwrap()
            .with_description("customer email")
            .encrypted()
            .with_pii()
            .with_keyset("customers", "customer_id")
            .with_original_type("STRING")
            .with_derives_from("raw_email");

        let loaded = FieldConfig::from_dict(&field.to_dict().unwrap()).unwrap();
        assert_eq!(loaded, field);
    }
}
