//! 타입/DDL/레코드 변환 에러 타입

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("알 수 없는 MySQL 타입: \"{0}\"")]
    UnknownType(String),

    #[error("지원하지 않는 DDL: {reason}, query: {query}")]
    MalformedDdl { reason: String, query: String },

    #[error(
        "스키마 불일치: field index {index} out of range for table '{table}'. \
         Record has {record_fields} fields but schema has {schema_fields} fields. \
         Field types defined in schema: {field_types:?}. \
         This may indicate a schema mismatch between MySQL and the replication process."
    )]
    SchemaMismatch {
        table: String,
        index: usize,
        record_fields: usize,
        schema_fields: usize,
        field_types: Vec<String>,
    },

    #[error("잘못된 바이너리 데이터: {0}")]
    MalformedBinary(String),

    #[error("ENUM 변환 에러 (field '{field}', table '{table}'): {reason}")]
    EnumConversion {
        field: String,
        table: String,
        reason: String,
    },

    #[error("지원하지 않는 문자셋: {0}")]
    UnsupportedCharset(String),

    #[error("문자셋 디코딩 에러 ({charset}): {reason}")]
    CharsetDecode { charset: String, reason: String },

    #[error("유효하지 않은 UUID: {0}")]
    InvalidUuid(String),

    #[error("유효하지 않은 필터 패턴: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConvertError {
    pub(crate) fn malformed_ddl(reason: impl Into<String>, query: impl Into<String>) -> Self {
        ConvertError::MalformedDdl {
            reason: reason.into(),
            query: query.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
