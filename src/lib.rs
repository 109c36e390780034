//! MySQL → ClickHouse 변환 핵심 구현
//!
//! 복제 파이프라인에서 MySQL 스키마와 행 데이터를 ClickHouse 형식으로 변환합니다.
//! 주요 기능:
//! - 타입 매핑 (MySQL 컬럼 타입 → ClickHouse 컬럼 타입)
//! - 레코드 변환 (unsigned 보정, 문자셋 디코딩, ENUM/SET, POINT, UUID)
//! - ALTER TABLE 변환 및 스키마 쌍 동기화
//! - 데이터베이스/테이블 필터

pub mod charset;
pub mod config;
pub mod ddl;
pub mod enums;
pub mod error;
pub mod geometry;
pub mod record;
pub mod schema;
pub mod types;
pub mod value;

pub use charset::{CharsetTable, TableCharset};
pub use config::{ConverterConfig, NameFilter};
pub use ddl::{AlterOutcome, DdlTranslator};
pub use enums::EnumCodec;
pub use error::{ConvertError, Result};
pub use geometry::GeometryDecoder;
pub use record::RecordTranscoder;
pub use schema::{ColumnPosition, SchemaPair, SharedSchemaPair, TableField, TableStructure};
pub use types::TypeMapper;
pub use value::CellValue;
