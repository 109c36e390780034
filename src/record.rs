//! MySQL 레코드 → ClickHouse 레코드 변환
//!
//! 컬럼별 변환 순서:
//! 1. 필드 수 검사 (스키마 불일치 감지, 짧은 행과 긴 행 모두)
//! 2. TIME → 문자열, JSON → 문자열
//! 3. NULL이면 이후 단계 생략
//! 4. UUID 재포장, unsigned 보정, 문자셋 디코딩, SET 전개
//! 5. POINT 디코딩 (NULL → 원점), ENUM → ordinal

use crate::charset::{CharsetTable, TableCharset};
use crate::enums::EnumCodec;
use crate::error::{ConvertError, Result};
use crate::geometry::GeometryDecoder;
use crate::schema::TableStructure;
use crate::value::CellValue;
use std::borrow::Cow;
use std::collections::BTreeSet;
use tracing::warn;

/// 한 배치 동안 공유하는 테이블 단위 정보
struct RowContext<'a> {
    mysql_structure: &'a TableStructure,
    /// 미리 해석한 문자셋. 해석할 수 없으면 None이고 실제 디코딩 시점에 에러
    charset: Option<TableCharset>,
}

impl<'a> RowContext<'a> {
    fn new(mysql_structure: &'a TableStructure) -> Self {
        RowContext {
            mysql_structure,
            charset: CharsetTable::resolve(mysql_structure.charset.as_deref()).ok(),
        }
    }

    fn decode_text(&self, bytes: &[u8]) -> Result<String> {
        match &self.charset {
            Some(charset) => charset.decode(bytes),
            None => CharsetTable::decode(bytes, self.mysql_structure.charset.as_deref()),
        }
    }
}

/// 레코드 변환기 (상태 없음)
pub struct RecordTranscoder;

impl RecordTranscoder {
    /// 여러 행 변환. 행끼리 독립적이므로 호출 측에서 병렬 처리 가능
    pub fn convert_records(
        records: Vec<Vec<CellValue>>,
        mysql_structure: &TableStructure,
        clickhouse_structure: &TableStructure,
        only_primary: bool,
    ) -> Result<Vec<Vec<CellValue>>> {
        let mysql_field_types = mysql_structure.field_types();
        let clickhouse_field_types = clickhouse_structure.field_types();
        let ctx = RowContext::new(mysql_structure);

        records
            .into_iter()
            .map(|record| {
                Self::convert_row(
                    record,
                    &mysql_field_types,
                    &clickhouse_field_types,
                    &ctx,
                    only_primary,
                )
            })
            .collect()
    }

    /// 한 행 변환. only_primary면 primary key 컬럼만 변환
    ///
    /// 행의 필드 수가 스키마와 다르면 (짧든 길든) SchemaMismatch.
    pub fn convert_record(
        record: Vec<CellValue>,
        mysql_field_types: &[&str],
        clickhouse_field_types: &[&str],
        mysql_structure: &TableStructure,
        only_primary: bool,
    ) -> Result<Vec<CellValue>> {
        let ctx = RowContext::new(mysql_structure);
        Self::convert_row(
            record,
            mysql_field_types,
            clickhouse_field_types,
            &ctx,
            only_primary,
        )
    }

    fn convert_row(
        record: Vec<CellValue>,
        mysql_field_types: &[&str],
        clickhouse_field_types: &[&str],
        ctx: &RowContext<'_>,
        only_primary: bool,
    ) -> Result<Vec<CellValue>> {
        let mysql_structure = ctx.mysql_structure;
        let record_fields = record.len();
        if record_fields != mysql_field_types.len() || record_fields != clickhouse_field_types.len() {
            let schema_fields = mysql_field_types.len().min(clickhouse_field_types.len());
            let err = ConvertError::SchemaMismatch {
                table: mysql_structure.table_name.clone(),
                index: record_fields.min(schema_fields),
                record_fields,
                schema_fields,
                field_types: mysql_field_types.iter().map(|t| t.to_string()).collect(),
            };
            warn!("{}", err);
            return Err(err);
        }

        let columns = record
            .into_iter()
            .zip(mysql_field_types)
            .zip(clickhouse_field_types)
            .enumerate();

        let mut converted = Vec::with_capacity(record_fields);
        for (idx, ((value, mysql_type), ch_type)) in columns {
            if only_primary && !mysql_structure.primary_key_ids.contains(&idx) {
                converted.push(value);
                continue;
            }
            converted.push(Self::convert_value(value, idx, mysql_type, ch_type, ctx)?);
        }

        Ok(converted)
    }

    fn convert_value(
        value: CellValue,
        idx: usize,
        mysql_type: &str,
        ch_type: &str,
        ctx: &RowContext<'_>,
    ) -> Result<CellValue> {
        let mysql_structure = ctx.mysql_structure;
        let mysql_type = mysql_type.to_lowercase();
        let ch_is_string = ch_type.contains("String");
        let mut value = value;

        if mysql_type.starts_with("time") && ch_is_string && !value.is_null() {
            value = CellValue::Text(value.to_text());
        }

        if mysql_type == "json" && ch_is_string {
            value = match value {
                CellValue::Text(s) => CellValue::Text(s),
                // 드라이버가 JSON 텍스트를 바이트로 주는 경우
                CellValue::Bytes(b) => CellValue::Text(CharsetTable::decode(&b, None)?),
                other => CellValue::Text(serde_json::to_string(&other.to_json())?),
            };
        }

        if !value.is_null() {
            if ch_type.contains("UUID") && value.text_len() == Some(36) {
                value = Self::repack_uuid(value)?;
            }

            value = Self::fix_unsigned(value, &mysql_type, ch_type);

            if ch_is_string && (mysql_type.contains("text") || mysql_type.contains("char")) {
                value = match value {
                    CellValue::Bytes(b) => CellValue::Text(ctx.decode_text(&b)?),
                    other => other,
                };
            }

            if mysql_type.contains("set(") {
                let declared = Self::declared_labels(idx, &mysql_type, mysql_structure)?;
                value = Self::expand_set(value, &declared, ctx)?;
            }
        }

        if mysql_type.starts_with("point") {
            let (x, y) = match &value {
                CellValue::Null => GeometryDecoder::decode_point(None)?,
                CellValue::Bytes(b) => GeometryDecoder::decode_point(Some(b.as_slice()))?,
                CellValue::Point { x, y } => (*x, *y),
                other => {
                    return Err(ConvertError::MalformedBinary(format!(
                        "unexpected POINT value {:?}",
                        other
                    )))
                }
            };
            value = CellValue::Point { x, y };
        }

        if mysql_type.starts_with("enum(") {
            let declared = Self::declared_labels(idx, &mysql_type, mysql_structure)?;
            let field_name = mysql_structure
                .fields
                .get(idx)
                .map(|f| f.name.as_str())
                .unwrap_or("unknown");
            value = match EnumCodec::enum_ordinal(&value, &declared) {
                Ok(Some(ordinal)) => CellValue::UInt(ordinal as u64),
                Ok(None) => CellValue::Null,
                Err(reason) => {
                    let err = ConvertError::EnumConversion {
                        field: field_name.to_string(),
                        table: mysql_structure.table_name.clone(),
                        reason,
                    };
                    warn!("{}", err);
                    return Err(err);
                }
            };
        }

        Ok(value)
    }

    /// 36자 UUID 문자열 → 16 bytes
    fn repack_uuid(value: CellValue) -> Result<CellValue> {
        let text = match value {
            CellValue::Text(s) => s,
            CellValue::Bytes(b) => CharsetTable::decode(&b, None)?,
            other => return Ok(other),
        };
        let uuid = uuid::Uuid::parse_str(&text).map_err(|_| ConvertError::InvalidUuid(text))?;
        Ok(CellValue::Bytes(uuid.as_bytes().to_vec()))
    }

    /// 드라이버가 음수로 준 unsigned 값 보정
    fn fix_unsigned(value: CellValue, mysql_type: &str, ch_type: &str) -> CellValue {
        let CellValue::Int(mut v) = value else {
            return value;
        };
        if v >= 0 {
            return value;
        }

        let modulus: i128 = if ch_type.contains("UInt8") {
            1 << 8
        } else if ch_type.contains("UInt16") {
            1 << 16
        } else if ch_type.contains("UInt32") {
            1 << 32
        } else if ch_type.contains("UInt64") {
            1 << 64
        } else {
            return value;
        };

        // mediumint(24bit)는 24bit 기준으로 먼저 보정. unsigned 대상일 때만 여기까지 오므로
        // signed 대상의 음수는 그대로 유지됨
        if mysql_type.contains("mediumint") {
            v += 1 << 24;
        }

        if v < 0 {
            CellValue::UInt((v as i128 + modulus) as u64)
        } else {
            CellValue::UInt(v as u64)
        }
    }

    fn declared_labels<'a>(
        idx: usize,
        mysql_type: &str,
        mysql_structure: &'a TableStructure,
    ) -> Result<Cow<'a, [String]>> {
        match mysql_structure
            .fields
            .get(idx)
            .and_then(|f| f.additional_data.as_deref())
        {
            Some(labels) => Ok(Cow::Borrowed(labels)),
            None => Ok(Cow::Owned(EnumCodec::parse_mysql_enum(mysql_type)?)),
        }
    }

    /// SET 값 → 선언 순서로 정렬된 `a,b` 문자열
    ///
    /// 드라이버에 따라 비트마스크, 레이블 집합, 또는 `a,b` 텍스트(바이트)로 들어옵니다.
    fn expand_set(value: CellValue, declared: &[String], ctx: &RowContext<'_>) -> Result<CellValue> {
        let labels = match value {
            CellValue::Int(mask) => EnumCodec::decode_set_mask(mask as u64, declared),
            CellValue::UInt(mask) => EnumCodec::decode_set_mask(mask, declared),
            CellValue::LabelSet(members) => EnumCodec::decode_set_labels(&members, declared),
            CellValue::Bytes(b) => Self::split_set_text(&ctx.decode_text(&b)?, declared),
            CellValue::Text(text) => Self::split_set_text(&text, declared),
            other => return Ok(other),
        };
        Ok(CellValue::Text(EnumCodec::join_set(&labels)))
    }

    fn split_set_text(text: &str, declared: &[String]) -> Vec<String> {
        let members: BTreeSet<String> = text
            .split(',')
            .filter(|label| !label.is_empty())
            .map(String::from)
            .collect();
        EnumCodec::decode_set_labels(&members, declared)
    }
}
