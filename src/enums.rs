//! MySQL ENUM / SET 처리
//!
//! - 타입 선언 `enum('a','b')` / `set('x','y')` 파싱 (선언 순서 유지)
//! - SET 비트마스크 ↔ 레이블 목록 ↔ 콤마 문자열 변환
//! - ENUM 값(인덱스, 레이블) → ClickHouse 1-based ordinal

use crate::error::{ConvertError, Result};
use crate::value::CellValue;
use std::collections::BTreeSet;

/// SET은 최대 64개 멤버
const MAX_SET_MEMBERS: usize = 64;

/// ENUM/SET 코덱
pub struct EnumCodec;

impl EnumCodec {
    /// `enum(...)` / `set(...)` 선언에서 레이블 목록 추출
    ///
    /// `''` 와 `\'` 이스케이프를 처리하며 대소문자는 그대로 유지합니다.
    pub fn parse_mysql_enum(declaration: &str) -> Result<Vec<String>> {
        let decl = declaration.trim();
        let (start, end) = match (decl.find('('), decl.rfind(')')) {
            (Some(start), Some(end)) if start < end => (start, end),
            _ => return Err(ConvertError::UnknownType(declaration.to_string())),
        };
        let body = &decl[start + 1..end];

        let mut labels = Vec::new();
        let mut chars = body.chars().peekable();
        loop {
            while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
                chars.next();
            }
            let Some(quote) = chars.next() else {
                break;
            };
            if quote != '\'' && quote != '"' {
                return Err(ConvertError::UnknownType(declaration.to_string()));
            }

            let mut label = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        label.push(escaped);
                    }
                } else if c == quote {
                    // '' → '
                    if chars.peek() == Some(&quote) {
                        chars.next();
                        label.push(quote);
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    label.push(c);
                }
            }
            if !closed {
                return Err(ConvertError::UnknownType(declaration.to_string()));
            }
            labels.push(label);
        }

        Ok(labels)
    }

    /// ENUM/SET 타입이면 레이블 목록, 아니면 None
    pub fn parse_enum_or_set_field(field_type: &str) -> Result<Option<Vec<String>>> {
        let lower = field_type.trim().to_lowercase();
        if lower.starts_with("enum(") || lower.starts_with("set(") {
            Self::parse_mysql_enum(field_type).map(Some)
        } else {
            Ok(None)
        }
    }

    /// ClickHouse Enum 본문 생성: `'red' = 1, 'green' = 2`
    pub fn clickhouse_enum_body(labels: &[String]) -> String {
        labels
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let escaped = label.to_lowercase().replace('\\', "\\\\").replace('\'', "\\'");
                format!("'{}' = {}", escaped, idx + 1)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 레이블 부분집합 → SET 비트마스크
    pub fn encode_set<S: AsRef<str>>(selected: &[S], declared: &[String]) -> Result<u64> {
        if declared.len() > MAX_SET_MEMBERS {
            return Err(ConvertError::UnknownType(format!(
                "set with {} members",
                declared.len()
            )));
        }

        let mut mask = 0u64;
        for label in selected {
            let label = label.as_ref();
            let idx = declared
                .iter()
                .position(|d| d.eq_ignore_ascii_case(label))
                .ok_or_else(|| ConvertError::EnumConversion {
                    field: String::new(),
                    table: String::new(),
                    reason: format!("'{}' is not a member of {:?}", label, declared),
                })?;
            mask |= 1 << idx;
        }
        Ok(mask)
    }

    /// SET 비트마스크 → 선언 순서의 레이블 목록
    pub fn decode_set_mask(mask: u64, declared: &[String]) -> Vec<String> {
        declared
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx < MAX_SET_MEMBERS && mask & (1 << idx) != 0)
            .map(|(_, label)| label.clone())
            .collect()
    }

    /// 네이티브 레이블 집합 → 선언 순서의 레이블 목록
    pub fn decode_set_labels(members: &BTreeSet<String>, declared: &[String]) -> Vec<String> {
        declared
            .iter()
            .filter(|label| members.contains(label.as_str()))
            .cloned()
            .collect()
    }

    /// 레이블 목록 → `a,b,c`
    pub fn join_set(labels: &[String]) -> String {
        labels.join(",")
    }

    /// ENUM 값 → ClickHouse ordinal (1-based)
    ///
    /// 정수는 MySQL 인덱스(1-based), 텍스트/바이트는 레이블(대소문자 무시).
    /// 인덱스 0과 빈 문자열은 MySQL의 잘못된 값 표현이므로 NULL로 처리합니다.
    pub fn enum_ordinal(value: &CellValue, declared: &[String]) -> std::result::Result<Option<u16>, String> {
        let label = match value {
            CellValue::Null => return Ok(None),
            CellValue::Int(_) | CellValue::UInt(_) => {
                let index = value
                    .as_i64()
                    .ok_or_else(|| format!("invalid enum index {}", value))?;
                if index == 0 {
                    return Ok(None);
                }
                if index < 0 || index as usize > declared.len() {
                    return Err(format!(
                        "enum index {} out of range (1..={})",
                        index,
                        declared.len()
                    ));
                }
                return Ok(Some(index as u16));
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Bytes(b) => String::from_utf8(b.clone())
                .map_err(|e| format!("enum label is not valid UTF-8: {}", e))?,
            other => return Err(format!("unsupported enum value {:?}", other)),
        };

        if label.is_empty() {
            return Ok(None);
        }

        declared
            .iter()
            .position(|d| d.to_lowercase() == label.to_lowercase())
            .map(|idx| Some(idx as u16 + 1))
            .ok_or_else(|| format!("'{}' is not a member of {:?}", label, declared))
    }
}
