//! 컬럼 값 표현 (MySQL 드라이버 값 ↔ ClickHouse 입력 값)

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 셀 값 (드라이버가 주는 원시 값 및 변환 결과)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    /// SET 컬럼의 네이티브 레이블 집합
    LabelSet(BTreeSet<String>),
    Json(serde_json::Value),
    /// 디코딩된 JSON 배열 (바이트 원소 포함 가능)
    Array(Vec<CellValue>),
    /// 디코딩된 JSON 객체 (바이트 키 포함 가능)
    Object(Vec<(CellValue, CellValue)>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// MySQL TIME (-838:59:59 ~ 838:59:59)
    Time {
        negative: bool,
        hours: u32,
        minutes: u8,
        seconds: u8,
        micros: u32,
    },
    /// POINT 변환 결과
    Point { x: f64, y: f64 },
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// 정수 값 (부호 보정용)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// 텍스트 표현 길이 (UUID 판별용)
    pub fn text_len(&self) -> Option<usize> {
        match self {
            CellValue::Text(s) => Some(s.len()),
            CellValue::Bytes(b) => Some(b.len()),
            _ => None,
        }
    }

    /// 문자열로 변환 (TIME 등 네이티브 대응 타입이 없는 값)
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            other => other.to_string(),
        }
    }

    /// JSON 값으로 변환. 바이트 키/값은 UTF-8 텍스트로 디코딩
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            CellValue::Null => Value::Null,
            CellValue::Int(i) => Value::from(*i),
            CellValue::UInt(u) => Value::from(*u),
            CellValue::Float(f) => Value::from(*f),
            CellValue::Decimal(d) => Value::String(d.clone()),
            CellValue::Text(s) => Value::String(s.clone()),
            CellValue::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            CellValue::LabelSet(labels) => {
                Value::Array(labels.iter().cloned().map(Value::String).collect())
            }
            CellValue::Json(v) => v.clone(),
            CellValue::Array(items) => Value::Array(items.iter().map(CellValue::to_json).collect()),
            CellValue::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.to_text(), value.to_json()))
                    .collect(),
            ),
            CellValue::Point { x, y } => serde_json::json!({ "x": x, "y": y }),
            other => Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::UInt(u) => write!(f, "{}", u),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Decimal(d) => write!(f, "{}", d),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            CellValue::LabelSet(labels) => {
                let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
                write!(f, "{}", labels.join(","))
            }
            CellValue::Json(v) => write!(f, "{}", v),
            CellValue::Array(_) | CellValue::Object(_) => write!(f, "{}", self.to_json()),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            CellValue::Time {
                negative,
                hours,
                minutes,
                seconds,
                micros,
            } => {
                let sign = if *negative { "-" } else { "" };
                write!(f, "{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)?;
                if *micros > 0 {
                    write!(f, ".{:06}", micros)?;
                }
                Ok(())
            }
            CellValue::Point { x, y } => write!(f, "({}, {})", x, y),
        }
    }
}

/// mysql_async 드라이버 값 변환 (스냅샷 조회 결과)
impl From<mysql_async::Value> for CellValue {
    fn from(value: mysql_async::Value) -> Self {
        use mysql_async::Value;

        match value {
            Value::NULL => CellValue::Null,
            Value::Bytes(b) => CellValue::Bytes(b),
            Value::Int(i) => CellValue::Int(i),
            Value::UInt(u) => CellValue::UInt(u),
            Value::Float(f) => CellValue::Float(f as f64),
            Value::Double(d) => CellValue::Float(d),
            Value::Date(year, month, day, hour, minute, second, micros) => {
                let Some(date) = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
                else {
                    // 0000-00-00 같은 zero date
                    return CellValue::Text(format!("{:04}-{:02}-{:02}", year, month, day));
                };
                if hour == 0 && minute == 0 && second == 0 && micros == 0 {
                    CellValue::Date(date)
                } else {
                    match date.and_hms_micro_opt(hour as u32, minute as u32, second as u32, micros)
                    {
                        Some(dt) => CellValue::DateTime(dt),
                        None => CellValue::Date(date),
                    }
                }
            }
            Value::Time(negative, days, hours, minutes, seconds, micros) => CellValue::Time {
                negative,
                hours: days * 24 + hours as u32,
                minutes,
                seconds,
                micros,
            },
        }
    }
}
