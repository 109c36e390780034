//! MySQL → ClickHouse 타입 매핑
//!
//! 규칙은 우선순위 순서대로 평가됩니다. 뒤쪽의 넓은 부분 문자열 규칙
//! (`contains("int(")` 등)은 앞쪽의 좁은 규칙에 대한 fallback입니다.

use crate::enums::EnumCodec;
use crate::error::{ConvertError, Result};
use crate::schema::{SchemaPair, TableField, TableStructure};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^numeric\s*\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\)$").expect("valid numeric pattern")
});

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^timestamp(?:\((\d+)\))?$").expect("valid timestamp pattern")
});

/// 규칙 매칭 대상 (소문자 타입 + unsigned 여부)
struct TypeInput<'a> {
    mysql_type: &'a str,
    is_unsigned: bool,
}

type Matcher = fn(&str) -> bool;
type Mapper = fn(&TypeInput<'_>) -> Result<String>;

fn signed(input: &TypeInput<'_>, signed: &str, unsigned: &str) -> String {
    if input.is_unsigned {
        unsigned.to_string()
    } else {
        signed.to_string()
    }
}

fn fixed(ch_type: &'static str) -> Result<String> {
    Ok(ch_type.to_string())
}

/// (이름, 매칭, 매핑) 우선순위 테이블
static TYPE_RULES: &[(&str, Matcher, Mapper)] = &[
    ("point", |t| t == "point", |_| fixed("Tuple(x Float32, y Float32)")),
    ("numeric", |t| t.starts_with("numeric"), map_numeric),
    ("int", |t| t == "int" || t == "integer", |i| Ok(signed(i, "Int32", "UInt32"))),
    ("bigint", |t| t == "bigint", |i| Ok(signed(i, "Int64", "UInt64"))),
    ("double", |t| t == "double" || t == "real", |_| fixed("Float64")),
    ("float", |t| t == "float", |_| fixed("Float32")),
    ("date", |t| t == "date", |_| fixed("Date32")),
    ("year", |t| t == "year" || t == "year(4)", |_| fixed("UInt16")),
    ("bool", |t| matches!(t, "tinyint(1)" | "bit(1)" | "bool" | "boolean"), |_| fixed("Bool")),
    ("smallint", |t| t.contains("smallint"), |i| Ok(signed(i, "Int16", "UInt16"))),
    ("tinyint", |t| t.contains("tinyint"), |i| Ok(signed(i, "Int8", "UInt8"))),
    ("mediumint", |t| t.contains("mediumint"), |i| Ok(signed(i, "Int32", "UInt32"))),
    ("datetime", |t| t.contains("datetime"), |i| Ok(i.mysql_type.replace("datetime", "DateTime64"))),
    ("longtext", |t| t.contains("longtext"), |_| fixed("String")),
    ("varchar", |t| t.contains("varchar"), |_| fixed("String")),
    ("enum", |t| t.starts_with("enum"), map_enum),
    ("text", |t| t.contains("text"), |_| fixed("String")),
    ("blob", |t| t.contains("blob"), |_| fixed("String")),
    ("char", |t| t.contains("char"), |_| fixed("String")),
    ("json", |t| t.contains("json"), |_| fixed("String")),
    // 정밀도 손실 fallback (numeric과 다르게 취급)
    ("decimal", |t| t.contains("decimal"), |_| fixed("Float64")),
    ("float*", |t| t.contains("float"), |_| fixed("Float32")),
    ("double*", |t| t.contains("double"), |_| fixed("Float64")),
    ("bigint*", |t| t.contains("bigint"), |i| Ok(signed(i, "Int64", "UInt64"))),
    ("int*", |t| t.contains("integer") || t.contains("int("), |i| Ok(signed(i, "Int32", "UInt32"))),
    ("real*", |t| t.contains("real"), |_| fixed("Float64")),
    ("timestamp", |t| t.starts_with("timestamp"), map_timestamp),
    // TIME은 ClickHouse 대응 타입 없음
    ("time", |t| t.starts_with("time"), |_| fixed("String")),
    ("varbinary", |t| t.contains("varbinary"), |_| fixed("String")),
    ("binary", |t| t.contains("binary"), |_| fixed("String")),
    ("set", |t| t.contains("set("), |_| fixed("String")),
];

fn map_numeric(input: &TypeInput<'_>) -> Result<String> {
    let (precision, scale) = if input.mysql_type.contains('(') {
        let caps = NUMERIC_RE.captures(input.mysql_type).ok_or_else(|| {
            ConvertError::malformed_ddl("invalid numeric type definition", input.mysql_type)
        })?;
        let precision = parse_digits(&caps[1], input.mysql_type)?;
        let scale = match caps.get(2) {
            Some(m) => parse_digits(m.as_str(), input.mysql_type)?,
            None => 0,
        };
        (precision, scale)
    } else {
        (10, 0)
    };

    if scale == 0 {
        if precision <= 9 {
            return Ok(signed(input, "Int32", "UInt32"));
        }
        if precision <= 18 {
            return Ok(signed(input, "Int64", "UInt64"));
        }
    }
    Ok(format!("Decimal({}, {})", precision, scale))
}

fn parse_digits(digits: &str, mysql_type: &str) -> Result<u32> {
    digits
        .parse()
        .map_err(|_| ConvertError::malformed_ddl("precision out of range", mysql_type))
}

fn map_timestamp(input: &TypeInput<'_>) -> Result<String> {
    let caps = TIMESTAMP_RE.captures(input.mysql_type.trim()).ok_or_else(|| {
        ConvertError::malformed_ddl("invalid timestamp precision", input.mysql_type)
    })?;
    Ok(match caps.get(1) {
        Some(precision) => format!("DateTime64({})", precision.as_str()),
        None => "DateTime64".to_string(),
    })
}

fn map_enum(input: &TypeInput<'_>) -> Result<String> {
    let labels = EnumCodec::parse_mysql_enum(input.mysql_type)?;
    let body = EnumCodec::clickhouse_enum_body(&labels);
    if labels.len() <= 127 {
        Ok(format!("Enum8({})", body))
    } else {
        Ok(format!("Enum16({})", body))
    }
}

/// 괄호/따옴표 밖의 첫 공백에서 타입과 수식어 분리
///
/// `int unsigned` → (`int`, `unsigned`), `numeric(5, 2)` → (`numeric(5, 2)`, ``)
pub fn split_type_modifiers(mysql_type: &str) -> (&str, &str) {
    let mysql_type = mysql_type.trim();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in mysql_type.char_indices() {
        match (quote, c) {
            (Some(_), _) if escaped => escaped = false,
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, c) if c.is_whitespace() && depth == 0 => {
                return (&mysql_type[..idx], mysql_type[idx..].trim());
            }
            _ => {}
        }
    }
    (mysql_type, "")
}

/// MySQL → ClickHouse 타입 매퍼
#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    /// 사용자 지정 매핑 (소문자 MySQL 타입 → ClickHouse 타입)
    types_mapping: HashMap<String, String>,
}

impl TypeMapper {
    pub fn new(types_mapping: HashMap<String, String>) -> Self {
        let types_mapping = types_mapping
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        TypeMapper { types_mapping }
    }

    /// 타입 변환 (nullable 처리 없음)
    pub fn convert_type(&self, mysql_type: &str, parameters: &str) -> Result<String> {
        let mysql_type = mysql_type.trim().to_lowercase();
        if let Some(ch_type) = self.types_mapping.get(&mysql_type) {
            return Ok(ch_type.clone());
        }

        let input = TypeInput {
            mysql_type: &mysql_type,
            is_unsigned: parameters.to_lowercase().contains("unsigned"),
        };
        for (_, matches, map) in TYPE_RULES {
            if matches(input.mysql_type) {
                return map(&input);
            }
        }
        Err(ConvertError::UnknownType(mysql_type))
    }

    /// 타입 변환 + Nullable 처리
    ///
    /// `NOT NULL`이 없으면 `Nullable(...)`로 감쌉니다. Tuple(POINT)은 항상 non-null.
    /// 타입 문자열 안의 수식어(`int unsigned`, `double precision`)는 파라미터로 옮깁니다.
    pub fn convert_field_type(&self, mysql_type: &str, parameters: &str) -> Result<String> {
        let (base_type, modifiers) = split_type_modifiers(mysql_type);
        let parameters = format!("{} {}", modifiers, parameters).to_lowercase();

        let mut ch_type = self.convert_type(base_type, &parameters)?;
        let not_null = parameters.contains("not null") || ch_type.contains("Tuple");
        if !not_null {
            ch_type = format!("Nullable({})", ch_type);
        }
        Ok(ch_type)
    }

    /// MySQL 테이블 구조 전체를 ClickHouse 구조로 변환
    pub fn convert_table_structure(&self, mysql_structure: &TableStructure) -> Result<TableStructure> {
        let fields = mysql_structure
            .fields
            .iter()
            .map(|field| {
                let ch_type = self.convert_field_type(&field.field_type, &field.parameters)?;
                Ok(TableField::new(field.name.clone(), ch_type))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut ch_structure = TableStructure {
            table_name: mysql_structure.table_name.clone(),
            fields,
            primary_keys: mysql_structure.primary_keys.clone(),
            primary_key_ids: Vec::new(),
            if_not_exists: mysql_structure.if_not_exists,
            charset: None,
        };
        ch_structure.preprocess();
        Ok(ch_structure)
    }

    /// MySQL 구조로부터 스키마 쌍 생성
    pub fn schema_pair(&self, mut mysql_structure: TableStructure) -> Result<SchemaPair> {
        for field in &mut mysql_structure.fields {
            if field.additional_data.is_none() {
                field.additional_data = EnumCodec::parse_enum_or_set_field(&field.field_type)?;
            }
        }
        mysql_structure.preprocess();
        let ch_structure = self.convert_table_structure(&mysql_structure)?;
        SchemaPair::new(mysql_structure, ch_structure)
    }
}
