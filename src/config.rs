//! 변환기 설정 (타입 오버라이드, 데이터베이스/테이블 필터)

use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::HashMap;

/// 변환기 설정
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// MySQL 타입 → ClickHouse 타입 강제 매핑 (최우선)
    pub types_mapping: HashMap<String, String>,
    /// 포함할 데이터베이스 glob 패턴 (비어 있으면 전체)
    pub databases: Vec<String>,
    /// 포함할 테이블 glob 패턴 (비어 있으면 전체)
    pub tables: Vec<String>,
    pub exclude_databases: Vec<String>,
    pub exclude_tables: Vec<String>,
    /// DDL의 source 데이터베이스명을 target으로 치환
    pub source_database: Option<String>,
    pub target_database: Option<String>,
}

impl ConverterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type_mapping(mut self, mysql_type: &str, clickhouse_type: &str) -> Self {
        self.types_mapping
            .insert(mysql_type.to_lowercase(), clickhouse_type.to_string());
        self
    }

    pub fn with_database_alias(
        mut self,
        source_database: impl Into<String>,
        target_database: impl Into<String>,
    ) -> Self {
        self.source_database = Some(source_database.into());
        self.target_database = Some(target_database.into());
        self
    }

    /// 필터 패턴 컴파일
    pub fn name_filter(&self) -> Result<NameFilter> {
        Ok(NameFilter {
            databases: PatternList::compile(&self.databases)?,
            tables: PatternList::compile(&self.tables)?,
            exclude_databases: PatternList::compile(&self.exclude_databases)?,
            exclude_tables: PatternList::compile(&self.exclude_tables)?,
        })
    }

    /// source 데이터베이스명이면 target으로 치환
    pub fn resolve_database<'a>(&'a self, database: &'a str) -> &'a str {
        match (&self.source_database, &self.target_database) {
            (Some(source), Some(target)) if source == database => target,
            _ => database,
        }
    }
}

/// 컴파일된 glob 패턴 목록
#[derive(Debug, Clone, Default)]
struct PatternList {
    patterns: Vec<Regex>,
}

impl PatternList {
    fn compile(globs: &[String]) -> Result<Self> {
        let patterns = globs
            .iter()
            .map(|glob| {
                RegexBuilder::new(&glob_to_regex(glob))
                    .case_insensitive(true)
                    .build()
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(PatternList { patterns })
    }

    fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
    }
}

/// `*` → `.*`, `?` → `.`
fn glob_to_regex(pattern: &str) -> String {
    let escaped = regex::escape(pattern);
    format!("^{}$", escaped.replace(r"\*", ".*").replace(r"\?", "."))
}

/// 데이터베이스/테이블 포함 여부 판단
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    databases: PatternList,
    tables: PatternList,
    exclude_databases: PatternList,
    exclude_tables: PatternList,
}

impl NameFilter {
    pub fn is_database_matches(&self, database: &str) -> bool {
        if self.exclude_databases.matches(database) {
            return false;
        }
        self.databases.is_empty() || self.databases.matches(database)
    }

    pub fn is_table_matches(&self, table: &str) -> bool {
        if self.exclude_tables.matches(table) {
            return false;
        }
        self.tables.is_empty() || self.tables.matches(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = ConverterConfig::new().name_filter().unwrap();
        assert!(filter.is_database_matches("any_db"));
        assert!(filter.is_table_matches("any_table"));
    }

    #[test]
    fn test_include_and_exclude_globs() {
        let config = ConverterConfig {
            databases: vec!["shop_*".to_string()],
            tables: vec!["*".to_string()],
            exclude_tables: vec!["_*_new".to_string(), "tmp?".to_string()],
            ..Default::default()
        };
        let filter = config.name_filter().unwrap();
        assert!(filter.is_database_matches("shop_eu"));
        assert!(filter.is_database_matches("SHOP_US"));
        assert!(!filter.is_database_matches("billing"));
        assert!(filter.is_table_matches("orders"));
        assert!(!filter.is_table_matches("_orders_new"));
        assert!(!filter.is_table_matches("tmp1"));
        assert!(filter.is_table_matches("tmp12"));
    }

    #[test]
    fn test_database_alias() {
        let config = ConverterConfig::new().with_database_alias("src", "dst");
        assert_eq!(config.resolve_database("src"), "dst");
        assert_eq!(config.resolve_database("other"), "other");
    }

    #[test]
    fn test_deserialize_config() {
        let config: ConverterConfig = serde_json::from_str(
            r#"{"types_mapping": {"char(36)": "UUID"}, "exclude_databases": ["mysql"]}"#,
        )
        .unwrap();
        assert_eq!(config.types_mapping["char(36)"], "UUID");
        assert!(!config.name_filter().unwrap().is_database_matches("mysql"));
    }
}
