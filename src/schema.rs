//! 테이블 구조 (MySQL 측 / ClickHouse 측 미러)
//!
//! 두 구조는 항상 같은 순서, 같은 개수의 필드를 가져야 합니다 (order parity).
//! 레코드 변환은 두 구조를 위치 기반으로 인덱싱합니다.

use crate::error::{ConvertError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 테이블 컬럼
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableField {
    /// 컬럼명
    pub name: String,
    /// 컬럼 타입 (MySQL 또는 ClickHouse, 구조에 따라 다름)
    pub field_type: String,
    /// 타입 뒤의 수식어 원문 (e.g. "NOT NULL DEFAULT 0")
    pub parameters: String,
    /// ENUM/SET 레이블 목록 (선언 순서)
    pub additional_data: Option<Vec<String>>,
}

impl TableField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        TableField {
            name: name.into(),
            field_type: field_type.into(),
            parameters: String::new(),
            additional_data: None,
        }
    }

    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    pub fn with_additional_data(mut self, additional_data: Option<Vec<String>>) -> Self {
        self.additional_data = additional_data;
        self
    }
}

/// 테이블 구조
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStructure {
    pub table_name: String,
    /// 컬럼 순서가 곧 레코드 순서
    pub fields: Vec<TableField>,
    pub primary_keys: Vec<String>,
    /// primary_keys의 필드 인덱스 (preprocess로 재계산)
    pub primary_key_ids: Vec<usize>,
    pub if_not_exists: bool,
    /// MySQL 테이블 문자셋 (e.g. "utf8mb4"). None이면 UTF-8
    pub charset: Option<String>,
}

impl TableStructure {
    pub fn new(table_name: impl Into<String>) -> Self {
        TableStructure {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// 파생 인덱스 재계산
    pub fn preprocess(&mut self) {
        self.primary_key_ids = self
            .primary_keys
            .iter()
            .filter_map(|key| self.field_index(key))
            .collect();
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_index(name).is_some()
    }

    pub fn get_field(&self, name: &str) -> Option<&TableField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_types(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.field_type.as_str()).collect()
    }

    pub fn add_field_first(&mut self, field: TableField) {
        self.insert_field(0, field);
    }

    /// `after` 컬럼 바로 뒤에 추가
    pub fn add_field_after(&mut self, field: TableField, after: &str) -> Result<()> {
        let idx = self
            .field_index(after)
            .ok_or_else(|| missing_column(after, &self.table_name))?;
        self.insert_field(idx + 1, field);
        Ok(())
    }

    pub fn insert_field(&mut self, position: usize, field: TableField) {
        let position = position.min(self.fields.len());
        self.fields.insert(position, field);
        self.preprocess();
    }

    pub fn remove_field(&mut self, name: &str) -> Result<TableField> {
        let idx = self
            .field_index(name)
            .ok_or_else(|| missing_column(name, &self.table_name))?;
        let field = self.fields.remove(idx);
        self.preprocess();
        Ok(field)
    }

    /// 컬럼명 변경. primary key 목록도 함께 변경
    pub fn rename_field(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let idx = self
            .field_index(old_name)
            .ok_or_else(|| missing_column(old_name, &self.table_name))?;
        self.fields[idx].name = new_name.to_string();
        for key in self.primary_keys.iter_mut().filter(|key| key.as_str() == old_name) {
            *key = new_name.to_string();
        }
        self.preprocess();
        Ok(())
    }

    /// 같은 위치의 필드를 통째로 교체 (이름 변경 포함)
    pub fn update_field(&mut self, name: &str, field: TableField) -> Result<()> {
        let idx = self
            .field_index(name)
            .ok_or_else(|| missing_column(name, &self.table_name))?;
        self.fields[idx] = field;
        self.preprocess();
        Ok(())
    }
}

fn duplicate_column(name: &str, table: &str) -> ConvertError {
    ConvertError::malformed_ddl(
        format!("column `{}` already exists", name),
        format!("table `{}`", table),
    )
}

fn missing_column(name: &str, table: &str) -> ConvertError {
    ConvertError::malformed_ddl(
        format!("column `{}` does not exist", name),
        format!("table `{}`", table),
    )
}

/// 컬럼 위치 지정 (ALTER TABLE ... FIRST / AFTER col)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPosition {
    First,
    After(String),
}

/// MySQL 구조와 ClickHouse 구조의 쌍. 모든 구조 변경은 양쪽에 동시에 적용됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaPair {
    pub mysql: TableStructure,
    pub clickhouse: TableStructure,
}

/// 테이블 단위 잠금. DDL 적용(write)과 레코드 변환(read)을 직렬화합니다.
pub type SharedSchemaPair = Arc<RwLock<SchemaPair>>;

impl SchemaPair {
    pub fn new(mysql: TableStructure, clickhouse: TableStructure) -> Result<Self> {
        let pair = SchemaPair { mysql, clickhouse };
        pair.check_parity()?;
        Ok(pair)
    }

    pub fn into_shared(self) -> SharedSchemaPair {
        Arc::new(RwLock::new(self))
    }

    /// 필드 개수 및 이름 순서 일치 검사
    pub fn check_parity(&self) -> Result<()> {
        let mysql_names = self.mysql.fields.iter().map(|f| f.name.as_str());
        let ch_names = self.clickhouse.fields.iter().map(|f| f.name.as_str());
        if self.mysql.fields.len() != self.clickhouse.fields.len() || !mysql_names.eq(ch_names) {
            return Err(ConvertError::SchemaMismatch {
                table: self.mysql.table_name.clone(),
                index: self.mysql.fields.len().min(self.clickhouse.fields.len()),
                record_fields: self.clickhouse.fields.len(),
                schema_fields: self.mysql.fields.len(),
                field_types: self
                    .mysql
                    .field_types()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            });
        }
        Ok(())
    }

    /// 양쪽에 같은 위치로 컬럼 추가. position이 None이면 마지막 컬럼 뒤
    pub fn add_field(
        &mut self,
        mysql_field: TableField,
        ch_field: TableField,
        position: Option<&ColumnPosition>,
    ) -> Result<()> {
        let idx = match position {
            Some(ColumnPosition::First) => 0,
            Some(ColumnPosition::After(after)) => {
                self.mysql
                    .field_index(after)
                    .ok_or_else(|| missing_column(after, &self.mysql.table_name))?
                    + 1
            }
            None => self.mysql.fields.len(),
        };
        self.mysql.insert_field(idx, mysql_field);
        self.clickhouse.insert_field(idx, ch_field);
        Ok(())
    }

    pub fn remove_field(&mut self, name: &str) -> Result<()> {
        // 양쪽 모두 존재를 확인한 뒤에 변경
        if !self.clickhouse.has_field(name) {
            return Err(missing_column(name, &self.clickhouse.table_name));
        }
        self.mysql.remove_field(name)?;
        self.clickhouse.remove_field(name)?;
        Ok(())
    }

    /// 양쪽 컬럼명 변경 (타입 유지)
    pub fn rename_field(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if !self.mysql.has_field(old_name) || !self.clickhouse.has_field(old_name) {
            return Err(missing_column(old_name, &self.mysql.table_name));
        }
        if old_name == new_name {
            return Ok(());
        }
        if self.mysql.has_field(new_name) || self.clickhouse.has_field(new_name) {
            return Err(duplicate_column(new_name, &self.mysql.table_name));
        }
        self.mysql.rename_field(old_name, new_name)?;
        self.clickhouse.rename_field(old_name, new_name)?;
        Ok(())
    }

    /// 컬럼 교체 (타입 변경 및 이름 변경). position이 있으면 위치도 이동
    pub fn replace_field(
        &mut self,
        name: &str,
        mysql_field: TableField,
        ch_field: TableField,
        position: Option<&ColumnPosition>,
    ) -> Result<()> {
        if !self.mysql.has_field(name) || !self.clickhouse.has_field(name) {
            return Err(missing_column(name, &self.mysql.table_name));
        }
        let new_name = mysql_field.name.clone();
        if let Some(ColumnPosition::After(after)) = position {
            if *after != name && *after != new_name && !self.mysql.has_field(after) {
                return Err(missing_column(after, &self.mysql.table_name));
            }
        }

        // 이름 변경을 먼저 반영해 primary key 이름을 유지
        self.rename_field(name, &new_name)?;

        match position {
            None => {
                self.mysql.update_field(&new_name, mysql_field)?;
                self.clickhouse.update_field(&new_name, ch_field)?;
            }
            // 자기 자신 뒤 = 제자리
            Some(ColumnPosition::After(after)) if *after == name || *after == new_name => {
                self.mysql.update_field(&new_name, mysql_field)?;
                self.clickhouse.update_field(&new_name, ch_field)?;
            }
            Some(position) => {
                self.mysql.remove_field(&new_name)?;
                self.clickhouse.remove_field(&new_name)?;
                self.add_field(mysql_field, ch_field, Some(position))?;
            }
        }
        Ok(())
    }
}
