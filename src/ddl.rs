//! ALTER TABLE 변환 (MySQL → ClickHouse)
//!
//! 처리 순서:
//! 1. 주석 제거, 끝의 `;` 하나 제거 (다중 문장은 거부)
//! 2. `ALTER TABLE <db.table>` 검증, 데이터베이스명 치환, 필터 확인
//! 3. 괄호 밖의 콤마로 하위 연산 분리
//! 4. 하위 연산별로 스키마 쌍(MySQL/ClickHouse)을 같은 위치로 변경하고 ClickHouse DDL 생성
//!
//! 하나라도 실패하면 스키마 쌍은 변경되지 않습니다.

use crate::config::{ConverterConfig, NameFilter};
use crate::enums::EnumCodec;
use crate::error::{ConvertError, Result};
use crate::schema::{ColumnPosition, SchemaPair, TableField};
use crate::types::{split_type_modifiers, TypeMapper};
use regex::Regex;
use sqlparser::dialect::MySqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// 토큰 패턴 (우선순위 순)
/// 1. 백쿼트 식별자 (+ 괄호 인자)
/// 2. 단어 (+ 괄호 인자)
/// 3. 작은따옴표/큰따옴표 문자열
/// 4. 그 외 공백이 아닌 연속 문자
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"`[^`]+`(?:\([^)]*\))?|\w+(?:\([^)]*\))?|'(?:\\'|[^'])*'|"(?:\\"|[^"])*"|\S+"#,
    )
    .expect("valid token pattern")
});

/// 컬럼 타입 뒤에 오는 옵션 키워드
const CONSTRAINT_KEYWORDS: &[&str] = &[
    "DEFAULT", "NOT", "NULL", "AUTO_INCREMENT", "PRIMARY", "UNIQUE", "COMMENT", "COLLATE",
    "REFERENCES", "ON", "CHECK", "CONSTRAINT", "AFTER", "BEFORE", "GENERATED", "VIRTUAL",
    "STORED", "FIRST", "ALWAYS", "AS", "IDENTITY", "INVISIBLE", "PERSISTED",
];

/// ClickHouse에 대응이 없어 무시하는 ADD/DROP 대상
const SKIPPED_TARGETS: &[&str] = &[
    "constraint", "index", "foreign", "unique", "key", "primary", "fulltext", "spatial", "check",
];

/// ALTER 변환 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterOutcome {
    /// 필터에 의해 제외된 테이블
    Skipped,
    /// 적용됨. 하위 연산별 ClickHouse DDL
    Applied(Vec<String>),
}

impl AlterOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, AlterOutcome::Skipped)
    }

    pub fn statements(&self) -> &[String] {
        match self {
            AlterOutcome::Skipped => &[],
            AlterOutcome::Applied(statements) => statements,
        }
    }
}

/// 백쿼트 제거
pub fn strip_sql_name(name: &str) -> &str {
    let name = name.trim();
    let name = name.strip_prefix('`').unwrap_or(name);
    name.strip_suffix('`').unwrap_or(name)
}

/// 괄호 깊이 0의 구분자로만 분리 (`NUMERIC(5,2)` 안의 콤마는 무시)
pub fn split_high_level(data: &str, token: char) -> Vec<String> {
    let mut results = Vec::new();
    let mut level = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut current = String::new();

    for c in data.chars() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(q) if c == '\\' && q != '`' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == token && level == 0 => {
                results.push(current.trim().to_string());
                current.clear();
                continue;
            }
            None if c == '\'' || c == '"' || c == '`' => quote = Some(c),
            None if c == '(' => level += 1,
            None if c == ')' => level -= 1,
            None => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        results.push(current.trim().to_string());
    }
    results
}

/// `--`, `#`, `/* */` 주석 제거
///
/// MySQL 방언으로 토큰화한 뒤 주석 토큰만 공백으로 바꿔 다시 조립합니다.
/// 문자열 리터럴은 이스케이프를 풀지 않고 원문 그대로 유지합니다.
pub fn strip_sql_comments(sql: &str) -> Result<String> {
    let tokens = Tokenizer::new(&MySqlDialect {}, sql)
        .with_unescape(false)
        .tokenize()
        .map_err(|e| ConvertError::malformed_ddl(e.to_string(), sql))?;

    let stripped: String = tokens
        .iter()
        .map(|token| match token {
            Token::Whitespace(Whitespace::SingleLineComment { .. })
            | Token::Whitespace(Whitespace::MultiLineComment(_)) => " ".to_string(),
            other => other.to_string(),
        })
        .collect();
    Ok(stripped.trim().to_string())
}

/// 컬럼 정의 토큰화: [컬럼명, 병합된 타입, 나머지 옵션...]
///
/// `DOUBLE PRECISION`, `INT UNSIGNED` 같은 여러 단어 타입은 옵션 키워드가
/// 나올 때까지 하나의 타입 토큰으로 병합합니다.
pub fn tokenize_alter_query(sql_line: &str) -> Vec<String> {
    let tokens: Vec<&str> = TOKEN_RE.find_iter(sql_line).map(|m| m.as_str()).collect();
    let Some((column_name, rest)) = tokens.split_first() else {
        return Vec::new();
    };

    let type_len = rest
        .iter()
        .position(|t| CONSTRAINT_KEYWORDS.contains(&t.to_uppercase().as_str()))
        .unwrap_or(rest.len());
    let (type_tokens, param_tokens) = rest.split_at(type_len);

    let mut result = vec![column_name.to_string()];
    if !type_tokens.is_empty() {
        result.push(type_tokens.join(" "));
    }
    result.extend(param_tokens.iter().map(|t| t.to_string()));
    result
}

/// 끝의 `AFTER col` / `FIRST` 분리
fn extract_position(tokens: &mut Vec<String>) -> Option<ColumnPosition> {
    let len = tokens.len();
    if len >= 2 && tokens[len - 2].eq_ignore_ascii_case("after") {
        let after = strip_sql_name(&tokens[len - 1]).to_string();
        tokens.truncate(len - 2);
        return Some(ColumnPosition::After(after));
    }
    if len >= 1 && tokens[len - 1].eq_ignore_ascii_case("first") {
        tokens.truncate(len - 1);
        return Some(ColumnPosition::First);
    }
    None
}

fn position_clause(position: Option<&ColumnPosition>) -> String {
    match position {
        Some(ColumnPosition::First) => " FIRST".to_string(),
        Some(ColumnPosition::After(after)) => format!(" AFTER `{}`", after),
        None => String::new(),
    }
}

/// 파싱된 컬럼 정의
struct ColumnDefinition {
    name: String,
    mysql_field: TableField,
    ch_type: String,
    position: Option<ColumnPosition>,
}

/// 하위 연산 처리 컨텍스트
struct AlterContext<'a> {
    query: &'a str,
    db_name: String,
    table_name: String,
    pair: Option<&'a mut SchemaPair>,
    statements: Vec<String>,
}

impl AlterContext<'_> {
    fn table_ref(&self) -> String {
        format!("`{}`.`{}`", self.db_name, self.table_name)
    }

    fn error(&self, reason: impl Into<String>) -> ConvertError {
        ConvertError::malformed_ddl(reason, self.query)
    }
}

/// ALTER TABLE 변환기
#[derive(Debug, Clone)]
pub struct DdlTranslator {
    mapper: TypeMapper,
    filter: NameFilter,
    config: ConverterConfig,
}

impl DdlTranslator {
    pub fn new(config: ConverterConfig) -> Result<Self> {
        Ok(DdlTranslator {
            mapper: TypeMapper::new(config.types_mapping.clone()),
            filter: config.name_filter()?,
            config,
        })
    }

    pub fn type_mapper(&self) -> &TypeMapper {
        &self.mapper
    }

    /// 끝의 `;` 하나 제거, 다중 문장 거부
    fn basic_validate_query(mysql_query: &str) -> Result<String> {
        let query = strip_sql_comments(mysql_query)?;
        let query = query.strip_suffix(';').unwrap_or(&query).trim();
        if query.contains(';') {
            return Err(ConvertError::malformed_ddl(
                "multi-query statement not supported",
                mysql_query,
            ));
        }
        Ok(query.to_string())
    }

    /// `db.table` / `table` 해석 → (db, table, 필터 통과 여부)
    pub fn get_db_and_table_name(&self, token: &str, db_name: &str) -> Result<(String, String, bool)> {
        let parts = split_high_level(token, '.');
        let (db_name, table_name) = match parts.as_slice() {
            [table] => (db_name, table.as_str()),
            [db, table] => (db.as_str(), table.as_str()),
            _ => {
                return Err(ConvertError::malformed_ddl(
                    format!("invalid table reference {}", token),
                    token,
                ))
            }
        };
        let db_name = self.config.resolve_database(strip_sql_name(db_name)).to_string();
        let table_name = strip_sql_name(table_name).to_string();
        let matches_config =
            self.filter.is_database_matches(&db_name) && self.filter.is_table_matches(&table_name);
        Ok((db_name, table_name, matches_config))
    }

    /// ALTER TABLE 문 변환 및 스키마 쌍 적용
    ///
    /// `pair`가 주어지면 모든 하위 연산이 성공한 경우에만 반영됩니다.
    pub fn convert_alter_query(
        &self,
        mysql_query: &str,
        db_name: &str,
        pair: Option<&mut SchemaPair>,
    ) -> Result<AlterOutcome> {
        let result = self.convert_alter_query_inner(mysql_query, db_name, pair);
        if let Err(e) = &result {
            warn!("Failed to convert alter query: {}", e);
        }
        result
    }

    fn convert_alter_query_inner(
        &self,
        mysql_query: &str,
        db_name: &str,
        pair: Option<&mut SchemaPair>,
    ) -> Result<AlterOutcome> {
        let query = Self::basic_validate_query(mysql_query)?;

        let tokens: Vec<&str> = query.split_whitespace().collect();
        if tokens.len() < 3
            || !tokens[0].eq_ignore_ascii_case("alter")
            || !tokens[1].eq_ignore_ascii_case("table")
        {
            return Err(ConvertError::malformed_ddl("wrong query", mysql_query));
        }

        let (db_name, table_name, matches_config) = self.get_db_and_table_name(tokens[2], db_name)?;
        if !matches_config {
            info!("Skipping alter for filtered table {}.{}", db_name, table_name);
            return Ok(AlterOutcome::Skipped);
        }

        let mut working = pair.as_deref().cloned();
        let mut ctx = AlterContext {
            query: &query,
            db_name,
            table_name,
            pair: working.as_mut(),
            statements: Vec::new(),
        };

        for subquery in split_high_level(&tokens[3..].join(" "), ',') {
            self.convert_subquery(&mut ctx, &subquery)?;
        }
        let statements = ctx.statements;

        if let (Some(pair), Some(working)) = (pair, working) {
            *pair = working;
        }
        Ok(AlterOutcome::Applied(statements))
    }

    fn convert_subquery(&self, ctx: &mut AlterContext<'_>, subquery: &str) -> Result<()> {
        let tokens: Vec<&str> = subquery.split_whitespace().collect();
        let Some((op_name, rest)) = tokens.split_first() else {
            return Err(ctx.error("empty alter operation"));
        };
        let op_name = op_name.to_lowercase();

        let rest = match rest.first() {
            Some(t) if t.eq_ignore_ascii_case("column") => &rest[1..],
            _ => rest,
        };
        let target = rest.first().map(|t| t.to_lowercase());
        let is_skipped_target = target
            .as_deref()
            .is_some_and(|t| SKIPPED_TARGETS.contains(&t));

        match op_name.as_str() {
            "add" | "drop" if is_skipped_target => {
                info!("Skipping {} {} on {}", op_name, target.unwrap_or_default(), ctx.table_ref());
                Ok(())
            }
            "add" => self.convert_add_column(ctx, rest),
            "drop" => self.convert_drop_column(ctx, rest),
            "modify" => self.convert_modify_column(ctx, rest),
            "change" => self.convert_change_column(ctx, rest),
            "rename" => self.convert_rename(ctx, &tokens[1..], subquery),
            "alter" => Ok(()),
            op if op == "auto_increment" || op.starts_with("auto_increment=") => Ok(()),
            op => Err(ctx.error(format!(
                "operation {} not implement, query: {}",
                op, subquery
            ))),
        }
    }

    /// [name, type, params..., (AFTER col | FIRST)] 파싱
    fn parse_column_definition(
        &self,
        ctx: &AlterContext<'_>,
        definition: &str,
    ) -> Result<ColumnDefinition> {
        let mut tokens = tokenize_alter_query(definition);
        if tokens.len() < 2 {
            return Err(ctx.error(format!("wrong tokens count: {:?}", tokens)));
        }
        let position = extract_position(&mut tokens);
        if tokens.len() < 2 {
            return Err(ctx.error(format!("wrong tokens count: {:?}", tokens)));
        }

        let name = strip_sql_name(&tokens[0]).to_string();
        let (base_type, modifiers) = split_type_modifiers(&tokens[1]);
        let parameters = std::iter::once(modifiers)
            .chain(tokens[2..].iter().map(String::as_str))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let ch_type = self.mapper.convert_field_type(base_type, &parameters)?;
        let mysql_field = TableField::new(name.clone(), base_type)
            .with_parameters(parameters)
            .with_additional_data(EnumCodec::parse_enum_or_set_field(base_type)?);

        Ok(ColumnDefinition {
            name,
            mysql_field,
            ch_type,
            position,
        })
    }

    fn convert_add_column(&self, ctx: &mut AlterContext<'_>, tokens: &[&str]) -> Result<()> {
        let column = self.parse_column_definition(ctx, &tokens.join(" "))?;
        let ch_field = TableField::new(column.name.clone(), column.ch_type.clone());

        // 위치 미지정 시 현재 마지막 컬럼 뒤
        let position = match (&column.position, ctx.pair.as_deref()) {
            (None, Some(pair)) => pair
                .mysql
                .fields
                .last()
                .map(|f| ColumnPosition::After(f.name.clone())),
            (position, _) => position.clone(),
        };

        if let Some(pair) = ctx.pair.as_deref_mut() {
            pair.add_field(column.mysql_field, ch_field, position.as_ref())?;
        }

        let statement = format!(
            "ALTER TABLE {} ADD COLUMN `{}` {}{}",
            ctx.table_ref(),
            column.name,
            column.ch_type,
            position_clause(position.as_ref())
        );
        debug!("Translated add column: {}", statement);
        ctx.statements.push(statement);
        Ok(())
    }

    fn convert_drop_column(&self, ctx: &mut AlterContext<'_>, tokens: &[&str]) -> Result<()> {
        let Some(name) = tokens.first().map(|t| strip_sql_name(t).to_string()) else {
            return Err(ctx.error("missing column name for drop"));
        };

        if let Some(pair) = ctx.pair.as_deref_mut() {
            pair.remove_field(&name)?;
        }

        let statement = format!("ALTER TABLE {} DROP COLUMN `{}`", ctx.table_ref(), name);
        debug!("Translated drop column: {}", statement);
        ctx.statements.push(statement);
        Ok(())
    }

    fn convert_modify_column(&self, ctx: &mut AlterContext<'_>, tokens: &[&str]) -> Result<()> {
        let column = self.parse_column_definition(ctx, &tokens.join(" "))?;
        let ch_field = TableField::new(column.name.clone(), column.ch_type.clone());

        if let Some(pair) = ctx.pair.as_deref_mut() {
            pair.replace_field(
                &column.name,
                column.mysql_field,
                ch_field,
                column.position.as_ref(),
            )?;
        }

        let statement = format!(
            "ALTER TABLE {} MODIFY COLUMN `{}` {}{}",
            ctx.table_ref(),
            column.name,
            column.ch_type,
            position_clause(column.position.as_ref())
        );
        debug!("Translated modify column: {}", statement);
        ctx.statements.push(statement);
        Ok(())
    }

    /// `RENAME COLUMN a TO b`만 지원. `RENAME INDEX|KEY`는 무시, 테이블 이름 변경은 실패
    fn convert_rename(
        &self,
        ctx: &mut AlterContext<'_>,
        tokens: &[&str],
        subquery: &str,
    ) -> Result<()> {
        match tokens {
            [kind, old_name, to, new_name]
                if kind.eq_ignore_ascii_case("column") && to.eq_ignore_ascii_case("to") =>
            {
                let old_name = strip_sql_name(old_name).to_string();
                let new_name = strip_sql_name(new_name).to_string();
                if let Some(pair) = ctx.pair.as_deref_mut() {
                    pair.rename_field(&old_name, &new_name)?;
                }

                let statement = format!(
                    "ALTER TABLE {} RENAME COLUMN `{}` TO `{}`",
                    ctx.table_ref(),
                    old_name,
                    new_name
                );
                debug!("Translated rename column: {}", statement);
                ctx.statements.push(statement);
                Ok(())
            }
            [kind, ..] if kind.eq_ignore_ascii_case("index") || kind.eq_ignore_ascii_case("key") => {
                info!("Skipping rename {} on {}", kind.to_lowercase(), ctx.table_ref());
                Ok(())
            }
            _ => Err(ctx.error(format!(
                "operation rename not implement, query: {}",
                subquery
            ))),
        }
    }

    fn convert_change_column(&self, ctx: &mut AlterContext<'_>, tokens: &[&str]) -> Result<()> {
        let Some((old_name, definition)) = tokens.split_first() else {
            return Err(ctx.error("missing column name for change"));
        };
        let old_name = strip_sql_name(old_name).to_string();
        let column = self.parse_column_definition(ctx, &definition.join(" "))?;
        let ch_field = TableField::new(column.name.clone(), column.ch_type.clone());

        if let Some(pair) = ctx.pair.as_deref_mut() {
            if old_name != column.name && pair.mysql.has_field(&column.name) {
                return Err(ctx.error(format!("column `{}` already exists", column.name)));
            }
            pair.replace_field(
                &old_name,
                column.mysql_field,
                ch_field,
                column.position.as_ref(),
            )?;
        }

        if old_name != column.name {
            let statement = format!(
                "ALTER TABLE {} RENAME COLUMN `{}` TO `{}`",
                ctx.table_ref(),
                old_name,
                column.name
            );
            debug!("Translated rename column: {}", statement);
            ctx.statements.push(statement);
        }

        let statement = format!(
            "ALTER TABLE {} MODIFY COLUMN `{}` {}{}",
            ctx.table_ref(),
            column.name,
            column.ch_type,
            position_clause(column.position.as_ref())
        );
        debug!("Translated change column: {}", statement);
        ctx.statements.push(statement);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableStructure;

    fn translator() -> DdlTranslator {
        DdlTranslator::new(ConverterConfig::default()).unwrap()
    }

    fn pair(names: &[&str]) -> SchemaPair {
        let mut mysql = TableStructure::new("t");
        mysql.fields = names.iter().map(|n| TableField::new(*n, "int")).collect();
        mysql.primary_keys = vec![names[0].to_string()];
        TypeMapper::default().schema_pair(mysql).unwrap()
    }

    fn names(s: &TableStructure) -> Vec<&str> {
        s.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_split_high_level() {
        assert_eq!(
            split_high_level("ADD COLUMN a NUMERIC(5,2), ADD COLUMN b INT", ','),
            vec!["ADD COLUMN a NUMERIC(5,2)", "ADD COLUMN b INT"]
        );
        assert_eq!(
            split_high_level("ADD c enum('x,y','z'), DROP d", ','),
            vec!["ADD c enum('x,y','z')", "DROP d"]
        );
        assert_eq!(
            split_high_level(r"ADD c enum('a\'b','x'), DROP d", ','),
            vec![r"ADD c enum('a\'b','x')", "DROP d"]
        );
    }

    #[test]
    fn test_tokenize_alter_query() {
        assert_eq!(
            tokenize_alter_query("`price` DOUBLE PRECISION NOT NULL DEFAULT 0"),
            vec!["`price`", "DOUBLE PRECISION", "NOT", "NULL", "DEFAULT", "0"]
        );
        assert_eq!(
            tokenize_alter_query("amount NUMERIC(5, 2) AFTER id"),
            vec!["amount", "NUMERIC(5, 2)", "AFTER", "id"]
        );
        assert_eq!(
            tokenize_alter_query("note varchar(10) COMMENT 'hello world'"),
            vec!["note", "varchar(10)", "COMMENT", "'hello world'"]
        );
        assert!(tokenize_alter_query("").is_empty());
    }

    #[test]
    fn test_strip_sql_comments() {
        assert_eq!(
            strip_sql_comments("ALTER TABLE t /* note */ ADD c INT -- trailing\n").unwrap(),
            "ALTER TABLE t   ADD c INT"
        );
        assert_eq!(
            strip_sql_comments("ALTER TABLE t ADD c INT COMMENT 'a -- b'").unwrap(),
            "ALTER TABLE t ADD c INT COMMENT 'a -- b'"
        );
        assert_eq!(
            strip_sql_comments(r"ALTER TABLE `t` ADD c enum('a\'b') # note").unwrap(),
            r"ALTER TABLE `t` ADD c enum('a\'b')"
        );
        assert!(strip_sql_comments("ALTER TABLE t ADD c enum('open").is_err());
    }

    #[test]
    fn test_add_column_after() {
        let mut p = pair(&["a", "b"]);
        let outcome = translator()
            .convert_alter_query("ALTER TABLE t ADD COLUMN c VARCHAR(10) AFTER b", "db", Some(&mut p))
            .unwrap();
        assert_eq!(names(&p.mysql), vec!["a", "b", "c"]);
        assert_eq!(names(&p.clickhouse), vec!["a", "b", "c"]);
        assert_eq!(p.clickhouse.fields[2].field_type, "Nullable(String)");
        assert_eq!(p.mysql.fields[2].field_type, "VARCHAR(10)");
        assert_eq!(
            outcome.statements(),
            &["ALTER TABLE `db`.`t` ADD COLUMN `c` Nullable(String) AFTER `b`".to_string()]
        );
    }

    #[test]
    fn test_add_column_first_and_default_position() {
        let mut p = pair(&["id", "name"]);
        let t = translator();
        t.convert_alter_query("ALTER TABLE `t` ADD COLUMN c1 INT FIRST;", "db", Some(&mut p))
            .unwrap();
        let outcome = t
            .convert_alter_query("ALTER TABLE `db`.`t` ADD c2 INT UNSIGNED NOT NULL", "db", Some(&mut p))
            .unwrap();
        assert_eq!(names(&p.mysql), vec!["c1", "id", "name", "c2"]);
        assert_eq!(names(&p.clickhouse), vec!["c1", "id", "name", "c2"]);
        assert_eq!(p.mysql.primary_key_ids, vec![1]);
        assert_eq!(p.clickhouse.primary_key_ids, vec![1]);
        assert_eq!(p.clickhouse.fields[3].field_type, "UInt32");
        assert_eq!(p.mysql.fields[3].parameters, "UNSIGNED NOT NULL");
        assert_eq!(
            outcome.statements(),
            &["ALTER TABLE `db`.`t` ADD COLUMN `c2` UInt32 AFTER `name`".to_string()]
        );
    }

    #[test]
    fn test_multiple_subqueries_keep_parity() {
        let mut p = pair(&["id", "a", "b"]);
        let outcome = translator()
            .convert_alter_query(
                "ALTER TABLE t ADD COLUMN x NUMERIC(5,2), DROP COLUMN a, MODIFY b BIGINT NOT NULL, \
                 ADD INDEX idx_b (b), ADD CONSTRAINT fk FOREIGN KEY (b) REFERENCES o(id)",
                "db",
                Some(&mut p),
            )
            .unwrap();
        assert_eq!(names(&p.mysql), vec!["id", "b", "x"]);
        p.check_parity().unwrap();
        assert_eq!(
            p.clickhouse.field_types(),
            vec!["Nullable(Int32)", "Int64", "Nullable(Decimal(5, 2))"]
        );
        assert_eq!(outcome.statements().len(), 3);
    }

    #[test]
    fn test_change_column_renames_both_mirrors() {
        let mut p = pair(&["id", "old_name"]);
        let outcome = translator()
            .convert_alter_query(
                "ALTER TABLE t CHANGE COLUMN `old_name` `new_name` varchar(50) DEFAULT 'x'",
                "db",
                Some(&mut p),
            )
            .unwrap();
        assert_eq!(names(&p.mysql), vec!["id", "new_name"]);
        assert_eq!(names(&p.clickhouse), vec!["id", "new_name"]);
        assert_eq!(
            outcome.statements(),
            &[
                "ALTER TABLE `db`.`t` RENAME COLUMN `old_name` TO `new_name`".to_string(),
                "ALTER TABLE `db`.`t` MODIFY COLUMN `new_name` Nullable(String)".to_string(),
            ]
        );
    }

    #[test]
    fn test_enum_column_gets_labels() {
        let mut p = pair(&["id"]);
        translator()
            .convert_alter_query(
                "ALTER TABLE t ADD COLUMN status enum('Active','Inactive') DEFAULT 'Active'",
                "db",
                Some(&mut p),
            )
            .unwrap();
        assert_eq!(
            p.mysql.fields[1].additional_data,
            Some(vec!["Active".to_string(), "Inactive".to_string()])
        );
        assert_eq!(
            p.clickhouse.fields[1].field_type,
            "Nullable(Enum8('active' = 1, 'inactive' = 2))"
        );
    }

    #[test]
    fn test_noop_operations() {
        let mut p = pair(&["id"]);
        let outcome = translator()
            .convert_alter_query(
                "ALTER TABLE t ALTER COLUMN id SET DEFAULT 1, AUTO_INCREMENT=100",
                "db",
                Some(&mut p),
            )
            .unwrap();
        assert_eq!(outcome, AlterOutcome::Applied(Vec::new()));
    }

    #[test]
    fn test_unsupported_operation_fails_without_mutation() {
        let mut p = pair(&["id", "a"]);
        let before = p.clone();
        let err = translator()
            .convert_alter_query(
                "ALTER TABLE t ADD COLUMN z INT, RENAME TO t2",
                "db",
                Some(&mut p),
            )
            .unwrap_err();
        match err {
            ConvertError::MalformedDdl { reason, query } => {
                assert!(reason.contains("rename"));
                assert!(query.contains("RENAME TO t2"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(p, before);
    }

    #[test]
    fn test_invalid_statements() {
        let t = translator();
        assert!(t.convert_alter_query("ALTER TABLE t ADD a INT; DROP TABLE t;", "db", None).is_err());
        assert!(t.convert_alter_query("CREATE TABLE t (id int)", "db", None).is_err());
        assert!(t.convert_alter_query("ALTER VIEW v AS SELECT 1", "db", None).is_err());
        let mut p = pair(&["id"]);
        assert!(t
            .convert_alter_query("ALTER TABLE t DROP COLUMN missing", "db", Some(&mut p))
            .is_err());
        assert!(t
            .convert_alter_query("ALTER TABLE t ADD c INT AFTER missing", "db", Some(&mut p))
            .is_err());
        assert_eq!(names(&p.mysql), vec!["id"]);
    }

    #[test]
    fn test_filtered_table_is_skipped() {
        let config = ConverterConfig {
            exclude_tables: vec!["_*_new".to_string()],
            ..Default::default()
        };
        let t = DdlTranslator::new(config).unwrap();
        let mut p = pair(&["id"]);
        let outcome = t
            .convert_alter_query("ALTER TABLE `db`.`_t_new` ADD COLUMN c1 INT;", "db", Some(&mut p))
            .unwrap();
        assert!(outcome.is_skipped());
        assert_eq!(names(&p.mysql), vec!["id"]);
    }

    #[test]
    fn test_database_alias() {
        let t = DdlTranslator::new(ConverterConfig::new().with_database_alias("src", "dst")).unwrap();
        let outcome = t
            .convert_alter_query("alter table src.t drop column a", "src", None)
            .unwrap();
        assert_eq!(
            outcome.statements(),
            &["ALTER TABLE `dst`.`t` DROP COLUMN `a`".to_string()]
        );
    }

    #[test]
    fn test_escaped_quote_does_not_swallow_next_operation() {
        let mut p = pair(&["id", "d"]);
        let outcome = translator()
            .convert_alter_query(
                r"ALTER TABLE t ADD COLUMN c enum('a\'b','x'), DROP COLUMN d",
                "db",
                Some(&mut p),
            )
            .unwrap();
        assert_eq!(names(&p.mysql), vec!["id", "c"]);
        assert_eq!(names(&p.clickhouse), vec!["id", "c"]);
        assert_eq!(
            p.mysql.fields[1].additional_data,
            Some(vec!["a'b".to_string(), "x".to_string()])
        );
        assert_eq!(outcome.statements().len(), 2);
        assert_eq!(outcome.statements()[1], "ALTER TABLE `db`.`t` DROP COLUMN `d`");
    }

    #[test]
    fn test_rename_column() {
        let mut p = pair(&["id", "a"]);
        let t = translator();
        let outcome = t
            .convert_alter_query(
                "ALTER TABLE t RENAME COLUMN a TO b, RENAME COLUMN `id` TO `uid`",
                "db",
                Some(&mut p),
            )
            .unwrap();
        assert_eq!(names(&p.mysql), vec!["uid", "b"]);
        assert_eq!(names(&p.clickhouse), vec!["uid", "b"]);
        assert_eq!(p.clickhouse.field_types(), vec!["Nullable(Int32)", "Nullable(Int32)"]);
        assert_eq!(p.mysql.primary_keys, vec!["uid".to_string()]);
        assert_eq!(p.clickhouse.primary_key_ids, vec![0]);
        assert_eq!(
            outcome.statements(),
            &[
                "ALTER TABLE `db`.`t` RENAME COLUMN `a` TO `b`".to_string(),
                "ALTER TABLE `db`.`t` RENAME COLUMN `id` TO `uid`".to_string(),
            ]
        );

        let outcome = t
            .convert_alter_query("ALTER TABLE t RENAME INDEX idx_a TO idx_b", "db", Some(&mut p))
            .unwrap();
        assert_eq!(outcome, AlterOutcome::Applied(Vec::new()));

        let before = p.clone();
        assert!(t
            .convert_alter_query("ALTER TABLE t RENAME COLUMN missing TO c", "db", Some(&mut p))
            .is_err());
        assert!(t
            .convert_alter_query("ALTER TABLE t RENAME AS t2", "db", Some(&mut p))
            .is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn test_change_primary_key_column_keeps_key() {
        let mut p = pair(&["id", "a"]);
        translator()
            .convert_alter_query(
                "ALTER TABLE t CHANGE id order_id BIGINT NOT NULL",
                "db",
                Some(&mut p),
            )
            .unwrap();
        assert_eq!(p.mysql.primary_keys, vec!["order_id".to_string()]);
        assert_eq!(p.mysql.primary_key_ids, vec![0]);
        assert_eq!(p.clickhouse.fields[0].field_type, "Int64");
    }
}
