//! Statement builders for the relational store.
//!
//! Each builder produces one parameterized statement. Identifiers are quoted,
//! values are always bound; only the field names a document actually carries
//! end up in the SQL text.

use crate::core::{Document, PageRequest, QueryOptions, Sort};
use crate::storage::codec::normalize;
use rusqlite::types::Value as SqlValue;

/// SQL text plus its bound parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<SqlValue>,
}

/// Quotes a table or column name.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builds ` WHERE a = ? AND b = ?`, or an empty string for an empty query.
fn where_clause(query: &Document, options: QueryOptions, params: &mut Vec<SqlValue>) -> String {
    if query.is_empty() {
        return String::new();
    }

    let predicates = query
        .iter()
        .map(|(field, value)| {
            params.push(normalize(value));
            format!("{} {} ?", quote_identifier(field), options.operator.as_sql())
        })
        .collect::<Vec<_>>()
        .join(&format!(" {} ", options.logic.as_sql()));

    format!(" WHERE {predicates}")
}

fn order_clause(sort: &Sort) -> String {
    if sort.is_empty() {
        return String::new();
    }

    let fields = sort
        .iter()
        .map(|(field, direction)| format!("{} {}", quote_identifier(field), direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(" ORDER BY {fields}")
}

/// `INSERT INTO t (fields...) VALUES (?...)`.
#[must_use]
pub fn insert(table: &str, document: &Document) -> Statement {
    let columns = document
        .keys()
        .map(|k| quote_identifier(k))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; document.len()].join(", ");

    Statement {
        sql: format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            quote_identifier(table)
        ),
        params: document.values().map(normalize).collect(),
    }
}

/// `UPDATE t SET f = ?... WHERE q = ? AND ...`.
///
/// Patch parameters come first, then query parameters.
#[must_use]
pub fn update(table: &str, query: &Document, patch: &Document) -> Statement {
    let mut params: Vec<SqlValue> = patch.values().map(normalize).collect();
    let assignments = patch
        .keys()
        .map(|k| format!("{} = ?", quote_identifier(k)))
        .collect::<Vec<_>>()
        .join(", ");
    let predicate = where_clause(query, QueryOptions::default(), &mut params);

    Statement {
        sql: format!(
            "UPDATE {} SET {assignments}{predicate}",
            quote_identifier(table)
        ),
        params,
    }
}

/// `DELETE FROM t WHERE ...`.
#[must_use]
pub fn delete(table: &str, query: &Document, options: QueryOptions) -> Statement {
    let mut params = Vec::with_capacity(query.len());
    let predicate = where_clause(query, options, &mut params);

    Statement {
        sql: format!("DELETE FROM {}{predicate}", quote_identifier(table)),
        params,
    }
}

/// `SELECT * FROM t WHERE ... LIMIT 1` with equality predicates.
#[must_use]
pub fn select_one(table: &str, query: &Document) -> Statement {
    let mut params = Vec::with_capacity(query.len());
    let predicate = where_clause(query, QueryOptions::default(), &mut params);

    Statement {
        sql: format!("SELECT * FROM {}{predicate} LIMIT 1", quote_identifier(table)),
        params,
    }
}

/// `SELECT * FROM t WHERE ... ORDER BY ... LIMIT n OFFSET m`.
#[must_use]
pub fn select_page(
    table: &str,
    query: &Document,
    page: PageRequest,
    sort: &Sort,
    options: QueryOptions,
) -> Statement {
    let mut params = Vec::with_capacity(query.len());
    let predicate = where_clause(query, options, &mut params);

    Statement {
        sql: format!(
            "SELECT * FROM {}{predicate}{} LIMIT {} OFFSET {}",
            quote_identifier(table),
            order_clause(sort),
            page.limit,
            page.offset()
        ),
        params,
    }
}

/// `SELECT COUNT(*) AS count FROM t WHERE ...`.
#[must_use]
pub fn count(table: &str, query: &Document, options: QueryOptions) -> Statement {
    let mut params = Vec::with_capacity(query.len());
    let predicate = where_clause(query, options, &mut params);

    Statement {
        sql: format!(
            "SELECT COUNT(*) AS count FROM {}{predicate}",
            quote_identifier(table)
        ),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Logic, Operator, SortDirection, document};

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("items"), "\"items\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_insert_statement() {
        let doc = document([("name", "a"), ("kind", "b")]);
        let stmt = insert("items", &doc);
        assert_eq!(
            stmt.sql,
            r#"INSERT INTO "items" ("kind", "name") VALUES (?, ?)"#
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Text("b".to_string()),
                SqlValue::Text("a".to_string())
            ]
        );
    }

    #[test]
    fn test_update_statement_param_order() {
        let query = document([("id", "42")]);
        let patch = document([("status", "done")]);
        let stmt = update("items", &query, &patch);
        assert_eq!(
            stmt.sql,
            r#"UPDATE "items" SET "status" = ? WHERE "id" = ?"#
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Text("done".to_string()),
                SqlValue::Text("42".to_string())
            ]
        );
    }

    #[test]
    fn test_delete_with_options() {
        let query = document([("a", 1i64), ("b", 2i64)]);
        let stmt = delete("items", &query, QueryOptions::new(Operator::Gt, Logic::Or));
        assert_eq!(stmt.sql, r#"DELETE FROM "items" WHERE "a" > ? OR "b" > ?"#);
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn test_select_one() {
        let stmt = select_one("items", &document([("id", "x")]));
        assert_eq!(stmt.sql, r#"SELECT * FROM "items" WHERE "id" = ? LIMIT 1"#);

        let stmt = select_one("items", &Document::new());
        assert_eq!(stmt.sql, r#"SELECT * FROM "items" LIMIT 1"#);
    }

    #[test]
    fn test_select_page_defaults() {
        let stmt = select_page(
            "items",
            &Document::new(),
            PageRequest::new(2, 10),
            &Sort::default(),
            QueryOptions::default(),
        );
        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "items" ORDER BY "updatedAt" DESC, "createdAt" DESC LIMIT 10 OFFSET 10"#
        );
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_page_with_predicate_and_sort() {
        let stmt = select_page(
            "items",
            &document([("status", "open")]),
            PageRequest::new(1, 5),
            &Sort::by("name", SortDirection::Asc),
            QueryOptions::new(Operator::Ne, Logic::And),
        );
        assert_eq!(
            stmt.sql,
            r#"SELECT * FROM "items" WHERE "status" != ? ORDER BY "name" ASC LIMIT 5 OFFSET 0"#
        );
        assert_eq!(stmt.params, vec![SqlValue::Text("open".to_string())]);
    }

    #[test]
    fn test_select_page_without_sort() {
        let stmt = select_page(
            "items",
            &Document::new(),
            PageRequest::new(1, 5),
            &Sort::none(),
            QueryOptions::default(),
        );
        assert_eq!(stmt.sql, r#"SELECT * FROM "items" LIMIT 5 OFFSET 0"#);
    }

    #[test]
    fn test_count_statement() {
        let stmt = count("items", &Document::new(), QueryOptions::default());
        assert_eq!(stmt.sql, r#"SELECT COUNT(*) AS count FROM "items""#);

        let stmt = count(
            "items",
            &document([("name", "a%")]),
            QueryOptions::new(Operator::Like, Logic::And),
        );
        assert_eq!(
            stmt.sql,
            r#"SELECT COUNT(*) AS count FROM "items" WHERE "name" LIKE ?"#
        );
    }

    #[test]
    fn test_structured_query_value_is_normalized() {
        let query = document([("meta", serde_json::json!({"x": 1}))]);
        let stmt = select_one("items", &query);
        assert_eq!(stmt.params, vec![SqlValue::Text(r#"{"x":1}"#.to_string())]);
    }
}
