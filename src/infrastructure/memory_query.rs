// SQL-subset evaluator over in-memory JSON rows
//
// Grammar:
//   SELECT * | col [, col ...]
//   FROM ?
//   [WHERE field <op> literal | :param]     op: = != < <= > >=
//   [ORDER BY field [ASC | DESC]]
//   [LIMIT n]
//
// String literals are single-quoted. Named `:param` placeholders are
// resolved against the caller-supplied params map.
use crate::application::query_engine::{QueryError, TabularQueryEngine};
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub struct MemoryQueryEngine;

impl TabularQueryEngine for MemoryQueryEngine {
    fn evaluate(
        &self,
        query: &str,
        rows: &[Value],
        params: Option<&Map<String, Value>>,
    ) -> Result<Value, QueryError> {
        let parsed = parse(&tokenize(query)?)?;

        let mut selected: Vec<Value> = Vec::new();
        for row in rows {
            let keep = match &parsed.filter {
                Some(filter) => {
                    let right = filter.operand.resolve(params)?;
                    matches(&filter.op, row.get(&filter.field), &right)
                }
                None => true,
            };
            if keep {
                selected.push(row.clone());
            }
        }

        if let Some(order) = &parsed.order_by {
            selected.sort_by(|a, b| {
                let cmp = compare_values(a.get(&order.field), b.get(&order.field));
                if order.descending { cmp.reverse() } else { cmp }
            });
        }

        if let Some(limit) = parsed.limit {
            selected.truncate(limit);
        }

        if let Projection::Columns(columns) = &parsed.projection {
            selected = selected
                .into_iter()
                .map(|row| {
                    let mut out = Map::new();
                    for column in columns {
                        let value = row.get(column).cloned().unwrap_or(Value::Null);
                        out.insert(column.clone(), value);
                    }
                    Value::Object(out)
                })
                .collect();
        }

        Ok(Value::Array(selected))
    }
}

enum Projection {
    All,
    Columns(Vec<String>),
}

enum Operand {
    Literal(Value),
    Param(String),
}

impl Operand {
    fn resolve(&self, params: Option<&Map<String, Value>>) -> Result<Value, QueryError> {
        match self {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Param(name) => params
                .and_then(|p| p.get(name))
                .cloned()
                .ok_or_else(|| QueryError::UnboundParam(name.clone())),
        }
    }
}

struct Filter {
    field: String,
    op: String,
    operand: Operand,
}

struct OrderBy {
    field: String,
    descending: bool,
}

struct ParsedQuery {
    projection: Projection,
    filter: Option<Filter>,
    order_by: Option<OrderBy>,
    limit: Option<usize>,
}

fn tokenize(input: &str) -> Result<Vec<String>, QueryError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == ',' {
            chars.next();
            tokens.push(",".to_string());
        } else if c == '\'' {
            chars.next();
            let mut literal = String::from("'");
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '\'' {
                    closed = true;
                    break;
                }
                literal.push(ch);
            }
            if !closed {
                return Err(QueryError::Parse("unterminated string literal".to_string()));
            }
            literal.push('\'');
            tokens.push(literal);
        } else if matches!(c, '=' | '!' | '<' | '>') {
            let mut op = String::new();
            while let Some(&ch) = chars.peek() {
                if !matches!(ch, '=' | '!' | '<' | '>') {
                    break;
                }
                op.push(ch);
                chars.next();
            }
            tokens.push(op);
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() || matches!(ch, ',' | '\'' | '=' | '!' | '<' | '>') {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            tokens.push(word);
        }
    }
    Ok(tokens)
}

fn parse(tokens: &[String]) -> Result<ParsedQuery, QueryError> {
    let mut pos = 0;

    expect_keyword(tokens, &mut pos, "SELECT")?;

    let projection = if tokens.get(pos).is_some_and(|t| t == "*") {
        pos += 1;
        Projection::All
    } else {
        let mut columns = Vec::new();
        loop {
            let column = next_token(tokens, &mut pos, "column name")?;
            columns.push(column.clone());
            if tokens.get(pos).is_some_and(|t| t == ",") {
                pos += 1;
            } else {
                break;
            }
        }
        Projection::Columns(columns)
    };

    expect_keyword(tokens, &mut pos, "FROM")?;
    let table = next_token(tokens, &mut pos, "table placeholder")?;
    if table != "?" {
        return Err(QueryError::Parse(format!(
            "expected `?` as the table, found `{table}`"
        )));
    }

    let mut filter = None;
    if peek_keyword(tokens, pos, "WHERE") {
        pos += 1;
        let field = next_token(tokens, &mut pos, "filter field")?.clone();
        let op = next_token(tokens, &mut pos, "comparison operator")?.clone();
        if !matches!(op.as_str(), "=" | "!=" | "<" | "<=" | ">" | ">=") {
            return Err(QueryError::Parse(format!("unknown operator `{op}`")));
        }
        let operand_token = next_token(tokens, &mut pos, "comparison value")?;
        filter = Some(Filter {
            field,
            op,
            operand: parse_operand(operand_token)?,
        });
    }

    let mut order_by = None;
    if peek_keyword(tokens, pos, "ORDER") {
        pos += 1;
        expect_keyword(tokens, &mut pos, "BY")?;
        let field = next_token(tokens, &mut pos, "sort field")?.clone();
        let mut descending = false;
        if peek_keyword(tokens, pos, "ASC") {
            pos += 1;
        } else if peek_keyword(tokens, pos, "DESC") {
            pos += 1;
            descending = true;
        }
        order_by = Some(OrderBy { field, descending });
    }

    let mut limit = None;
    if peek_keyword(tokens, pos, "LIMIT") {
        pos += 1;
        let count = next_token(tokens, &mut pos, "limit count")?;
        limit = Some(
            count
                .parse::<usize>()
                .map_err(|_| QueryError::Parse(format!("invalid LIMIT value `{count}`")))?,
        );
    }

    if pos < tokens.len() {
        return Err(QueryError::Parse(format!(
            "unexpected token `{}`",
            tokens[pos]
        )));
    }

    Ok(ParsedQuery {
        projection,
        filter,
        order_by,
        limit,
    })
}

fn expect_keyword(tokens: &[String], pos: &mut usize, keyword: &str) -> Result<(), QueryError> {
    if peek_keyword(tokens, *pos, keyword) {
        *pos += 1;
        Ok(())
    } else {
        Err(QueryError::Parse(format!(
            "expected `{keyword}`, found `{}`",
            tokens.get(*pos).map(String::as_str).unwrap_or("end of query")
        )))
    }
}

fn peek_keyword(tokens: &[String], pos: usize, keyword: &str) -> bool {
    tokens
        .get(pos)
        .is_some_and(|t| t.eq_ignore_ascii_case(keyword))
}

fn next_token<'a>(
    tokens: &'a [String],
    pos: &mut usize,
    what: &str,
) -> Result<&'a String, QueryError> {
    let token = tokens
        .get(*pos)
        .ok_or_else(|| QueryError::Parse(format!("expected {what}, found end of query")))?;
    *pos += 1;
    Ok(token)
}

fn parse_operand(token: &str) -> Result<Operand, QueryError> {
    if let Some(name) = token.strip_prefix(':') {
        if name.is_empty() {
            return Err(QueryError::Parse("empty parameter name".to_string()));
        }
        return Ok(Operand::Param(name.to_string()));
    }
    if let Some(inner) = token.strip_prefix('\'') {
        return Ok(Operand::Literal(Value::String(
            inner.trim_end_matches('\'').to_string(),
        )));
    }
    match token.to_ascii_lowercase().as_str() {
        "true" => return Ok(Operand::Literal(Value::Bool(true))),
        "false" => return Ok(Operand::Literal(Value::Bool(false))),
        "null" => return Ok(Operand::Literal(Value::Null)),
        _ => {}
    }
    serde_json::from_str::<Value>(token)
        .ok()
        .filter(Value::is_number)
        .map(Operand::Literal)
        .ok_or_else(|| QueryError::Parse(format!("invalid literal `{token}`")))
}

fn matches(op: &str, left: Option<&Value>, right: &Value) -> bool {
    let left = left.unwrap_or(&Value::Null);
    match op {
        "=" => loosely_equal(left, right),
        "!=" => !loosely_equal(left, right),
        _ => match ordering(left, right) {
            Some(cmp) => match op {
                "<" => cmp == Ordering::Less,
                "<=" => cmp != Ordering::Greater,
                ">" => cmp == Ordering::Greater,
                ">=" => cmp != Ordering::Less,
                _ => false,
            },
            None => false,
        },
    }
}

// Integer and float encodings of the same number compare equal
fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return a.partial_cmp(&b);
    }
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Some(a.cmp(b));
    }
    None
}

/// Missing or incomparable sort keys sink to the end.
fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => ordering(a, b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({"city": "Oslo", "pop": 700, "capital": true}),
            json!({"city": "Bergen", "pop": 290, "capital": false}),
            json!({"city": "Trondheim", "pop": 210, "capital": false}),
        ]
    }

    fn run(query: &str) -> Result<Value, QueryError> {
        MemoryQueryEngine.evaluate(query, &rows(), None)
    }

    #[test]
    fn test_select_star_passes_rows_through() {
        assert_eq!(run("SELECT * FROM ?").unwrap(), Value::Array(rows()));
    }

    #[test]
    fn test_projection() {
        let out = run("SELECT city FROM ? LIMIT 1").unwrap();
        assert_eq!(out, json!([{"city": "Oslo"}]));
    }

    #[test]
    fn test_where_with_number_literal() {
        let out = run("SELECT city FROM ? WHERE pop > 250").unwrap();
        assert_eq!(out, json!([{"city": "Oslo"}, {"city": "Bergen"}]));
    }

    #[test]
    fn test_where_with_string_literal() {
        let out = run("SELECT pop FROM ? WHERE city = 'Bergen'").unwrap();
        assert_eq!(out, json!([{"pop": 290}]));
    }

    #[test]
    fn test_where_with_bool_and_no_spaces_around_operator() {
        let out = run("SELECT city FROM ? WHERE capital=true").unwrap();
        assert_eq!(out, json!([{"city": "Oslo"}]));
    }

    #[test]
    fn test_order_by_desc_and_limit() {
        let out = run("SELECT city FROM ? ORDER BY pop DESC LIMIT 2").unwrap();
        assert_eq!(out, json!([{"city": "Oslo"}, {"city": "Bergen"}]));
    }

    #[test]
    fn test_order_by_string_ascending() {
        let out = run("SELECT city FROM ? ORDER BY city").unwrap();
        assert_eq!(
            out,
            json!([{"city": "Bergen"}, {"city": "Oslo"}, {"city": "Trondheim"}])
        );
    }

    #[test]
    fn test_named_param_binding() {
        let params: Map<String, Value> =
            serde_json::from_value(json!({"min": 250})).unwrap();
        let out = MemoryQueryEngine
            .evaluate("SELECT city FROM ? WHERE pop >= :min", &rows(), Some(&params))
            .unwrap();
        assert_eq!(out, json!([{"city": "Oslo"}, {"city": "Bergen"}]));
    }

    #[test]
    fn test_unbound_param() {
        let err = run("SELECT * FROM ? WHERE pop > :min").unwrap_err();
        assert!(matches!(err, QueryError::UnboundParam(name) if name == "min"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(run("DELETE FROM ?"), Err(QueryError::Parse(_))));
        assert!(matches!(run("SELECT * FROM t"), Err(QueryError::Parse(_))));
        assert!(matches!(
            run("SELECT * FROM ? WHERE pop ~ 1"),
            Err(QueryError::Parse(_))
        ));
        assert!(matches!(
            run("SELECT * FROM ? LIMIT many"),
            Err(QueryError::Parse(_))
        ));
        assert!(matches!(
            run("SELECT * FROM ? trailing"),
            Err(QueryError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_field_never_matches_ordering_filters() {
        let out = run("SELECT * FROM ? WHERE altitude > 0").unwrap();
        assert_eq!(out, json!([]));
    }

    #[test]
    fn test_projection_fills_missing_columns_with_null() {
        let out = run("SELECT city, altitude FROM ? LIMIT 1").unwrap();
        assert_eq!(out, json!([{"city": "Oslo", "altitude": null}]));
    }
}
