//! Select/filter/order/limit description shared by every store.
//!
//! `to_params` renders PostgREST query parameters; `Filter::matches` and
//! `Query::apply` evaluate the same description over in-memory rows.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, String),
    IsNull(String),
    In(String, Vec<String>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Filter::Eq(column.to_string(), value.to_string())
    }

    pub fn is_null(column: &str) -> Self {
        Filter::IsNull(column.to_string())
    }

    pub fn is_in(column: &str, values: &[String]) -> Self {
        Filter::In(column.to_string(), values.to_vec())
    }

    /// `col.op.value` form used inside `or=(...)`.
    fn inner_expr(&self) -> String {
        match self {
            Filter::Eq(c, v)   => format!("{c}.eq.{v}"),
            Filter::IsNull(c)  => format!("{c}.is.null"),
            Filter::In(c, vs)  => format!("{c}.in.({})", quote_list(vs)),
            Filter::Or(inner)  => format!("or({})", join_inner(inner)),
        }
    }

    fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq(c, v)  => (c.clone(), format!("eq.{v}")),
            Filter::IsNull(c) => (c.clone(), "is.null".to_string()),
            Filter::In(c, vs) => (c.clone(), format!("in.({})", quote_list(vs))),
            Filter::Or(inner) => ("or".to_string(), format!("({})", join_inner(inner))),
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(c, v)  => row.get(c).map_or(false, |field| scalar_eq(field, v)),
            Filter::IsNull(c) => row.get(c).map_or(true, Value::is_null),
            Filter::In(c, vs) => row
                .get(c)
                .map_or(false, |field| vs.iter().any(|v| scalar_eq(field, v))),
            Filter::Or(inner) => inner.iter().any(|f| f.matches(row)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column:    String,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub select:  String,
    pub filters: Vec<Filter>,
    pub order:   Option<Order>,
    pub limit:   Option<usize>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            select:  "*".to_string(),
            filters: Vec::new(),
            order:   None,
            limit:   None,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.to_string();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order { column: column.to_string(), ascending });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), compact_select(&self.select))];
        params.extend(self.filters.iter().map(Filter::to_param));
        if let Some(order) = &self.order {
            let dir = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, dir)));
        }
        if let Some(n) = self.limit {
            params.push(("limit".to_string(), n.to_string()));
        }
        params
    }

    /// Filter, order and limit rows in memory. Embedded selects are not
    /// resolved; rows are returned whole.
    pub fn apply(&self, rows: &[Value]) -> Vec<Value> {
        let mut out: Vec<Value> = rows
            .iter()
            .filter(|row| self.filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();

        if let Some(order) = &self.order {
            out.sort_by(|a, b| {
                let ord = compare_fields(a.get(&order.column), b.get(&order.column));
                if order.ascending { ord } else { ord.reverse() }
            });
        }
        if let Some(n) = self.limit {
            out.truncate(n);
        }
        out
    }
}

fn join_inner(filters: &[Filter]) -> String {
    filters.iter().map(Filter::inner_expr).collect::<Vec<_>>().join(",")
}

fn quote_list(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(",")
}

/// PostgREST rejects whitespace in select lists.
fn compact_select(select: &str) -> String {
    select.chars().filter(|c| !c.is_whitespace()).collect()
}

fn scalar_eq(field: &Value, expected: &str) -> bool {
    match field {
        Value::String(s) => s == expected,
        Value::Bool(b)   => b.to_string() == expected,
        Value::Number(n) => n.to_string() == expected,
        _ => false,
    }
}

// Nulls sort last in both directions of the comparator's ascending form.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None)       => Ordering::Equal,
        (None, Some(_))    => Ordering::Greater,
        (Some(_), None)    => Ordering::Less,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(dx), Ok(dy)) => dx.cmp(&dy),
                _ => x.to_lowercase().cmp(&y.to_lowercase()),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn route_targeting_renders_or_group() {
        let q = Query::new()
            .eq("is_active", true)
            .filter(Filter::Or(vec![
                Filter::eq("target_page", "/live"),
                Filter::is_null("target_page"),
            ]));

        let params = q.to_params();
        assert_eq!(params[0], ("select".to_string(), "*".to_string()));
        assert_eq!(params[1], ("is_active".to_string(), "eq.true".to_string()));
        assert_eq!(
            params[2],
            ("or".to_string(), "(target_page.eq./live,target_page.is.null)".to_string())
        );
    }

    #[test]
    fn select_is_compacted_and_order_limit_appended() {
        let q = Query::new()
            .select("*, team_a:team_a_id(id, name)")
            .order("kickoff_time", false)
            .limit(5);
        let params = q.to_params();
        assert_eq!(params[0].1, "*,team_a:team_a_id(id,name)");
        assert!(params.contains(&("order".to_string(), "kickoff_time.desc".to_string())));
        assert!(params.contains(&("limit".to_string(), "5".to_string())));
    }

    #[test]
    fn in_filter_quotes_values() {
        let q = Query::new().filter(Filter::is_in("id", &["a".to_string(), "b,c".to_string()]));
        assert_eq!(q.to_params()[1].1, "in.(\"a\",\"b,c\")");
    }

    #[test]
    fn apply_filters_orders_and_limits() {
        let rows = vec![
            json!({"id": "1", "status": "upcoming", "kickoff_time": "2026-06-12T18:00:00Z", "target_page": null}),
            json!({"id": "2", "status": "live",     "kickoff_time": "2026-06-11T18:00:00Z"}),
            json!({"id": "3", "status": "upcoming", "kickoff_time": "2026-06-11T20:00:00+00:00", "target_page": "/tv"}),
            json!({"id": "4", "status": "upcoming", "kickoff_time": "2026-06-13T09:00:00Z", "target_page": "/live"}),
        ];

        let q = Query::new().eq("status", "upcoming").order("kickoff_time", true).limit(2);
        let ids: Vec<_> = q.apply(&rows).iter().map(|r| r["id"].as_str().unwrap().to_string()).collect();
        assert_eq!(ids, vec!["3", "1"]);

        let targeted = Query::new().filter(Filter::Or(vec![
            Filter::eq("target_page", "/live"),
            Filter::is_null("target_page"),
        ]));
        let ids: Vec<_> = targeted.apply(&rows).iter().map(|r| r["id"].as_str().unwrap().to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
    }
}
