//! Part discovery: a structured predicate builder compiled into one
//! parameterized page query plus a matching count query.
//!
//! Each recognized filter contributes a WHERE fragment, bound arguments, and
//! (for inventory- or fitment-backed filters) a join requirement. Join
//! requirements are deduplicated before assembly, so the price, condition and
//! in-stock filters share a single `offer` join instead of stacking one
//! inventory join per filter. Relevance scoring reuses the WHERE-clause
//! placeholders in ORDER BY, and the count query carries only the predicate
//! arguments.

use std::collections::BTreeSet;

use bigdecimal::BigDecimal;
use common_http_errors::ApiError;
use common_pagination::Pagination;
use serde::Deserialize;

use crate::sql::{ArgList, SqlArg};

/// Raw query-string filters for `GET /search`. Absent means unconstrained.
/// `page`/`limit` stay raw strings so non-numeric input falls back to the
/// pagination defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchFilters {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub q: Option<String>,
    pub category_id: Option<String>,
    pub model_id: Option<i64>,
    pub year: Option<i32>,
    pub min_price: Option<BigDecimal>,
    pub max_price: Option<BigDecimal>,
    pub condition: Option<String>,
    pub manufacturer: Option<String>,
    pub in_stock: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl SearchFilters {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_raw(self.page.as_deref(), self.limit.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum JoinReq {
    Fitment,
    Offer,
}

const HIT_COLUMNS: &str = "p.id, p.category_id, cat.name AS category_name, p.title, \
     p.description, p.sku, p.manufacturer, p.image_url, p.created_at, \
     (SELECT MIN(i.price) FROM inventory i WHERE i.part_id = p.id AND i.quantity > 0) AS min_price, \
     (SELECT COUNT(i.id) FROM inventory i WHERE i.part_id = p.id AND i.quantity > 0) AS suppliers_count";

const BASE_FROM: &str = "FROM parts p JOIN part_categories cat ON p.category_id = cat.id";

/// Compiled search predicate. `page_query` and `count_query` share the same
/// WHERE clause and bound arguments, so the page and the total can never
/// disagree about which parts match.
#[derive(Debug)]
pub struct PartSearchQuery {
    joins: BTreeSet<JoinReq>,
    conditions: Vec<String>,
    args: ArgList,
    predicate_args: usize,
    order_by: String,
}

impl PartSearchQuery {
    pub fn build(filters: &SearchFilters) -> Result<Self, ApiError> {
        let mut joins = BTreeSet::new();
        let mut conditions: Vec<String> = Vec::new();
        let mut args = ArgList::new();

        let term = filters.q.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let mut like_ph = None;
        if let Some(term) = term {
            let ph = args.push(SqlArg::Text(format!("%{term}%")));
            conditions.push(format!(
                "(p.title ILIKE {ph} OR p.description ILIKE {ph} OR p.sku ILIKE {ph} OR p.manufacturer ILIKE {ph})"
            ));
            like_ph = Some(ph);
        }

        if let Some(raw) = non_empty(filters.category_id.as_deref()) {
            let ids = parse_id_list(raw).ok_or_else(|| {
                ApiError::validation_msg(
                    "invalid_category_id",
                    "category_id must be a comma-separated list of ids",
                )
            })?;
            if !ids.is_empty() {
                let ph = args.push(SqlArg::IntList(ids));
                conditions.push(format!("p.category_id = ANY({ph})"));
            }
        }

        if let Some(model_id) = filters.model_id {
            joins.insert(JoinReq::Fitment);
            let ph = args.push(SqlArg::Int(model_id));
            conditions.push(format!("fit.model_id = {ph}"));
            // Open-ended year ranges: NULL bound matches every year.
            if let Some(year) = filters.year {
                let ph = args.push(SqlArg::Int4(year));
                conditions.push(format!("(fit.year_from IS NULL OR fit.year_from <= {ph})"));
                conditions.push(format!("(fit.year_to IS NULL OR fit.year_to >= {ph})"));
            }
        }

        let mut need_stock = false;
        if let Some(min) = &filters.min_price {
            joins.insert(JoinReq::Offer);
            let ph = args.push(SqlArg::Numeric(min.clone()));
            conditions.push(format!("offer.price >= {ph}"));
            need_stock = true;
        }
        if let Some(max) = &filters.max_price {
            joins.insert(JoinReq::Offer);
            let ph = args.push(SqlArg::Numeric(max.clone()));
            conditions.push(format!("offer.price <= {ph}"));
            need_stock = true;
        }

        if let Some(raw) = non_empty(filters.condition.as_deref()) {
            let values = split_list(raw);
            if !values.is_empty() {
                joins.insert(JoinReq::Offer);
                let ph = args.push(SqlArg::TextList(values));
                conditions.push(format!("offer.condition = ANY({ph})"));
            }
        }

        if let Some(raw) = non_empty(filters.manufacturer.as_deref()) {
            let values = split_list(raw);
            if !values.is_empty() {
                let ph = args.push(SqlArg::TextList(values));
                conditions.push(format!("p.manufacturer = ANY({ph})"));
            }
        }

        if filters.in_stock.as_deref() == Some("true") {
            joins.insert(JoinReq::Offer);
            need_stock = true;
        }
        if need_stock {
            conditions.push("offer.quantity > 0".to_string());
        }

        let predicate_args = args.len();

        let order_by = match filters.sort.as_deref() {
            Some("price_asc") => "min_price ASC".to_string(),
            // NULL min_price means no in-stock offer; keep those last either way.
            Some("price_desc") => "min_price DESC NULLS LAST".to_string(),
            Some("newest") => "p.created_at DESC".to_string(),
            // Relevance is the default; without a search term it degenerates
            // to newest-first.
            _ => match (term, like_ph.as_ref()) {
                (Some(term), Some(like_ph)) => {
                    let exact_ph = args.push(SqlArg::Text(term.to_string()));
                    format!(
                        "CASE WHEN p.sku = {exact_ph} THEN 4 \
                         WHEN p.title ILIKE {like_ph} THEN 3 \
                         WHEN p.manufacturer ILIKE {like_ph} THEN 2 \
                         WHEN p.description ILIKE {like_ph} THEN 1 \
                         ELSE 0 END DESC, p.created_at DESC"
                    )
                }
                _ => "p.created_at DESC".to_string(),
            },
        };

        Ok(Self {
            joins,
            conditions,
            args,
            predicate_args,
            order_by,
        })
    }

    fn from_clause(&self) -> String {
        let mut out = BASE_FROM.to_string();
        for join in &self.joins {
            out.push_str(match join {
                JoinReq::Fitment => " JOIN part_compatibility fit ON fit.part_id = p.id",
                JoinReq::Offer => " JOIN inventory offer ON offer.part_id = p.id",
            });
        }
        out
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// The paginated result query with its full argument list.
    pub fn page_query(&self, pg: &Pagination) -> (String, Vec<SqlArg>) {
        let mut args = self.args.as_slice().to_vec();
        let limit_ph = format!("${}", args.len() + 1);
        let offset_ph = format!("${}", args.len() + 2);
        args.push(SqlArg::Int(pg.limit));
        args.push(SqlArg::Int(pg.offset()));
        let sql = format!(
            "SELECT {HIT_COLUMNS} {}{} GROUP BY p.id, cat.name ORDER BY {} LIMIT {limit_ph} OFFSET {offset_ph}",
            self.from_clause(),
            self.where_clause(),
            self.order_by,
        );
        (sql, args)
    }

    /// Total over the same predicate, deduplicated by part identity. Ordering
    /// arguments are dropped; only the predicate arguments are bound.
    pub fn count_query(&self) -> (String, Vec<SqlArg>) {
        let args = self.args.as_slice()[..self.predicate_args].to_vec();
        let sql = format!(
            "SELECT COUNT(DISTINCT p.id) {}{}",
            self.from_clause(),
            self.where_clause(),
        );
        (sql, args)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_id_list(raw: &str) -> Option<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().ok())
        .collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
