//! Small helpers for assembling parameterized queries from optional filters.
//!
//! Filters contribute WHERE fragments referencing numbered placeholders and
//! push their values into an [`ArgList`]; the finished argument list is bound
//! in order at execution time. No user input is ever spliced into SQL text.

use bigdecimal::BigDecimal;
use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::Postgres;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Int(i64),
    Int4(i32),
    Text(String),
    Numeric(BigDecimal),
    IntList(Vec<i64>),
    TextList(Vec<String>),
}

/// Ordered bind arguments with 1-based placeholder numbering.
#[derive(Debug, Default)]
pub struct ArgList(Vec<SqlArg>);

impl ArgList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Push an argument and return its placeholder (`"$3"` etc.).
    pub fn push(&mut self, arg: SqlArg) -> String {
        self.0.push(arg);
        format!("${}", self.0.len())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[SqlArg] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<SqlArg> {
        self.0
    }
}

pub fn bind_query<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    args: &[SqlArg],
) -> Query<'q, Postgres, PgArguments> {
    for arg in args {
        q = match arg {
            SqlArg::Int(v) => q.bind(*v),
            SqlArg::Int4(v) => q.bind(*v),
            SqlArg::Text(v) => q.bind(v.clone()),
            SqlArg::Numeric(v) => q.bind(v.clone()),
            SqlArg::IntList(v) => q.bind(v.clone()),
            SqlArg::TextList(v) => q.bind(v.clone()),
        };
    }
    q
}

pub fn bind_query_as<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    args: &[SqlArg],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for arg in args {
        q = match arg {
            SqlArg::Int(v) => q.bind(*v),
            SqlArg::Int4(v) => q.bind(*v),
            SqlArg::Text(v) => q.bind(v.clone()),
            SqlArg::Numeric(v) => q.bind(v.clone()),
            SqlArg::IntList(v) => q.bind(v.clone()),
            SqlArg::TextList(v) => q.bind(v.clone()),
        };
    }
    q
}

pub fn bind_query_scalar<'q, O>(
    mut q: QueryScalar<'q, Postgres, O, PgArguments>,
    args: &[SqlArg],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for arg in args {
        q = match arg {
            SqlArg::Int(v) => q.bind(*v),
            SqlArg::Int4(v) => q.bind(*v),
            SqlArg::Text(v) => q.bind(v.clone()),
            SqlArg::Numeric(v) => q.bind(v.clone()),
            SqlArg::IntList(v) => q.bind(v.clone()),
            SqlArg::TextList(v) => q.bind(v.clone()),
        };
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_one_based_and_sequential() {
        let mut args = ArgList::new();
        assert_eq!(args.push(SqlArg::Int(7)), "$1");
        assert_eq!(args.push(SqlArg::Text("x".into())), "$2");
        assert_eq!(args.len(), 2);
    }
}
