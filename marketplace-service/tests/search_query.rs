use bigdecimal::BigDecimal;
use common_pagination::Pagination;
use marketplace_service::search::{PartSearchQuery, SearchFilters};
use marketplace_service::sql::SqlArg;
use std::str::FromStr;

fn filters() -> SearchFilters {
    SearchFilters::default()
}

#[test]
fn empty_filters_compile_to_unfiltered_newest_first() {
    let query = PartSearchQuery::build(&filters()).unwrap();

    let (count_sql, count_args) = query.count_query();
    assert_eq!(
        count_sql,
        "SELECT COUNT(DISTINCT p.id) FROM parts p JOIN part_categories cat ON p.category_id = cat.id"
    );
    assert!(count_args.is_empty());

    let pg = Pagination::from_raw(None, None);
    let (page_sql, page_args) = query.page_query(&pg);
    assert!(page_sql.contains("ORDER BY p.created_at DESC LIMIT $1 OFFSET $2"));
    assert_eq!(page_args, vec![SqlArg::Int(20), SqlArg::Int(0)]);
}

#[test]
fn search_term_binds_once_and_scores_relevance_via_same_placeholder() {
    let mut f = filters();
    f.q = Some("brake pad".into());
    let query = PartSearchQuery::build(&f).unwrap();

    let pg = Pagination::from_raw(None, None);
    let (page_sql, page_args) = query.page_query(&pg);

    // one ILIKE pattern reused across all four probed columns
    assert!(page_sql.contains(
        "(p.title ILIKE $1 OR p.description ILIKE $1 OR p.sku ILIKE $1 OR p.manufacturer ILIKE $1)"
    ));
    // relevance: exact SKU beats title beats manufacturer beats description
    assert!(page_sql.contains("CASE WHEN p.sku = $2 THEN 4"));
    assert!(page_sql.contains("WHEN p.title ILIKE $1 THEN 3"));
    assert!(page_sql.contains("WHEN p.manufacturer ILIKE $1 THEN 2"));
    assert!(page_sql.contains("WHEN p.description ILIKE $1 THEN 1"));
    assert!(page_sql.contains("ELSE 0 END DESC, p.created_at DESC"));

    assert_eq!(
        page_args,
        vec![
            SqlArg::Text("%brake pad%".into()),
            SqlArg::Text("brake pad".into()),
            SqlArg::Int(20),
            SqlArg::Int(0),
        ]
    );

    // count drops the ordering argument and keeps only the predicate
    let (count_sql, count_args) = query.count_query();
    assert!(count_sql.starts_with("SELECT COUNT(DISTINCT p.id)"));
    assert!(!count_sql.contains("CASE WHEN"));
    assert_eq!(count_args, vec![SqlArg::Text("%brake pad%".into())]);
}

#[test]
fn inventory_backed_filters_share_a_single_offer_join() {
    let mut f = filters();
    f.min_price = Some(BigDecimal::from_str("10").unwrap());
    f.max_price = Some(BigDecimal::from_str("50").unwrap());
    f.condition = Some("new,refurbished".into());
    f.in_stock = Some("true".into());
    let query = PartSearchQuery::build(&f).unwrap();

    let (count_sql, count_args) = query.count_query();
    assert_eq!(
        count_sql.matches("JOIN inventory offer ON offer.part_id = p.id").count(),
        1
    );
    assert!(count_sql.contains("offer.price >= $1"));
    assert!(count_sql.contains("offer.price <= $2"));
    assert!(count_sql.contains("offer.condition = ANY($3)"));
    // the stock guard appears once even though three filters require it
    assert_eq!(count_sql.matches("offer.quantity > 0").count(), 1);
    assert_eq!(
        count_args,
        vec![
            SqlArg::Numeric(BigDecimal::from_str("10").unwrap()),
            SqlArg::Numeric(BigDecimal::from_str("50").unwrap()),
            SqlArg::TextList(vec!["new".into(), "refurbished".into()]),
        ]
    );
}

#[test]
fn fitment_filter_joins_compatibility_and_reuses_year_placeholder() {
    let mut f = filters();
    f.model_id = Some(42);
    f.year = Some(2019);
    let query = PartSearchQuery::build(&f).unwrap();

    let (count_sql, count_args) = query.count_query();
    assert!(count_sql.contains("JOIN part_compatibility fit ON fit.part_id = p.id"));
    assert!(count_sql.contains("fit.model_id = $1"));
    assert!(count_sql.contains("(fit.year_from IS NULL OR fit.year_from <= $2)"));
    assert!(count_sql.contains("(fit.year_to IS NULL OR fit.year_to >= $2)"));
    assert_eq!(count_args, vec![SqlArg::Int(42), SqlArg::Int4(2019)]);
}

#[test]
fn fitment_join_precedes_offer_join_deterministically() {
    let mut f = filters();
    f.in_stock = Some("true".into());
    f.model_id = Some(7);
    let query = PartSearchQuery::build(&f).unwrap();

    let (count_sql, _) = query.count_query();
    let fit = count_sql.find("JOIN part_compatibility fit").unwrap();
    let offer = count_sql.find("JOIN inventory offer").unwrap();
    assert!(fit < offer);
}

#[test]
fn category_list_parses_and_rejects_garbage() {
    let mut f = filters();
    f.category_id = Some("3, 5 ,9".into());
    let query = PartSearchQuery::build(&f).unwrap();
    let (count_sql, count_args) = query.count_query();
    assert!(count_sql.contains("p.category_id = ANY($1)"));
    assert_eq!(count_args, vec![SqlArg::IntList(vec![3, 5, 9])]);

    let mut bad = filters();
    bad.category_id = Some("3,abc".into());
    let err = PartSearchQuery::build(&bad).unwrap_err();
    assert_eq!(err.status().as_u16(), 400);
}

#[test]
fn price_sorts_use_derived_min_price_and_skip_relevance_binding() {
    let mut f = filters();
    f.q = Some("filter".into());
    f.sort = Some("price_asc".into());
    let query = PartSearchQuery::build(&f).unwrap();

    let pg = Pagination::from_raw(None, None);
    let (page_sql, page_args) = query.page_query(&pg);
    assert!(page_sql.contains("ORDER BY min_price ASC LIMIT $2 OFFSET $3"));
    // no exact-match argument when relevance scoring is not in play
    assert_eq!(
        page_args,
        vec![
            SqlArg::Text("%filter%".into()),
            SqlArg::Int(20),
            SqlArg::Int(0),
        ]
    );
}

#[test]
fn price_desc_keeps_offerless_parts_last() {
    let mut f = filters();
    f.sort = Some("price_desc".into());
    let query = PartSearchQuery::build(&f).unwrap();

    let pg = Pagination::from_raw(None, None);
    let (page_sql, _) = query.page_query(&pg);
    // NULL min_price (no in-stock offer) must not float to the top
    assert!(page_sql.contains("ORDER BY min_price DESC NULLS LAST LIMIT $1 OFFSET $2"));
}

#[test]
fn newest_sort_without_term_orders_by_created_at() {
    let mut f = filters();
    f.sort = Some("newest".into());
    f.manufacturer = Some("Bosch".into());
    let query = PartSearchQuery::build(&f).unwrap();

    let pg = Pagination::from_raw(Some("3"), Some("10"));
    let (page_sql, page_args) = query.page_query(&pg);
    assert!(page_sql.contains("p.manufacturer = ANY($1)"));
    assert!(page_sql.contains("ORDER BY p.created_at DESC LIMIT $2 OFFSET $3"));
    assert_eq!(
        page_args,
        vec![
            SqlArg::TextList(vec!["Bosch".into()]),
            SqlArg::Int(10),
            SqlArg::Int(20),
        ]
    );
}

#[test]
fn blank_and_whitespace_filters_are_ignored() {
    let mut f = filters();
    f.q = Some("   ".into());
    f.condition = Some(" , ,".into());
    f.manufacturer = Some("".into());
    f.in_stock = Some("false".into());
    let query = PartSearchQuery::build(&f).unwrap();

    let (count_sql, count_args) = query.count_query();
    assert!(!count_sql.contains("WHERE"));
    assert!(count_args.is_empty());
}
