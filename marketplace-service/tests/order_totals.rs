use bigdecimal::BigDecimal;
use marketplace_service::money::{effective_unit_price, line_subtotal, normalize_scale};
use marketplace_service::order_handlers::{validate_new_order, NewOrder, OrderLine};
use std::str::FromStr;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn base_order() -> NewOrder {
    NewOrder {
        shipping_address: "12 Main St".into(),
        billing_address: "12 Main St".into(),
        payment_method: "card".into(),
        notes: None,
        items: vec![OrderLine {
            inventory_id: 1,
            quantity: 2,
        }],
    }
}

#[test]
fn sale_price_wins_over_list_price() {
    let unit = effective_unit_price(&dec("100.00"), Some(&dec("80")));
    assert_eq!(unit, dec("80.00"));
    assert_eq!(line_subtotal(&unit, 2), dec("160.00"));
}

#[test]
fn list_price_applies_when_no_sale_is_running() {
    let unit = effective_unit_price(&dec("49.9"), None);
    assert_eq!(unit, dec("49.90"));
    assert_eq!(line_subtotal(&unit, 3), dec("149.70"));
}

#[test]
fn totals_are_normalized_to_two_decimal_places() {
    assert_eq!(normalize_scale(&dec("10")), dec("10.00"));
    assert_eq!(normalize_scale(&dec("10.1")), dec("10.10"));
    assert_eq!(line_subtotal(&dec("0.10"), 3), dec("0.30"));
}

#[test]
fn order_must_contain_at_least_one_item() {
    let mut order = base_order();
    order.items.clear();
    let err = validate_new_order(&order).unwrap_err();
    assert_eq!(err.status().as_u16(), 400);
}

#[test]
fn blank_required_fields_are_rejected() {
    for field in ["shipping_address", "billing_address", "payment_method"] {
        let mut order = base_order();
        match field {
            "shipping_address" => order.shipping_address = "  ".into(),
            "billing_address" => order.billing_address = String::new(),
            _ => order.payment_method = " ".into(),
        }
        let err = validate_new_order(&order).unwrap_err();
        assert_eq!(err.status().as_u16(), 400, "field {field}");
    }
}

#[test]
fn non_positive_quantities_are_rejected() {
    for quantity in [0, -1] {
        let mut order = base_order();
        order.items[0].quantity = quantity;
        let err = validate_new_order(&order).unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
    }
}

#[test]
fn well_formed_order_passes_validation() {
    assert!(validate_new_order(&base_order()).is_ok());
}
