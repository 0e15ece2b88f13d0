use bigdecimal::BigDecimal;

/// Normalize a monetary value to 2 decimal places.
pub fn normalize_scale(value: &BigDecimal) -> BigDecimal {
    value.with_scale(2)
}

/// Effective unit price of an offer: sale price wins when set.
pub fn effective_unit_price(price: &BigDecimal, sale_price: Option<&BigDecimal>) -> BigDecimal {
    normalize_scale(sale_price.unwrap_or(price))
}

/// Line subtotal at the snapshotted unit price.
pub fn line_subtotal(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    normalize_scale(&(unit_price * BigDecimal::from(quantity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    #[test]
    fn sale_price_takes_precedence() {
        let unit = effective_unit_price(&dec("100.00"), Some(&dec("80.00")));
        assert_eq!(unit, dec("80.00"));
    }

    #[test]
    fn list_price_when_no_sale() {
        let unit = effective_unit_price(&dec("49.99"), None);
        assert_eq!(unit, dec("49.99"));
    }

    #[test]
    fn subtotal_is_scaled_to_cents() {
        assert_eq!(line_subtotal(&dec("80"), 2), dec("160.00"));
        assert_eq!(line_subtotal(&dec("19.99"), 3), dec("59.97"));
    }
}
