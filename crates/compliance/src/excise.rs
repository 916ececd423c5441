//! Excise tax and GST on regulated products

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{ComplianceError, ComplianceResult};

/// GST on (base price + excise)
pub const GST_RATE: Decimal = dec!(0.18);

/// Excise rate for product types without a specific rate
pub const DEFAULT_EXCISE_RATE: Decimal = dec!(0.20);

/// Product types with a specific excise rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ProductType {
    #[strum(to_string = "whiskey", serialize = "whisky")]
    Whiskey,
    Rum,
    Vodka,
    Gin,
    Brandy,
    Wine,
    Beer,
}

impl ProductType {
    /// Excise rate as a fraction of the base price
    pub fn excise_rate(&self) -> Decimal {
        match self {
            ProductType::Whiskey
            | ProductType::Rum
            | ProductType::Vodka
            | ProductType::Gin
            | ProductType::Brandy => dec!(0.25),
            ProductType::Wine => dec!(0.15),
            ProductType::Beer => dec!(0.10),
        }
    }
}

/// Tax components for one product, each rounded to 2 dp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExciseBreakdown {
    pub excise_rate: Decimal,
    pub excise_tax: Decimal,
    pub gst: Decimal,
    /// Rounded from the unrounded sum, so it may differ from
    /// `excise_tax + gst` by one paisa
    pub total_tax: Decimal,
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Excise tax and GST for `product_type` at `base_price`.
///
/// Unknown product types use [`DEFAULT_EXCISE_RATE`].
pub fn calculate_excise_tax(
    product_type: &str,
    base_price: Decimal,
) -> ComplianceResult<ExciseBreakdown> {
    if base_price.is_sign_negative() {
        return Err(ComplianceError::InvalidPrice(base_price.to_string()));
    }

    let excise_rate = ProductType::from_str(product_type.trim())
        .map(|p| p.excise_rate())
        .unwrap_or(DEFAULT_EXCISE_RATE);

    let excise = base_price * excise_rate;
    let gst = (base_price + excise) * GST_RATE;

    Ok(ExciseBreakdown {
        excise_rate,
        excise_tax: round2(excise),
        gst: round2(gst),
        total_tax: round2(excise + gst),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spirits_rate() {
        let tax = calculate_excise_tax("Whiskey", dec!(1000)).unwrap();
        assert_eq!(tax.excise_rate, dec!(0.25));
        assert_eq!(tax.excise_tax, dec!(250.00));
        assert_eq!(tax.gst, dec!(225.00));
        assert_eq!(tax.total_tax, dec!(475.00));
    }

    #[test]
    fn test_wine_and_beer() {
        assert_eq!(calculate_excise_tax("wine", dec!(800)).unwrap().excise_tax, dec!(120));
        let beer = calculate_excise_tax("BEER", dec!(150)).unwrap();
        assert_eq!(beer.excise_tax, dec!(15));
        assert_eq!(beer.gst, dec!(29.70));
    }

    #[test]
    fn test_unknown_product_uses_default() {
        let tax = calculate_excise_tax("cider", dec!(100)).unwrap();
        assert_eq!(tax.excise_rate, DEFAULT_EXCISE_RATE);
        assert_eq!(tax.excise_tax, dec!(20));
        assert_eq!(tax.gst, dec!(21.6));
    }

    #[test]
    fn test_rounding_to_two_places() {
        // 0.25 * 99.99 = 24.9975
        let tax = calculate_excise_tax("rum", dec!(99.99)).unwrap();
        assert_eq!(tax.excise_tax, dec!(25.00));
        // (99.99 + 24.9975) * 0.18 = 22.49775
        assert_eq!(tax.gst, dec!(22.50));
        // 47.49525
        assert_eq!(tax.total_tax, dec!(47.50));
    }

    #[test]
    fn test_negative_price_rejected() {
        assert!(matches!(
            calculate_excise_tax("gin", dec!(-1)),
            Err(ComplianceError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_whisky_spelling() {
        assert_eq!(ProductType::from_str("whisky").unwrap(), ProductType::Whiskey);
        assert_eq!(ProductType::Whiskey.to_string(), "whiskey");
    }
}
