//! Promotion classification and shopper-facing rendering.
//!
//! Vendor reward-type codes map onto a closed set of discount families.
//! Anything outside those families is omitted from presentation; it is never
//! an error.

use std::fmt;

use cartwise_core::Promotion;
use rust_decimal::Decimal;

use crate::adapter::ChainAdapter;

/// How a vendor reward-type code is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardKind {
    /// Buy within a quantity band at a fixed discounted unit price.
    QuantityThreshold,
    /// Percentage off, rate given in hundredths of a percent.
    Percentage,
    Unrecognized,
}

impl RewardKind {
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" | "6" | "10" => RewardKind::QuantityThreshold,
            "2" | "3" => RewardKind::Percentage,
            _ => RewardKind::Unrecognized,
        }
    }
}

/// A promotion's discount parameters, as its family defines them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountFamily {
    QuantityThreshold {
        discounted_price: Option<Decimal>,
        min_qty: Option<Decimal>,
        max_qty: Option<Decimal>,
        min_purchase_amount: Option<Decimal>,
    },
    Percentage {
        rate_hundredths: i64,
        min_qty: Option<Decimal>,
        max_qty: Option<Decimal>,
    },
    /// Known family but missing the parameter that defines it.
    Incomplete { reward_type: String },
    Unrecognized { reward_type: String },
}

pub struct PromotionClassifier;

impl PromotionClassifier {
    #[must_use]
    pub fn classify(promo: &Promotion) -> DiscountFamily {
        match RewardKind::from_code(&promo.reward_type) {
            RewardKind::QuantityThreshold => DiscountFamily::QuantityThreshold {
                discounted_price: promo.discounted_price,
                min_qty: promo.min_qty,
                max_qty: promo.max_qty,
                min_purchase_amount: promo.min_purchase_amount,
            },
            RewardKind::Percentage => match promo.discount_rate {
                Some(rate_hundredths) => DiscountFamily::Percentage {
                    rate_hundredths,
                    min_qty: promo.min_qty,
                    max_qty: promo.max_qty,
                },
                None => DiscountFamily::Incomplete {
                    reward_type: promo.reward_type.clone(),
                },
            },
            RewardKind::Unrecognized => DiscountFamily::Unrecognized {
                reward_type: promo.reward_type.clone(),
            },
        }
    }
}

/// Formats a hundredths-of-a-percent rate: `1550` → `"15.5%"`.
#[must_use]
pub fn format_rate(rate_hundredths: i64) -> String {
    format!("{}%", Decimal::new(rate_hundredths, 2).normalize())
}

/// The headline figure of a rendered promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoValue {
    /// Discounted unit price.
    Price(Option<Decimal>),
    /// Percentage discount, already formatted.
    Rate(String),
}

/// A promotion ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoView {
    pub description: String,
    pub value: PromoValue,
    pub min_qty: Option<Decimal>,
    pub max_qty: Option<Decimal>,
    /// Only quantity-band offers carry a minimum purchase.
    pub min_purchase_amount: Option<Decimal>,
    pub audience: String,
    pub valid_until: Option<String>,
}

impl PromoView {
    /// Renders `promo` using `adapter` for the audience text. Returns `None`
    /// for promotions whose family cannot be presented.
    #[must_use]
    pub fn render(promo: &Promotion, adapter: &dyn ChainAdapter) -> Option<Self> {
        let (value, min_qty, max_qty, min_purchase_amount) =
            match PromotionClassifier::classify(promo) {
                DiscountFamily::QuantityThreshold {
                    discounted_price,
                    min_qty,
                    max_qty,
                    min_purchase_amount,
                } => (
                    PromoValue::Price(discounted_price),
                    min_qty,
                    max_qty,
                    min_purchase_amount,
                ),
                DiscountFamily::Percentage {
                    rate_hundredths,
                    min_qty,
                    max_qty,
                } => (
                    PromoValue::Rate(format_rate(rate_hundredths)),
                    min_qty,
                    max_qty,
                    None,
                ),
                DiscountFamily::Incomplete { reward_type }
                | DiscountFamily::Unrecognized { reward_type } => {
                    tracing::trace!(
                        promotion_id = %promo.promotion_id,
                        reward_type = %reward_type,
                        "promotion omitted from presentation"
                    );
                    return None;
                }
            };

        Some(Self {
            description: promo.description.clone(),
            value,
            min_qty,
            max_qty,
            min_purchase_amount,
            audience: adapter.promo_audience(promo),
            valid_until: promo
                .ends_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
        })
    }
}

fn or_na(value: Option<&Decimal>) -> String {
    value.map_or_else(|| "N/A".to_owned(), ToString::to_string)
}

impl fmt::Display for PromoView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = if self.description.is_empty() {
            "N/A"
        } else {
            &self.description
        };
        writeln!(f, "{description}")?;
        match &self.value {
            PromoValue::Price(price) => {
                writeln!(f, "  Promotion price: {}", or_na(price.as_ref()))?;
            }
            PromoValue::Rate(rate) => writeln!(f, "  Promotion discount: {rate}")?,
        }
        writeln!(f, "  Minimum quantity: {}", or_na(self.min_qty.as_ref()))?;
        writeln!(f, "  Maximum quantity: {}", or_na(self.max_qty.as_ref()))?;
        if let PromoValue::Price(_) = self.value {
            writeln!(
                f,
                "  Minimum purchase: {}",
                or_na(self.min_purchase_amount.as_ref())
            )?;
        }
        writeln!(f, "  Target customers: {}", self.audience)?;
        write!(
            f,
            "  Valid until: {}",
            self.valid_until.as_deref().unwrap_or("N/A")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn promo(reward_type: &str) -> Promotion {
        Promotion {
            promotion_id: "p1".into(),
            reward_type: reward_type.into(),
            description: "deal".into(),
            discounted_price: Some(dec!(9.90)),
            discount_rate: Some(1550),
            min_qty: Some(dec!(2)),
            max_qty: Some(dec!(6)),
            min_purchase_amount: Some(dec!(50)),
            club_id: Some("0".into()),
            ends_at: None,
            item_codes: vec!["100".into()],
        }
    }

    #[test]
    fn reward_codes_map_to_families() {
        for code in ["1", "6", "10"] {
            assert_eq!(RewardKind::from_code(code), RewardKind::QuantityThreshold);
        }
        for code in ["2", "3"] {
            assert_eq!(RewardKind::from_code(code), RewardKind::Percentage);
        }
        assert_eq!(RewardKind::from_code("7"), RewardKind::Unrecognized);
        assert_eq!(RewardKind::from_code(""), RewardKind::Unrecognized);
    }

    #[test]
    fn percentage_family_carries_rate() {
        assert_eq!(
            PromotionClassifier::classify(&promo("2")),
            DiscountFamily::Percentage {
                rate_hundredths: 1550,
                min_qty: Some(dec!(2)),
                max_qty: Some(dec!(6)),
            }
        );
    }

    #[test]
    fn quantity_family_carries_band() {
        let family = PromotionClassifier::classify(&promo("10"));
        assert!(matches!(
            family,
            DiscountFamily::QuantityThreshold {
                discounted_price: Some(p),
                min_purchase_amount: Some(m),
                ..
            } if p == dec!(9.90) && m == dec!(50)
        ));
    }

    #[test]
    fn percentage_without_rate_is_incomplete() {
        let mut p = promo("3");
        p.discount_rate = None;
        assert!(matches!(
            PromotionClassifier::classify(&p),
            DiscountFamily::Incomplete { .. }
        ));
    }

    #[test]
    fn unknown_code_is_unrecognized() {
        assert_eq!(
            PromotionClassifier::classify(&promo("99")),
            DiscountFamily::Unrecognized {
                reward_type: "99".into()
            }
        );
    }

    #[test]
    fn rates_render_as_percent() {
        assert_eq!(format_rate(1550), "15.5%");
        assert_eq!(format_rate(1000), "10%");
        assert_eq!(format_rate(5), "0.05%");
    }
}
