use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// All payment rails the deposit page offers.
pub enum PaymentMethod {
    /// Bank card.
    Card,
    /// Russian Faster Payments System, bank transfer by phone number.
    Sbp,
    /// Binance Pay.
    Binance,
    /// Steam skins exchange.
    Steam,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Card,
        PaymentMethod::Sbp,
        PaymentMethod::Binance,
        PaymentMethod::Steam,
    ];

    /// Identifier the marketplace expects in the `method` form field.
    pub const fn vendor_code(self) -> &'static str {
        match self {
            PaymentMethod::Card => "Paymentlnk_Card",
            PaymentMethod::Sbp => "Paymentlnk_Sbp",
            PaymentMethod::Binance => "Settlepay_Binance",
            PaymentMethod::Steam => "Ruks_SkinPay",
        }
    }

    /// Smallest accepted deposit, in roubles.
    pub const fn minimum_rub(self) -> u32 {
        match self {
            PaymentMethod::Card => 10,
            PaymentMethod::Sbp => 10,
            PaymentMethod::Binance => 100,
            PaymentMethod::Steam => 500,
        }
    }

    pub fn minimum_amount(self) -> Decimal {
        Decimal::from(self.minimum_rub())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Sbp => "sbp",
            PaymentMethod::Binance => "binance",
            PaymentMethod::Steam => "steam",
        }
    }

    pub const fn requires_phone(self) -> bool {
        matches!(self, PaymentMethod::Sbp)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment method '{0}', expected one of: card, sbp, binance, steam")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UnknownPaymentMethod(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_method_table_is_complete() {
        let codes: HashSet<_> = PaymentMethod::ALL.iter().map(|m| m.vendor_code()).collect();
        assert_eq!(codes.len(), PaymentMethod::ALL.len());

        let minimums: Vec<_> = PaymentMethod::ALL.iter().map(|m| m.minimum_rub()).collect();
        assert_eq!(minimums, vec![10, 10, 100, 500]);
    }

    #[test]
    fn test_method_names_round_trip() {
        for method in PaymentMethod::ALL {
            assert_eq!(method.as_str().parse::<PaymentMethod>(), Ok(method));
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
        assert!("paypal".parse::<PaymentMethod>().is_err());
        assert!("Card".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_only_sbp_requires_phone() {
        let with_phone: Vec<_> = PaymentMethod::ALL
            .into_iter()
            .filter(|m| m.requires_phone())
            .collect();
        assert_eq!(with_phone, vec![PaymentMethod::Sbp]);
    }
}
