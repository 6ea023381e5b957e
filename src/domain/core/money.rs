use std::fmt::Display;

use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

/// 通貨
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    EUR,
    USD,
    JPY,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::EUR => "€",
            Currency::USD => "$",
            Currency::JPY => "¥",
        }
    }
}

/// 金額（通貨の最小単位ではなく整数の表示単位で保持する）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn eur(amount: i64) -> Self {
        Self::new(amount, Currency::EUR)
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}{}",
            sign,
            self.currency.symbol(),
            self.amount.unsigned_abs().to_formatted_string(&Locale::en)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::eur(1350).to_string(), "€1,350");
        assert_eq!(Money::new(1000000, Currency::JPY).to_string(), "¥1,000,000");
        assert_eq!(Money::eur(-2800).to_string(), "-€2,800");
        assert_eq!(Money::eur(0).to_string(), "€0");
    }
}
