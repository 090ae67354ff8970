use serde::{Deserialize, Serialize};

use crate::{EngineError, Money};

/// ISO-like currency code of an account.
///
/// Only the codes listed here are accepted when opening an account. The
/// ledger never converts between currencies: a transfer requires both
/// accounts to share one.
///
/// ## Minor units
///
/// `minor_units()` is the maximum number of fractional digits an amount may
/// carry in this currency. `10.50 USD` is valid, `10.505 USD` is not; `JPY`
/// accepts whole amounts only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Idr,
    Usd,
    Eur,
    Sgd,
    Jpy,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Idr,
        Currency::Usd,
        Currency::Eur,
        Currency::Sgd,
        Currency::Jpy,
    ];

    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Idr => "IDR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Sgd => "SGD",
            Currency::Jpy => "JPY",
        }
    }

    /// Number of fraction digits allowed for amounts in this currency.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Currency::Jpy => 0,
            Currency::Idr | Currency::Usd | Currency::Eur | Currency::Sgd => 2,
        }
    }

    /// Ensure `amount` is representable in this currency.
    pub fn check_precision(self, amount: Money) -> Result<(), EngineError> {
        if amount.scale() > self.minor_units() {
            return Err(EngineError::InvalidAmount(format!(
                "{} allows at most {} decimal places, got {amount}",
                self.code(),
                self.minor_units()
            )));
        }
        Ok(())
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|currency| currency.code() == code)
            .ok_or(EngineError::InvalidCurrency(code))
    }
}

impl std::str::FromStr for Currency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::try_from(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Currency::try_from("idr").unwrap(), Currency::Idr);
        assert_eq!(Currency::try_from(" Usd ").unwrap(), Currency::Usd);
        assert_eq!("JPY".parse::<Currency>().unwrap(), Currency::Jpy);
    }

    #[test]
    fn parse_rejects_unknown_codes() {
        assert_eq!(
            Currency::try_from("BTC"),
            Err(EngineError::InvalidCurrency("BTC".to_string()))
        );
    }

    #[test]
    fn precision_follows_minor_units() {
        let cents: Money = "10.50".parse().unwrap();
        let mills: Money = "10.505".parse().unwrap();
        assert!(Currency::Usd.check_precision(cents).is_ok());
        assert!(Currency::Usd.check_precision(mills).is_err());
        assert!(Currency::Jpy.check_precision("100".parse().unwrap()).is_ok());
        assert!(Currency::Jpy.check_precision(cents).is_err());
    }
}
