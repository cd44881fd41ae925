//! Wire types for the collaborator endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tickview_core::{Price, Quantity};

/// `GET /portfolio` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResponse {
    #[serde(default)]
    pub virtual_cash: Decimal,
    #[serde(default)]
    pub positions: Vec<PositionRecord>,
    /// Account status (e.g. `APPROVED`, `PENDING`).
    #[serde(default)]
    pub status: Option<String>,
}

/// Held position as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub symbol: String,
    pub quantity: Quantity,
    pub average_price: Price,
    /// Server-side price at response time. Informational only.
    #[serde(default)]
    pub current_price: Option<Price>,
}

/// `GET /system` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub trading_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `POST /trade/{side}` body. The side travels in the path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRequest {
    #[serde(skip)]
    pub side: TradeSide,
    pub symbol: String,
    /// Sent as a JSON number.
    #[serde(serialize_with = "quantity_as_number")]
    pub quantity: Quantity,
}

fn quantity_as_number<S: Serializer>(quantity: &Quantity, serializer: S) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float::serialize(&quantity.inner(), serializer)
}

/// Error body returned by the collaborator on failure.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_portfolio_deserialize() {
        let json = r#"{
            "virtual_cash": 10000.5,
            "positions": [
                {"symbol": "AAPL", "quantity": 4, "average_price": "150.25", "current_price": 160}
            ],
            "status": "APPROVED"
        }"#;

        let pf: PortfolioResponse = serde_json::from_str(json).unwrap();

        assert_eq!(pf.virtual_cash, dec!(10000.5));
        assert_eq!(pf.positions.len(), 1);
        assert_eq!(pf.positions[0].quantity, Quantity::new(dec!(4)));
        assert_eq!(pf.positions[0].average_price, Price::new(dec!(150.25)));
        assert_eq!(pf.status.as_deref(), Some("APPROVED"));
    }

    #[test]
    fn test_portfolio_missing_fields_default() {
        let pf: PortfolioResponse = serde_json::from_str("{}").unwrap();

        assert_eq!(pf.virtual_cash, Decimal::ZERO);
        assert!(pf.positions.is_empty());
        assert!(pf.status.is_none());
    }

    #[test]
    fn test_trade_request_body_omits_side() {
        let req = TradeRequest {
            side: TradeSide::Sell,
            symbol: "AAPL".to_string(),
            quantity: Quantity::new(dec!(2)),
        };

        let value = serde_json::to_value(&req).unwrap();

        assert!(value.get("side").is_none());
        assert_eq!(value["symbol"], "AAPL");
    }

    #[test]
    fn test_trade_request_quantity_is_number() {
        let req = TradeRequest {
            side: TradeSide::Buy,
            symbol: "AAPL".to_string(),
            quantity: Quantity::new(dec!(2.5)),
        };

        let value = serde_json::to_value(&req).unwrap();

        assert!(value["quantity"].is_number());
        assert_eq!(value["quantity"].as_f64(), Some(2.5));
    }

    #[test]
    fn test_system_status_deserialize() {
        let status: SystemStatus = serde_json::from_str(r#"{"trading_enabled": true}"#).unwrap();
        assert!(status.trading_enabled);
    }
}
