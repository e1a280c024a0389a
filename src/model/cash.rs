use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CashFlow {
    In,
    Out,
}

impl CashFlow {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashFlow::In => "in",
            CashFlow::Out => "out",
        }
    }

    /// Exact match only: `"IN"` or `" in"` are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "in" => Some(CashFlow::In),
            "out" => Some(CashFlow::Out),
            _ => None,
        }
    }
}

/// Raw request body; checked by `validation::validate_cash_transaction`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewCashTransaction {
    #[schema(example = "txn-1")]
    pub id: String,
    #[serde(rename = "type")]
    #[schema(example = "in")]
    pub kind: String,
    #[schema(example = 100.0)]
    pub amount: f64,
    #[serde(default)]
    #[schema(example = "Deposit")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CashTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CashFlow,
    pub amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "total_in": 100.0,
    "total_out": 30.0,
    "total_cash": 70.0,
    "gross_margin": 60.0,
    "net": 56.0
}))]
pub struct CashSummary {
    pub total_in: f64,
    pub total_out: f64,
    pub total_cash: f64,
    pub gross_margin: f64,
    pub net: f64,
}

impl CashSummary {
    /// Fields in display order, keyed by their JSON names.
    pub fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("total_in", self.total_in),
            ("total_out", self.total_out),
            ("total_cash", self.total_cash),
            ("gross_margin", self.gross_margin),
            ("net", self.net),
        ]
    }
}
