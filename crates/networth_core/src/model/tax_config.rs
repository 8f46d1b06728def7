use serde::{Deserialize, Serialize};

/// A single bracket in a progressive tax system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Annual income threshold where this bracket begins
    pub threshold: f64,
    /// Marginal tax rate for income in this bracket (e.g., 0.22 for 22%)
    pub rate: f64,
}

/// Income tax applied to taxable income streams.
///
/// Regional tax law is out of scope; this is the hook where a caller plugs in
/// whatever approximation it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TaxPolicy {
    #[default]
    None,
    /// Flat rate on all taxable income
    Flat { rate: f64 },
    /// Progressive brackets on annualized income (sorted by threshold ascending)
    Progressive { brackets: Vec<TaxBracket> },
}

impl TaxPolicy {
    /// French-style progressive scale, useful as a preset
    #[must_use]
    pub fn progressive_preset() -> Self {
        TaxPolicy::Progressive {
            brackets: vec![
                TaxBracket {
                    threshold: 0.0,
                    rate: 0.0,
                },
                TaxBracket {
                    threshold: 11_294.0,
                    rate: 0.11,
                },
                TaxBracket {
                    threshold: 28_797.0,
                    rate: 0.30,
                },
                TaxBracket {
                    threshold: 82_341.0,
                    rate: 0.41,
                },
                TaxBracket {
                    threshold: 177_106.0,
                    rate: 0.45,
                },
            ],
        }
    }
}
