// =============================================================================
// Portfolio Aggregation
// =============================================================================
//
// For every holding that has a quote:
//   total_value      += price        * quantity
//   total_cost       += avg_cost     * quantity
//   day_change_value += change_amount * quantity
//
// Holdings without a quote contribute nothing. Percentages are defined as 0
// when their denominator is not positive.
// =============================================================================

use std::collections::HashMap;

use serde::Serialize;

use super::Holding;
use crate::market_data::PriceQuote;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_pnl: f64,
    pub total_pnl_percent: f64,
    pub day_change_value: f64,
    pub day_change_percent: f64,
}

/// Summary plus the tickers that had no quote and were left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateReport {
    pub summary: PortfolioSummary,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationSlice {
    pub ticker: String,
    pub value: f64,
    pub percent: f64,
}

/// Totals for `holdings` priced with `quotes` (keyed by canonical ticker).
pub fn aggregate_portfolio(holdings: &[Holding], quotes: &HashMap<String, PriceQuote>) -> PortfolioSummary {
    aggregate_portfolio_strict(holdings, quotes).summary
}

/// Same totals as [`aggregate_portfolio`], also reporting skipped tickers.
pub fn aggregate_portfolio_strict(
    holdings: &[Holding],
    quotes: &HashMap<String, PriceQuote>,
) -> AggregateReport {
    let mut total_value = 0.0;
    let mut total_cost = 0.0;
    let mut day_change_value = 0.0;
    let mut skipped = Vec::new();

    for holding in holdings {
        let Some(quote) = quotes.get(&holding.ticker) else {
            skipped.push(holding.ticker.clone());
            continue;
        };
        total_value += holding.market_value(quote.price);
        total_cost += holding.cost_basis();
        day_change_value += quote.change_amount * holding.quantity;
    }

    let total_pnl = total_value - total_cost;
    let total_pnl_percent = if total_cost > 0.0 {
        total_pnl / total_cost * 100.0
    } else {
        0.0
    };
    let day_change_percent = if total_value > 0.0 {
        day_change_value / total_value * 100.0
    } else {
        0.0
    };

    AggregateReport {
        summary: PortfolioSummary {
            total_value,
            total_cost,
            total_pnl,
            total_pnl_percent,
            day_change_value,
            day_change_percent,
        },
        skipped,
    }
}

/// Share of total market value per holding, largest first. Holdings without a
/// quote or with zero value are omitted.
pub fn allocation(holdings: &[Holding], quotes: &HashMap<String, PriceQuote>) -> Vec<AllocationSlice> {
    let mut slices: Vec<AllocationSlice> = holdings
        .iter()
        .filter_map(|h| {
            let quote = quotes.get(&h.ticker)?;
            let value = h.market_value(quote.price);
            (value > 0.0).then(|| AllocationSlice {
                ticker: h.ticker.clone(),
                value,
                percent: 0.0,
            })
        })
        .collect();

    let total: f64 = slices.iter().map(|s| s.value).sum();
    if total > 0.0 {
        for slice in &mut slices {
            slice.percent = slice.value / total * 100.0;
        }
    }

    slices.sort_by(|a, b| b.value.total_cmp(&a.value));
    slices
}
