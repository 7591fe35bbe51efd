//! Built-in sample instruments for synthesizing a universe table.
//!
//! Several symbols (`NDQ`, `NDQUSD`) appear more than once on different
//! venues, the way a symbol search shows them.

use std::collections::BTreeMap;

use kbar_core::UniverseRow;
use kbar_core::universe::FILTER_SEPARATOR;
use rand::seq::SliceRandom;

use crate::error::SynthError;
use crate::generator;

#[derive(Debug, Clone, Copy)]
pub struct Instrument {
    pub filters: &'static [&'static str],
    pub badge: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    pub market: &'static str,
    pub venue: &'static str,
}

const fn instrument(
    filters: &'static [&'static str],
    badge: &'static str,
    symbol: &'static str,
    name: &'static str,
    market: &'static str,
    venue: &'static str,
) -> Instrument {
    Instrument {
        filters,
        badge,
        symbol,
        name,
        market,
        venue,
    }
}

// Filter tags match the category chips of the symbol search overlay.
pub static INSTRUMENTS: &[Instrument] = &[
    instrument(&["Indices"], "100", "NDQ", "US 100 Index", "index cfd", "TVC"),
    instrument(&["Funds"], "ETF", "NDQ", "BetaShares NASDAQ 100 ETF", "fund etf", "ASX"),
    instrument(&["Funds"], "ETF", "NDQ", "Invesco QQQ Trust Series I", "fund etf", "TRADEGATE"),
    instrument(&["Funds"], "ETF", "NDQ", "Invesco QQQ Trust Series I", "fund etf", "BER"),
    instrument(&["Funds"], "ETF", "NDQ", "Invesco QQQ Trust Series I", "fund etf", "HAM"),
    instrument(&["Indices"], "100", "NDQM", "NASDAQ 100 Index (NDX)", "index cfd", "FXOpen"),
    instrument(&["Funds"], "CASH", "NDQ100", "Nasdaq Cash", "index cfd", "Eightcap"),
    instrument(&["Options"], "CW", "NDQCC", "Cititwarrants 36.2423 NDQ 07-Jun-35 Instal Mini", "warrant", "CHIXAU"),
    instrument(&["Crypto"], "CR", "NDQUSD", "Nasdaq666", "spot crypto", "CRYPTO"),
    instrument(&["Funds"], "3L", "NDQ3L", "SG Issuer SA Exchange Traded Product 2022-03-18", "fund etf", "Euronext Paris"),
    instrument(&["Funds"], "3S", "NDQ3S", "SG Issuer SA War 2022- Without fixed mat on ...", "fund etf", "Euronext Paris"),
    instrument(&["Forex", "Indices"], "USD", "NDQUSD", "US Tech (NDQ) / US Dollar", "index cfd", "easyMarkets"),
    instrument(&["Indices"], "SPX", "SPX", "S&P 500 Index", "index", "CBOE"),
    instrument(&["Indices"], "DJI", "DJI", "Dow Jones Industrial Average", "index", "INDEXDJX"),
    instrument(&["Indices"], "DAX", "DAX", "Germany 40 Index", "index", "XETRA"),
    instrument(&["Funds"], "ETF", "SPY", "SPDR S&P 500 ETF Trust", "fund etf", "NYSE Arca"),
    instrument(&["Funds"], "ETF", "QQQ", "Invesco QQQ Trust Series I", "fund etf", "NASDAQ"),
    instrument(&["Funds"], "ETF", "VOO", "Vanguard S&P 500 ETF", "fund etf", "NYSE Arca"),
    instrument(&["Stocks"], "STK", "AAPL", "Apple Inc.", "equity", "NASDAQ"),
    instrument(&["Stocks"], "STK", "TSLA", "Tesla, Inc.", "equity", "NASDAQ"),
    instrument(&["Stocks"], "STK", "NFLX", "Netflix, Inc.", "equity", "NASDAQ"),
    instrument(&["Stocks"], "STK", "MSFT", "Microsoft Corporation", "equity", "NASDAQ"),
    instrument(&["Stocks"], "STK", "NVDA", "NVIDIA Corporation", "equity", "NASDAQ"),
    instrument(&["Futures"], "FUT", "ES1!", "E-mini S&P 500 Futures", "futures", "CME"),
    instrument(&["Futures"], "FUT", "NQ1!", "E-mini NASDAQ 100 Futures", "futures", "CME"),
    instrument(&["Futures"], "FUT", "CL1!", "Crude Oil WTI Futures", "futures", "NYMEX"),
    instrument(&["Futures"], "FUT", "GC1!", "Gold Futures", "futures", "COMEX"),
    instrument(&["Futures"], "FUT", "USOIL", "WTI Crude Oil Spot", "energy cfd", "TVC"),
    instrument(&["Forex"], "FX", "EURUSD", "Euro / US Dollar", "forex", "FX"),
    instrument(&["Forex"], "FX", "USDJPY", "US Dollar / Japanese Yen", "forex", "FX"),
    instrument(&["Forex"], "FX", "GBPUSD", "British Pound / US Dollar", "forex", "FX"),
    instrument(&["Forex"], "FX", "AUDUSD", "Australian Dollar / US Dollar", "forex", "FX"),
    instrument(&["Crypto"], "CR", "BTCUSD", "Bitcoin / US Dollar", "spot crypto", "CRYPTO"),
    instrument(&["Crypto"], "CR", "ETHUSD", "Ethereum / US Dollar", "spot crypto", "CRYPTO"),
    instrument(&["Crypto"], "CR", "SOLUSD", "Solana / US Dollar", "spot crypto", "CRYPTO"),
    instrument(&["Bonds"], "BND", "US10Y", "US 10 Year Treasury Yield", "bond yield", "TVC"),
    instrument(&["Bonds"], "BND", "US02Y", "US 2 Year Treasury Yield", "bond yield", "TVC"),
    instrument(&["Economy"], "ECO", "USGDP", "United States GDP QoQ", "economy", "FRED"),
    instrument(&["Economy"], "ECO", "USCPI", "United States CPI YoY", "economy", "FRED"),
    instrument(&["Options"], "OPT", "AAPL250117C00200000", "AAPL 17-Jan-2025 200 Call", "equity option", "OPRA"),
    instrument(&["Options"], "OPT", "TSLA250117P00150000", "TSLA 17-Jan-2025 150 Put", "equity option", "OPRA"),
];

/// Trim tags, drop blanks and repeats (first wins), join with `;`.
pub fn normalize_filters<'a>(filters: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for raw in filters {
        let value = raw.trim();
        if !value.is_empty() && !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen.join(FILTER_SEPARATOR.to_string().as_str())
}

impl Instrument {
    pub fn to_row(&self) -> UniverseRow {
        UniverseRow {
            symbol: self.symbol.to_string(),
            name: self.name.to_string(),
            market: self.market.to_string(),
            venue: self.venue.to_string(),
            filters: normalize_filters(self.filters.iter().copied()),
            badge: self.badge.to_string(),
            exchange: None,
        }
    }
}

/// Universe rows for the whole catalog, in catalog order.
pub fn build_rows() -> Vec<UniverseRow> {
    INSTRUMENTS.iter().map(Instrument::to_row).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Sorted by filters, then symbol, venue and badge.
    Sorted,
    /// Shuffled with a seeded stream, or OS entropy when unseeded.
    Shuffled { seed: Option<u64> },
}

pub fn order_rows(mut rows: Vec<UniverseRow>, order: RowOrder) -> Vec<UniverseRow> {
    match order {
        RowOrder::Sorted => rows.sort_by(|a, b| {
            (&a.filters, &a.symbol, &a.venue, &a.badge).cmp(&(
                &b.filters, &b.symbol, &b.venue, &b.badge,
            ))
        }),
        RowOrder::Shuffled { seed } => {
            let mut rng = generator::rng_from_seed(seed);
            rows.shuffle(&mut rng);
        }
    }
    rows
}

/// Keep at most `limit` rows. A limit of zero is rejected.
pub fn limit_rows(
    mut rows: Vec<UniverseRow>,
    limit: Option<usize>,
) -> Result<Vec<UniverseRow>, SynthError> {
    match limit {
        None => Ok(rows),
        Some(0) => Err(SynthError::InvalidArgument("limit must be positive".into())),
        Some(n) => {
            rows.truncate(n);
            Ok(rows)
        }
    }
}

/// Per-tag row counts, e.g. `Crypto:4, Forex:5`, tags sorted.
pub fn summarize(rows: &[UniverseRow]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        for tag in row.filter_tags() {
            *counts.entry(tag).or_default() += 1;
        }
    }
    counts
        .iter()
        .map(|(tag, count)| format!("{tag}:{count}"))
        .collect::<Vec<_>>()
        .join(", ")
}
