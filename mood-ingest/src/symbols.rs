//! Provider symbol normalization
//!
//! Maps internal market ids to the tickers the live provider understands.
//! Internal ids are the stable keys everywhere else in the pipeline;
//! provider tickers never leave this crate.

/// (internal id, provider ticker) for every supported index
pub const MARKET_SYMBOLS: &[(&str, &str)] = &[
    ("US_SPX", "SPY"),
    ("US_IYY", "DIA"),
    ("US_CCMP", "QQQ"),
    ("EU_STOXX", "EXS1.DE"),
    ("GB_FTSE", "EUFX"),
    ("JP_NIKKEI", "0050.KL"),
    ("CN_SSE", "YINN"),
    ("IN_SENSEX", "INDY"),
    ("BR_IBOV", "EWZ"),
    ("KR_KOSPI", "EWY"),
    ("RU_MOEX", "RSX"),
    ("AU_ASX", "EWA"),
    ("CH_SMI", "EWL"),
    ("SG_STI", "EWS"),
    ("MX_MEXBOL", "EWW"),
];

/// Look up the provider ticker for an internal market id
pub fn provider_symbol(market_id: &str) -> Option<&'static str> {
    MARKET_SYMBOLS
        .iter()
        .find(|(id, _)| *id == market_id)
        .map(|(_, symbol)| *symbol)
}
