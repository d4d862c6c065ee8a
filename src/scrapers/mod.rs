pub mod autotrader;

pub use autotrader::AutoTraderScraper;
