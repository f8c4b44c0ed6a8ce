//! External collaborators: market data in, notifications out.

pub mod binance;
pub mod market_data;
pub mod message;
pub mod notifier;
pub mod routing;
pub mod telegram;
pub mod yahoo;

pub use binance::BinanceMarketDataProvider;
pub use market_data::{InMemoryMarketDataProvider, MarketDataProvider};
pub use message::MessageFormatter;
pub use notifier::{LogNotifier, Notifier};
pub use routing::RoutingMarketDataProvider;
pub use telegram::TelegramNotifier;
pub use yahoo::YahooMarketDataProvider;
