pub mod bcv;
pub mod binance_p2p;
pub mod util;

pub use bcv::BcvProvider;
pub use binance_p2p::BinanceP2pProvider;
