pub mod analysis;
pub mod approval;
pub mod error;
pub mod execution_result;
pub mod instrument;
pub mod market_data;
pub mod proposal;
pub mod session;
pub mod trading_state;

pub use analysis::{AnalysisResult, Signal, MAX_KEY_FACTORS};
pub use approval::{ApprovalDecision, ApprovalStatus};
pub use error::ErrorKind;
pub use execution_result::ExecutionResult;
pub use instrument::{AnalystKind, Instrument, MarketKind};
pub use market_data::{AccountContext, Candle, MarketDataSnapshot, Orderbook, OrderbookLevel, Ticker};
pub use proposal::{ProposalOverrides, TradeAction, TradeProposal};
pub use session::{Session, SessionId, SessionStatus, ThreadId};
pub use trading_state::{PartialTradingState, Stage, TradingState, MAX_REANALYZE_RETRIES, REASONING_LOG_CAP};
