//! Bot state records exposed by the gateway.
//!
//! Timestamps produced by the bot arrive as ISO-8601 strings and are
//! relayed verbatim; only `last_update` is stamped by the gateway itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Bot lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BotStatus {
    /// Process started, no state pushed yet.
    #[default]
    Idle,
    /// Bot is actively trading.
    Running,
    /// Bot was shut down.
    Stopped,
}

/// An open position held by the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Asset ticker (e.g. "BTC").
    pub asset: String,
    /// Position side as reported by the bot (e.g. "long").
    pub side: String,
    /// Position size in units of the asset.
    pub size: Decimal,
    /// Average entry price.
    pub entry_price: Decimal,
    /// Latest observed price.
    pub current_price: Decimal,
    /// Unrealized profit and loss.
    pub pnl: Decimal,
    /// Unrealized P&L as a percentage of the entry.
    pub pnl_percentage: f64,
}

/// A trading decision made by the bot, executed or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    /// When the decision was made (ISO-8601, bot clock).
    pub timestamp: String,
    /// Asset ticker.
    pub asset: String,
    /// Decided action (e.g. "buy", "sell", "hold").
    pub action: String,
    /// Conviction level (e.g. "high", "medium", "low").
    pub conviction: String,
    /// Signal family that triggered the decision.
    pub signal_type: String,
    /// Free-form reasoning from the strategy.
    pub reasoning: String,
    /// Intended position size, when the decision was actionable.
    #[serde(default)]
    pub position_size: Option<Decimal>,
    /// Intended entry price.
    #[serde(default)]
    pub entry_price: Option<Decimal>,
    /// Take-profit target.
    #[serde(default)]
    pub take_profit: Option<Decimal>,
    /// Stop-loss level.
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
}

/// Point-in-time market analysis for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    /// Asset ticker.
    pub asset: String,
    /// When the analysis was computed (ISO-8601, bot clock).
    pub timestamp: String,
    /// Spot price at analysis time.
    pub price: Decimal,
    /// 24h price change in percent.
    pub change_24h: f64,
    /// Relative strength index.
    pub rsi: f64,
    /// Overall signal (e.g. "bullish", "bearish", "neutral").
    pub signal: String,
    /// Conviction level.
    pub conviction: String,
    /// Signal quality score.
    pub quality_score: f64,
}

/// A completed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Execution time (ISO-8601, bot clock).
    pub timestamp: String,
    /// Asset ticker.
    pub asset: String,
    /// Executed action ("buy" or "sell").
    pub action: String,
    /// Executed size.
    pub size: Decimal,
    /// Execution price.
    pub price: Decimal,
    /// Total trade value.
    pub value: Decimal,
    /// Execution status (e.g. "executed", "filled", "cancelled").
    pub status: String,
    /// Realized P&L, when the bot reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Decimal>,
}

/// Account summary derived from the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Total account value.
    pub account_value: Decimal,
    /// Number of open positions.
    pub total_positions: usize,
    /// Bot status.
    pub status: BotStatus,
    /// When the bot last pushed state (ISO-8601), if ever.
    pub last_update: Option<String>,
}

/// Aggregate performance statistics over the trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Total account value.
    pub account_value: Decimal,
    /// Sum of realized P&L across all trades that report one.
    pub total_pnl: Decimal,
    /// Total number of recorded trades.
    pub total_trades: usize,
    /// Trades with positive P&L.
    pub winning_trades: usize,
    /// Trades with negative P&L.
    pub losing_trades: usize,
    /// Winning trades as a percentage of all trades.
    pub win_rate: f64,
    /// Number of open positions.
    pub positions: usize,
    /// Bot status.
    pub status: BotStatus,
}

/// Partial state pushed by the bot. Absent fields leave the snapshot
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateUpdate {
    /// New bot status.
    #[serde(default)]
    pub status: Option<BotStatus>,
    /// New account value.
    #[serde(default)]
    pub account_value: Option<Decimal>,
    /// Full replacement for the open-positions list.
    #[serde(default)]
    pub positions: Option<Vec<Position>>,
    /// Full replacement for the recent-decisions list.
    #[serde(default)]
    pub recent_decisions: Option<Vec<TradeDecision>>,
    /// Full replacement for the trade history.
    #[serde(default)]
    pub trade_history: Option<Vec<TradeRecord>>,
    /// Full replacement for the market analyses.
    #[serde(default)]
    pub market_analyses: Option<Vec<MarketAnalysis>>,
}
