//! In-memory snapshot of the trading bot's state.
//!
//! This module handles:
//! - The single shared snapshot behind a coarse lock
//! - The ingestion API used by the trusted bot process
//! - Filtered read views served by the gateway endpoints
//!
//! The snapshot lives only as long as the process; nothing is persisted.

pub mod types;

use std::collections::VecDeque;
use std::sync::Arc;

use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::metrics;

pub use types::{
    AccountInfo, BotStatus, MarketAnalysis, PerformanceReport, Position, StateUpdate,
    TradeDecision, TradeRecord,
};

/// Maximum number of decisions retained, newest first.
pub const MAX_RECENT_DECISIONS: usize = 100;

/// Current UTC time as an RFC 3339 string.
pub(crate) fn utc_now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// The bot state snapshot. All mutation goes through [`StateHandle`].
#[derive(Debug, Default)]
struct BotState {
    status: BotStatus,
    last_update: Option<String>,
    account_value: Decimal,
    positions: Vec<Position>,
    recent_decisions: VecDeque<TradeDecision>,
    trade_history: VecDeque<TradeRecord>,
    market_analyses: Vec<MarketAnalysis>,
}

/// Shared, lock-guarded handle to the bot state.
///
/// Ingest calls take the write lock for whole-field replacement or a
/// single head insertion, so concurrent pushes never interleave into a
/// lost update.
#[derive(Debug, Clone, Default)]
pub struct StateHandle {
    inner: Arc<RwLock<BotState>>,
}

impl StateHandle {
    /// Fresh, idle snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial update into the snapshot and stamp `last_update`.
    pub async fn apply_update(&self, update: StateUpdate) {
        let mut state = self.inner.write().await;
        if let Some(status) = update.status {
            state.status = status;
        }
        if let Some(account_value) = update.account_value {
            state.account_value = account_value;
        }
        if let Some(positions) = update.positions {
            state.positions = positions;
        }
        if let Some(decisions) = update.recent_decisions {
            state.recent_decisions = decisions
                .into_iter()
                .take(MAX_RECENT_DECISIONS)
                .collect();
        }
        if let Some(trades) = update.trade_history {
            state.trade_history = trades.into();
        }
        if let Some(analyses) = update.market_analyses {
            state.market_analyses = latest_per_asset(analyses);
        }
        state.last_update = Some(utc_now_rfc3339());
        metrics::inc_state_updates();
    }

    /// Record a decision at the head of the list, evicting past the cap.
    pub async fn push_decision(&self, decision: TradeDecision) {
        let mut state = self.inner.write().await;
        state.recent_decisions.push_front(decision);
        state.recent_decisions.truncate(MAX_RECENT_DECISIONS);
        metrics::inc_decisions_recorded();
    }

    /// Record a completed trade at the head of the history.
    pub async fn push_trade(&self, trade: TradeRecord) {
        let mut state = self.inner.write().await;
        state.trade_history.push_front(trade);
        metrics::inc_trades_recorded();
    }

    /// Set the bot status without touching anything else.
    pub async fn set_status(&self, status: BotStatus) {
        self.inner.write().await.status = status;
    }

    /// Stamp `last_update` with the current time.
    pub async fn touch(&self) {
        self.inner.write().await.last_update = Some(utc_now_rfc3339());
    }

    /// Current bot status.
    pub async fn status(&self) -> BotStatus {
        self.inner.read().await.status
    }

    /// Account summary.
    pub async fn account(&self) -> AccountInfo {
        let state = self.inner.read().await;
        AccountInfo {
            account_value: state.account_value,
            total_positions: state.positions.len(),
            status: state.status,
            last_update: state.last_update.clone(),
        }
    }

    /// Open positions.
    pub async fn positions(&self) -> Vec<Position> {
        self.inner.read().await.positions.clone()
    }

    /// Up to `limit` recent decisions, optionally filtered by asset.
    pub async fn decisions(&self, limit: usize, asset: Option<&str>) -> Vec<TradeDecision> {
        let state = self.inner.read().await;
        state
            .recent_decisions
            .iter()
            .filter(|d| matches_asset(&d.asset, asset))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Market analyses, optionally filtered by asset.
    pub async fn analyses(&self, asset: Option<&str>) -> Vec<MarketAnalysis> {
        let state = self.inner.read().await;
        state
            .market_analyses
            .iter()
            .filter(|a| matches_asset(&a.asset, asset))
            .cloned()
            .collect()
    }

    /// Up to `limit` trades, optionally filtered by asset and status.
    /// Asset matching is case-insensitive; status matching is exact.
    pub async fn trades(
        &self,
        limit: usize,
        asset: Option<&str>,
        status: Option<&str>,
    ) -> Vec<TradeRecord> {
        let state = self.inner.read().await;
        state
            .trade_history
            .iter()
            .filter(|t| matches_asset(&t.asset, asset))
            .filter(|t| status.is_none_or(|s| t.status == s))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Aggregate performance over the full trade history.
    pub async fn performance(&self) -> PerformanceReport {
        let state = self.inner.read().await;
        let total_trades = state.trade_history.len();
        let mut total_pnl = Decimal::ZERO;
        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        for trade in &state.trade_history {
            if let Some(pnl) = trade.pnl {
                total_pnl += pnl;
                if pnl > Decimal::ZERO {
                    winning_trades += 1;
                } else if pnl < Decimal::ZERO {
                    losing_trades += 1;
                }
            }
        }
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        PerformanceReport {
            account_value: state.account_value,
            total_pnl,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            positions: state.positions.len(),
            status: state.status,
        }
    }
}

fn matches_asset(candidate: &str, filter: Option<&str>) -> bool {
    filter.is_none_or(|f| candidate.eq_ignore_ascii_case(f))
}

/// Collapse duplicate assets, later entries winning, input order otherwise
/// preserved.
fn latest_per_asset(analyses: Vec<MarketAnalysis>) -> Vec<MarketAnalysis> {
    let mut out: Vec<MarketAnalysis> = Vec::with_capacity(analyses.len());
    for analysis in analyses {
        if let Some(existing) = out
            .iter_mut()
            .find(|a| a.asset.eq_ignore_ascii_case(&analysis.asset))
        {
            *existing = analysis;
        } else {
            out.push(analysis);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn decision(n: usize, asset: &str) -> TradeDecision {
        TradeDecision {
            timestamp: format!("2026-01-05T12:{:02}:00Z", n % 60),
            asset: asset.to_string(),
            action: "buy".to_string(),
            conviction: "high".to_string(),
            signal_type: "momentum".to_string(),
            reasoning: format!("decision {n}"),
            position_size: None,
            entry_price: None,
            take_profit: None,
            stop_loss: None,
        }
    }

    fn trade(asset: &str, status: &str, pnl: Option<Decimal>) -> TradeRecord {
        TradeRecord {
            timestamp: "2026-01-05T12:00:00Z".to_string(),
            asset: asset.to_string(),
            action: "buy".to_string(),
            size: dec!(0.1),
            price: dec!(100),
            value: dec!(10),
            status: status.to_string(),
            pnl,
        }
    }

    fn analysis(asset: &str, rsi: f64) -> MarketAnalysis {
        MarketAnalysis {
            asset: asset.to_string(),
            timestamp: "2026-01-05T12:00:00Z".to_string(),
            price: dec!(100),
            change_24h: 1.5,
            rsi,
            signal: "bullish".to_string(),
            conviction: "medium".to_string(),
            quality_score: 0.8,
        }
    }

    #[tokio::test]
    async fn decision_list_caps_at_one_hundred() {
        let state = StateHandle::new();
        for n in 1..=105 {
            state.push_decision(decision(n, "BTC")).await;
        }

        let decisions = state.decisions(MAX_RECENT_DECISIONS, None).await;
        assert_eq!(decisions.len(), 100);
        // Newest first: 105 at the head, 1 through 5 evicted.
        assert_eq!(decisions[0].reasoning, "decision 105");
        assert_eq!(decisions[99].reasoning, "decision 6");
    }

    #[tokio::test]
    async fn decisions_filter_by_asset_then_limit() {
        let state = StateHandle::new();
        for n in 1..=6 {
            let asset = if n % 2 == 0 { "ETH" } else { "BTC" };
            state.push_decision(decision(n, asset)).await;
        }

        let eth = state.decisions(2, Some("eth")).await;
        assert_eq!(eth.len(), 2);
        assert!(eth.iter().all(|d| d.asset == "ETH"));
        assert_eq!(eth[0].reasoning, "decision 6");
    }

    #[tokio::test]
    async fn trades_filter_case_insensitive_asset_and_exact_status() {
        let state = StateHandle::new();
        state.push_trade(trade("BTC", "filled", None)).await;
        state.push_trade(trade("BTC", "cancelled", None)).await;
        state.push_trade(trade("ETH", "filled", None)).await;

        let filtered = state.trades(50, Some("btc"), Some("filled")).await;
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].asset, "BTC");
        assert_eq!(filtered[0].status, "filled");

        // Status comparison stays exact.
        assert!(state.trades(50, None, Some("FILLED")).await.is_empty());
    }

    #[tokio::test]
    async fn apply_update_merges_only_supplied_fields() {
        let state = StateHandle::new();
        state.push_trade(trade("BTC", "filled", None)).await;

        state
            .apply_update(StateUpdate {
                status: Some(BotStatus::Running),
                account_value: Some(dec!(1500)),
                ..StateUpdate::default()
            })
            .await;

        let account = state.account().await;
        assert_eq!(account.status, BotStatus::Running);
        assert_eq!(account.account_value, dec!(1500));
        assert!(account.last_update.is_some());
        // Untouched list survives the merge.
        assert_eq!(state.trades(50, None, None).await.len(), 1);
    }

    #[tokio::test]
    async fn apply_update_truncates_oversized_decision_list() {
        let state = StateHandle::new();
        let decisions: Vec<_> = (1..=120).map(|n| decision(n, "BTC")).collect();
        state
            .apply_update(StateUpdate {
                recent_decisions: Some(decisions),
                ..StateUpdate::default()
            })
            .await;

        assert_eq!(state.decisions(200, None).await.len(), 100);
    }

    #[tokio::test]
    async fn analyses_keep_latest_entry_per_asset() {
        let state = StateHandle::new();
        state
            .apply_update(StateUpdate {
                market_analyses: Some(vec![
                    analysis("BTC", 40.0),
                    analysis("ETH", 55.0),
                    analysis("BTC", 62.0),
                ]),
                ..StateUpdate::default()
            })
            .await;

        let all = state.analyses(None).await;
        assert_eq!(all.len(), 2);
        let btc = state.analyses(Some("BTC")).await;
        assert_eq!(btc.len(), 1);
        assert_eq!(btc[0].rsi, 62.0);
    }

    #[tokio::test]
    async fn performance_aggregates_reported_pnl() {
        let state = StateHandle::new();
        state.push_trade(trade("BTC", "filled", Some(dec!(12)))).await;
        state.push_trade(trade("ETH", "filled", Some(dec!(-4)))).await;
        state.push_trade(trade("SOL", "filled", None)).await;
        state
            .apply_update(StateUpdate {
                account_value: Some(dec!(1000)),
                ..StateUpdate::default()
            })
            .await;

        let report = state.performance().await;
        assert_eq!(report.total_trades, 3);
        assert_eq!(report.winning_trades, 1);
        assert_eq!(report.losing_trades, 1);
        assert_eq!(report.total_pnl, dec!(8));
        assert!((report.win_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.account_value, dec!(1000));
    }

    #[tokio::test]
    async fn empty_history_reports_zero_win_rate() {
        let state = StateHandle::new();
        let report = state.performance().await;
        assert_eq!(report.total_trades, 0);
        assert_eq!(report.win_rate, 0.0);
        assert_eq!(report.total_pnl, Decimal::ZERO);
    }

    #[tokio::test]
    async fn status_transitions_do_not_stamp_updates() {
        let state = StateHandle::new();
        state.set_status(BotStatus::Running).await;
        assert_eq!(state.status().await, BotStatus::Running);
        assert!(state.account().await.last_update.is_none());

        state.touch().await;
        assert!(state.account().await.last_update.is_some());
    }
}
