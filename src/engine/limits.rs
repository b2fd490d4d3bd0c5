//! Limit/risk evaluator.
//!
//! A pure function over current aggregates: it never mutates stores, it
//! returns zero or more alerts plus an optional forced PAUSED transition
//! which the status-update step applies. The surrounding system can compose
//! additional checks through [`LimitCheck`].

use std::sync::Arc;

use crate::alerts::{Alert, Severity};
use crate::orders::SymbolSideSnapshot;
use crate::strat::{PairStrat, StratBrief};

/// Inputs to one evaluation pass.
pub struct EvalContext<'a> {
    pub pair_strat: &'a PairStrat,
    pub strat_brief: &'a StratBrief,
    pub symbol_side_snapshot: &'a SymbolSideSnapshot,
}

/// Outcome of one evaluation pass.
#[derive(Debug, Default)]
pub struct Evaluation {
    pub alerts: Vec<Alert>,
    /// True when any rule demands the strategy stop trading
    pub pause: bool,
}

impl Evaluation {
    fn breach(&mut self, alert: Alert) {
        self.pause = true;
        self.alerts.push(alert);
    }
}

/// Externally supplied predicate composed into the evaluator.
///
/// A returned alert with severity `Error` or above forces a pause, matching
/// the built-in rules.
pub trait LimitCheck: Send + Sync {
    fn check(&self, ctx: &EvalContext<'_>) -> Option<Alert>;
}

/// Evaluates the built-in limit rules plus any composed checks.
#[derive(Default)]
pub struct LimitEvaluator {
    checks: Vec<Arc<dyn LimitCheck>>,
}

impl LimitEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose an external check into every future evaluation.
    pub fn add_check(&mut self, check: Arc<dyn LimitCheck>) {
        self.checks.push(check);
    }

    /// Evaluate all rules independently; any rule can trigger a pause.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Evaluation {
        let mut evaluation = Evaluation::default();

        self.check_residual(ctx, &mut evaluation);
        self.check_cancel_rate(ctx, &mut evaluation);

        for check in &self.checks {
            if let Some(alert) = check.check(ctx) {
                if alert.severity >= Severity::Error {
                    evaluation.pause = true;
                }
                evaluation.alerts.push(alert);
            }
        }

        evaluation
    }

    /// Rule 1: residual breach.
    fn check_residual(&self, ctx: &EvalContext<'_>, evaluation: &mut Evaluation) {
        let residual = &ctx.pair_strat.strat_status.residual;
        let max_residual = ctx
            .pair_strat
            .strat_limits
            .residual_restriction
            .max_residual;
        if residual.residual_notional > max_residual {
            evaluation.breach(Alert::error(format!(
                "residual notional {} exceeds max residual {}",
                residual.residual_notional, max_residual
            )));
        }
    }

    /// Rule 2: cancel-rate breach.
    ///
    /// Only armed once the side's order count passes the waiver threshold,
    /// and only for sides that have actually cancelled quantity.
    fn check_cancel_rate(&self, ctx: &EvalContext<'_>, evaluation: &mut Evaluation) {
        let snapshot = ctx.symbol_side_snapshot;
        let waived_min_orders = ctx.pair_strat.strat_limits.cancel_rate.waived_min_orders;
        if snapshot.order_count <= waived_min_orders {
            return;
        }
        let side_brief = ctx.strat_brief.side_brief(snapshot.side);
        if side_brief.all_bkr_cxlled_qty.is_zero() {
            // A side with no cancels stays exempt even past the waiver.
            return;
        }
        if side_brief.consumable_cxl_qty.is_sign_negative() {
            evaluation.breach(Alert::error(format!(
                "Consumable cxl qty can't be < 0, current consumable_cxl_qty {} for {} {}",
                side_brief.consumable_cxl_qty, snapshot.security, snapshot.side
            )));
        }
    }
}
