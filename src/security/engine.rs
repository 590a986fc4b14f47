//! Rule evaluation.
//!
//! # Responsibilities
//! - Run a role's rules in order, stopping at the first live denial
//! - Bound every rule by a deadline
//! - Turn rule faults (errors, timeouts, panics) into an internal-error
//!   decision instead of letting them reach the HTTP layer
//!
//! # Design Decisions
//! - Fail closed: a fault in a live rule denies the request
//! - Dry-run rules are evaluated and logged but never block, including
//!   when they fault. This is the one fail-open path besides test mode; a
//!   rule is only dry-run when configured so, and every fault (live or
//!   dry-run) is counted in `admission_rule_faults_total`

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;

use crate::config::RuleMode;
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;
use crate::security::decision::{Decision, Verdict};
use crate::security::identity::Identity;
use crate::security::rules::{RequestContext, RuleError, SecurityRule};

#[derive(Debug, Clone)]
pub struct RuleEngine {
    rule_timeout: Duration,
}

impl RuleEngine {
    pub fn new(rule_timeout: Duration) -> Self {
        Self { rule_timeout }
    }

    pub async fn evaluate(
        &self,
        identity: &Identity,
        context: &RequestContext,
        rules: &[Arc<dyn SecurityRule>],
    ) -> Decision {
        for rule in rules {
            let started = Instant::now();
            let outcome = self.run_rule(rule.as_ref(), identity, context).await;
            metrics::record_rule_duration(rule.name(), started);

            let dry_run = rule.mode() == RuleMode::DryRun;
            match outcome {
                Ok(verdict) if verdict.allowed => {}
                Ok(verdict) if dry_run => {
                    tracing::info!(
                        rule = rule.name(),
                        client = %identity.fingerprint,
                        role = %identity.role,
                        reason = %verdict.reason,
                        "Dry-run rule would deny request"
                    );
                }
                Ok(verdict) => {
                    tracing::warn!(
                        rule = rule.name(),
                        client = %identity.fingerprint,
                        role = %identity.role,
                        reason = %verdict.reason,
                        "Request denied"
                    );
                    return verdict.into();
                }
                Err(e) if dry_run => {
                    metrics::record_rule_fault(rule.name(), RuleMode::DryRun);
                    tracing::error!(rule = rule.name(), error = %e, "Dry-run rule failed");
                }
                Err(e) => {
                    metrics::record_rule_fault(rule.name(), RuleMode::Live);
                    tracing::error!(
                        rule = rule.name(),
                        client = %identity.fingerprint,
                        error = %e,
                        "Security rule failed, denying request"
                    );
                    return Decision::internal_error();
                }
            }
        }

        Decision::allow()
    }

    async fn run_rule(
        &self,
        rule: &dyn SecurityRule,
        identity: &Identity,
        context: &RequestContext,
    ) -> Result<Verdict, RuleError> {
        let guarded = AssertUnwindSafe(rule.evaluate(identity, context)).catch_unwind();

        match with_deadline(self.rule_timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(_panic)) => Err(RuleError::Panicked { rule: rule.name() }),
            Err(elapsed) => Err(RuleError::Timeout {
                rule: rule.name(),
                after: elapsed.after,
            }),
        }
    }
}
