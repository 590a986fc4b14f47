//! Role → rule list lookup.
//!
//! Every role gets a pre-built, immutable rule list at startup. Order is
//! fixed: bot classification, shield heuristic, rate limit. Cheaper and
//! more certain signals run first so a rejected bot never spends a
//! rate-limit slot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{GateConfig, RoleLimit};
use crate::security::identity::Role;
use crate::security::providers::{BotDecisionProvider, ShieldDecisionProvider};
use crate::security::rate_limit::SlidingWindowLimiter;
use crate::security::rules::{
    BotClassificationRule, RateLimitRule, SecurityRule, ShieldHeuristicRule,
};

/// Rate budget bound to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulePolicy {
    pub role: Role,
    pub max_requests: u64,
    pub window_length: Duration,
}

impl RulePolicy {
    pub fn from_limit(role: Role, limit: RoleLimit) -> Self {
        Self {
            role,
            max_requests: limit.max_requests,
            window_length: Duration::from_secs(limit.window_secs),
        }
    }

    /// User-facing message for a request over this budget.
    pub fn limit_message(&self) -> String {
        let per = match self.window_length.as_secs() {
            60 => "minute".to_string(),
            1 => "second".to_string(),
            3600 => "hour".to_string(),
            secs => format!("{} seconds", secs),
        };
        let mut message = format!(
            "{} request limit exceeded ({} per {}).",
            self.role.title(),
            self.max_requests,
            per
        );
        if self.role == Role::Guest {
            message.push_str(" Sign up for higher limits.");
        }
        message
    }
}

/// Optional external collaborators; absent providers drop their rule.
#[derive(Clone, Default)]
pub struct Providers {
    pub bot: Option<Arc<dyn BotDecisionProvider>>,
    pub shield: Option<Arc<dyn ShieldDecisionProvider>>,
}

pub type RuleList = Arc<[Arc<dyn SecurityRule>]>;

/// Immutable mapping from role to its ordered rules.
#[derive(Clone)]
pub struct PolicyRegistry {
    rules: HashMap<Role, RuleList>,
}

impl PolicyRegistry {
    pub fn new(rules: HashMap<Role, Vec<Arc<dyn SecurityRule>>>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(role, list)| (role, RuleList::from(list)))
                .collect(),
        }
    }

    /// Build the standard rule set for every role.
    pub fn from_config(
        config: &GateConfig,
        limiter: Arc<SlidingWindowLimiter>,
        providers: &Providers,
    ) -> Self {
        let allowed_categories: Arc<HashSet<String>> =
            Arc::new(config.bot.allowed_categories.iter().cloned().collect());

        let mut rules = HashMap::new();
        for role in Role::ALL {
            let mut list: Vec<Arc<dyn SecurityRule>> = Vec::with_capacity(3);

            if let Some(bot) = &providers.bot {
                list.push(Arc::new(BotClassificationRule::new(
                    Arc::clone(bot),
                    Arc::clone(&allowed_categories),
                    config.rules.bot,
                )));
            }
            if let Some(shield) = &providers.shield {
                list.push(Arc::new(ShieldHeuristicRule::new(
                    Arc::clone(shield),
                    config.rules.shield,
                )));
            }

            let policy = RulePolicy::from_limit(role, config.roles.for_role(role));
            list.push(Arc::new(RateLimitRule::new(
                policy,
                Arc::clone(&limiter),
                config.rules.rate_limit,
            )));

            rules.insert(role, list);
        }

        Self::new(rules)
    }

    /// Ordered rules for `role`, or `None` when the role has no policy.
    pub fn policy_for(&self, role: Role) -> Option<&[Arc<dyn SecurityRule>]> {
        self.rules.get(&role).map(|list| &**list)
    }
}
