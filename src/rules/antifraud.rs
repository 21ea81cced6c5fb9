use crate::config::Config;
use crate::domain::merchant::Merchant;
use crate::domain::payment::Payment;
use rust_decimal::Decimal;

/// A veto raised by an anti-fraud rule. Carries the rule name and a
/// human-readable reason for the rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct FraudRejection {
    pub rule: String,
    pub reason: String,
}

/// An independent validator in the anti-fraud chain. Returns `Ok` to allow
/// or a rejection to veto the whole creation request. Rules must not mutate
/// the payment.
pub trait AntiFraudRule: Send + Sync {
    fn validate(&self, payment: &Payment, merchant: &Merchant) -> Result<(), FraudRejection>;
}

/// Declarative registration metadata for an anti-fraud rule.
#[derive(Debug, Clone)]
pub struct FraudRuleMeta {
    pub name: &'static str,
    pub priority: i32,
}

/// The ordered anti-fraud chain. Rules are stable-sorted by ascending
/// priority at build time (ties keep registration order); the registry is
/// read-only afterwards. Adding a rule is purely additive registration.
#[derive(Default)]
pub struct AntiFraudRegistry {
    rules: Vec<(FraudRuleMeta, Box<dyn AntiFraudRule>)>,
}

impl AntiFraudRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in HighAmount rule.
    pub fn builtin(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(
            FraudRuleMeta {
                name: "HighAmount",
                priority: 1,
            },
            Box::new(HighAmountRule::new(config.high_amount_threshold)),
        );
        registry
    }

    pub fn register(&mut self, meta: FraudRuleMeta, rule: Box<dyn AntiFraudRule>) {
        self.rules.push((meta, rule));
        self.rules.sort_by_key(|(meta, _)| meta.priority);
    }

    /// The full chain in priority order.
    pub fn rules(&self) -> impl Iterator<Item = (&FraudRuleMeta, &dyn AntiFraudRule)> {
        self.rules
            .iter()
            .map(|(meta, rule)| (meta, rule.as_ref()))
    }
}

/// Vetoes payments whose amount exceeds a fixed threshold. The threshold is
/// a property of the rule, injected at registration time.
pub struct HighAmountRule {
    threshold: Decimal,
}

impl HighAmountRule {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }
}

impl AntiFraudRule for HighAmountRule {
    fn validate(&self, payment: &Payment, _merchant: &Merchant) -> Result<(), FraudRejection> {
        if payment.amount > self.threshold {
            return Err(FraudRejection {
                rule: "HighAmount".to_string(),
                reason: format!(
                    "amount {} exceeds the allowed maximum of {}",
                    payment.amount, self.threshold
                ),
            });
        }
        Ok(())
    }
}
