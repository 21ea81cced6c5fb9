use crate::config::Config;
use crate::domain::merchant::Merchant;
use crate::domain::payment::{CreatePaymentRequest, Payment};
use crate::error::{PaymentError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

/// A payment-method business rule. Mutates the installment and interest
/// fields of a freshly built payment; deterministic, no I/O, rejects nothing.
pub trait PaymentMethodRule: Send + Sync {
    fn apply(&self, payment: &mut Payment, request: &CreatePaymentRequest, merchant: &Merchant);
}

/// Declarative registration metadata for a method rule.
#[derive(Debug, Clone)]
pub struct MethodRuleMeta {
    pub name: &'static str,
    pub method_key: &'static str,
    pub supports_installments: bool,
    /// Upper bound on accepted installment counts. Also keeps the compound
    /// interest loop bounded so `Decimal` arithmetic cannot overflow.
    pub max_installments: u32,
}

struct RegisteredMethod {
    meta: MethodRuleMeta,
    rule: Box<dyn PaymentMethodRule>,
}

/// Exact-match mapping from normalized method key to a single handler.
///
/// Built once at startup from explicit registrations; read-only afterwards,
/// so lookups need no synchronization.
#[derive(Default)]
pub struct PaymentMethodRegistry {
    handlers: HashMap<String, RegisteredMethod>,
}

impl PaymentMethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in Card and Debit rules.
    pub fn builtin(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(
            MethodRuleMeta {
                name: "Card",
                method_key: "CARD",
                supports_installments: true,
                max_installments: config.card_max_installments,
            },
            Box::new(CardRule::new(config.card_monthly_interest)),
        );
        registry.register(
            MethodRuleMeta {
                name: "Debit",
                method_key: "DEBIT",
                supports_installments: false,
                max_installments: 1,
            },
            Box::new(DebitRule),
        );
        registry
    }

    pub fn register(&mut self, meta: MethodRuleMeta, rule: Box<dyn PaymentMethodRule>) {
        self.handlers
            .insert(meta.method_key.to_uppercase(), RegisteredMethod { meta, rule });
    }

    /// Resolves the handler and its metadata for a method key. Unknown keys
    /// surface as a client error, not a server fault.
    pub fn get(&self, method: &str) -> Result<(&MethodRuleMeta, &dyn PaymentMethodRule)> {
        self.handlers
            .get(&method.to_uppercase())
            .map(|registered| (&registered.meta, registered.rule.as_ref()))
            .ok_or_else(|| PaymentError::UnsupportedMethod(method.to_string()))
    }
}

/// Debit settles in full: a single installment, no interest.
pub struct DebitRule;

impl PaymentMethodRule for DebitRule {
    fn apply(&self, payment: &mut Payment, request: &CreatePaymentRequest, _merchant: &Merchant) {
        payment.installments = 1;
        payment.monthly_interest_percent = Decimal::ZERO;
        payment.total_with_interest = request.amount;
    }
}

/// Card applies monthly compounding interest when paid in installments:
/// `total = amount * (1 + rate/100)^installments`, rounded half-up to the
/// currency's two minor-unit decimals.
pub struct CardRule {
    monthly_interest_percent: Decimal,
}

impl CardRule {
    pub fn new(monthly_interest_percent: Decimal) -> Self {
        Self {
            monthly_interest_percent,
        }
    }
}

impl PaymentMethodRule for CardRule {
    fn apply(&self, payment: &mut Payment, request: &CreatePaymentRequest, _merchant: &Merchant) {
        let installments = request.installments.unwrap_or(1);
        payment.installments = installments;

        if installments > 1 {
            let factor = Decimal::ONE + self.monthly_interest_percent / Decimal::from(100);
            let mut compounded = Decimal::ONE;
            for _ in 0..installments {
                compounded *= factor;
            }
            payment.monthly_interest_percent = self.monthly_interest_percent;
            payment.total_with_interest = (request.amount * compounded)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        } else {
            payment.monthly_interest_percent = Decimal::ZERO;
            payment.total_with_interest = request.amount;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(method: &str, amount: Decimal, installments: Option<u32>) -> CreatePaymentRequest {
        CreatePaymentRequest {
            method: method.to_string(),
            amount,
            currency: "BRL".to_string(),
            installments,
            metadata_order_id: None,
        }
    }

    fn apply(registry: &PaymentMethodRegistry, request: &CreatePaymentRequest) -> Payment {
        let merchant = Merchant::new(1, "Acme Store");
        let mut payment = Payment::pending(&merchant, request, None);
        let (_, rule) = registry.get(&request.method).unwrap();
        rule.apply(&mut payment, request, &merchant);
        payment
    }

    #[test]
    fn test_card_three_installments_compounds_interest() {
        let registry = PaymentMethodRegistry::builtin(&Config::default());
        let payment = apply(&registry, &request("card", dec!(100.00), Some(3)));
        assert_eq!(payment.installments, 3);
        assert_eq!(payment.monthly_interest_percent, dec!(1.0));
        // 100.00 * 1.01^3 = 103.0301, rounded half-up to 103.03
        assert_eq!(payment.total_with_interest, dec!(103.03));
    }

    #[test]
    fn test_card_single_installment_has_no_interest() {
        let registry = PaymentMethodRegistry::builtin(&Config::default());
        let payment = apply(&registry, &request("CARD", dec!(100.00), None));
        assert_eq!(payment.installments, 1);
        assert_eq!(payment.monthly_interest_percent, Decimal::ZERO);
        assert_eq!(payment.total_with_interest, dec!(100.00));
    }

    #[test]
    fn test_debit_forces_single_installment() {
        let registry = PaymentMethodRegistry::builtin(&Config::default());
        let payment = apply(&registry, &request("debit", dec!(250.00), None));
        assert_eq!(payment.installments, 1);
        assert_eq!(payment.total_with_interest, dec!(250.00));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = PaymentMethodRegistry::builtin(&Config::default());
        assert!(registry.get("card").is_ok());
        assert!(registry.get("Card").is_ok());
        assert!(registry.get("DEBIT").is_ok());
    }

    #[test]
    fn test_builtin_metadata_bounds_installments() {
        let registry = PaymentMethodRegistry::builtin(&Config::default());
        let (card, _) = registry.get("card").unwrap();
        assert!(card.supports_installments);
        assert_eq!(card.max_installments, 48);
        let (debit, _) = registry.get("debit").unwrap();
        assert_eq!(debit.max_installments, 1);
    }

    #[test]
    fn test_unknown_method_is_a_client_error() {
        let registry = PaymentMethodRegistry::builtin(&Config::default());
        assert!(matches!(
            registry.get("pix"),
            Err(PaymentError::UnsupportedMethod(method)) if method == "pix"
        ));
    }

    #[test]
    fn test_total_never_below_amount() {
        let registry = PaymentMethodRegistry::builtin(&Config::default());
        for installments in 1..=12 {
            let payment = apply(
                &registry,
                &request("card", dec!(99.99), Some(installments)),
            );
            assert!(payment.total_with_interest >= payment.amount);
            if installments == 1 {
                assert_eq!(payment.total_with_interest, payment.amount);
            }
        }
    }
}
