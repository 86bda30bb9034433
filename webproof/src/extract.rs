//! Income extraction from proof payloads.
//!
//! Pure functions: a proof maps to an income estimate and then to a
//! discrete bucket. Missing or malformed numeric fields degrade silently to
//! zero rather than failing the flow. A legitimately-zero income and an
//! unparseable proof produce the same bucket, so callers that care can
//! check [`Estimate::missing_field`].

use crate::payload::ProofPayload;
use creditline_types::{FlowParams, IncomeBucket, Provider};

/// The observed income value computed from a proof.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Estimate {
    /// Estimated monthly income in monetary units.
    pub value: f64,
    /// Whether the expected numeric field was absent and the estimate
    /// defaulted to zero.
    pub missing_field: bool,
}

/// Estimate monthly income from a proof.
///
/// Balance proofs apply the configured multiplier (a balance is a stock,
/// not a flow); transaction proofs use the raw amount.
pub fn estimate_income(
    payload: &ProofPayload,
    provider: Provider,
    params: &FlowParams,
) -> Estimate {
    let observed = match provider {
        Provider::Binance => payload.balance,
        Provider::Wise => payload.amount,
    };

    match observed {
        Some(value) => {
            let value = match provider {
                Provider::Binance => value * params.income_multiplier_bps as f64 / 10_000.0,
                Provider::Wise => value,
            };
            Estimate {
                value,
                missing_field: false,
            }
        }
        None => Estimate {
            value: 0.0,
            missing_field: true,
        },
    }
}

/// Map a proof directly to its income bucket.
pub fn income_bucket(
    payload: &ProofPayload,
    provider: Provider,
    params: &FlowParams,
) -> IncomeBucket {
    let estimate = estimate_income(payload, provider, params);
    IncomeBucket::from_estimate(estimate.value, &params.bucket_thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> ProofPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn balance_15000_estimates_1500_buckets_1000() {
        let params = FlowParams::defaults();
        let p = payload(r#"{"balance": 15000}"#);

        let estimate = estimate_income(&p, Provider::Binance, &params);
        assert_eq!(estimate.value, 1500.0);
        assert!(!estimate.missing_field);

        assert_eq!(
            income_bucket(&p, Provider::Binance, &params).as_units(),
            1000
        );
    }

    #[test]
    fn wise_amount_is_taken_raw() {
        let params = FlowParams::defaults();
        let p = payload(r#"{"amount": 2500}"#);
        let estimate = estimate_income(&p, Provider::Wise, &params);
        assert_eq!(estimate.value, 2500.0);
        assert_eq!(income_bucket(&p, Provider::Wise, &params).as_units(), 2000);
    }

    #[test]
    fn empty_payload_gives_zero_bucket_without_error() {
        let params = FlowParams::defaults();
        let p = payload("{}");

        for provider in [Provider::Binance, Provider::Wise] {
            let estimate = estimate_income(&p, provider, &params);
            assert_eq!(estimate.value, 0.0);
            assert!(estimate.missing_field);
            assert!(income_bucket(&p, provider, &params).is_zero());
        }
    }

    #[test]
    fn wrong_field_for_provider_degrades_to_zero() {
        let params = FlowParams::defaults();
        // A balance proof payload asked about a transaction provider.
        let p = payload(r#"{"balance": 15000}"#);
        let estimate = estimate_income(&p, Provider::Wise, &params);
        assert_eq!(estimate.value, 0.0);
        assert!(estimate.missing_field);
    }

    #[test]
    fn multiplier_is_overridable() {
        let mut params = FlowParams::defaults();
        params.income_multiplier_bps = 2_000; // 20%
        let p = payload(r#"{"balance": 10000}"#);
        let estimate = estimate_income(&p, Provider::Binance, &params);
        assert_eq!(estimate.value, 2000.0);
        assert_eq!(
            income_bucket(&p, Provider::Binance, &params).as_units(),
            2000
        );
    }

    #[test]
    fn bucket_boundaries_from_balances() {
        let params = FlowParams::defaults();
        // 10% multiplier: balance 4999 -> 499.9 -> bucket 0
        assert!(income_bucket(&payload(r#"{"balance": 4999}"#), Provider::Binance, &params)
            .is_zero());
        // balance 5000 -> 500 -> bucket 500
        assert_eq!(
            income_bucket(&payload(r#"{"balance": 5000}"#), Provider::Binance, &params)
                .as_units(),
            500
        );
        // balance 20000 -> 2000 -> bucket 2000
        assert_eq!(
            income_bucket(&payload(r#"{"balance": 20000}"#), Provider::Binance, &params)
                .as_units(),
            2000
        );
    }
}
