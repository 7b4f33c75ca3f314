use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuePayment {
    #[serde(default)]
    pub payment_id: Option<String>,
    pub has_due: bool,
    #[serde(default)]
    pub base_amount: Decimal,
    #[serde(default)]
    pub late_fee_amount: Decimal,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub period_month: Option<u32>,
    #[serde(default)]
    pub period_year: Option<i32>,
    #[serde(default)]
    pub is_overdue: bool,
    #[serde(default)]
    pub grace_period_ends: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DueInvariantError {
    #[error("negative amount in due payment: {0}")]
    NegativeAmount(&'static str),
    #[error("total {total} does not equal base {base} + late fee {late_fee}")]
    TotalMismatch {
        base: Decimal,
        late_fee: Decimal,
        total: Decimal,
    },
    #[error("amount {0} does not fit in paise")]
    AmountOutOfRange(Decimal),
}

impl DuePayment {
    pub fn nothing_due() -> Self {
        Self {
            payment_id: None,
            has_due: false,
            base_amount: Decimal::ZERO,
            late_fee_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            period_month: None,
            period_year: None,
            is_overdue: false,
            grace_period_ends: None,
        }
    }

    pub fn payable_id(&self) -> Option<&str> {
        if !self.has_due {
            return None;
        }
        self.payment_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn total_in_paise(&self) -> Result<i64, DueInvariantError> {
        to_paise(self.total_amount)
    }

    pub fn check_totals(&self) -> Result<(), DueInvariantError> {
        for (name, value) in [
            ("baseAmount", self.base_amount),
            ("lateFeeAmount", self.late_fee_amount),
            ("totalAmount", self.total_amount),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(DueInvariantError::NegativeAmount(name));
            }
        }
        if self.base_amount + self.late_fee_amount != self.total_amount {
            return Err(DueInvariantError::TotalMismatch {
                base: self.base_amount,
                late_fee: self.late_fee_amount,
                total: self.total_amount,
            });
        }
        self.total_in_paise()?;
        Ok(())
    }
}

impl Default for DuePayment {
    fn default() -> Self {
        DuePayment::nothing_due()
    }
}

/// Major units to integer minor units, half away from zero.
pub fn to_paise(amount: Decimal) -> Result<i64, DueInvariantError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|scaled| i64::try_from(scaled).ok())
        .ok_or(DueInvariantError::AmountOutOfRange(amount))
}

pub fn from_paise(paise: i64) -> Decimal {
    Decimal::new(paise, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn due(base: i64, late: i64, total: i64) -> DuePayment {
        DuePayment {
            payment_id: Some("pay_1".to_string()),
            has_due: true,
            base_amount: Decimal::from(base),
            late_fee_amount: Decimal::from(late),
            total_amount: Decimal::from(total),
            period_month: Some(3),
            period_year: Some(2025),
            is_overdue: false,
            grace_period_ends: None,
        }
    }

    #[test]
    fn totals_must_add_up() {
        assert!(due(900, 100, 1000).check_totals().is_ok());
        assert!(matches!(
            due(900, 100, 950).check_totals(),
            Err(DueInvariantError::TotalMismatch { .. })
        ));
        assert!(matches!(
            due(-5, 5, 0).check_totals(),
            Err(DueInvariantError::NegativeAmount("baseAmount"))
        ));
    }

    #[test]
    fn payable_id_requires_has_due() {
        let mut d = due(900, 100, 1000);
        assert_eq!(d.payable_id(), Some("pay_1"));
        d.has_due = false;
        assert_eq!(d.payable_id(), None);
    }

    #[test]
    fn paise_conversion_rounds_half_away() {
        assert_eq!(to_paise(Decimal::new(100005, 3)), Ok(10001));
        assert_eq!(to_paise(Decimal::from(1000)), Ok(100_000));
        assert_eq!(from_paise(150), Decimal::new(150, 2));
    }

    #[test]
    fn oversized_amount_is_rejected_not_clamped() {
        let huge = Decimal::from(i64::MAX);
        assert_eq!(to_paise(huge), Err(DueInvariantError::AmountOutOfRange(huge)));
        assert_eq!(to_paise(Decimal::MAX), Err(DueInvariantError::AmountOutOfRange(Decimal::MAX)));

        let mut d = due(0, 0, 0);
        d.base_amount = huge;
        d.total_amount = huge;
        assert_eq!(d.check_totals(), Err(DueInvariantError::AmountOutOfRange(huge)));
    }

    #[test]
    fn deserializes_backend_shape() {
        let raw = r#"{"paymentId":"p9","hasDue":true,"baseAmount":2500,"lateFeeAmount":50.5,
            "totalAmount":2550.5,"periodMonth":4,"periodYear":2025,"isOverdue":true}"#;
        let d: DuePayment = serde_json::from_str(raw).unwrap();
        assert_eq!(d.payable_id(), Some("p9"));
        assert_eq!(d.total_in_paise(), Ok(255_050));
        assert!(d.check_totals().is_ok());
    }
}
