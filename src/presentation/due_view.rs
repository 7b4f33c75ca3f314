use crate::domain::due::{to_paise, DuePayment};
use crate::domain::payment::PaymentOrder;
use crate::service::notifier::Notice;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

const TEST_KEY_PREFIX: &str = "rzp_test_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownLine {
    pub label: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueView {
    pub headline: String,
    pub amount_label: Option<String>,
    pub breakdown: Vec<BreakdownLine>,
    pub period_label: Option<String>,
    pub overdue: bool,
    pub can_pay: bool,
    pub pay_button_label: Option<String>,
}

impl DueView {
    pub fn from_due(due: &DuePayment, in_flight: bool) -> Self {
        if !due.has_due {
            return Self {
                headline: "No dues pending".to_string(),
                amount_label: None,
                breakdown: Vec::new(),
                period_label: None,
                overdue: false,
                can_pay: false,
                pay_button_label: None,
            };
        }

        let mut breakdown = vec![BreakdownLine {
            label: "Rent".to_string(),
            amount: format_inr(due.base_amount),
        }];
        if !due.late_fee_amount.is_zero() {
            breakdown.push(BreakdownLine {
                label: "Late fee".to_string(),
                amount: format_inr(due.late_fee_amount),
            });
        }

        let amount = format_inr(due.total_amount);
        Self {
            headline: if due.is_overdue { "Rent overdue" } else { "Rent due" }.to_string(),
            amount_label: Some(amount.clone()),
            breakdown,
            period_label: period_label(due.period_month, due.period_year),
            overdue: due.is_overdue,
            can_pay: !in_flight && due.payable_id().is_some(),
            pay_button_label: Some(if in_flight {
                "Processing...".to_string()
            } else {
                format!("Pay {}", amount)
            }),
        }
    }
}

pub fn format_inr(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let paise = match to_paise(rounded.abs()) {
        Ok(paise) => paise,
        Err(_) => return format!("₹{}", rounded),
    };
    format!(
        "{}₹{}.{:02}",
        if negative { "-" } else { "" },
        group_indian(&(paise / 100).to_string()),
        paise % 100
    )
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (mut rest, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    while rest.len() > 2 {
        let (head, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = head;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

pub fn period_label(month: Option<u32>, year: Option<i32>) -> Option<String> {
    let month = u8::try_from(month?).ok()?;
    let name = chrono::Month::try_from(month).ok()?.name();
    Some(match year {
        Some(year) => format!("{} {}", name, year),
        None => name.to_string(),
    })
}

pub fn payment_description(due: &DuePayment) -> String {
    match period_label(due.period_month, due.period_year) {
        Some(period) => format!("Rent for {}", period),
        None => "Rent payment".to_string(),
    }
}

pub fn is_test_key(key: &str) -> bool {
    key.starts_with(TEST_KEY_PREFIX)
}

pub fn sandbox_notice(due: &DuePayment, order: &PaymentOrder, test_mode: bool) -> Option<Notice> {
    let due_paise = match due.total_in_paise() {
        Ok(paise) => paise,
        Err(e) => {
            tracing::warn!(payment_id = ?due.payment_id, "cannot compare charge with due: {}", e);
            return None;
        }
    };
    if test_mode && order.amount_in_paise < due_paise {
        Some(Notice::SandboxAmount {
            charged_paise: order.amount_in_paise,
            due_paise,
        })
    } else {
        None
    }
}
