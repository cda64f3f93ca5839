use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PaymentFrequency {
    Weekly,
    Fortnightly,
    Monthly,
}

impl PaymentFrequency {
    pub fn payments_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Weekly => 52,
            PaymentFrequency::Fortnightly => 26,
            PaymentFrequency::Monthly => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OffsetAccount {
    pub name: String,
    pub initial_balance: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone)]
pub struct LoanInputs {
    pub principal: f64,
    pub annual_rate: f64,
    pub term_years: f64,
    pub frequency: PaymentFrequency,
    pub extra_repayment: f64,
    pub offsets: Vec<OffsetAccount>,
}

#[derive(Debug, Clone)]
pub struct ScheduleInputs {
    pub principal: f64,
    pub periodic_rate: f64,
    pub periodic_payment: f64,
    pub payments_per_year: u32,
    pub offset_initials: Vec<f64>,
    pub offset_contributions: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePoint {
    pub year: f64,
    pub loan_balance: f64,
    pub offset_balances: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub points: Vec<SamplePoint>,
    pub total_interest_paid: f64,
    pub total_amount_paid: f64,
    pub periods_to_payoff: u32,
    pub paid_off: bool,
}

impl Trajectory {
    pub fn last_year(&self) -> f64 {
        self.points.last().map(|p| p.year).unwrap_or(0.0)
    }

    pub fn final_balance(&self) -> f64 {
        self.points.last().map(|p| p.loan_balance).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub total_interest_paid: f64,
    pub total_amount_paid: f64,
    pub periods_to_payoff: u32,
    pub years_to_payoff: f64,
    pub final_balance: f64,
    pub paid_off: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Savings {
    pub interest_saved: f64,
    pub amount_saved: f64,
    pub periods_saved: u32,
    pub years_saved: f64,
}

#[derive(Debug, Clone)]
pub struct Comparison {
    pub minimum_repayment: f64,
    pub accelerated_repayment: f64,
    pub payments_per_year: u32,
    pub baseline: Trajectory,
    pub accelerated: Trajectory,
    pub baseline_summary: ScheduleSummary,
    pub accelerated_summary: ScheduleSummary,
    pub savings: Savings,
}
