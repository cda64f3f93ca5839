use super::types::{
    Comparison, LoanInputs, SamplePoint, Savings, ScheduleInputs, ScheduleSummary, Trajectory,
};

const BALANCE_DUST: f64 = 1e-8;
const PAYOFF_EPS: f64 = 1e-6;
const MAX_SIMULATION_YEARS: u32 = 50;

pub fn periodic_payment(principal: f64, periodic_rate: f64, total_periods: f64) -> f64 {
    if periodic_rate <= 0.0 {
        principal / total_periods
    } else {
        principal * periodic_rate / (1.0 - (1.0 + periodic_rate).powf(-total_periods))
    }
}

pub fn simulate(inputs: &ScheduleInputs) -> Trajectory {
    let ppy = inputs.payments_per_year;
    let max_periods = ppy * MAX_SIMULATION_YEARS;

    let mut balance = inputs.principal;
    let mut offsets = inputs.offset_initials.clone();
    let mut points = vec![SamplePoint {
        year: 0.0,
        loan_balance: balance,
        offset_balances: offsets.clone(),
    }];
    let mut total_interest = 0.0;
    let mut total_paid = 0.0;
    let mut period = 0_u32;

    while balance > PAYOFF_EPS && period < max_periods {
        period += 1;

        let offset_total: f64 = offsets.iter().sum();
        let effective_balance = (balance - offset_total).max(0.0);
        let interest = effective_balance * inputs.periodic_rate;
        let payment = (balance + interest).min(inputs.periodic_payment);

        total_interest += interest;
        total_paid += payment;
        balance += interest - payment;
        if balance < BALANCE_DUST {
            balance = 0.0;
        }

        for (offset, contribution) in offsets.iter_mut().zip(&inputs.offset_contributions) {
            *offset += contribution;
        }

        if period % ppy == 0 {
            points.push(SamplePoint {
                year: (period / ppy) as f64,
                loan_balance: balance,
                offset_balances: offsets.clone(),
            });
        }
    }

    let paid_off = balance <= PAYOFF_EPS;
    if paid_off {
        balance = 0.0;
    }

    let payoff_year = period as f64 / ppy as f64;
    let landed_on_sample = points
        .last()
        .is_some_and(|p| (p.year - payoff_year).abs() <= BALANCE_DUST);
    if landed_on_sample {
        if let Some(last) = points.last_mut() {
            last.loan_balance = balance;
        }
    } else {
        points.push(SamplePoint {
            year: payoff_year,
            loan_balance: balance,
            offset_balances: offsets.clone(),
        });
    }

    Trajectory {
        points,
        total_interest_paid: total_interest,
        total_amount_paid: total_paid,
        periods_to_payoff: period,
        paid_off,
    }
}

pub fn run_comparison(inputs: &LoanInputs) -> Comparison {
    let ppy = inputs.frequency.payments_per_year();
    let periodic_rate = inputs.annual_rate / ppy as f64;
    let total_periods = inputs.term_years * ppy as f64;
    let minimum_repayment = periodic_payment(inputs.principal, periodic_rate, total_periods);
    let accelerated_repayment = minimum_repayment + inputs.extra_repayment;

    let baseline = simulate(&ScheduleInputs {
        principal: inputs.principal,
        periodic_rate,
        periodic_payment: minimum_repayment,
        payments_per_year: ppy,
        offset_initials: Vec::new(),
        offset_contributions: Vec::new(),
    });
    let accelerated = simulate(&ScheduleInputs {
        principal: inputs.principal,
        periodic_rate,
        periodic_payment: accelerated_repayment,
        payments_per_year: ppy,
        offset_initials: inputs.offsets.iter().map(|o| o.initial_balance).collect(),
        offset_contributions: inputs.offsets.iter().map(|o| o.contribution).collect(),
    });

    let baseline_summary = summarize(&baseline, ppy);
    let accelerated_summary = summarize(&accelerated, ppy);
    let savings = compute_savings(&baseline_summary, &accelerated_summary);

    Comparison {
        minimum_repayment,
        accelerated_repayment,
        payments_per_year: ppy,
        baseline,
        accelerated,
        baseline_summary,
        accelerated_summary,
        savings,
    }
}

pub fn summarize(trajectory: &Trajectory, payments_per_year: u32) -> ScheduleSummary {
    ScheduleSummary {
        total_interest_paid: trajectory.total_interest_paid,
        total_amount_paid: trajectory.total_amount_paid,
        periods_to_payoff: trajectory.periods_to_payoff,
        years_to_payoff: trajectory.periods_to_payoff as f64 / payments_per_year as f64,
        final_balance: trajectory.final_balance(),
        paid_off: trajectory.paid_off,
    }
}

fn compute_savings(baseline: &ScheduleSummary, accelerated: &ScheduleSummary) -> Savings {
    let periods_saved = baseline
        .periods_to_payoff
        .saturating_sub(accelerated.periods_to_payoff);
    Savings {
        interest_saved: baseline.total_interest_paid - accelerated.total_interest_paid,
        amount_saved: baseline.total_amount_paid - accelerated.total_amount_paid,
        periods_saved,
        years_saved: baseline.years_to_payoff - accelerated.years_to_payoff,
    }
}
