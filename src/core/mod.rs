mod engine;
mod series;
mod types;

pub use engine::{periodic_payment, run_comparison, simulate, summarize};
pub use series::{
    AlignedSeries, align, align_all, build_labels, offset_account_series, offset_total_series,
    resample,
};
pub use types::{
    Comparison, LoanInputs, OffsetAccount, PaymentFrequency, SamplePoint, Savings, ScheduleInputs,
    ScheduleSummary, Trajectory,
};
