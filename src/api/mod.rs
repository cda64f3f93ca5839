use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Comparison, LoanInputs, OffsetAccount, PaymentFrequency, SamplePoint, Savings,
    ScheduleSummary, align, offset_account_series, offset_total_series, run_comparison,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliFrequency {
    Weekly,
    Fortnightly,
    Monthly,
}

impl From<CliFrequency> for PaymentFrequency {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Weekly => PaymentFrequency::Weekly,
            CliFrequency::Fortnightly => PaymentFrequency::Fortnightly,
            CliFrequency::Monthly => PaymentFrequency::Monthly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum ApiFrequency {
    Weekly,
    Fortnightly,
    Monthly,
}

impl From<ApiFrequency> for CliFrequency {
    fn from(value: ApiFrequency) -> Self {
        match value {
            ApiFrequency::Weekly => CliFrequency::Weekly,
            ApiFrequency::Fortnightly => CliFrequency::Fortnightly,
            ApiFrequency::Monthly => CliFrequency::Monthly,
        }
    }
}

impl From<PaymentFrequency> for ApiFrequency {
    fn from(value: PaymentFrequency) -> Self {
        match value {
            PaymentFrequency::Weekly => ApiFrequency::Weekly,
            PaymentFrequency::Fortnightly => ApiFrequency::Fortnightly,
            PaymentFrequency::Monthly => ApiFrequency::Monthly,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OffsetPayload {
    name: Option<String>,
    initial_balance: Option<f64>,
    contribution: Option<f64>,
    enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    principal: Option<f64>,
    interest_rate: Option<f64>,
    term_years: Option<f64>,
    frequency: Option<ApiFrequency>,
    extra_repayment: Option<f64>,
    offsets: Option<Vec<OffsetPayload>>,
}

#[derive(Parser, Debug)]
#[command(
    name = "offsetcalc",
    about = "Mortgage repayment calculator (minimum vs accelerated repayments with offset accounts)"
)]
struct Cli {
    #[arg(long, help = "Loan principal")]
    principal: f64,
    #[arg(long, help = "Annual interest rate in percent, e.g. 5.5")]
    interest_rate: f64,
    #[arg(long, help = "Loan term in years")]
    term_years: f64,
    #[arg(long, value_enum, default_value_t = CliFrequency::Monthly)]
    frequency: CliFrequency,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Extra repayment per period on top of the minimum"
    )]
    extra_repayment: f64,
    #[arg(long, value_delimiter = ',', help = "Offset account starting balances")]
    offset_initial: Vec<f64>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Per-period contribution for each offset account; defaults to 0 per account"
    )]
    offset_contribution: Vec<f64>,
    #[arg(long, value_delimiter = ',', help = "Display names for offset accounts")]
    offset_name: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleReport {
    summary: ScheduleSummary,
    points: Vec<SamplePoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NamedSeries {
    name: String,
    values: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartBlock {
    labels: Vec<f64>,
    baseline_balance: Vec<f64>,
    accelerated_balance: Vec<f64>,
    offset_total: Vec<f64>,
    offset_accounts: Vec<NamedSeries>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    frequency: ApiFrequency,
    payments_per_year: u32,
    minimum_repayment: f64,
    accelerated_repayment: f64,
    baseline: ScheduleReport,
    accelerated: ScheduleReport,
    savings: Savings,
    chart: ChartBlock,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<LoanInputs, String> {
    if !cli.principal.is_finite() || cli.principal <= 0.0 {
        return Err("--principal must be > 0".to_string());
    }

    if !(0.0..=100.0).contains(&cli.interest_rate) {
        return Err("--interest-rate must be between 0 and 100".to_string());
    }

    if !cli.term_years.is_finite() || cli.term_years <= 0.0 {
        return Err("--term-years must be > 0".to_string());
    }

    if !cli.extra_repayment.is_finite() || cli.extra_repayment < 0.0 {
        return Err("--extra-repayment must be >= 0".to_string());
    }

    if !cli.offset_contribution.is_empty()
        && cli.offset_contribution.len() != cli.offset_initial.len()
    {
        return Err("--offset-contribution count must match --offset-initial".to_string());
    }

    if cli.offset_name.len() > cli.offset_initial.len() {
        return Err("--offset-name count must not exceed --offset-initial".to_string());
    }

    let mut offsets = Vec::with_capacity(cli.offset_initial.len());
    for (idx, &initial_balance) in cli.offset_initial.iter().enumerate() {
        let contribution = cli.offset_contribution.get(idx).copied().unwrap_or(0.0);
        if !initial_balance.is_finite() || initial_balance < 0.0 {
            return Err("--offset-initial values must be >= 0".to_string());
        }
        if !contribution.is_finite() || contribution < 0.0 {
            return Err("--offset-contribution values must be >= 0".to_string());
        }
        let name = cli
            .offset_name
            .get(idx)
            .filter(|n| !n.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Offset {}", idx + 1));
        offsets.push(OffsetAccount {
            name,
            initial_balance,
            contribution,
        });
    }

    Ok(LoanInputs {
        principal: cli.principal,
        annual_rate: cli.interest_rate / 100.0,
        term_years: cli.term_years,
        frequency: cli.frequency.into(),
        extra_repayment: cli.extra_repayment,
        offsets,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Mortgage offset calculator listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let comparison = run_comparison(&inputs);
    let response = build_simulate_response(&inputs, &comparison);
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<LoanInputs, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: SimulatePayload) -> Result<LoanInputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.principal {
        cli.principal = v;
    }
    if let Some(v) = payload.interest_rate {
        cli.interest_rate = v;
    }
    if let Some(v) = payload.term_years {
        cli.term_years = v;
    }
    if let Some(v) = payload.frequency {
        cli.frequency = v.into();
    }
    if let Some(v) = payload.extra_repayment {
        cli.extra_repayment = v;
    }

    if let Some(offsets) = payload.offsets {
        cli.offset_name.clear();
        cli.offset_initial.clear();
        cli.offset_contribution.clear();
        for offset in offsets
            .into_iter()
            .filter(|o| o.enabled.unwrap_or(true))
        {
            cli.offset_name.push(offset.name.unwrap_or_default());
            cli.offset_initial.push(offset.initial_balance.unwrap_or(0.0));
            cli.offset_contribution
                .push(offset.contribution.unwrap_or(0.0));
        }
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        principal: 500_000.0,
        interest_rate: 5.5,
        term_years: 30.0,
        frequency: CliFrequency::Monthly,
        extra_repayment: 0.0,
        offset_initial: Vec::new(),
        offset_contribution: Vec::new(),
        offset_name: Vec::new(),
    }
}

fn build_simulate_response(inputs: &LoanInputs, comparison: &Comparison) -> SimulateResponse {
    let aligned = align(&comparison.baseline, &comparison.accelerated);
    let offset_total = offset_total_series(&comparison.accelerated, &aligned.labels);
    let offset_accounts = inputs
        .offsets
        .iter()
        .enumerate()
        .map(|(idx, account)| NamedSeries {
            name: account.name.clone(),
            values: offset_account_series(&comparison.accelerated, idx, &aligned.labels),
        })
        .collect();

    let mut balances = aligned.series.into_iter();
    let baseline_balance = balances.next().unwrap_or_default();
    let accelerated_balance = balances.next().unwrap_or_default();

    SimulateResponse {
        frequency: inputs.frequency.into(),
        payments_per_year: comparison.payments_per_year,
        minimum_repayment: comparison.minimum_repayment,
        accelerated_repayment: comparison.accelerated_repayment,
        baseline: ScheduleReport {
            summary: comparison.baseline_summary,
            points: comparison.baseline.points.clone(),
        },
        accelerated: ScheduleReport {
            summary: comparison.accelerated_summary,
            points: comparison.accelerated.points.clone(),
        },
        savings: comparison.savings,
        chart: ChartBlock {
            labels: aligned.labels,
            baseline_balance,
            accelerated_balance,
            offset_total,
            offset_accounts,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn build_inputs_converts_percent_rate_to_fraction() {
        let mut cli = sample_cli();
        cli.interest_rate = 5.5;

        let inputs = build_inputs(cli).expect("valid inputs");
        assert_approx(inputs.annual_rate, 0.055);
    }

    #[test]
    fn build_inputs_rejects_non_positive_principal() {
        let mut cli = sample_cli();
        cli.principal = 0.0;

        let err = build_inputs(cli).expect_err("must reject zero principal");
        assert!(err.contains("--principal"));
    }

    #[test]
    fn build_inputs_rejects_out_of_range_interest_rate() {
        let mut cli = sample_cli();
        cli.interest_rate = -1.0;

        let err = build_inputs(cli).expect_err("must reject negative rate");
        assert!(err.contains("--interest-rate"));
    }

    #[test]
    fn build_inputs_rejects_non_finite_term() {
        let mut cli = sample_cli();
        cli.term_years = f64::NAN;

        let err = build_inputs(cli).expect_err("must reject NaN term");
        assert!(err.contains("--term-years"));
    }

    #[test]
    fn build_inputs_rejects_mismatched_offset_lists() {
        let mut cli = sample_cli();
        cli.offset_initial = vec![10_000.0, 5_000.0];
        cli.offset_contribution = vec![100.0];

        let err = build_inputs(cli).expect_err("must reject mismatched lists");
        assert!(err.contains("--offset-contribution"));
    }

    #[test]
    fn build_inputs_defaults_offset_contributions_and_names() {
        let mut cli = sample_cli();
        cli.offset_initial = vec![10_000.0, 5_000.0];
        cli.offset_name = vec!["Joint".to_string()];

        let inputs = build_inputs(cli).expect("valid inputs");
        assert_eq!(inputs.offsets.len(), 2);
        assert_eq!(inputs.offsets[0].name, "Joint");
        assert_approx(inputs.offsets[0].contribution, 0.0);
        assert_eq!(inputs.offsets[1].name, "Offset 2");
        assert_approx(inputs.offsets[1].initial_balance, 5_000.0);
    }

    #[test]
    fn build_inputs_rejects_negative_offset_balance() {
        let mut cli = sample_cli();
        cli.offset_initial = vec![-1.0];

        let err = build_inputs(cli).expect_err("must reject negative offset");
        assert!(err.contains("--offset-initial"));
    }

    #[test]
    fn inputs_from_json_parses_web_keys() {
        let json = r#"{
          "principal": 300000,
          "interestRate": 6,
          "termYears": 30,
          "frequency": "fortnightly",
          "extraRepayment": 250,
          "offsets": [
            { "name": "Joint", "initialBalance": 20000, "contribution": 400 },
            { "name": "Person 2", "initialBalance": 5000, "contribution": 100, "enabled": false }
          ]
        }"#;
        let inputs = inputs_from_json(json).expect("json should parse");

        assert_approx(inputs.principal, 300_000.0);
        assert_approx(inputs.annual_rate, 0.06);
        assert_approx(inputs.term_years, 30.0);
        assert_eq!(inputs.frequency, PaymentFrequency::Fortnightly);
        assert_approx(inputs.extra_repayment, 250.0);
        assert_eq!(inputs.offsets.len(), 1, "disabled holders are excluded");
        assert_eq!(inputs.offsets[0].name, "Joint");
        assert_approx(inputs.offsets[0].initial_balance, 20_000.0);
        assert_approx(inputs.offsets[0].contribution, 400.0);
    }

    #[test]
    fn inputs_from_json_applies_defaults_for_missing_fields() {
        let inputs = inputs_from_json("{}").expect("empty payload uses defaults");

        assert_approx(inputs.principal, 500_000.0);
        assert_approx(inputs.annual_rate, 0.055);
        assert_eq!(inputs.frequency, PaymentFrequency::Monthly);
        assert!(inputs.offsets.is_empty());
    }

    #[test]
    fn inputs_from_json_rejects_invalid_values_before_simulation() {
        let err = inputs_from_json(r#"{ "principal": -5 }"#).expect_err("must reject");
        assert!(err.contains("--principal"));
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let json = r#"{
          "principal": 300000,
          "interestRate": 6,
          "termYears": 30,
          "extraRepayment": 500,
          "offsets": [{ "name": "Joint", "initialBalance": 10000, "contribution": 200 }]
        }"#;
        let inputs = inputs_from_json(json).expect("valid inputs");
        let comparison = run_comparison(&inputs);
        let response = build_simulate_response(&inputs, &comparison);
        let body = serde_json::to_string(&response).expect("response should serialize");

        assert!(body.contains("\"paymentsPerYear\":12"));
        assert!(body.contains("\"minimumRepayment\""));
        assert!(body.contains("\"acceleratedRepayment\""));
        assert!(body.contains("\"totalInterestPaid\""));
        assert!(body.contains("\"periodsToPayoff\""));
        assert!(body.contains("\"paidOff\""));
        assert!(body.contains("\"interestSaved\""));
        assert!(body.contains("\"labels\""));
        assert!(body.contains("\"baselineBalance\""));
        assert!(body.contains("\"acceleratedBalance\""));
        assert!(body.contains("\"offsetTotal\""));
        assert!(body.contains("\"offsetAccounts\""));
        assert!(body.contains("\"Joint\""));
    }

    #[test]
    fn chart_series_share_the_aligned_label_axis() {
        let inputs = inputs_from_json(
            r#"{ "principal": 200000, "interestRate": 5, "termYears": 20, "extraRepayment": 400 }"#,
        )
        .expect("valid inputs");
        let comparison = run_comparison(&inputs);
        let response = build_simulate_response(&inputs, &comparison);

        let labels = response.chart.labels.len();
        assert_eq!(response.chart.baseline_balance.len(), labels);
        assert_eq!(response.chart.accelerated_balance.len(), labels);
        assert_eq!(response.chart.offset_total.len(), labels);
        assert!(response.savings.interest_saved > 0.0);
    }
}
