//! # Energy Report Engine
//!
//! Billing and period-resolution core behind the monthly energy-management
//! reports of the client portal. Everything here is a pure function of its
//! inputs: the portal fetches records, picks a period and renders whatever
//! comes back.
//!
//! ## Core Concepts
//!
//! - **Billing formulas**: ICMS on purchased energy, net savings and percentage
//!   savings, computed on exact decimals with the spreadsheet's `ROUND`/`TRUNC`
//!   semantics
//! - **Electrical formulas**: reactive energy excess, power factor and the kVAr
//!   correction needed to reach a target power factor
//! - **Reference labels**: `"mmm/yy"` month labels (`"ago/24"`), decoded into
//!   period keys (`202408`) for ordering and filtering
//! - **Period selector**: last 12 months, this year, previous year or a custom
//!   range with optional bounds in any order
//!
//! ## Example
//!
//! ```rust,ignore
//! use energy_report_engine::*;
//! use chrono::NaiveDate;
//!
//! let records: Vec<MonthlyEnergyRecord> = serde_json::from_str(payload)?;
//! let selector = PeriodSelector::custom(Some("jan/24"), Some("jun/24"))?;
//! let today = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
//!
//! let report = generate_report(&records, &selector, today, &EngineConfig::default())?;
//! println!("Savings: {}", report.resumo.economia_total);
//! ```

pub mod billing;
pub mod error;
pub mod period;
pub mod power;
pub mod report;
pub mod rounding;
pub mod schema;

pub use billing::{calc_economia_liquida, calc_icms_energia, calc_pct_economia, ParcelasEconomia};
pub use error::{ReportError, Result};
pub use period::{
    compare_ref_labels, filter_by_period, parse_ref_label, resolve_range, select_in_range,
    sort_ref_labels, HasRefLabel, PeriodKey, PeriodRange, PeriodSelector, RefLabel,
    MONTH_ABBREVIATIONS,
};
pub use power::{
    calc_fator_potencia, calc_fator_potencia_global, calc_fator_potencia_periodo,
    calc_kvar_corrigir_por_demanda, calc_reativo_excedente,
};
pub use report::{build_report, MonthlyFigures, PeriodReport, PeriodSummary};
pub use rounding::{round4, round_half_up, trunc2};
pub use schema::*;

use chrono::NaiveDate;
use log::{debug, info};

pub struct ReportProcessor;

impl ReportProcessor {
    pub fn process(
        records: &[MonthlyEnergyRecord],
        selector: &PeriodSelector,
        today: NaiveDate,
        config: &EngineConfig,
    ) -> Result<PeriodReport> {
        config.validate()?;

        info!(
            "Building report for {:?} from {} records",
            selector,
            records.len()
        );
        debug!(
            "Engine configuration: reactive limit {}, target power factor {}",
            config.reactive_limit, config.target_power_factor
        );

        let report = build_report(records, selector, today, config);

        debug!(
            "Report over {} covers {} months",
            report.range,
            report.meses.len()
        );

        Ok(report)
    }
}

pub fn generate_report(
    records: &[MonthlyEnergyRecord],
    selector: &PeriodSelector,
    today: NaiveDate,
    config: &EngineConfig,
) -> Result<PeriodReport> {
    ReportProcessor::process(records, selector, today, config)
}
