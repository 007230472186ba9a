use crate::billing::{calc_economia_liquida, calc_pct_economia, checked_sum};
use crate::period::{resolve_range, select_in_range, PeriodRange, PeriodSelector, RefLabel};
use crate::power::{
    calc_fator_potencia, calc_fator_potencia_global, calc_fator_potencia_periodo,
    calc_kvar_corrigir_por_demanda, calc_reativo_excedente,
};
use crate::schema::{EngineConfig, MonthlyEnergyRecord};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Figures shown on one row of the monthly report table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFigures {
    pub referencia: RefLabel,
    pub icms_energia: Decimal,
    pub economia_liquida: Decimal,
    pub pct_economia: Decimal,
    pub reativo_excedente: f64,
    pub fator_potencia: f64,
    /// `None` when no active energy was metered.
    pub fator_potencia_periodo: Option<f64>,
}

impl MonthlyFigures {
    pub fn from_record(
        referencia: RefLabel,
        record: &MonthlyEnergyRecord,
        config: &EngineConfig,
    ) -> Self {
        let parcelas = record.parcelas_economia();
        let economia_liquida = calc_economia_liquida(&parcelas);

        Self {
            referencia,
            icms_energia: parcelas.icms_energia,
            economia_liquida,
            pct_economia: calc_pct_economia(economia_liquida, record.fatura_geral),
            reativo_excedente: calc_reativo_excedente(
                record.total_energia,
                record.total_reativo,
                config.reactive_limit,
            ),
            fator_potencia: calc_fator_potencia(record.total_energia, record.total_reativo),
            fator_potencia_periodo: calc_fator_potencia_periodo(
                record.total_energia,
                record.total_reativo,
            ),
        }
    }
}

/// Dashboard cards for the selected period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub meses: usize,
    pub fatura_geral_total: Decimal,
    pub economia_total: Decimal,
    /// Savings over the whole period, not the mean of monthly percentages.
    pub pct_economia: Decimal,
    pub total_energia: f64,
    pub total_reativo: f64,
    pub reativo_excedente_total: f64,
    pub fator_potencia_global: Option<f64>,
    pub demanda_maxima: f64,
    pub fp_meta: f64,
    pub kvar_corrigir: f64,
}

impl PeriodSummary {
    /// `rows` must already be in chronological order; the latest row with a
    /// usable `fp_meta` (finite, in `(0, 1]`) wins over the configured target.
    /// Money totals that overflow `Decimal` are reported as zero.
    pub fn from_rows(
        rows: &[(RefLabel, &MonthlyEnergyRecord)],
        figures: &[MonthlyFigures],
        config: &EngineConfig,
    ) -> Self {
        let fatura_geral_total =
            total_or_zero("fatura_geral", rows.iter().map(|(_, r)| r.fatura_geral));
        let economia_total =
            total_or_zero("economia_liquida", figures.iter().map(|f| f.economia_liquida));
        let total_energia: f64 = rows.iter().map(|(_, r)| r.total_energia).sum();
        let total_reativo: f64 = rows.iter().map(|(_, r)| r.total_reativo).sum();
        let reativo_excedente_total: f64 = figures.iter().map(|f| f.reativo_excedente).sum();

        let demanda_maxima = rows
            .iter()
            .map(|(_, r)| r.demanda_maxima)
            .filter(|d| d.is_finite())
            .fold(0.0_f64, f64::max);

        let fp_meta = rows
            .iter()
            .rev()
            .find_map(|(_, r)| r.fp_meta.filter(|fp| is_usable_target(*fp)))
            .unwrap_or(config.target_power_factor);

        let fator_potencia_global = calc_fator_potencia_global(total_energia, total_reativo);

        Self {
            meses: rows.len(),
            fatura_geral_total,
            economia_total,
            pct_economia: calc_pct_economia(economia_total, fatura_geral_total),
            total_energia,
            total_reativo,
            reativo_excedente_total,
            fator_potencia_global,
            demanda_maxima,
            fp_meta,
            kvar_corrigir: calc_kvar_corrigir_por_demanda(
                fator_potencia_global,
                demanda_maxima,
                fp_meta,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub range: PeriodRange,
    pub meses: Vec<MonthlyFigures>,
    pub resumo: PeriodSummary,
}

fn total_or_zero(field: &str, values: impl Iterator<Item = Decimal>) -> Decimal {
    checked_sum(values).unwrap_or_else(|| {
        warn!("Period total of {} overflowed; reporting zero", field);
        Decimal::ZERO
    })
}

fn is_usable_target(fp: f64) -> bool {
    fp.is_finite() && fp > 0.0 && fp <= 1.0
}

/// Builds a report from records already narrowed to one client.
pub fn build_report(
    records: &[MonthlyEnergyRecord],
    selector: &PeriodSelector,
    today: chrono::NaiveDate,
    config: &EngineConfig,
) -> PeriodReport {
    let range = resolve_range(selector, today);

    let mut rows = select_in_range(records, &range);
    rows.sort_by_key(|(label, _)| *label);

    let meses: Vec<MonthlyFigures> = rows
        .iter()
        .map(|(label, record)| MonthlyFigures::from_record(*label, record, config))
        .collect();

    let resumo = PeriodSummary::from_rows(&rows, &meses, config);

    PeriodReport {
        range,
        meses,
        resumo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record(
        label: &str,
        fatura_geral: Decimal,
        energia: f64,
        reativo: f64,
    ) -> MonthlyEnergyRecord {
        MonthlyEnergyRecord {
            referencia: Some(label.to_string()),
            fatura_geral,
            fatura_livre: fatura_geral / dec!(2),
            total_energia: energia,
            total_reativo: reativo,
            demanda_maxima: 250.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_monthly_figures() {
        let rec = MonthlyEnergyRecord {
            referencia: Some("ago/24".to_string()),
            fatura_geral: dec!(50000),
            fatura_livre: dec!(20000),
            compra_energia: dec!(10000),
            aliquota_icms: dec!(0.18),
            encargos: dec!(1000),
            total_energia: 1000.0,
            total_reativo: 700.0,
            ..Default::default()
        };

        let label: RefLabel = "ago/24".parse().unwrap();
        let figures = MonthlyFigures::from_record(label, &rec, &EngineConfig::default());

        assert_eq!(figures.icms_energia, dec!(2195.12));
        // 50000 - (20000 + 10000 + 2195.12 + 1000)
        assert_eq!(figures.economia_liquida, dec!(16804.88));
        assert_eq!(figures.pct_economia, dec!(0.3361));
        assert!((figures.reativo_excedente - 80.0).abs() < 1e-9);
        assert!(figures.fator_potencia_periodo.is_some());
    }

    #[test]
    fn test_month_without_energy_has_no_period_power_factor() {
        let rec = record("jan/24", dec!(100), 0.0, 0.0);
        let label: RefLabel = "jan/24".parse().unwrap();
        let figures = MonthlyFigures::from_record(label, &rec, &EngineConfig::default());

        assert_eq!(figures.fator_potencia, 0.0);
        assert_eq!(figures.fator_potencia_periodo, None);
    }

    #[test]
    fn test_build_report_sorts_and_summarizes() {
        let records = vec![
            record("mar/24", dec!(1000), 1000.0, 200.0),
            record("jan/24", dec!(3000), 1000.0, 900.0),
            record("fev/23", dec!(9999), 1000.0, 0.0),
            MonthlyEnergyRecord::default(),
        ];

        let report = build_report(
            &records,
            &PeriodSelector::ThisYear,
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            &EngineConfig::default(),
        );

        let labels: Vec<String> = report.meses.iter().map(|m| m.referencia.to_string()).collect();
        assert_eq!(labels, vec!["jan/24", "mar/24"]);

        let resumo = &report.resumo;
        assert_eq!(resumo.meses, 2);
        assert_eq!(resumo.fatura_geral_total, dec!(4000));
        assert_eq!(resumo.economia_total, dec!(2000));
        assert_eq!(resumo.pct_economia, dec!(0.5));
        assert_eq!(resumo.total_energia, 2000.0);
        assert_eq!(resumo.total_reativo, 1100.0);
        assert!((resumo.reativo_excedente_total - 280.0).abs() < 1e-9);
        assert_eq!(resumo.demanda_maxima, 250.0);
        assert_eq!(resumo.fp_meta, 0.92);

        let fp = resumo.fator_potencia_global.unwrap();
        assert!((fp - 2000.0 / (2000.0_f64.powi(2) + 1100.0_f64.powi(2)).sqrt()).abs() < 1e-9);
        assert!(resumo.kvar_corrigir > 0.0);
    }

    #[test]
    fn test_latest_record_target_overrides_config() {
        let mut older = record("jan/24", dec!(100), 1000.0, 900.0);
        older.fp_meta = Some(0.85);
        let mut newer = record("fev/24", dec!(100), 1000.0, 900.0);
        newer.fp_meta = Some(0.95);

        let report = build_report(
            &[newer, older],
            &PeriodSelector::ThisYear,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            &EngineConfig::default(),
        );

        assert_eq!(report.resumo.fp_meta, 0.95);
    }

    #[test]
    fn test_out_of_range_record_target_is_ignored() {
        let mut valid = record("jan/24", dec!(100), 1000.0, 900.0);
        valid.fp_meta = Some(0.85);
        let mut too_high = record("fev/24", dec!(100), 1000.0, 900.0);
        too_high.fp_meta = Some(1.5);
        let mut not_a_number = record("mar/24", dec!(100), 1000.0, 900.0);
        not_a_number.fp_meta = Some(f64::NAN);
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let report = build_report(
            &[valid, too_high.clone(), not_a_number.clone()],
            &PeriodSelector::ThisYear,
            today,
            &EngineConfig::default(),
        );
        assert_eq!(report.resumo.fp_meta, 0.85);

        let mut zero = record("abr/24", dec!(100), 1000.0, 900.0);
        zero.fp_meta = Some(0.0);
        let report = build_report(
            &[too_high, not_a_number, zero],
            &PeriodSelector::ThisYear,
            today,
            &EngineConfig::default(),
        );
        assert_eq!(report.resumo.fp_meta, 0.92);
        assert!(report.resumo.kvar_corrigir.is_finite());
    }

    #[test]
    fn test_overflowing_totals_are_zero() {
        let mut first = record("jan/24", Decimal::MAX, 1000.0, 0.0);
        first.fatura_livre = Decimal::MAX;
        let mut second = record("fev/24", Decimal::MAX, 1000.0, 0.0);
        second.fatura_livre = Decimal::MAX;

        let report = build_report(
            &[first, second],
            &PeriodSelector::ThisYear,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            &EngineConfig::default(),
        );

        assert_eq!(report.meses.len(), 2);
        assert_eq!(report.resumo.fatura_geral_total, Decimal::ZERO);
        assert_eq!(report.resumo.economia_total, Decimal::ZERO);
        assert_eq!(report.resumo.pct_economia, Decimal::ZERO);
    }

    #[test]
    fn test_empty_period() {
        let report = build_report(
            &[],
            &PeriodSelector::PrevYear,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            &EngineConfig::default(),
        );

        assert!(report.meses.is_empty());
        assert_eq!(report.resumo.meses, 0);
        assert_eq!(report.resumo.pct_economia, Decimal::ZERO);
        assert_eq!(report.resumo.fator_potencia_global, None);
        assert_eq!(report.resumo.kvar_corrigir, 0.0);
    }
}
