//! Electrical figures derived from metered active and reactive energy.
//!
//! Two power-factor flavours live here on purpose. `calc_fator_potencia`
//! reports `0.0` when nothing was metered, while the period/global variants
//! return `None` when no active energy was consumed. Report screens render
//! those differently ("0,00" vs an empty cell), so the two must not be merged.

/// Reactive energy above the regulatory share of active energy.
///
/// `limite` is the allowed kVArh/kWh ratio, normally
/// [`EngineConfig::reactive_limit`](crate::EngineConfig).
pub fn calc_reativo_excedente(total_energia: f64, total_reativo: f64, limite: f64) -> f64 {
    let excedente = total_reativo - total_energia * limite;
    if excedente.is_finite() {
        excedente.max(0.0)
    } else {
        0.0
    }
}

pub fn calc_fator_potencia(total_energia: f64, total_reativo: f64) -> f64 {
    let aparente = (total_energia * total_energia + total_reativo * total_reativo).sqrt();
    if aparente == 0.0 || !aparente.is_finite() {
        return 0.0;
    }
    total_energia / aparente
}

/// Power factor of a single billing period, `None` when no active energy was
/// consumed.
pub fn calc_fator_potencia_periodo(energia: f64, reativo: f64) -> Option<f64> {
    if energia.is_nan() || energia <= 0.0 {
        return None;
    }
    let ratio = reativo / energia;
    let fp = 1.0 / (1.0 + ratio * ratio).sqrt();
    fp.is_finite().then_some(fp)
}

/// Power factor over the totals of a whole period. Same contract as
/// [`calc_fator_potencia_periodo`].
pub fn calc_fator_potencia_global(total_energia: f64, total_reativo: f64) -> Option<f64> {
    calc_fator_potencia_periodo(total_energia, total_reativo)
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Capacitor bank size (kVAr) needed to raise the facility's power factor from
/// `fp_global` to `fp_meta` at the given maximum demand (kW).
pub fn calc_kvar_corrigir_por_demanda(
    fp_global: Option<f64>,
    demanda_maxima: f64,
    fp_meta: f64,
) -> f64 {
    let Some(fp_global) = fp_global.filter(|fp| fp.is_finite() && *fp > 0.0) else {
        return 0.0;
    };
    if !demanda_maxima.is_finite() || demanda_maxima <= 0.0 || !fp_meta.is_finite() {
        return 0.0;
    }

    let tan_atual = clamp_unit(fp_global).acos().tan();
    let tan_meta = clamp_unit(fp_meta).acos().tan();
    let kvar = demanda_maxima * (tan_atual - tan_meta);

    if kvar.is_finite() {
        kvar.max(0.0)
    } else {
        0.0
    }
}
