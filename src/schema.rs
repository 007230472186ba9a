use crate::billing::{calc_icms_energia, ParcelasEconomia};
use crate::error::{ReportError, Result};
use crate::period::HasRefLabel;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Regulatory kVArh/kWh ratio above which reactive energy is billed.
pub const DEFAULT_REACTIVE_LIMIT: f64 = 0.62;

/// Minimum power factor required by the distribution utility.
pub const DEFAULT_TARGET_POWER_FACTOR: f64 = 0.92;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthlyEnergyRecord {
    #[serde(default)]
    #[schemars(description = "Reference month as 'mmm/yy' with Portuguese abbreviations, e.g. 'ago/24'")]
    pub referencia: Option<String>,

    #[serde(default)]
    #[schemars(description = "Captive-market invoice the customer would have paid (BRL)")]
    pub fatura_geral: Decimal,

    #[serde(default)]
    #[schemars(description = "Distribution invoice paid in the free market (BRL)")]
    pub fatura_livre: Decimal,

    #[serde(default)]
    #[schemars(description = "Cost of the energy bought from the trader (BRL)")]
    pub compra_energia: Decimal,

    #[serde(default)]
    #[schemars(description = "ICMS rate as a fraction, e.g. 0.18")]
    pub aliquota_icms: Decimal,

    #[serde(default)]
    #[schemars(description = "ICMS base reduction (rebate) as a fraction of the ICMS rate")]
    pub aliquota_rdb: Decimal,

    #[serde(default)]
    #[schemars(description = "Sector charges billed outside the invoices (BRL)")]
    pub encargos: Decimal,

    #[serde(default)]
    #[schemars(description = "Intermediary bank fees (BRL)")]
    pub banco_trianon: Decimal,

    #[serde(default)]
    #[schemars(description = "Management fee charged by the CCO (BRL)")]
    pub gestao_cco: Decimal,

    #[serde(default)]
    #[schemars(description = "Management fee charged by the partner (BRL)")]
    pub gestao_parceiro: Decimal,

    #[serde(default)]
    #[schemars(description = "Total active energy in the month (kWh)")]
    pub total_energia: f64,

    #[serde(default)]
    #[schemars(description = "Total reactive energy in the month (kVArh)")]
    pub total_reativo: f64,

    #[serde(default)]
    #[schemars(description = "Contracted demand (kW)")]
    pub demanda_contratada: f64,

    #[serde(default)]
    #[schemars(description = "Maximum measured demand (kW)")]
    pub demanda_maxima: f64,

    #[serde(default)]
    #[schemars(description = "Target power factor for this facility; falls back to the engine configuration")]
    pub fp_meta: Option<f64>,
}

impl MonthlyEnergyRecord {
    pub fn icms_energia(&self) -> Decimal {
        calc_icms_energia(self.compra_energia, self.aliquota_icms, self.aliquota_rdb)
    }

    pub fn parcelas_economia(&self) -> ParcelasEconomia {
        ParcelasEconomia {
            fatura_geral: self.fatura_geral,
            fatura_livre: self.fatura_livre,
            compra_energia: self.compra_energia,
            icms_energia: self.icms_energia(),
            encargos: self.encargos,
            banco_trianon: self.banco_trianon,
            gestao_cco: self.gestao_cco,
            gestao_parceiro: self.gestao_parceiro,
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(MonthlyEnergyRecord)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

impl HasRefLabel for MonthlyEnergyRecord {
    fn ref_label(&self) -> Option<&str> {
        self.referencia.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(
        description = "Allowed reactive/active energy ratio before reactive energy is billed. Regulatory value is 0.62."
    )]
    pub reactive_limit: f64,

    #[schemars(
        description = "Power factor used for kVAr correction sizing when a record carries no target of its own."
    )]
    pub target_power_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reactive_limit: DEFAULT_REACTIVE_LIMIT,
            target_power_factor: DEFAULT_TARGET_POWER_FACTOR,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        validate_fraction("reactive_limit", self.reactive_limit)?;
        validate_fraction("target_power_factor", self.target_power_factor)?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(EngineConfig)
    }
}

fn validate_fraction(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(ReportError::InvalidConfig(format!(
            "{name} must be in (0, 1], got {value}"
        )));
    }
    Ok(())
}
