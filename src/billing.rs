//! Free-market billing formulas: ICMS on purchased energy, net savings and
//! percentage savings against the captive-market invoice.

use crate::rounding::{round4, round_half_up, trunc2};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Every amount that is deducted from the captive invoice to obtain the net
/// savings of a month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelasEconomia {
    pub fatura_geral: Decimal,
    pub fatura_livre: Decimal,
    pub compra_energia: Decimal,
    pub icms_energia: Decimal,
    pub encargos: Decimal,
    pub banco_trianon: Decimal,
    pub gestao_cco: Decimal,
    pub gestao_parceiro: Decimal,
}

impl ParcelasEconomia {
    /// Sum of everything the free-market customer pays instead of the
    /// captive invoice. `None` if the sum overflows.
    pub fn custo_livre(&self) -> Option<Decimal> {
        checked_sum([
            self.fatura_livre,
            self.compra_energia,
            self.icms_energia,
            self.encargos,
            self.banco_trianon,
            self.gestao_cco,
            self.gestao_parceiro,
        ])
    }
}

/// Overflow-checked sum of decimal amounts.
pub fn checked_sum<I: IntoIterator<Item = Decimal>>(values: I) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
}

/// ICMS levied "por dentro" on the energy purchase.
///
/// The effective rate is the ICMS rate reduced by the rebate (`rdb_rate`),
/// rounded to 4 places; the purchase is grossed up by that rate and the tax is
/// the truncated product. Zero if any step overflows `Decimal`.
pub fn calc_icms_energia(
    compra_energia: Decimal,
    icms_rate: Decimal,
    rdb_rate: Decimal,
) -> Decimal {
    let icms = icms_rate
        .checked_mul(rdb_rate)
        .and_then(|reduction| icms_rate.checked_sub(reduction))
        .map(round4)
        .and_then(|effective| {
            let mut divisor = Decimal::ONE.checked_sub(effective)?;
            if divisor.is_zero() {
                // Carried over from the billing sheet; a 100% effective rate
                // has no meaningful base.
                warn!(
                    "Effective ICMS rate {} (icms {}, rdb {}); taxing the purchase itself",
                    effective, icms_rate, rdb_rate
                );
                divisor = Decimal::ONE;
            }
            let base = trunc2(compra_energia.checked_div(divisor)?);
            base.checked_mul(effective).map(trunc2)
        });

    icms.unwrap_or_else(|| {
        warn!(
            "ICMS overflowed for purchase {} (icms {}, rdb {}); reporting zero",
            compra_energia, icms_rate, rdb_rate
        );
        Decimal::ZERO
    })
}

/// Net savings truncated to the cent. Zero if the amounts overflow `Decimal`.
pub fn calc_economia_liquida(parcelas: &ParcelasEconomia) -> Decimal {
    parcelas
        .custo_livre()
        .and_then(|custo| parcelas.fatura_geral.checked_sub(custo))
        .map(trunc2)
        .unwrap_or_else(|| {
            warn!(
                "Net savings overflowed for invoice {}; reporting zero",
                parcelas.fatura_geral
            );
            Decimal::ZERO
        })
}

/// Savings as a fraction of the captive invoice, rounded to 5 places.
/// Zero when there is no captive invoice to compare against, or when the
/// ratio does not fit in a `Decimal`.
pub fn calc_pct_economia(economia: Decimal, fatura_geral: Decimal) -> Decimal {
    if fatura_geral.is_zero() {
        return Decimal::ZERO;
    }
    match economia.checked_div(fatura_geral) {
        Some(ratio) => round_half_up(ratio, 5),
        None => {
            warn!(
                "Savings ratio {} / {} overflowed; reporting zero",
                economia, fatura_geral
            );
            Decimal::ZERO
        }
    }
}
