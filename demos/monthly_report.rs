use chrono::NaiveDate;
use energy_report_engine::*;

fn main() -> Result<()> {
    let records: Vec<MonthlyEnergyRecord> = serde_json::from_str(
        r#"[
            {"referencia":"out/24","fatura_geral":52340.18,"fatura_livre":18120.4,"compra_energia":14500,"aliquota_icms":0.18,"aliquota_rdb":0.3333,"encargos":1980.32,"banco_trianon":420,"gestao_cco":1150,"gestao_parceiro":380,"total_energia":182000,"total_reativo":121500,"demanda_maxima":512},
            {"referencia":"nov/24","fatura_geral":49876.02,"fatura_livre":17655.9,"compra_energia":13900,"aliquota_icms":0.18,"aliquota_rdb":0.3333,"encargos":1875.11,"banco_trianon":420,"gestao_cco":1150,"gestao_parceiro":380,"total_energia":175400,"total_reativo":98000,"demanda_maxima":498},
            {"referencia":"dez/24","fatura_geral":51002.77,"fatura_livre":17990.0,"compra_energia":14120,"aliquota_icms":0.18,"aliquota_rdb":0.3333,"encargos":1902.5,"banco_trianon":420,"gestao_cco":1150,"gestao_parceiro":380,"total_energia":178900,"total_reativo":101200,"demanda_maxima":505}
        ]"#,
    )?;

    let selector = PeriodSelector::custom(Some("dez/24"), Some("out/24"))?;
    let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();

    let report = generate_report(&records, &selector, today, &EngineConfig::default())?;

    println!("Period {}", report.range);
    println!(
        "{:<8} {:>12} {:>12} {:>9} {:>12} {:>6}",
        "Mes", "ICMS", "Economia", "%", "Reativo exc", "FP"
    );
    for mes in &report.meses {
        let fp = mes
            .fator_potencia_periodo
            .map(|fp| format!("{fp:.3}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:>12} {:>12} {:>9} {:>12.1} {:>6}",
            mes.referencia.to_string(),
            mes.icms_energia,
            mes.economia_liquida,
            mes.pct_economia,
            mes.reativo_excedente,
            fp
        );
    }

    let resumo = &report.resumo;
    println!("\nTotal savings: {} ({})", resumo.economia_total, resumo.pct_economia);
    if let Some(fp) = resumo.fator_potencia_global {
        println!(
            "Global power factor {:.3}; {:.1} kVAr needed to reach {:.2}",
            fp, resumo.kvar_corrigir, resumo.fp_meta
        );
    }

    Ok(())
}
