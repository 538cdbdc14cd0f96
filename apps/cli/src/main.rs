#![deny(warnings)]

//! Headless CLI: run one fleet scenario and print its financial report.

mod scenario;

use anyhow::Result;
use persistence::{save_missions, upsert_doc, Collection, SqliteStore};
use scenario::Scenario;
use sim_econ::{evaluate_fleet, CachedPricing, FleetEconomics, PortfolioSummary, StaticPrices};
use sim_runtime::{Fleet, FleetReport};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<PathBuf>,
    vessels: Option<u32>,
    seed: Option<u64>,
    save: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next().map(PathBuf::from),
            "--vessels" => args.vessels = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--save" => args.save = it.next(),
            _ => {}
        }
    }
    args
}

fn print_report(report: &FleetReport, econ: &FleetEconomics) {
    for (mission, m) in report.missions.iter().zip(&econ.missions) {
        let target = mission
            .asteroid
            .as_ref()
            .map(|a| format!("{} ({})", a.name, a.class.label()))
            .unwrap_or_else(|| "none".to_string());
        println!(
            "{} | {} | days: {} | mined: {} kg | hazards: {} | hull: {} | cost: ${} | cargo: ${} | net: ${} | roi: {:.1}% | risk: {:?}",
            mission.vessel,
            target,
            m.facts.total_days,
            mission.extracted_kg,
            m.facts.hazard_count,
            m.facts.hull_damage,
            m.costs.total.round_dp(0),
            m.cargo.total.round_dp(0),
            m.net_profit.round_dp(0),
            m.roi_percent,
            m.risk.level,
        );
    }
    if let Some(sale) = &report.sale {
        println!(
            "Pooled sale | mass: {} kg | revenue: ${} | market impact: {:.3} | trade barrier: {:.3}",
            sale.total_mass_kg,
            sale.total_revenue.round_dp(0),
            sale.factors.market_impact,
            sale.factors.trade_barrier
        );
    }
    println!(
        "Fleet | days: {} | revenue: ${} | cost: ${} | net: ${} | roi: {:.1}% | risk: {:?}",
        report.days,
        econ.revenue.round_dp(0),
        econ.total_cost.round_dp(0),
        econ.net_profit.round_dp(0),
        econ.roi_percent,
        econ.risk.level
    );
    for r in &econ.risk.recommendations {
        println!("  - {r}");
    }
    let portfolio = PortfolioSummary::from_missions(&econ.missions);
    println!(
        "Portfolio | missions: {} | profitable: {} | success: {:.1}% | avg profit: ${}",
        portfolio.missions,
        portfolio.profitable_missions,
        portfolio.success_rate,
        portfolio.average_profit.round_dp(0)
    );
    if report.stopped {
        println!("Run stopped before every vessel completed");
    }
}

async fn save_run(url: &str, run: &str, report: &FleetReport, econ: &FleetEconomics) -> Result<()> {
    let mut store = SqliteStore::connect(url).await?;
    save_missions(&mut store, run, &report.missions).await?;
    upsert_doc(&mut store, Collection::Reports, run, econ).await?;
    if let Some(prices) = &report.prices {
        upsert_doc(&mut store, Collection::Prices, run, prices).await?;
    }
    persistence::create_save(store.pool(), run, None).await?;
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(scenario = ?args.scenario, vessels = ?args.vessels, seed = ?args.seed, "starting CLI");

    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };
    let (mut config, asteroids) = scenario.into_parts();
    if let Some(v) = args.vessels {
        config.vessels = v;
    }
    if let Some(s) = args.seed {
        config.rng_seed = s;
    }
    let costs = config.costs.clone();
    let seed = config.rng_seed;

    let mut prices = CachedPricing::new(StaticPrices::default());
    let mut fleet = Fleet::new(config, asteroids)?;
    let report = fleet.run(&mut prices)?;
    let sale_prices = report.prices.clone().unwrap_or_else(sim_econ::fallback_prices);
    let econ = evaluate_fleet(&report.missions, report.sale.as_ref(), &sale_prices, &costs)?;
    print_report(&report, &econ);

    if let Some(url) = &args.save {
        let run = format!("seed-{seed}");
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(save_run(url, &run, &report, &econ))?;
        info!(url = %url, run = %run, "run saved");
    }
    Ok(())
}
