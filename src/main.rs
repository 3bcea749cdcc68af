//! Velocity banking CLI
//!
//! Command-line interface for amortization, HELOC cycle simulation and chunk optimization

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use velocity_banking::amortization::{
    monthly_payment, payoff_date, standard_amortization, standard_baseline,
};
use velocity_banking::optimizer::{
    generate_scenarios, optimize_all_objectives, optimize_chunk, sensitivity_analysis,
    strategies_for_target, ChunkOptimization, Objective, ScenarioSet, SensitivityReport,
    TargetStrategies,
};
use velocity_banking::simulation::{format_currency, simulate_strategy, write_ledger_csv};
use velocity_banking::{
    compare_to_standard, AmortizationSchedule, HelocParams, MortgageParams, OptimizerConfig,
    StrategyResult,
};

/// HELOC velocity banking simulator and chunk optimizer
#[derive(Parser)]
#[command(name = "velocity", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Optimizer overrides (key,value CSV)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Standard amortization schedule
    Amortize(AmortizeArgs),
    /// Simulate a fixed chunk amount month by month
    Simulate(SimulateArgs),
    /// Recommend a chunk amount (five scenarios, or variations for --target-years)
    Optimize(OptimizeArgs),
    /// Chunk minimizing interest, time or a balanced blend (every objective when omitted)
    Goal(GoalArgs),
    /// Perturb rate, chunk and payment to see how the strategy reacts
    Sensitivity(SensitivityArgs),
}

#[derive(Args)]
struct MortgageArgs {
    /// Outstanding mortgage balance
    #[arg(long)]
    balance: f64,
    /// Annual mortgage rate in percent
    #[arg(long)]
    rate: f64,
    /// Contractual monthly payment
    #[arg(long)]
    payment: f64,
    /// Monthly household income
    #[arg(long)]
    income: f64,
    /// Monthly household expenses (excluding the mortgage)
    #[arg(long)]
    expenses: f64,
}

impl MortgageArgs {
    fn params(&self) -> MortgageParams {
        MortgageParams {
            balance: self.balance,
            annual_rate_pct: self.rate,
            monthly_payment: self.payment,
            monthly_income: self.income,
            monthly_expenses: self.expenses,
        }
    }
}

#[derive(Args)]
struct HelocArgs {
    /// HELOC credit limit
    #[arg(long)]
    heloc_limit: f64,
    /// Annual HELOC rate in percent
    #[arg(long)]
    heloc_rate: f64,
    /// HELOC balance already drawn
    #[arg(long, default_value_t = 0.0)]
    heloc_balance: f64,
}

impl HelocArgs {
    fn params(&self) -> HelocParams {
        HelocParams::new(self.heloc_limit, self.heloc_rate)
            .with_starting_balance(self.heloc_balance)
    }
}

#[derive(Args)]
struct AmortizeArgs {
    #[arg(long)]
    balance: f64,
    #[arg(long)]
    rate: f64,
    /// Monthly payment (derived from --term-months when omitted)
    #[arg(long)]
    payment: Option<f64>,
    #[arg(long, default_value_t = 360)]
    term_months: u32,
    /// First payment month (YYYY-MM-DD), prints the payoff date
    #[arg(long)]
    start_date: Option<NaiveDate>,
    /// Write the schedule as CSV
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SimulateArgs {
    #[command(flatten)]
    mortgage: MortgageArgs,
    #[command(flatten)]
    heloc: HelocArgs,
    /// Amount drawn from the HELOC each cycle
    #[arg(long)]
    chunk: f64,
    /// First simulated month (YYYY-MM-DD), prints the payoff date
    #[arg(long)]
    start_date: Option<NaiveDate>,
    /// Write the month-by-month ledger as CSV
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct OptimizeArgs {
    #[command(flatten)]
    mortgage: MortgageArgs,
    #[command(flatten)]
    heloc: HelocArgs,
    /// Payoff horizon in years (1-30)
    #[arg(long)]
    target_years: Option<u32>,
}

#[derive(Args)]
struct GoalArgs {
    #[command(flatten)]
    mortgage: MortgageArgs,
    #[command(flatten)]
    heloc: HelocArgs,
    /// interest, time or balanced
    #[arg(long)]
    objective: Option<Objective>,
}

#[derive(Args)]
struct SensitivityArgs {
    #[command(flatten)]
    mortgage: MortgageArgs,
    #[command(flatten)]
    heloc: HelocArgs,
    #[arg(long)]
    chunk: f64,
    /// Relative perturbation applied to each input
    #[arg(long, default_value_t = 0.1)]
    perturbation: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => OptimizerConfig::from_csv_path(path)
            .with_context(|| format!("Failed to load optimizer config {}", path.display()))?,
        None => OptimizerConfig::default(),
    };

    match &cli.command {
        Commands::Amortize(args) => run_amortize(args, cli.json),
        Commands::Simulate(args) => run_simulate(args, &config, cli.json),
        Commands::Optimize(args) => run_optimize(args, &config, cli.json),
        Commands::Goal(args) => run_goal(args, &config, cli.json),
        Commands::Sensitivity(args) => run_sensitivity(args, &config, cli.json),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_payoff_date(start: Option<NaiveDate>, months: u32) {
    if let Some(date) = start.and_then(|s| payoff_date(s, months)) {
        println!("Projected payoff: {}", date.format("%B %Y"));
    }
}

fn run_amortize(args: &AmortizeArgs, json: bool) -> Result<()> {
    let payment = match args.payment {
        Some(payment) => payment,
        None => monthly_payment(args.balance, args.rate, args.term_months)?,
    };
    let schedule = standard_amortization(args.balance, args.rate, payment)
        .context("Failed to build amortization schedule")?;

    if let Some(path) = &args.output {
        write_schedule_csv(path, &schedule)?;
    }
    if json {
        return print_json(&schedule);
    }

    println!("Standard amortization");
    println!("  Payment:        {}", format_currency(payment));
    println!("  Months:         {}", schedule.months_to_payoff);
    println!("  Total interest: {}", format_currency(schedule.total_interest));
    println!("  Total paid:     {}", format_currency(schedule.total_payments));
    if schedule.reached_cap {
        let full = standard_baseline(args.balance, args.rate, payment)?;
        println!(
            "  Stopped at the month cap with {} remaining",
            format_currency(schedule.remaining_balance)
        );
        println!(
            "  Full payoff:    {} months, {} interest",
            full.months,
            format_currency(full.total_interest)
        );
    }
    print_payoff_date(args.start_date, schedule.months_to_payoff);
    Ok(())
}

fn write_schedule_csv(path: &Path, schedule: &AmortizationSchedule) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for entry in &schedule.entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    println!("Schedule written to {}", path.display());
    Ok(())
}

fn run_simulate(args: &SimulateArgs, config: &OptimizerConfig, json: bool) -> Result<()> {
    let mortgage = args.mortgage.params();
    let heloc = args.heloc.params();
    let result = simulate_strategy(&mortgage, &heloc, args.chunk, &config.simulation)
        .context("Simulation failed")?;

    if let Some(path) = &args.output {
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_ledger_csv(file, &result.entries)?;
        println!("Ledger written to {}", path.display());
    }
    if json {
        return print_json(&result);
    }

    print_ledger(&result);
    print_summary(&mortgage, &result)?;
    print_payoff_date(args.start_date, result.months());
    Ok(())
}

fn print_ledger(result: &StrategyResult) {
    println!(
        "{:>5} {:>9} {:>12} {:>10} {:>10} {:>10} {:>12} {:>14}",
        "Month", "Action", "MtgInterest", "Draw", "HelocInt", "HelocPmt", "HelocBal", "MortgageBal"
    );
    println!("{}", "-".repeat(90));
    for entry in &result.entries {
        println!(
            "{:>5} {:>9} {:>12.2} {:>10.2} {:>10.2} {:>10.2} {:>12.2} {:>14.2}",
            entry.month,
            entry.action.to_string(),
            entry.mortgage_interest,
            entry.heloc_draw,
            entry.heloc_interest,
            entry.heloc_payment,
            entry.heloc_balance,
            entry.mortgage_balance,
        );
    }
    println!();
}

fn print_summary(mortgage: &MortgageParams, result: &StrategyResult) -> Result<()> {
    let summary = &result.summary;
    let standard = standard_baseline(
        mortgage.balance,
        mortgage.annual_rate_pct,
        mortgage.monthly_payment,
    )?;
    let savings = compare_to_standard(&standard, summary);

    println!("Strategy summary (chunk {})", format_currency(summary.chunk_amount));
    println!(
        "  Payoff:         {} months ({} pulls) vs {} standard",
        summary.total_months, summary.total_cycles, summary.standard_months
    );
    println!(
        "  Interest:       {} (HELOC {}, mortgage {})",
        format_currency(summary.total_interest),
        format_currency(summary.total_heloc_interest),
        format_currency(summary.total_mortgage_interest)
    );
    println!(
        "  Saved:          {} ({:.1}%), {} months sooner",
        format_currency(savings.interest_saved),
        savings.percentage_saved,
        savings.months_saved
    );
    if summary.residual_heloc_balance > 0.0 {
        let clearance = summary
            .heloc_clearance_months
            .map(|m| format!("{m} more months"))
            .unwrap_or_else(|| "cannot be cleared".to_string());
        println!(
            "  HELOC residual: {} ({})",
            format_currency(summary.residual_heloc_balance),
            clearance
        );
    }
    Ok(())
}

fn run_optimize(args: &OptimizeArgs, config: &OptimizerConfig, json: bool) -> Result<()> {
    let mortgage = args.mortgage.params();
    let heloc = args.heloc.params();

    match args.target_years {
        Some(years) => {
            let strategies = strategies_for_target(&mortgage, &heloc, years, config)
                .context("Target search failed")?;
            if json {
                return print_json(&strategies);
            }
            print_target_strategies(&strategies);
        }
        None => {
            let set = generate_scenarios(&mortgage, &heloc, config)
                .context("Scenario generation failed")?;
            if json {
                return print_json(&set);
            }
            print_scenarios(&set);
        }
    }
    Ok(())
}

fn print_scenarios(set: &ScenarioSet) {
    println!(
        "Standard payoff: {} months, {} interest\n",
        set.standard_months,
        format_currency(set.standard_interest)
    );
    println!(
        "{:>6} {:>10} {:>7} {:>14} {:>13} {:>7}",
        "Target", "Chunk", "Months", "NetSavings", "Kind", "Score"
    );
    println!("{}", "-".repeat(62));
    for (i, scenario) in set.scenarios.iter().enumerate() {
        let marker = if set.recommended == Some(i) { " *" } else { "" };
        match (&scenario.summary, scenario.chunk_amount) {
            (Some(summary), Some(chunk)) => println!(
                "{:>5}y {:>10} {:>7} {:>14} {:>13} {:>7.3}{}",
                scenario.target_years,
                format_currency(chunk),
                summary.total_months,
                format_currency(summary.net_savings),
                scenario
                    .strategy_kind
                    .map(|k| k.to_string())
                    .unwrap_or_default(),
                scenario.score.unwrap_or(0.0),
                marker
            ),
            _ => println!(
                "{:>5}y  not viable: {}",
                scenario.target_years,
                scenario.notes.join("; ")
            ),
        }
    }
}

fn print_target_strategies(strategies: &TargetStrategies) {
    println!("Target: {} years", strategies.target_years);
    for note in &strategies.optimal.notes {
        println!("  {note}");
    }
    if strategies.variations.is_empty() {
        return;
    }

    println!(
        "\n{:>6} {:>10} {:>7} {:>14} {:>13} {:>7}",
        "Mult", "Chunk", "Months", "NetSavings", "Kind", "Viable"
    );
    println!("{}", "-".repeat(62));
    for variation in &strategies.variations {
        let (months, savings) = variation
            .summary
            .as_ref()
            .map(|s| (s.total_months.to_string(), format_currency(s.net_savings)))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        println!(
            "{:>5.0}% {:>10} {:>7} {:>14} {:>13} {:>7}",
            variation.multiplier * 100.0,
            format_currency(variation.chunk_amount),
            months,
            savings,
            variation.strategy_kind.to_string(),
            if variation.is_viable { "yes" } else { "no" }
        );
    }
}

fn run_goal(args: &GoalArgs, config: &OptimizerConfig, json: bool) -> Result<()> {
    let mortgage = args.mortgage.params();
    let heloc = args.heloc.params();
    let outcomes = match args.objective {
        Some(objective) => vec![optimize_chunk(&mortgage, &heloc, objective, config)
            .context("Chunk optimization failed")?],
        None => optimize_all_objectives(&mortgage, &heloc, config)
            .context("Chunk optimization failed")?,
    };

    if json {
        return print_json(&outcomes);
    }
    print_goal_outcomes(&outcomes);
    Ok(())
}

fn print_goal_outcomes(outcomes: &[ChunkOptimization]) {
    if let Some(first) = outcomes.first() {
        println!(
            "Chunks {} to {} ({} candidates, {} failed)\n",
            format_currency(first.lower_bound),
            format_currency(first.upper_bound),
            first.candidates,
            first.failed_candidates
        );
    }
    println!(
        "{:>9} {:>10} {:>7} {:>14} {:>13} {:>10}",
        "Objective", "Chunk", "Months", "NetSavings", "Kind", "Confidence"
    );
    println!("{}", "-".repeat(68));
    for outcome in outcomes {
        match (&outcome.summary, outcome.chunk_amount) {
            (Some(summary), Some(chunk)) => println!(
                "{:>9} {:>10} {:>7} {:>14} {:>13} {:>10.2}",
                outcome.objective.to_string(),
                format_currency(chunk),
                summary.total_months,
                format_currency(summary.net_savings),
                outcome
                    .strategy_kind
                    .map(|k| k.to_string())
                    .unwrap_or_default(),
                outcome.confidence
            ),
            _ => println!(
                "{:>9}  not converged: {}",
                outcome.objective.to_string(),
                outcome.notes.join("; ")
            ),
        }
    }
}

fn run_sensitivity(args: &SensitivityArgs, config: &OptimizerConfig, json: bool) -> Result<()> {
    let report = sensitivity_analysis(
        &args.mortgage.params(),
        &args.heloc.params(),
        args.chunk,
        args.perturbation,
        &config.simulation,
    )
    .context("Sensitivity analysis failed")?;

    if json {
        return print_json(&report);
    }
    print_sensitivity(&report);
    Ok(())
}

fn print_sensitivity(report: &SensitivityReport) {
    println!(
        "Baseline: chunk {}, {} months, {} interest (+{:.0}% per input)\n",
        format_currency(report.baseline.chunk_amount),
        report.baseline.total_months,
        format_currency(report.baseline.total_interest),
        report.perturbation * 100.0
    );
    for s in &report.sensitivities {
        match (s.months_change, s.interest_change) {
            (Some(months), Some(interest)) => println!(
                "  {:<16} {:>+5} months ({:+.1}%)  {:>12} interest ({:+.1}%)",
                s.parameter.to_string(),
                months,
                s.months_pct.unwrap_or(0.0),
                format_currency(interest),
                s.interest_pct.unwrap_or(0.0)
            ),
            _ => println!(
                "  {:<16} failed: {}",
                s.parameter.to_string(),
                s.failure.as_deref().unwrap_or("unknown")
            ),
        }
    }
}
