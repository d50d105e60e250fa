use std::{error::Error, fs, path::PathBuf, process::exit};

use clap::Parser;

use tally_rs::{
    Config,
    aggregation::AggregateResult,
    chart::{
        echarts::{charts_script, report_charts},
        format_currency, format_percentage,
    },
    config::{DEFAULT_TIMEZONE, TIMEZONE_ENV_VAR},
    date::{LocalDate, YearMonth},
    filter::{
        CategoryFilter, CurrencyFilter, FilterSpecification, Period, PeriodKind,
        validate_range_text,
    },
    import::load_snapshot,
    logging::setup_logging,
    report::{PeriodReport, build_report},
};

/// Summarize a snapshot of transactions for a period.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to a `.json` or `.csv` snapshot of transactions.
    #[arg(long)]
    input: PathBuf,

    /// The period to report on: all, last-week, last-month, specific-month,
    /// custom-range or quarter-or-year.
    #[arg(long, default_value = "all")]
    period: PeriodKind,

    /// The year for `quarter-or-year`.
    #[arg(long)]
    year: Option<i32>,

    /// The month for `specific-month`, formatted as YYYY-MM.
    #[arg(long)]
    month: Option<YearMonth>,

    /// The first day for `custom-range`, formatted as YYYY-MM-DD.
    #[arg(long)]
    start: Option<String>,

    /// The last day for `custom-range`, formatted as YYYY-MM-DD.
    #[arg(long)]
    end: Option<String>,

    /// Only include transactions in this category, or "all".
    #[arg(long, default_value = "all")]
    category: CategoryFilter,

    /// Only include transactions in this currency (COP or USD), or "all".
    #[arg(long, default_value = "all")]
    currency: CurrencyFilter,

    /// The IANA timezone that decides what "today" is, e.g. America/Bogota.
    #[arg(long, env = TIMEZONE_ENV_VAR, default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Write a script that renders the report charts with ECharts to this path.
    #[arg(long)]
    charts: Option<PathBuf>,

    /// Also append debug logs to this file.
    #[arg(long)]
    debug_log: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    setup_logging(args.debug_log.as_deref())?;

    let config = Config::new(&args.timezone);
    let local_offset = config.local_offset().unwrap_or_else(|error| fail(error));
    let today = LocalDate::today(local_offset);

    let spec = filter_specification(&args).unwrap_or_else(|error| fail(error));
    let transactions =
        load_snapshot(&args.input, local_offset).unwrap_or_else(|error| fail(error));

    let report = build_report(&transactions, &spec, today);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(charts_path) = &args.charts {
        fs::write(charts_path, charts_script(&report_charts(&report)))?;
        tracing::info!("wrote charts to {}", charts_path.display());
    }

    Ok(())
}

fn filter_specification(args: &Args) -> Result<FilterSpecification, tally_rs::Error> {
    let (start, end) = match args.period {
        PeriodKind::CustomRange => {
            let (start, end) = validate_range_text(
                args.start.as_deref().unwrap_or_default(),
                args.end.as_deref().unwrap_or_default(),
            )?;
            (Some(start), Some(end))
        }
        _ => (None, None),
    };

    let period = Period::from_parts(args.period, args.year, args.month, start, end)?;

    Ok(FilterSpecification::for_period(period)
        .category(args.category.clone())
        .currency(args.currency))
}

fn print_report(report: &PeriodReport) {
    match report.span {
        Some((start, end)) => println!("{} ({start} to {end})", report.period),
        None => println!("{}", report.period),
    }
    println!();

    print_aggregate("Expenses", &report.expenses);
    print_aggregate("Income", &report.income);

    if let Some(quarters) = &report.quarters {
        println!("Quarters");
        for quarter in quarters {
            println!(
                "  Q{}  expenses {:>14}  income {:>14}  net {:>14}  ({} transactions)",
                quarter.quarter,
                format_currency(quarter.expense_total),
                format_currency(quarter.income_total),
                format_currency(quarter.net),
                quarter.count
            );
        }
        println!();
    }

    if let Some(peak) = report.peak_expense_day {
        println!(
            "Highest spending day: {} ({})",
            peak.date,
            format_currency(peak.total)
        );
    }

    println!("Balance: {}", format_currency(report.balance));
}

fn print_aggregate(title: &str, aggregate: &AggregateResult) {
    println!(
        "{title}: {} across {} transactions (average {})",
        format_currency(aggregate.total_amount),
        aggregate.count,
        format_currency(aggregate.average_amount)
    );

    for category in &aggregate.category_breakdown {
        println!(
            "  {} {:<16} {:>14} {:>5}  ({})",
            category.icon,
            category.name,
            format_currency(category.total),
            format_percentage(category.percentage_of_total),
            category.count
        );
    }

    println!();
}

fn fail(error: impl ToString) -> ! {
    print_error(error);
    exit(1);
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
