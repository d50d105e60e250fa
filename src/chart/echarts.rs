//! ECharts options for the report charts.
//!
//! This module creates the visualizations for a period report:
//! - **Category Chart**: Share of spending per category as a doughnut
//! - **Timeline Chart**: Expense and income totals per day or month
//! - **Net Chart**: Expenses minus income per day
//!
//! Each chart is generated as JSON configuration for the ECharts library,
//! along with the JavaScript that mounts it in a page.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title, VisualMap, VisualMapPiece},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Color, Emphasis, EmphasisFocus,
        JsFunction, Tooltip, Trigger,
    },
    series::{Line, Pie, bar},
};

use crate::{
    chart::{CategorySeries, TimeSeries},
    report::PeriodReport,
};

/// A report chart with its HTML container ID and ECharts configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Builds every chart for `report` that has something to draw.
///
/// A category chart is left out when its kind has no transactions. The
/// timeline and net charts are left out when every day or month is zero, and
/// the net chart also when the report has no per-day net series, i.e. for
/// yearly reports.
pub fn report_charts(report: &PeriodReport) -> Vec<ReportChart> {
    let data = report.chart_data();
    let subtext = report.period.to_string();
    let mut charts = Vec::new();

    if !data.expense_categories.values.is_empty() {
        charts.push(ReportChart {
            id: "expense-categories-chart",
            options: category_chart("Expenses by category", &subtext, &data.expense_categories)
                .to_string(),
        });
    }

    if !data.income_categories.values.is_empty() {
        charts.push(ReportChart {
            id: "income-categories-chart",
            options: category_chart("Income by category", &subtext, &data.income_categories)
                .to_string(),
        });
    }

    if has_activity(&data.expense_timeline) || has_activity(&data.income_timeline) {
        charts.push(ReportChart {
            id: "timeline-chart",
            options: timeline_chart(&subtext, &data.expense_timeline, &data.income_timeline)
                .to_string(),
        });

        if !data.net_per_day.values.is_empty() {
            charts.push(ReportChart {
                id: "net-chart",
                options: net_chart(&subtext, &data.net_per_day).to_string(),
            });
        }
    }

    tracing::debug!("built {} charts for {}", charts.len(), report.period);

    charts
}

fn has_activity(series: &TimeSeries) -> bool {
    series.values.iter().any(|value| *value != 0.0)
}

/// The script that mounts `charts` once the page has loaded.
///
/// Charts whose container element is missing from the page are skipped. The
/// mounted charts follow the page's colour scheme and resize with the window.
pub fn charts_script(charts: &[ReportChart]) -> String {
    let entries = charts
        .iter()
        .map(|chart| format!("    {{ id: \"{}\", option: {} }}", chart.id, chart.options))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
  const reportCharts = [
{entries}
  ];
  const colourScheme = window.matchMedia('(prefers-color-scheme: dark)');
  const mounted = [];

  for (const {{ id, option }} of reportCharts) {{
    const container = document.getElementById(id);
    if (!container) {{
      continue;
    }}
    const chart = echarts.init(container);
    chart.setOption(option);
    window.addEventListener('resize', () => chart.resize());
    mounted.push(chart);
  }}

  const applyColourScheme = () => {{
    const theme = colourScheme.matches ? 'dark' : 'default';
    mounted.forEach((chart) => chart.setTheme(theme));
  }};
  colourScheme.addEventListener('change', applyColourScheme);
  applyColourScheme();
}});"#
    )
}

pub fn category_chart(title: &str, subtext: &str, series: &CategorySeries) -> Chart {
    let data: Vec<(f64, &str)> = series
        .values
        .iter()
        .zip(&series.labels)
        .map(|(value, label)| (*value, label.as_str()))
        .collect();

    Chart::new()
        .title(Title::new().text(title).subtext(subtext))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().left("center").bottom("1%"))
        .color(series.colors.iter().map(|&color| Color::from(color)).collect())
        .series(
            Pie::new()
                .name(title)
                .radius(vec!["40%", "70%"])
                .center(vec!["40%", "55%"])
                .data(data),
        )
}

pub fn timeline_chart(subtext: &str, expenses: &TimeSeries, income: &TimeSeries) -> Chart {
    let labels = if expenses.labels.len() >= income.labels.len() {
        expenses.labels.clone()
    } else {
        income.labels.clone()
    };

    Chart::new()
        .title(
            Title::new()
                .text("Expenses and income")
                .subtext(subtext)
                .left(20)
                .top("1%"),
        )
        .tooltip(axis_tooltip(AxisPointerType::Shadow))
        .legend(Legend::new().left(250).top("1%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(90)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            bar::Bar::new()
                .name("Expenses")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(expenses.values.clone()),
        )
        .series(
            bar::Bar::new()
                .name("Income")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(income.values.clone()),
        )
}

/// A line of expenses minus income per day. Days where more went out than
/// came in are drawn red, the rest green.
pub fn net_chart(subtext: &str, net_per_day: &TimeSeries) -> Chart {
    Chart::new()
        .title(Title::new().text("Net spending").subtext(subtext))
        .tooltip(axis_tooltip(AxisPointerType::Line))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(net_per_day.labels.clone()),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .visual_map(VisualMap::new().show(false).pieces(vec![
            VisualMapPiece::new().lte(0).color("green"),
            VisualMapPiece::new().gt(0).color("red"),
        ]))
        .series(Line::new().name("Net").data(net_per_day.values.clone()))
}

/// Formats amounts the same way as [crate::chart::format_currency]: two
/// decimals, thousands separators and the sign before the dollar sign.
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "if (!Number.isFinite(number) || number === 0) {
              return '$0.00';
            }
            const digits = Math.abs(number).toLocaleString('en-US', {
              minimumFractionDigits: 2,
              maximumFractionDigits: 2
            });
            return (number < 0 ? '-$' : '$') + digits;",
    )
}

/// An axis tooltip with currency values and the given pointer.
fn axis_tooltip(pointer: AxisPointerType) -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(pointer))
}
