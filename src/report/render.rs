use crate::error::{EtlError, Result};
use std::io::Write;

/// A single-series bar chart over labeled categories.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, f64)>,
}

/// A grouped bar chart: one cluster per group, one bar per series entry.
/// `values[group][series]` is `None` when the cell has no data.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedBarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub groups: Vec<String>,
    pub series: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Display surface for rendered charts. The pipeline only ever hands a sink
/// fully aggregated tables; rendering backends stay swappable behind this
/// trait.
pub trait ChartSink {
    fn bar_chart(&mut self, chart: &BarChart) -> Result<()>;
    fn grouped_bar_chart(&mut self, chart: &GroupedBarChart) -> Result<()>;
}

/// Text renderer: draws horizontal Unicode bar charts to any writer, so runs
/// work the same on a terminal and headless.
pub struct TextChartSink<W: Write> {
    writer: W,
    max_bar_width: usize,
}

impl<W: Write> TextChartSink<W> {
    pub fn new(writer: W, max_bar_width: usize) -> Self {
        Self {
            writer,
            max_bar_width: max_bar_width.max(1),
        }
    }

    fn heading(&mut self, title: &str, x_label: &str, y_label: &str) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{title}")?;
        writeln!(self.writer, "{}", "=".repeat(title.chars().count()))?;
        writeln!(self.writer, "({x_label} vs {y_label})")?;
        Ok(())
    }

    fn bar(&self, value: f64, max: f64) -> String {
        if max <= 0.0 {
            return String::new();
        }
        let len = ((value / max) * self.max_bar_width as f64).round() as usize;
        "\u{2588}".repeat(len)
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

impl<W: Write> ChartSink for TextChartSink<W> {
    fn bar_chart(&mut self, chart: &BarChart) -> Result<()> {
        self.heading(&chart.title, &chart.x_label, &chart.y_label)?;
        if chart.bars.is_empty() {
            writeln!(self.writer, "(no data)")?;
            return Ok(());
        }
        let max = chart.bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
        let label_width = chart
            .bars
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);
        for (label, value) in &chart.bars {
            let bar = self.bar(*value, max);
            writeln!(
                self.writer,
                "{label:<label_width$}  {bar} {}",
                format_value(*value)
            )?;
        }
        Ok(())
    }

    fn grouped_bar_chart(&mut self, chart: &GroupedBarChart) -> Result<()> {
        if chart.values.len() != chart.groups.len() {
            return Err(EtlError::Render(format!(
                "chart {:?}: {} groups but {} value rows",
                chart.title,
                chart.groups.len(),
                chart.values.len()
            )));
        }
        self.heading(&chart.title, &chart.x_label, &chart.y_label)?;
        let populated = chart
            .values
            .iter()
            .flatten()
            .any(|cell| cell.is_some());
        if !populated {
            writeln!(self.writer, "(no data)")?;
            return Ok(());
        }
        let max = chart
            .values
            .iter()
            .flatten()
            .flatten()
            .fold(0.0_f64, |acc, v| acc.max(*v));
        let label_width = chart
            .series
            .iter()
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0);
        for (group, row) in chart.groups.iter().zip(&chart.values) {
            writeln!(self.writer, "{group}:")?;
            for (series, cell) in chart.series.iter().zip(row) {
                if let Some(value) = cell {
                    let bar = self.bar(*value, max);
                    writeln!(
                        self.writer,
                        "  {series:<label_width$}  {bar} {}",
                        format_value(*value)
                    )?;
                }
            }
        }
        Ok(())
    }
}
