use std::collections::BTreeMap;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Plot};

use super::truncate_label;
use crate::color::ColorMap;
use crate::data::model::Value;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Publications by year
// ---------------------------------------------------------------------------

/// Bar chart of publication counts per year.
pub fn year_chart(ui: &mut Ui, counts: &BTreeMap<i32, usize>) {
    if counts.is_empty() {
        ui.label("No year data available for chart");
        return;
    }

    let bars: Vec<Bar> = counts
        .iter()
        .map(|(&year, &count)| {
            Bar::new(year as f64, count as f64)
                .name(year.to_string())
                .width(0.8)
        })
        .collect();

    Plot::new("year_chart")
        .height(CHART_HEIGHT)
        .x_axis_label("Year")
        .y_axis_label("Papers")
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .name("Publications")
                    .color(Color32::LIGHT_BLUE),
            );
        });
}

// ---------------------------------------------------------------------------
// Top categories
// ---------------------------------------------------------------------------

/// Bar chart of the most frequent category values, one colour per bar.
pub fn category_chart(ui: &mut Ui, id: &str, top: &[(Value, usize)]) {
    if top.is_empty() {
        ui.label("No values to chart");
        return;
    }

    let colors = ColorMap::new(top.iter().map(|(v, _)| v));
    let labels: Vec<String> = top.iter().map(|(v, _)| v.to_string()).collect();

    let bars: Vec<Bar> = top
        .iter()
        .enumerate()
        .map(|(i, (value, count))| {
            Bar::new(i as f64, *count as f64)
                .name(value.to_string())
                .fill(colors.color_for(value))
                .width(0.8)
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label("Papers")
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                return String::new();
            }
            labels
                .get(idx as usize)
                .map(|l| truncate_label(l, 14))
                .unwrap_or_default()
        })
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}
