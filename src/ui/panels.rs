use eframe::egui::{self, ProgressBar, RichText, ScrollArea, Slider, Ui};
use egui_extras::{Column, TableBuilder};

use super::{plot, truncate_label};
use crate::color::severity_color;
use crate::data::filter::YearRange;
use crate::data::loader::LoadMode;
use crate::data::model::{format_count, Dataset};
use crate::data::stats::ColumnInfo;
use crate::state::AppState;

const CELL_CHARS: usize = 60;

/// Kick off a load of the current source/mode, repainting as it reports.
pub fn start_load(ui: &Ui, state: &mut AppState) {
    let ctx = ui.ctx().clone();
    state.request_load(move || ctx.request_repaint());
}

// ---------------------------------------------------------------------------
// Left side panel – loading options and filters
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data Loading Options");
    ui.separator();

    match &state.source_info {
        Some(info) => {
            ui.label(format!("Source: {}", info.path.display()));
            ui.label(format!("Dataset size: {:.2} GB", info.size_gb()));
            ui.label(format!("Columns: {}", info.columns.len()));
        }
        None => {
            ui.label(
                RichText::new(format!("Cannot read {}", state.source.display()))
                    .color(egui::Color32::RED),
            );
        }
    }
    ui.add_space(6.0);

    ui.strong("Choose data loading mode:");
    let loader_config = state.config.loader.clone();
    let mut mode = state.mode;
    egui::ComboBox::from_id_salt("load_mode")
        .selected_text(mode.label(&loader_config))
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for candidate in LoadMode::ALL {
                ui.selectable_value(&mut mode, candidate, candidate.label(&loader_config));
            }
        });
    if mode != state.mode {
        state.mode = mode;
        start_load(ui, state);
    }

    if ui
        .add_enabled(!state.is_loading(), egui::Button::new("Reload"))
        .clicked()
    {
        let source = state.source.clone();
        state.set_source(source);
        start_load(ui, state);
    }

    ui.add_space(6.0);
    ui.heading("Data Filtering");
    ui.separator();
    year_range_controls(ui, state);
}

fn year_range_controls(ui: &mut Ui, state: &mut AppState) {
    let bounds = state.view.as_ref().and_then(|v| v.year_bounds);
    let (Some((min, max)), Some(range)) = (bounds, state.year_range) else {
        ui.label("No year data available for filtering");
        return;
    };

    ui.strong("Select year range:");
    let mut start = range.start;
    let mut end = range.end;
    let changed_start = ui.add(Slider::new(&mut start, min..=max).text("from")).changed();
    let changed_end = ui.add(Slider::new(&mut end, min..=max).text("to")).changed();
    if changed_start || changed_end {
        state.set_year_range(YearRange::new(start, end));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(ui, state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(view) = &state.view {
            ui.label(format!(
                "{} rows loaded, {} in year range",
                format_count(view.dataset.len()),
                format_count(state.filtered.rows.len())
            ));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – the dashboard
// ---------------------------------------------------------------------------

/// Render the dashboard body.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    ui.heading("CORD-19 Dataset Explorer");

    if let Some(pending) = &state.pending {
        match pending.progress {
            Some(progress) => {
                ui.add(ProgressBar::new(progress.fraction).show_percentage());
                ui.label(format!("Loaded {} rows...", format_count(progress.rows_loaded)));
            }
            None => {
                ui.horizontal(|ui: &mut Ui| {
                    ui.spinner();
                    ui.label("Loading dataset...");
                });
            }
        }
    }

    for notice in &state.notices {
        ui.colored_label(severity_color(notice.severity), &notice.message);
    }

    let Some(view) = &state.view else {
        if !state.is_loading() {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a CSV file to explore  (File → Open…)");
            });
        }
        return;
    };
    let config = &state.config.view;
    let dataset = view.dataset.as_ref();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.add_space(6.0);
            ui.columns(3, |cols| {
                metric(&mut cols[0], "Total Rows", format_count(view.metrics.rows));
                metric(&mut cols[1], "Columns", view.metrics.columns.to_string());
                metric(&mut cols[2], "Memory Usage", format!("{:.1} MB", view.metrics.memory_mb));
            });

            egui::CollapsingHeader::new("View Sample Data")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    let rows: Vec<usize> = (0..dataset.len().min(config.preview_rows)).collect();
                    data_table(ui, "sample_table", dataset, &rows);
                });

            ui.add_space(6.0);
            ui.heading("Visualizations");
            ui.columns(2, |cols| {
                cols[0].strong("Publications by Year");
                plot::year_chart(&mut cols[0], &state.filtered.year_counts);

                cols[1].strong(format!("Top {} {}", config.top_n, config.category_column));
                match &state.filtered.top_categories {
                    Some(top) => plot::category_chart(&mut cols[1], "category_chart", top),
                    None => {
                        cols[1].label(format!("No {} data available", config.category_column));
                    }
                }
            });

            ui.add_space(6.0);
            ui.heading("Data Insights");
            egui::CollapsingHeader::new("Column Information")
                .default_open(false)
                .show(ui, |ui: &mut Ui| column_info_table(ui, &view.columns));

            let filtered_rows: Vec<usize> = state
                .filtered
                .rows
                .iter()
                .take(config.filtered_preview_rows)
                .map(|&(row, _)| row)
                .collect();
            egui::CollapsingHeader::new(format!(
                "Filtered Data ({} rows)",
                format_count(state.filtered.rows.len())
            ))
            .id_salt("filtered_data")
            .default_open(false)
            .show(ui, |ui: &mut Ui| {
                data_table(ui, "filtered_table", dataset, &filtered_rows);
            });
        });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).small());
        ui.label(RichText::new(value).heading().strong());
    });
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Render the given dataset rows with every column.
fn data_table(ui: &mut Ui, id: &str, dataset: &Dataset, rows: &[usize]) {
    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .columns(Column::auto().at_least(60.0).clip(true), dataset.columns.len())
                .header(20.0, |mut header| {
                    for column in &dataset.columns {
                        header.col(|ui| {
                            ui.strong(&column.name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, rows.len(), |mut row| {
                        let record = &dataset.records[rows[row.index()]];
                        for value in record.values() {
                            row.col(|ui| {
                                ui.label(truncate_label(&value.to_string(), CELL_CHARS));
                            });
                        }
                    });
                });
        });
    });
}

fn column_info_table(ui: &mut Ui, columns: &[ColumnInfo]) {
    ui.push_id("column_info", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(120.0))
            .columns(Column::auto().at_least(80.0), 4)
            .header(20.0, |mut header| {
                for title in ["Column", "Data Type", "Non-Null Count", "Null Count", "Memory Usage (KB)"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, columns.len(), |mut row| {
                    let info = &columns[row.index()];
                    row.col(|ui| {
                        ui.label(&info.name);
                    });
                    row.col(|ui| {
                        ui.label(info.dtype.label());
                    });
                    row.col(|ui| {
                        ui.label(format_count(info.non_null));
                    });
                    row.col(|ui| {
                        ui.label(format_count(info.null));
                    });
                    row.col(|ui| {
                        ui.label(format!("{:.1}", info.memory_kb));
                    });
                });
            });
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(ui: &Ui, state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open paper metadata")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.set_source(path);
        start_load(ui, state);
    }
}
