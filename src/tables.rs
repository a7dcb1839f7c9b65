use comfy_table::{Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::api::{Station, StationSnapshot};

#[must_use]
pub fn build_stations_table(stations: &[Station]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec!["Station ID", "Name"]);
    for station in stations {
        table.add_row(vec![
            Cell::new(station.id).set_alignment(CellAlignment::Right),
            Cell::new(&station.name),
        ]);
    }
    table
}

#[must_use]
pub fn build_snapshot_table(snapshot: &StationSnapshot) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec!["Reading", "Value"]);
    add_power_row(&mut table, "PV power", snapshot.pv_power);
    add_power_row(&mut table, "Battery power", snapshot.battery_power);
    table.add_row(vec![
        Cell::new("Battery SoC"),
        Cell::new(format!("{}%", snapshot.battery_soc)).set_alignment(CellAlignment::Right).fg(
            if snapshot.battery_soc < 20.0 { Color::Red } else { Color::Green },
        ),
    ]);
    add_power_row(&mut table, "Grid power", snapshot.grid_power);
    add_power_row(&mut table, "Load power", snapshot.load_power);
    add_energy_row(&mut table, "Today", snapshot.today_energy);
    add_energy_row(&mut table, "This month", snapshot.month_energy);
    add_energy_row(&mut table, "This year", snapshot.year_energy);
    add_energy_row(&mut table, "Lifetime", snapshot.total_energy);
    if let Some(mode) = snapshot.battery_mode {
        table.add_row(vec![Cell::new("Battery mode"), Cell::new(mode)]);
    }
    if let Some(reserve_soc) = snapshot.reserve_soc {
        table.add_row(vec![
            Cell::new("Reserve SoC"),
            Cell::new(format!("{reserve_soc}%")).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn add_power_row(table: &mut Table, label: &str, watts: f64) {
    table.add_row(vec![
        Cell::new(label),
        Cell::new(format!("{watts} W")).set_alignment(CellAlignment::Right),
    ]);
}

fn add_energy_row(table: &mut Table, label: &str, watt_hours: f64) {
    table.add_row(vec![
        Cell::new(label),
        Cell::new(format!("{:.1} kWh", watt_hours / 1000.0)).set_alignment(CellAlignment::Right),
    ]);
}
