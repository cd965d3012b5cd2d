use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use enumset::EnumSet;
use tokio_modbus::Address;

use crate::core::{
    catalog::{Access, Measurement},
    firmware::FirmwareVersion,
    snapshot::Snapshot,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

pub fn build_snapshot_table(snapshot: &Snapshot, firmware: FirmwareVersion) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Measurement", "Value", "Unit"]);

    let status_color = if snapshot.is_defrosting() {
        Color::Cyan
    } else if snapshot.is_running() {
        Color::Green
    } else {
        Color::Reset
    };
    table.add_row(vec![
        Cell::new("status"),
        Cell::new(&snapshot.status).fg(status_color),
        Cell::new(snapshot.status_code).add_attribute(Attribute::Dim),
    ]);
    if let Some(lock) = &snapshot.lock {
        let lock_color = if snapshot.is_lock_active() { Color::DarkYellow } else { Color::Reset };
        table.add_row(vec![
            Cell::new("lock"),
            Cell::new(lock).fg(lock_color),
            Cell::new(snapshot.lock_code.unwrap_or_default()).add_attribute(Attribute::Dim),
        ]);
    }
    if let Some(error_code) = snapshot.error_code {
        table.add_row(vec![
            Cell::new("error_code"),
            Cell::new(error_code)
                .set_alignment(CellAlignment::Right)
                .fg(if snapshot.is_error_active() { Color::Red } else { Color::Green }),
            Cell::new(""),
        ]);
    }
    if let Some(sensor_error_code) = snapshot.sensor_error_code {
        table.add_row(vec![
            Cell::new("sensor_error_code"),
            Cell::new(sensor_error_code)
                .set_alignment(CellAlignment::Right)
                .fg(if sensor_error_code > 0 { Color::Red } else { Color::Green }),
            Cell::new(""),
        ]);
    }
    if let Some(cop) = snapshot.cop {
        table.add_row(vec![
            Cell::new("cop"),
            Cell::new(format!("{cop:.2}")).set_alignment(CellAlignment::Right),
            Cell::new(""),
        ]);
    }
    for (measurement, value) in &snapshot.measurements {
        table.add_row(vec![
            Cell::new(measurement),
            Cell::new(value).set_alignment(CellAlignment::Right),
            Cell::new(measurement.definition(firmware).unit.symbol()).add_attribute(Attribute::Dim),
        ]);
    }
    table
}

pub fn build_catalog_table(firmware: FirmwareVersion) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Measurement", "Address", "Kind", "Words", "Scale", "Signed", "Unit", "Access", "Feature",
    ]);
    for measurement in EnumSet::<Measurement>::all() {
        let definition = measurement.definition(firmware);
        let Some(address) = definition.address else {
            table.add_row(vec![Cell::new(measurement).add_attribute(Attribute::Dim)]);
            continue;
        };
        let access = match measurement.access() {
            Access::ReadOnly => Cell::new("R").add_attribute(Attribute::Dim),
            Access::ReadWrite => Cell::new("RW").fg(Color::DarkYellow),
            Access::Bounded { min, max } => {
                Cell::new(format!("RW {min}..={max}")).fg(Color::DarkYellow)
            }
        };
        table.add_row(vec![
            Cell::new(measurement),
            Cell::new(address).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:?}", definition.kind)),
            Cell::new(definition.n_words()).set_alignment(CellAlignment::Right),
            Cell::new(definition.scale).set_alignment(CellAlignment::Right),
            Cell::new(if definition.signed { "yes" } else { "" }),
            Cell::new(definition.unit.symbol()),
            access,
            Cell::new(measurement.feature().map(|feature| format!("{feature:?}")).unwrap_or_default())
                .add_attribute(Attribute::Dim),
        ]);
    }
    table
}

pub fn build_registers_table(address: Address, words: &[u16]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Address", "Word", "Hex", "Signed"]);
    for (address, word) in (address..=Address::MAX).zip(words) {
        table.add_row(vec![
            Cell::new(address).add_attribute(Attribute::Dim),
            Cell::new(word).set_alignment(CellAlignment::Right),
            Cell::new(format!("{word:#06X}")).set_alignment(CellAlignment::Right),
            Cell::new(word.cast_signed()).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
