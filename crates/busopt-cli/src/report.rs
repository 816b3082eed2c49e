use busopt_model::{AssignmentPlan, Dataset};
use comfy_table::{presets::UTF8_FULL, CellAlignment, Table};

pub fn fleet_table(dataset: &Dataset) -> Table {
    let mut table = numeric_table(vec!["Unit", "Capacity", "Cost/km"]);
    for unit in &dataset.fleet {
        table.add_row(vec![
            unit.name.clone(),
            format!("{:.2}", unit.capacity),
            format!("{:.2}", unit.cost_per_km),
        ]);
    }
    table
}

pub fn route_table(dataset: &Dataset) -> Table {
    let mut table = numeric_table(vec!["Route", "Demand", "Distance"]);
    for route in &dataset.routes {
        table.add_row(vec![
            route.name.clone(),
            format!("{:.2}", route.demand),
            format!("{:.2}", route.distance),
        ]);
    }
    table
}

pub fn plan_table(plan: &AssignmentPlan) -> Table {
    let mut table = numeric_table(vec!["Unit", "Route", "Trips", "Cost"]);
    for row in &plan.rows {
        table.add_row(vec![
            row.unit.clone(),
            row.route.clone(),
            format!("{:.2}", row.trips),
            format_amount(row.cost),
        ]);
    }
    table
}

/// Right-align every column but the first (identifier) column.
fn numeric_table(header: Vec<&str>) -> Table {
    let columns = header.len();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    for i in 1..columns {
        if let Some(column) = table.column_mut(i) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    table
}

/// Round to a whole amount and group thousands with commas: `1234567.8` -> `1,234,568`.
pub fn format_amount(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busopt_model::{FleetUnit, ResultRow, Route};

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.4), "999");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1234567.8), "1,234,568");
        assert_eq!(format_amount(-45210.0), "-45,210");
    }

    #[test]
    fn test_tables_list_every_row() {
        let dataset = Dataset::new(
            vec![FleetUnit::new("Bus A", 10.0, 2.0)],
            vec![Route::new("Koridor 1", 5.0, 3.0), Route::new("Koridor 2", 1.0, 8.0)],
        );
        let plan = AssignmentPlan {
            rows: vec![ResultRow {
                unit: "Bus A".to_string(),
                route: "Koridor 1".to_string(),
                trips: 5.0,
                cost: 30000.0,
            }],
            total_cost: 30000.0,
            objective_value: 30000.0,
        };

        assert_eq!(fleet_table(&dataset).row_iter().count(), 1);
        assert_eq!(route_table(&dataset).row_iter().count(), 2);

        let rendered = plan_table(&plan).to_string();
        assert!(rendered.contains("Koridor 1"));
        assert!(rendered.contains("30,000"));
    }
}
