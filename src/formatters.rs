use serde::Serialize;
use std::io;

use crate::models::{CalculationResult, RowDetail};
use crate::pricing::PriceTier;

/// Formats a price in dollars, or "N/A" when the price is unknown
pub fn format_price(value: f64) -> String {
    if value > 0.0 && value.is_finite() {
        format!("${value:.2}")
    } else {
        "N/A".to_string()
    }
}

fn variant_label(is_foil: bool) -> &'static str {
    if is_foil {
        "Foil"
    } else {
        "Non-foil"
    }
}

fn row_label(row: &RowDetail) -> String {
    match row.split_index() {
        Some(index) => format!("{} #{}", row.card_name, index + 1),
        None => row.card_name.clone(),
    }
}

/// Renders a plain-text price report
pub fn format_price_report(result: &CalculationResult, tier: PriceTier) -> String {
    let mut output = String::new();

    if result.rows.is_empty() {
        output.push_str("No cards from your deck list were found in the catalog.\n");
    }

    let name_width = result
        .rows
        .iter()
        .map(|row| row_label(row).chars().count())
        .max()
        .unwrap_or(0);

    for row in &result.rows {
        output.push_str(&format!(
            "{:>3} x {:<width$}  {} ({})  {} each  {}\n",
            row.quantity,
            row_label(row),
            row.selected_set,
            variant_label(row.is_foil),
            format_price(row.unit_price),
            format_price(row.line_total),
            width = name_width
        ));
        if let Some(reason) = row.fallback {
            output.push_str(&format!("      note: {reason}\n"));
        }
    }

    output.push_str("========================\n");
    output.push_str(&format!(
        "Total ({} price): {}\n",
        tier,
        format_price(result.total_price)
    ));
    output.push_str(&format!("Total cards: {}\n", result.total_cards));

    if let Some(message) = result.not_found_message() {
        output.push_str(&format!("WARNING: {message}\n"));
    }

    output
}

#[derive(Serialize)]
struct CsvRow<'a> {
    card_name: &'a str,
    copy: Option<usize>,
    quantity: u32,
    set: &'a str,
    variant: &'static str,
    unit_price: String,
    line_total: String,
    fallback: &'static str,
}

/// Writes the rows of a result as CSV with a header line
pub fn write_csv<W: io::Write>(result: &CalculationResult, writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in &result.rows {
        wtr.serialize(CsvRow {
            card_name: &row.card_name,
            copy: row.split_index().map(|index| index + 1),
            quantity: row.quantity,
            set: &row.selected_set,
            variant: variant_label(row.is_foil),
            unit_price: format!("{:.2}", row.unit_price),
            line_total: format!("{:.2}", row.line_total),
            fallback: row.fallback.map(|reason| reason.message()).unwrap_or(""),
        })?;
    }
    wtr.flush()?;
    Ok(())
}
