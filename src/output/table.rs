use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::candidate::Candidate;
use crate::catalog::FilterOptions;
use crate::optimizer::SelectionResult;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn render_candidates_table(candidates: &[Candidate]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Rank",
        "Channel",
        "Title",
        "Category",
        "Subscribers",
        "Price",
        "Views (p50)",
        "Views / $",
    ]);
    for (idx, candidate) in candidates.iter().enumerate() {
        let efficiency = match candidate.efficiency() {
            Some(value) => Cell::new(format!("{value:.1}")),
            None => Cell::new("ineligible").fg(Color::Red),
        };
        table.add_row(Row::from(vec![
            Cell::new(idx + 1),
            Cell::new(candidate.id().unwrap_or("-")),
            Cell::new(candidate.text("title").unwrap_or_else(|| "-".to_string())),
            Cell::new(candidate.text("category").unwrap_or_else(|| "-".to_string())),
            Cell::new(
                candidate
                    .number("subscriber_count")
                    .map(compact_number)
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(
                candidate
                    .price()
                    .map(|v| format!("${v:.0}"))
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(
                candidate
                    .reach_point()
                    .map(compact_number)
                    .unwrap_or_else(|| "-".to_string()),
            ),
            efficiency,
        ]));
    }
    table.to_string()
}

pub fn render_selection_table(result: &SelectionResult) -> String {
    let mut out = render_candidates_table(&result.selected);
    out.push_str(&format!(
        "\nStrategy: {}\nSelected: {}\nTotal cost: ${:.2} (${:.2} remaining of ${:.2})",
        result.strategy,
        result.selected.len(),
        result.total_cost,
        result.display_remaining_budget(),
        result.budget,
    ));
    if result.expected_reach.is_distribution() {
        let d = result.expected_distribution();
        out.push_str(&format!(
            "\nExpected views: {} (p10 {} / p50 {} / p90 {})",
            compact_number(d.mean),
            compact_number(d.p10),
            compact_number(d.p50),
            compact_number(d.p90),
        ));
    } else {
        out.push_str(&format!(
            "\nTotal views: {}",
            compact_number(result.total_views())
        ));
    }
    if let Some(cpv) = result.cost_per_view() {
        out.push_str(&format!("\nCost per view: ${cpv:.4}"));
    }
    out
}

pub fn render_options_table(options: &FilterOptions) -> String {
    let mut table = new_table();
    table.set_header(vec!["Filter", "Values"]);
    for (name, values) in [
        ("category", &options.categories),
        ("archetype", &options.archetypes),
        ("language", &options.languages),
        ("country", &options.countries),
    ] {
        table.add_row(vec![name.to_string(), values.join(", ")]);
    }
    table.to_string()
}

pub fn compact_number(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{value:.0}")
    }
}
