use anyhow::Result;
use serde::Serialize;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_json;
    use crate::candidate::Candidate;
    use crate::optimizer::greedy::select_greedy;
    use crate::optimizer::Budget;

    #[test]
    fn renders_selection_wire_shape() {
        let candidates = [Candidate::from_value(
            json!({ "channel_id": "UC1", "price": 40, "view_count": 800 }),
        )];
        let result = select_greedy(&candidates, Budget::new(100.0).expect("budget"));
        let rendered = render_json(&result).expect("json");
        assert!(rendered.contains("\"optimizedKols\""));
        assert!(rendered.contains("\"remainingBudget\": 60.0"));
        assert!(!rendered.contains("expected_views"));
    }
}
