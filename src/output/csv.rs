use anyhow::Result;

use crate::candidate::Candidate;

const HEADER: [&str; 8] = [
    "channel_id",
    "title",
    "category",
    "country",
    "subscriber_count",
    "price",
    "views_p50",
    "efficiency",
];

pub fn candidates_to_csv(candidates: &[Candidate]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(HEADER)?;
    for candidate in candidates {
        writer.write_record([
            candidate.id().unwrap_or_default().to_string(),
            candidate.text("title").unwrap_or_default(),
            candidate.text("category").unwrap_or_default(),
            candidate.text("country").unwrap_or_default(),
            candidate
                .number("subscriber_count")
                .map(|v| format!("{v:.0}"))
                .unwrap_or_default(),
            candidate
                .price()
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default(),
            candidate
                .reach_point()
                .map(|v| format!("{v:.0}"))
                .unwrap_or_default(),
            candidate
                .efficiency()
                .map(|v| format!("{v:.4}"))
                .unwrap_or_default(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
