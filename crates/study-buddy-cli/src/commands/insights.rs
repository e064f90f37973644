use study_buddy_core::{compute_weekly_insights, Database};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let insights = compute_weekly_insights(&db);
    println!("{}", serde_json::to_string_pretty(&insights)?);
    Ok(())
}
