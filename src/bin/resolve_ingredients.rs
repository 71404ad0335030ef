//! Resolve an ingredient list from the command line
//!
//! Usage: resolve_ingredients [--json] "trứng gà=2 quả" "muối=1 nhúm" "hành lá"

use nutriresolve::config::Config;
use nutriresolve::nutrition::{IngredientQuantity, NutritionEngine};
use nutriresolve::tools::nutrition::calculate_nutrition;

/// `name=quantity`, or a bare name with no quantity
fn parse_arg(arg: &str) -> IngredientQuantity {
    match arg.split_once('=') {
        Some((name, quantity)) => IngredientQuantity {
            name: name.trim().to_string(),
            quantity: Some(quantity.trim().to_string()),
        },
        None => IngredientQuantity {
            name: arg.trim().to_string(),
            quantity: None,
        },
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nutriresolve=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let ingredients: Vec<IngredientQuantity> = args
        .iter()
        .filter(|a| a.as_str() != "--json")
        .map(|a| parse_arg(a))
        .collect();

    if ingredients.is_empty() {
        eprintln!("Usage: resolve_ingredients [--json] <name=quantity>...");
        std::process::exit(2);
    }

    let config = Config::from_env()?;
    let engine = NutritionEngine::load(&config.reference_path, config.settings)?;
    let result = calculate_nutrition(&engine, &ingredients);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Reference: {} ({} records)", config.reference_path.display(), engine.reference().len());
    for item in &result.ingredients {
        let matched = item.matched_key.as_deref().unwrap_or("(no match)");
        println!(
            "\n{} [{}]",
            item.name,
            item.quantity.as_deref().unwrap_or("-")
        );
        println!("  Match: {} (score {:.1})", matched, item.match_score);
        println!(
            "  Quantity: {} {} -> x{:.3}",
            item.parsed.amount, item.parsed.unit, item.mass_fraction
        );
        println!(
            "  {:.1} kcal, {:.1} g protein, {:.1} g fat, {:.1} g carbs",
            item.nutrition.calories, item.nutrition.protein, item.nutrition.fat, item.nutrition.carbs
        );
    }

    let raw = &result.raw_total;
    let calibrated = &result.calibrated_total;
    println!("\nRaw total: {:.2} kcal, {:.2} g protein, {:.2} g fat, {:.2} g carbs",
        raw.calories, raw.protein, raw.fat, raw.carbs);
    println!("Calibrated: {:.2} kcal, {:.2} g protein, {:.2} g fat, {:.2} g carbs",
        calibrated.calories, calibrated.protein, calibrated.fat, calibrated.carbs);

    if !result.unmatched.is_empty() {
        println!("Unmatched: {}", result.unmatched.join(", "));
    }

    Ok(())
}
