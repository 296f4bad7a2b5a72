use eek::{Definition, Evaluator, ExecVar};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/simple_operation.json".to_string());
    let definition = Definition::load(&path)?;

    let mut evaluator = Evaluator::from_definition(&definition);
    evaluator.build()?;

    let value = evaluator.evaluate(ExecVar::new())?;
    println!("{} returned: {value}", evaluator.name());

    Ok(())
}
