use crate::error::Result;
use readuct::core::calculators::CalculatorFactory;
use readuct::engine::tasks::TaskKind;

pub fn run() -> Result<()> {
    println!("Task types:");
    for kind in [TaskKind::SinglePoint, TaskKind::GeometryOptimization] {
        println!("  {}", kind);
    }

    println!("Method families:");
    for family in CalculatorFactory::default().available() {
        println!("  {}", family);
    }
    Ok(())
}
