//! `baton tools`: list the registered tool definitions.

use baton_tools::default_registry;

pub async fn run() -> anyhow::Result<()> {
    let registry = default_registry();
    let definitions = registry.definitions();

    println!("🔧 Registered tools ({})", definitions.len());
    println!("===================");

    for definition in &definitions {
        println!();
        println!("  {}: {}", definition.name, definition.description);
        for parameter in &definition.parameters {
            let requirement = if parameter.required {
                "required"
            } else {
                "optional"
            };
            println!(
                "      {} ({}, {}): {}",
                parameter.name, parameter.param_type, requirement, parameter.description
            );
        }
        println!("      timeout: {}ms", definition.timeout_ms);
    }

    Ok(())
}
