//! Markdown catalogues of the component registries

use crate::Cli;

fn print_table(title: &str, rows: impl Iterator<Item = (&'static str, &'static str)>) {
    println!("## {title}\n");
    println!("| Type | Description |");
    println!("|------|-------------|");
    for (name, description) in rows {
        let description: String = description.split_whitespace().collect::<Vec<_>>().join(" ");
        println!("| `{name}` | {description} |");
    }
    println!();
}

/// Print the requested catalogues as markdown tables
pub(crate) fn print(cli: &Cli) {
    if cli.list_inputs {
        print_table(
            "Inputs",
            weir_input::TYPE_SPECS
                .iter()
                .map(|spec| (spec.name, spec.description)),
        );
    }
    if cli.list_outputs {
        print_table(
            "Outputs",
            weir_output::TYPE_SPECS
                .iter()
                .map(|spec| (spec.name, spec.description)),
        );
    }
    if cli.list_processors {
        print_table(
            "Processors",
            weir_processor::TYPE_SPECS
                .iter()
                .map(|spec| (spec.name, spec.description)),
        );
    }
    if cli.list_conditions {
        print_table(
            "Conditions",
            weir_condition::TYPE_SPECS
                .iter()
                .map(|spec| (spec.name, spec.description)),
        );
    }
    if cli.list_buffers {
        print_table(
            "Buffers",
            weir_buffer::TYPE_SPECS
                .iter()
                .map(|spec| (spec.name, spec.description)),
        );
    }
    if cli.list_caches {
        print_table(
            "Caches",
            weir_manager::CACHE_SPECS
                .iter()
                .map(|spec| (spec.name, spec.description)),
        );
    }
    if cli.list_rate_limits {
        print_table(
            "Rate Limits",
            weir_manager::RATE_LIMIT_SPECS
                .iter()
                .map(|spec| (spec.name, spec.description)),
        );
    }
}
