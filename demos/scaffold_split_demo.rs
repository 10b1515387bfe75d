use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    molsplit::example_apps::run_scaffold_split_demo(std::env::args().skip(1))
}
