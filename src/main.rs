//! This is the main entry point for flower.

use flower::cli;

fn main() {
    if let Err(e) = cli::parse(None) {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
