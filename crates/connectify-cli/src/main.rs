mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{e:#}"); // full anyhow chain
        std::process::exit(1);
    }
}
