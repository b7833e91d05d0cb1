fn main() {
    if let Err(e) = randshear::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
