fn main() {
    if let Err(err) = murmur_tui::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
