fn main() {
    if let Err(error) = hotsearch_core::runtime::run() {
        eprintln!("[hotsearch] runtime failed: {error}");
        std::process::exit(1);
    }
}
