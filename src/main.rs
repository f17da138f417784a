fn main() {
    if let Err(err) = tubemap_renderer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
