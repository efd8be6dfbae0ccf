fn main() {
    env_logger::init();
    if let Err(err) = uml_edge_router::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
