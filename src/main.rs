use std::path::PathBuf;

fn main() {
    let settings_path = std::env::var_os("BUSTRACK_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("settings.json"));
    let mut queries = std::env::args().skip(1).collect::<Vec<_>>();
    if queries.is_empty() {
        queries = vec!["101".to_string(), "102".to_string()];
    }

    if let Err(error) = bustrack_lib::run(settings_path, queries) {
        eprintln!("{error}");
        std::process::exit(1);
    }
}
