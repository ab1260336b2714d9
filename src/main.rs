use hnews::query::Preset;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hnews=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if handle_cli_flags() {
        return;
    }

    if let Err(err) = hnews::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    let mut print_mode = false;
    let mut preset = Preset::Top;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("hnews {}", hnews::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "hnews — Browse Hacker News top stories from the terminal.\n\n  --print, -p          Print stories (title, link, points) instead of the interactive view\n  --new                With --print, list new stories instead of the front page\n  --version, -V        Show version and exit\n  --help,    -h        Show this help message"
                );
                saw_flag = true;
            }
            "--print" | "-p" => print_mode = true,
            "--new" => preset = Preset::New,
            _ => {}
        }
    }

    if saw_flag {
        return true;
    }

    if print_mode {
        if let Err(err) = hnews::run_print(preset) {
            eprintln!("error: {err:?}");
            std::process::exit(1);
        }
        return true;
    }

    false
}
