use inventory_dashboard::CliError;

fn is_robot_mode_args() -> bool {
    std::env::args().any(|arg| arg == "--json" || arg == "--robot")
}

fn report(err: &CliError) {
    if is_robot_mode_args() {
        eprintln!("{}", err.to_json());
    } else {
        let message = err.message.trim_end();
        if message.starts_with("error:") {
            eprintln!("{message}");
        } else {
            eprintln!("error: {message}");
        }
        if let Some(hint) = &err.hint {
            eprintln!("hint: {hint}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Load .env early; ignore if missing.
    dotenvy::dotenv().ok();

    let raw_args: Vec<String> = std::env::args().collect();
    let parsed = match inventory_dashboard::parse_cli(raw_args) {
        Ok(parsed) => parsed,
        Err(err) => {
            report(&err);
            std::process::exit(err.code);
        }
    };

    if let Err(err) = inventory_dashboard::run_with_parsed(parsed) {
        report(&err);
        std::process::exit(err.code);
    }
    Ok(())
}
