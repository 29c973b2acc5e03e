use recon_core::{cli::run_cli, init};

#[tokio::main]
async fn main() {
    init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run_cli(&args).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
