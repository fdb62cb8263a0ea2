use prel_packer::cli::{Args, Runner};
use prel_packer::output::OutputManager;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    let runner = match Runner::new(args) {
        Ok(runner) => runner,
        Err(e) => {
            OutputManager::new(false).error(&format!("{}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = runner.run().await {
        OutputManager::new(false).error(&format!("{}", e));
        std::process::exit(1);
    }
}
