//! Command-line argument parsing

use clap::Parser;

#[derive(Parser)]
#[command(name = "prel-packer")]
#[command(about = "Packs a properties file and the container images it references into a tgz archive")]
#[command(version, author)]
pub struct Args {
    /// Properties file location
    #[arg(
        long = "properties",
        short = 'p',
        help = "Path or URL of the properties file, or '-' to read standard input"
    )]
    pub properties: String,

    /// Destination archive path
    #[arg(
        long = "output",
        short = 'o',
        help = "Path of the tgz archive to create"
    )]
    pub output: String,

    /// Timeout in seconds for network operations
    #[arg(
        long = "timeout",
        short = 't',
        default_value = "300",
        help = "Timeout for fetch and registry operations in seconds"
    )]
    pub timeout: u64,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    /// Quiet output
    #[arg(long = "quiet", short = 'q', help = "Only print warnings and errors")]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.properties.is_empty() {
            return Err("Properties location must not be empty".to_string());
        }

        if self.output.is_empty() {
            return Err("Output archive path must not be empty".to_string());
        }

        if self.timeout == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.verbose && self.quiet {
            return Err("--verbose and --quiet are mutually exclusive".to_string());
        }

        Ok(())
    }

    /// Print usage examples
    pub fn print_examples() {
        println!("Examples:");
        println!("  # Pack a local properties file");
        println!("  prel-packer -p app.properties -o app.tgz");
        println!();
        println!("  # Pack a properties file fetched over HTTP");
        println!("  prel-packer -p https://config.example.com/app.properties -o app.tgz");
        println!();
        println!("  # Read the properties from standard input");
        println!("  cat app.properties | prel-packer -p - -o app.tgz");
    }
}
