//! Wires the CLI arguments to the packing pipeline

use crate::cli::args::Args;
use crate::error::{PackerError, Result};
use crate::materialize::RegistryMaterializer;
use crate::output::OutputManager;
use crate::packer::Packer;
use crate::source::{PropsSource, UrlFetcher};
use std::path::Path;
use std::time::Instant;

pub struct Runner {
    args: Args,
    output: OutputManager,
}

impl Runner {
    pub fn new(args: Args) -> Result<Self> {
        let output = if args.quiet {
            OutputManager::new_quiet()
        } else {
            OutputManager::new(args.verbose)
        };

        Ok(Self { args, output })
    }

    pub async fn run(&self) -> Result<()> {
        let start_time = Instant::now();

        self.output.section("Properties Packer");

        self.args
            .validate()
            .map_err(PackerError::Input)?;

        let source = PropsSource::from_arg(&self.args.properties);
        match &source {
            PropsSource::Stdin => self.output.verbose("Reading properties from standard input"),
            PropsSource::Located(location) => {
                self.output.verbose(&format!("Properties location: {}", location))
            }
        }

        let fetcher = UrlFetcher::new(self.args.timeout)?;
        let materializer = RegistryMaterializer::new(self.args.timeout, self.output.clone())?;
        let packer = Packer::new(Box::new(fetcher), Box::new(materializer), self.output.clone());

        packer.pack(&source, Path::new(&self.args.output)).await?;

        self.output.success(&format!(
            "Archive {} created in {}",
            self.args.output,
            self.output.format_duration(start_time.elapsed())
        ));

        Ok(())
    }
}
