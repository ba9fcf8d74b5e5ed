use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use lungmask_bids::config::{Args, RunConfig};
use lungmask_bids::runner::{self, RunContext};
use utils::{loader, logging};

fn main() -> Result<()> {
    let args = Args::parse();
    let config = RunConfig::from(args.clone());

    // 日志文件位于输出根目录下, 需先于 `RunContext` 创建目录.
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("cannot create output directory {}", config.output_dir.display())
    })?;
    logging::init(config.log_path())?;
    info!("Parsed Arguments: {args:?}");

    let inputs = loader::read_input_list(&config.input_list)
        .with_context(|| format!("cannot read input list {}", config.input_list.display()))?;
    let segmenter = config.segmenter();
    let mut ctx = RunContext::open(config)?;

    let summary = runner::run(&mut ctx, &segmenter, inputs);
    summary.log();

    info!("Log file saved to: {}", ctx.config().log_path().display());
    if let Some(path) = ctx.results_path() {
        info!("Emphysema results CSV saved to: {}", path.display());
    }
    Ok(())
}
