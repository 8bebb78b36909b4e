use crate::cli::args::InitArgs;
use crate::exit_codes;
use chatprobe_core::config::write_sample_config;

pub fn run(args: InitArgs) -> anyhow::Result<i32> {
    if args.config.exists() && !args.force {
        println!("   Skipped {} (exists, use --force to overwrite)", args.config.display());
        return Ok(exit_codes::EXIT_SUCCESS);
    }
    write_sample_config(&args.config)?;
    println!("   Created {}", args.config.display());
    println!("\nNext: chatprobe run --config {} --dataset questions.yaml", args.config.display());
    Ok(exit_codes::EXIT_SUCCESS)
}
