use super::args::{Cli, Command};

pub mod init;
pub mod run;
pub mod score;
pub mod validate;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Score(args) => score::run(args),
        Command::Validate(args) => validate::run(args),
        Command::Init(args) => init::run(args),
    }
}
