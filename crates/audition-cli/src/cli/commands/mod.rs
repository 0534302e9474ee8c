use super::args::{Cli, Command};
use crate::exit_codes;

pub mod init;
pub mod serve;
pub mod summary;
pub mod validate;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Serve(args) => serve::run(args).await,
        Command::Validate(args) => validate::run(args),
        Command::Init(args) => init::run(args),
        Command::Summary(args) => summary::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}
