mod check;
mod convert;
mod utils;

use crate::cli::{Cli, Commands, GlobalOptions};
use sqip_triangle::TriangleResult;

/// The main function to run the command based on CLI input.
pub async fn run(cli: Cli) -> TriangleResult<()> {
    let Cli { global, command } = cli;
    dispatch(&global, command).await
}

/// Dispatch the command to the appropriate handler.
async fn dispatch(global: &GlobalOptions, command: Commands) -> TriangleResult<()> {
    match command {
        Commands::Check => check::run(global).await,
        Commands::Convert(cmd) => convert::run(global, cmd).await,
    }
}
