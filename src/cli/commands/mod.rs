//! CLI command implementations.

pub mod serve;
pub mod volume;

use anyhow::Result;

use crate::cli::{CliContext, Commands};

/// Run one parsed command.
pub fn dispatch(ctx: &CliContext, command: Commands) -> Result<()> {
    match command {
        Commands::Ls => volume::ls(ctx),
        Commands::Create(args) => volume::create(ctx, args),
        Commands::Edit(args) => volume::edit(ctx, args),
        Commands::Info(args) => volume::info(ctx, args),
        Commands::Rm(args) => volume::rm(ctx, args),
        Commands::Render(args) => volume::render(ctx, args),
        Commands::Generate(args) => volume::generate(ctx, args),
        Commands::Serve(args) => serve::execute(ctx, args),
    }
}
