//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "voletc")]
#[command(about = "voletc - versioned configuration volumes", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command; they override the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Backend URI (consul://host:port or memory://)
    #[arg(short = 'H', long = "backend", global = true)]
    pub backend: Option<String>,

    /// Data prefix every volume is stored under
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// AES key (16, 24 or 32 bytes) for encryption at rest
    #[arg(short = 'e', long, global = true, env = "VOLETC_ENCRYPTION_KEY", hide_env_values = true)]
    pub encryption_key: Option<String>,

    /// Config file (defaults to ./voletc.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List volumes
    #[command(alias = "list")]
    Ls,

    /// Create a volume from key=value pairs and template:<file>=<body|path>
    Create(CreateArgs),

    /// Change keys or templates of an existing volume
    Edit(EditArgs),

    /// Show a volume's keys and templates
    Info(NameArgs),

    /// Delete a volume
    Rm(RmArgs),

    /// Print rendered templates
    Render(RenderArgs),

    /// Render a volume into a directory
    Generate(GenerateArgs),

    /// Run the Docker volume plugin service
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Volume name: <name>-<version>-<env>
    pub name: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Volume name: <name>-<version>-<env>
    pub name: String,

    /// key=value or template:<file>=<content|path>
    pub pairs: Vec<String>,

    /// Show the result without writing it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Volume name: <name>-<version>-<env>
    pub name: String,

    /// key=value or template:<file>=<content|path>
    #[arg(required = true)]
    pub pairs: Vec<String>,

    /// Show the result without writing it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Volume name: <name>-<version>-<env>
    pub name: String,

    /// Do not ask for confirmation
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Also delete the shared templates once no other environment uses them
    #[arg(long)]
    pub purge_templates: bool,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Volume name: <name>-<version>-<env>
    pub name: String,

    /// Extra key=value or template:<file>=<content|path> applied before rendering
    pub pairs: Vec<String>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Volume name: <name>-<version>-<env>
    pub name: String,

    /// Directory to write rendered files into
    pub dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides server.listen_addr)
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Base directory for mountpoints (overrides server.mount_base_dir)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}
