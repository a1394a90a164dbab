// ABOUTME: Entry point for rvs-setup
// ABOUTME: Authorizes this machine to reach a remote development host over SSH

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "rvs-setup",
    about = "Set up passwordless SSH access to a remote development host"
)]
struct Cli {
    /// Git user name written into the SSH config fragments
    #[arg(long = "git_user")]
    git_user: String,

    /// User name on the remote host
    #[arg(long = "remote_user")]
    remote_user: String,

    /// Remote host name or IP address
    #[arg(long = "remote_host")]
    remote_host: String,
}

fn main() -> Result<()> {
    rvs_log::init();

    let cli = Cli::parse();

    rvs_setup::run(&cli.git_user, &cli.remote_user, &cli.remote_host)
}
