use std::path::PathBuf;

use clap::Parser;
use glustervol::options::{self, DriverOptions, MountOptions, RestOptions};
use glustervol_shared::constants::{defaults, envs};

/// GlusterFS volume plugin.
///
/// Reads plugin requests as JSON lines on stdin and answers on stdout, one
/// `{"id", "endpoint", "body"}` object per line. Docker does not speak this
/// framing: an external adapter must relay the plugin socket to this process.
#[derive(Parser, Debug)]
#[command(
    name = "glustervol",
    version,
    about = "GlusterFS volume plugin over JSON lines on stdio (needs an external adapter for the plugin socket)"
)]
pub struct Cli {
    /// Colon-separated list of GlusterFS servers (e.g. 10.0.0.1:10.0.0.2)
    #[arg(long, env = envs::SERVERS)]
    pub servers: String,

    /// Directory under which volumes are mounted
    #[arg(long, env = envs::ROOT, default_value_os_t = options::default_root())]
    pub root: PathBuf,

    /// URL of the glusterfs-rest management API; local-only mode when unset
    #[arg(long, env = envs::REST)]
    pub rest: Option<String>,

    /// Base directory where volume bricks are created on the cluster
    #[arg(long = "gfs-base", env = envs::GFS_BASE, default_value = defaults::GFS_BASE)]
    pub gfs_base: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn to_options(&self) -> anyhow::Result<DriverOptions> {
        let servers = options::parse_server_list(&self.servers)?;

        let rest = self
            .rest
            .as_deref()
            .filter(|address| !address.is_empty())
            .map(|address| RestOptions {
                address: address.to_string(),
                base: self.gfs_base.clone(),
            });

        let options = DriverOptions {
            root: self.root.clone(),
            servers,
            rest,
            mount: MountOptions::default(),
        };
        options.validate()?;
        Ok(options)
    }
}
