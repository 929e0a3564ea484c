use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::desired::StreamKind;

#[derive(Debug, Parser)]
#[command(
    name = "ams-ctl",
    version,
    about = "Provision, inspect and tear down broadcasts on a media server"
)]
pub struct Args {
    /// TOML file with settings and server profiles (default: ./ams.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Server profile to use
    #[arg(short, long, global = true, conflicts_with = "server")]
    pub profile: Option<String>,

    /// Ad-hoc server as host[:port] instead of a profile
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// IP camera pulled by address
    Ipcam,
    /// RTSP stream source
    Source,
}

impl From<KindArg> for StreamKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Ipcam => StreamKind::IpCamera,
            KindArg::Source => StreamKind::StreamSource,
        }
    }
}

#[derive(Debug, ClapArgs)]
pub struct RangeArgs {
    /// Zone letter(s), e.g. A
    #[arg(long)]
    pub zone: String,
    /// Site subnet: 11, 12, 13, 14 or 15
    #[arg(long)]
    pub subnet: u8,
    /// First camera id (inclusive)
    #[arg(long)]
    pub start: u32,
    /// Last camera id (inclusive)
    #[arg(long)]
    pub end: u32,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub password: String,
    /// Backup feeds: names get a -1 suffix
    #[arg(long)]
    pub backup: bool,
    /// Where to write the created streams
    #[arg(long, default_value = "created_streams.csv")]
    pub output: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create streams from the profile's CSV, skipping ones that exist
    Create {
        #[arg(long = "type", value_enum, default_value_t = KindArg::Ipcam)]
        kind: KindArg,
        /// CSV file (default: the profile's streams_csv)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Create cameras for a numeric id range on one subnet
    CreateRange(RangeArgs),

    /// Start every stream on the server
    StartAll,

    /// Stop every stream on the server
    StopAll,

    /// Delete streams (all, or those whose name starts with a prefix)
    DeleteAll {
        #[arg(long)]
        prefix: Option<String>,
        /// Actually delete; without it the targets are only listed
        #[arg(long)]
        yes: bool,
    },

    /// Server summary and stream table
    Query,

    /// Details for one stream
    QueryStream { stream_id: String },

    /// Write the primary streams of a zone to CSV
    Export {
        #[arg(long)]
        zone: String,
        #[arg(long, default_value = "stream_id_sheet.csv")]
        output: PathBuf,
    },

    /// List the RTSP URL of every stream
    RtspUrls,

    /// List configured profiles
    Profiles,

    /// Print the stream ID derived from a name
    DeriveId { name: String },
}
