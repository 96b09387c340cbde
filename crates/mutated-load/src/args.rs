#![doc(hidden)]

use clap::Parser;

/// Arguments for the bulk key/value loader CLI
#[derive(Parser, Debug)]
#[command(version, about = "Populates a memcached server with an initial key/value population")]
pub struct Args {
    #[clap(help = "Target server address, e.g. 127.0.0.1:11211")]
    pub addr: String,

    #[clap(short = 'k', value_name = "N", help = "Number of keys to load", default_value_t = 10_000)]
    pub keys: u64,

    #[clap(short = 'v', value_name = "N", help = "Size of the values in bytes", default_value_t = 4 * 1024)]
    pub valn: u64,

    #[clap(short = 'n', value_name = "N", help = "Starting key sequence number", default_value_t = 1)]
    pub start: u64,

    #[clap(short = 'b', value_name = "N", help = "In-flight batch size", default_value_t = 100)]
    pub batch: u64,

    #[clap(short = 'e', value_name = "N", help = "Notify window for quiet SETs", default_value_t = 25)]
    pub notify: u64,

    #[clap(short = 'q', long, help = "Only log errors")]
    pub quiet: bool,
}
