#![doc(hidden)]

use clap::{Parser, ValueEnum};

/// Arguments for the load generator CLI
#[derive(Parser, Debug)]
#[command(version, about = "Open-loop latency measurement client")]
pub struct Args {
    #[clap(help = "Target server address, e.g. 127.0.0.1:11211")]
    pub addr: String,

    #[clap(help = "Request generator", value_enum)]
    pub generator: GeneratorKind,

    #[clap(help = "Mean request service time in microseconds")]
    pub service_us_mean: f64,

    #[clap(help = "Target request rate in requests per second")]
    pub req_per_s: f64,

    #[clap(short = 'r', help = "Machine-readable output (raw samples instead of a table)")]
    pub machine_readable: bool,

    #[clap(short = 'e', help = "Spin-wait the reactor instead of blocking on poll")]
    pub spin_wait: bool,

    #[clap(short = 'w', value_name = "N", help = "Warm-up duration in seconds", default_value_t = 5)]
    pub warmup_seconds: u64,

    #[clap(short = 'c', value_name = "N", help = "Cool-down duration in seconds", default_value_t = 5)]
    pub cooldown_seconds: u64,

    #[clap(short = 's', value_name = "N", help = "Measurement sample count [default: 10 * req_per_s]")]
    pub measurement_samples: Option<u64>,

    #[clap(short = 'l', value_name = "STR", help = "Label for machine-readable output")]
    pub label: Option<String>,

    #[clap(short = 'm', value_name = "MODE", help = "Connection mode", value_enum, default_value_t = ConnModeArg::RoundRobin)]
    pub conn_mode: ConnModeArg,

    #[clap(short = 'd', value_name = "DIST", help = "Service-time distribution (synthetic generator only)", value_enum, default_value_t = ServiceDistArg::Exponential)]
    pub service_dist: ServiceDistArg,

    #[clap(short = 'n', value_name = "N", help = "Connection pool size", default_value_t = 10)]
    pub connection_count: usize,

    #[clap(long, value_name = "N", help = "Number of keys in the memcache key pool", default_value_t = 10_000)]
    pub records: u64,

    #[clap(long, value_name = "RATIO", help = "Fraction of memcache requests that are SET", default_value_t = 0.1)]
    pub set_ratio: f64,

    #[clap(long, value_name = "BYTES", help = "Memcache value size in bytes", default_value_t = 128)]
    pub value_size: usize,

    #[clap(
        short = 'v',
        long,
        conflicts_with = "quiet",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity; specify multiple times for more detail"
    )]
    pub verbose: u8,

    #[clap(short = 'q', long, conflicts_with = "verbose", help = "Only log errors")]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Synthetic,
    Memcache,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnModeArg {
    PerRequest,
    RoundRobin,
    Random,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceDistArg {
    Fixed,
    Exponential,
    Lognorm,
}

impl Args {
    pub fn measurement_samples(&self) -> u64 {
        self.measurement_samples.unwrap_or_else(|| (10.0 * self.req_per_s).ceil() as u64)
    }

    pub fn conn_mode(&self) -> mutated_generators::ConnMode {
        match self.conn_mode {
            ConnModeArg::PerRequest => mutated_generators::ConnMode::PerRequest,
            ConnModeArg::RoundRobin => mutated_generators::ConnMode::RoundRobin,
            ConnModeArg::Random => mutated_generators::ConnMode::Random,
        }
    }

    pub fn service_dist(&self) -> mutated_generators::ServiceDist {
        match self.service_dist {
            ServiceDistArg::Fixed => mutated_generators::ServiceDist::Fixed,
            ServiceDistArg::Exponential => mutated_generators::ServiceDist::Exponential,
            ServiceDistArg::Lognorm => mutated_generators::ServiceDist::Lognormal,
        }
    }
}
