//! Server configuration from command line flags and `GRPC_MOCK_*` env vars.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_PORT: u16 = 50051;

#[derive(Debug, Clone, Parser)]
#[command(name = "grpc-mock", about = "Answers gRPC calls from per-session mock files")]
pub struct Config {
    /// Root directory holding one sub-directory per session.
    #[arg(long, env = "GRPC_MOCK_SESSIONS_DIR", default_value = "./sessions")]
    pub sessions_dir: PathBuf,

    /// Directory of .proto files [default: <sessions-dir>/protos]
    #[arg(long, env = "GRPC_MOCK_PROTO_DIR")]
    pub proto_dir: Option<PathBuf>,

    #[arg(long, env = "GRPC_MOCK_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "GRPC_MOCK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Session to start with. Without one every call answers UNAVAILABLE.
    #[arg(long, env = "GRPC_MOCK_SESSION")]
    pub session: Option<String>,
}

impl Config {
    pub fn proto_dir(&self) -> PathBuf {
        self.proto_dir
            .clone()
            .unwrap_or_else(|| self.sessions_dir.join("protos"))
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
