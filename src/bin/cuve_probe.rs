use clap::Parser;
use cuve_lib::probe::{run_probe, ProbeArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run_probe(ProbeArgs::parse()).await
}
