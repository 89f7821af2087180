//! # tb-runner
//!
//! Main entry point for the trade bridge.
//!
//! Loads a JSON configuration file, maps the FIFO registers (or builds the
//! simulated FIFO), opens the telemetry socket, starts the timer tick source
//! and hands control to the polling loop on its own thread.
//!
//! # Usage
//!
//! ```bash
//! tb-runner config.json --log-level info
//! tb-runner config.json --simulate
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tb_core::config::AppConfig;
use tb_core::regs::{MmioRegion, REGISTER_SPAN, RegisterBank};
use tb_core::sim::SimulatedFifo;
use tb_core::udp::TelemetryForwarder;
use tb_fifo::reader::FifoReader;
use tb_fifo::scheduler::{Scheduler, SchedulerOptions};
use tb_fifo::stack::HostedStack;
use tb_fifo::timer::{TimerFlags, spawn_tick_source};
use tokio::net::UdpSocket;
use tracing::{error, info};

/// FIFO-to-UDP trade bridge.
#[derive(Parser)]
#[command(name = "tb-runner", about = "FIFO-to-UDP trade bridge")]
struct Cli {
    /// Configuration file path (JSON).
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output (overrides `log_path`).
    #[arg(long)]
    log_dir: Option<String>,

    /// Use the in-memory FIFO model fed with synthetic trades.
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let config = tb_core::config::load_config(&cli.config)?;

    // 2. Initialize logging
    let log_dir = cli.log_dir.clone().or_else(|| config.log_path.clone());
    let _log_guard = tb_core::logging::init_logging(&cli.log_level, log_dir.as_deref(), &config.module_name);

    info!(
        "tb-runner starting: config={}, log_level={}, simulate={}",
        cli.config.display(),
        cli.log_level,
        cli.simulate,
    );

    // 3. Open the telemetry socket
    let endpoint = config.forward.endpoint()?;
    let forwarder = TelemetryForwarder::connect(endpoint, config.forward.bind_addr()?).await?;

    // 4. Start the timer interrupt stand-in
    let flags = Arc::new(TimerFlags::new());
    let _ticks = spawn_tick_source(flags.clone(), config.timers.fast_interval(), config.timers.slow_interval());

    // 5. Bring up the FIFO and enter the loop
    let loop_thread = if cli.simulate {
        let fifo = Arc::new(SimulatedFifo::new());
        let _feed = tb_fifo::feed::spawn_synthetic_feed(fifo.clone(), config.timers.fast_interval());
        start_loop(fifo, forwarder, flags, &config)?
    } else {
        let regs = MmioRegion::map(&config.fifo.mem_device, config.fifo.base_addr, REGISTER_SPAN)?;
        info!("FIFO registers mapped at {:#x} via {}", config.fifo.base_addr, config.fifo.mem_device);
        start_loop(regs, forwarder, flags, &config)?
    };

    // 6. Wait for shutdown signal; the loop itself never returns
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    if loop_thread.is_finished() {
        error!("polling loop thread exited unexpectedly");
    }
    Ok(())
}

/// Build the scheduler and run it on a dedicated, optionally pinned thread.
fn start_loop<R>(
    regs: R,
    forwarder: TelemetryForwarder<UdpSocket>,
    flags: Arc<TimerFlags>,
    config: &AppConfig,
) -> Result<std::thread::JoinHandle<()>>
where
    R: RegisterBank + Send + 'static,
{
    let reader = FifoReader::new(regs, config.fifo.on_invalid_length);
    if config.fifo.reset_on_start {
        reader.reset();
        info!("receive FIFO reset");
    }

    let scheduler = Scheduler::new(reader, forwarder, HostedStack::new(), flags, SchedulerOptions::from(&config.loop_cfg));
    let cpu_core = config.loop_cfg.cpu_affinity;

    let handle = std::thread::Builder::new().name("tb-loop".into()).spawn(move || {
        tb_core::cpu_affinity::maybe_bind(cpu_core);
        scheduler.run();
    })?;
    Ok(handle)
}
