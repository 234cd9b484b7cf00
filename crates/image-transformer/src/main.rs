//! Driver (§4.9 C9): parses arguments, picks a kernel and a transport,
//! times the distributed parallel pass, and — on rank 0, unless disabled —
//! reruns the serial oracle and reports whether the two agree.

use std::path::PathBuf;
use std::sync::Once;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use core_config::{ConfigOverrides, TransportPath};
use core_transport::{CollectiveIoTransport, ScatterGatherTransport, StripTransport};

/// CLI arguments, matching the original's `<threads> <operation> <input>
/// <output>` usage line plus the ambient overrides (§1.1, §6).
#[derive(Parser, Debug)]
#[command(
    name = "image-transformer",
    version,
    about = "Distributed, thread-parallel 2D image convolution"
)]
struct Args {
    /// Number of OpenMP-style worker threads per rank.
    number_of_threads: usize,
    /// Named kernel operation (see `core-ops` for the full list).
    operation: String,
    /// Input BMP path.
    input: PathBuf,
    /// Output BMP path.
    output: PathBuf,
    /// Optional path to `image_transformer.toml`.
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// Skip the rank-0 serial-oracle comparison after the parallel pass.
    #[arg(long = "no-compare")]
    no_compare: bool,
}

fn configure_logging(log_dir: &std::path::Path, rank: i32) -> Result<WorkerGuard> {
    let file_name = format!("stencil-rank{rank}.log");
    let log_path = log_dir.join(&file_name);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init();
    Ok(guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "driver.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// Prints an error on rank 0 then aborts the whole job (§7: every rank
/// must see the same fatal outcome, mirroring the original's
/// `MPI_Abort(MPI_COMM_WORLD, EXIT_FAILURE)` calls).
fn abort_all(world: &SimpleCommunicator, message: &str) -> ! {
    if world.rank() == 0 {
        eprintln!("Error: {message}");
    }
    tracing::error!(target: "driver", message, "aborting job");
    world.abort(1);
    unreachable!("communicator abort does not return")
}

fn main() -> Result<()> {
    let universe = mpi::initialize_with_threading(mpi::Threading::Funneled)
        .context("failed to initialize MPI with funneled threading")?
        .0;
    let world = universe.world();
    let rank = world.rank();
    let size = world.size();

    let args = Args::parse();

    if args.number_of_threads < 1 {
        abort_all(&world, "the number of threads must be at least 1");
    }

    let kernel = match core_ops::lookup(&args.operation) {
        Ok(kernel) => kernel,
        Err(_) => abort_all(&world, "unknown operation"),
    };

    let overrides = ConfigOverrides {
        path: None,
        compare_with_oracle: if args.no_compare { Some(false) } else { None },
    };
    let config = match core_config::load(args.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(err) => abort_all(&world, &err.to_string()),
    };

    let _log_guard = configure_logging(&config.log_dir, rank)?;
    install_panic_hook();
    info!(target: "driver", rank, size, operation = %args.operation, threads = args.number_of_threads, "startup");

    let transport: Box<dyn StripTransport> = match config.path {
        TransportPath::CollectiveIo => Box::new(CollectiveIoTransport),
        TransportPath::ScatterGather => Box::new(ScatterGatherTransport),
    };

    if rank == 0 {
        println!("\nLoading image from file {}", args.input.display());
    }

    let (width, height) = match transport.read_dimensions(&world, &args.input) {
        Ok(dims) => dims,
        Err(err) => abort_all(&world, &err.to_string()),
    };

    let plan = core_partition::partition(height, size as usize, width);
    if let Err(err) = core_partition::check_feasible(&plan, kernel.padding()) {
        abort_all(&world, &err.to_string());
    }

    let local_height = plan.local_height(rank as usize);
    let (mut padded_strip, mut output_strip) =
        core_strip::allocate_strip(local_height, width, kernel.padding());

    if rank == 0 {
        println!("\nStarted parallel work ...");
    }
    let parallel_start = Instant::now();

    if let Err(err) = transport.load_strip(&world, &args.input, &plan, &mut padded_strip) {
        abort_all(&world, &err.to_string());
    }

    core_halo::exchange_halos(&world, &mut padded_strip);
    core_convolve::convolve(&padded_strip, &mut output_strip, &kernel, args.number_of_threads);

    if let Err(err) = transport.store_strip(&world, &args.output, &plan, width, height, &output_strip) {
        abort_all(&world, &err.to_string());
    }

    let parallel_elapsed = parallel_start.elapsed();
    if rank == 0 {
        println!("\nEnded parallel work ...");
        println!("\nModified image saved in file {}", args.output.display());
        println!(
            "\nParallel version elapsed time: {:.6} seconds",
            parallel_elapsed.as_secs_f64()
        );
    }

    if rank == 0 && config.compare_with_oracle {
        println!("\nLoading image from file {}", args.input.display());
        let original = match core_bmp::read_file(&args.input) {
            Ok(image) => image,
            Err(err) => abort_all(&world, &err.to_string()),
        };

        println!("\nStart serial work ...");
        let serial_start = Instant::now();
        let oracle = core_convolve::serial_convolve(&original, &kernel);
        let serial_elapsed = serial_start.elapsed();
        println!("\nEnded serial work ...");

        let parallel_result = match core_bmp::read_file(&args.output) {
            Ok(image) => image,
            Err(err) => abort_all(&world, &err.to_string()),
        };

        if core_convolve::equal_results(&oracle, &parallel_result) {
            println!("\nThe parallel and serial results match.");
        } else {
            println!("\nThe parallel and serial results DIFFER.");
        }

        println!(
            "\nSerial version elapsed time: {:.6} seconds",
            serial_elapsed.as_secs_f64()
        );
        if parallel_elapsed.as_secs_f64() > 0.0 {
            println!(
                "Speedup: {:.3}x",
                serial_elapsed.as_secs_f64() / parallel_elapsed.as_secs_f64()
            );
        }
    }

    Ok(())
}
