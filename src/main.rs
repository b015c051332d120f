mod config;
mod data;
mod model;
mod output;

use self::config::{Config, LoadError};
use self::data::DataError;
use self::model::{MarketData, ModelError, Simulation};
use self::output::{OutputError, Recorder};
use pbr::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::process;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Error, Debug)]
enum RunError {
    #[error(transparent)]
    Config(#[from] LoadError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("run {run} failed: {source}")]
    Model {
        run: usize,
        source: ModelError,
    },

    #[error(transparent)]
    Output(#[from] OutputError),
}

// The tables every run starts from. Synthetic
// markets are drawn from the base seed so all
// runs share them.
fn market_data(conf: &Config) -> Result<MarketData, DataError> {
    match &conf.data_dir {
        Some(dir) => data::load(dir),
        None => {
            let mut rng: StdRng = SeedableRng::seed_from_u64(conf.seed);
            Ok(data::synthetic(&conf.synthetic, &mut rng))
        }
    }
}

fn run_once(run: usize, conf: &Config, mut data: MarketData, rng: &mut StdRng, recorder: &mut Recorder) -> Result<(), RunError> {
    data::generate_profits(&mut data, conf.profit_min, conf.profit_max, rng);

    let failed = |e| RunError::Model { run: run, source: e };
    let mut sim = Simulation::new(&conf.simulation, data).map_err(failed)?;
    let mut pb = ProgressBar::new(conf.steps as u64);
    for _ in 0..conf.steps {
        sim.step(rng).map_err(failed)?;
        recorder.record(&sim, conf.debug)?;
        pb.inc();
    }
    pb.finish();

    let provider = &sim.market.provider;
    info!(
        active = sim.market.n_active(),
        likes = sim.market.ledger.likes,
        dislikes = sim.market.ledger.dislikes,
        profit_last_step = provider.total_profit,
        "run finished");
    Ok(())
}

fn run() -> Result<(), RunError> {
    let conf = config::load_config()?;
    let data = market_data(&conf)?;

    let mut recorder = Recorder::new();
    for run in 0..conf.runs {
        let seed = conf.seed.wrapping_add(run as u64);
        info!(run = run, seed = seed, "starting run");
        let mut rng: StdRng = SeedableRng::seed_from_u64(seed);

        recorder.start_run(seed);
        run_once(run, &conf, data.clone(), &mut rng, &mut recorder)?;
        recorder.finish_run();
    }
    recorder.save(&conf)?;
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}
