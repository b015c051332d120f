use std::fs;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::os::unix::fs::symlink;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;
use super::config::Config;
use super::model::Simulation;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("could not write {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },

    #[error("could not serialize snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> OutputError + '_ {
    move |e| OutputError::Io { path: path.to_path_buf(), source: e }
}

pub struct Recorder {
    runs: Vec<Value>,

    // Snapshots of the current run
    history: Vec<Value>,
    seed: u64,
}

impl Recorder {
    pub fn new() -> Recorder {
        Recorder {
            runs: Vec::new(),
            history: Vec::new(),
            seed: 0,
        }
    }

    pub fn start_run(&mut self, seed: u64) {
        self.seed = seed;
        self.history.clear();
    }

    pub fn record(&mut self, sim: &Simulation, debug: bool) -> Result<(), OutputError> {
        let snapshot = serde_json::to_value(sim.snapshot(debug))?;
        self.history.push(snapshot);
        Ok(())
    }

    pub fn finish_run(&mut self) {
        let history = mem::replace(&mut self.history, Vec::new());
        self.runs.push(json!({
            "seed": self.seed,
            "history": history,
        }));
    }

    pub fn results(&self, conf: &Config) -> Value {
        json!({
            "runs": self.runs,
            "meta": {
                "seed": conf.seed,
                "steps": conf.steps,
                "runs": conf.runs,
                "strategy": conf.simulation.recommendation_strategy,
                "simulation": conf.simulation,
            }
        })
    }

    pub fn save(&self, conf: &Config) -> Result<PathBuf, OutputError> {
        self.save_to(Path::new("runs"), conf)
    }

    // Writes to <root>/<timestamp>/ and
    // points <root>/latest at it
    pub fn save_to(&self, root: &Path, conf: &Config) -> Result<PathBuf, OutputError> {
        let now: DateTime<Utc> = Utc::now();
        let now_str = now.format("%Y.%m.%d.%H.%M.%S").to_string();
        let dir = root.join(&now_str);
        fs::create_dir_all(&dir).map_err(io_err(&dir))?;

        let fname = dir.join("output.json");
        let results = self.results(conf).to_string();
        fs::write(&fname, results).map_err(io_err(&fname))?;

        let latest_path = root.join("latest");
        if fs::symlink_metadata(&latest_path).is_ok() {
            fs::remove_file(&latest_path).map_err(io_err(&latest_path))?;
        }
        symlink(Path::new(&now_str), &latest_path).map_err(io_err(&latest_path))?;

        if conf.path.is_file() {
            let conf_path = dir.join("config.yaml");
            fs::copy(&conf.path, &conf_path).map_err(io_err(&conf_path))?;
        }
        info!("wrote output to {:?}", dir);
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use super::super::config::SyntheticConfig;
    use super::super::data;

    fn simulation(conf: &Config, rng: &mut StdRng) -> Simulation {
        let mut market = data::synthetic(&conf.synthetic, rng);
        data::generate_profits(&mut market, conf.profit_min, conf.profit_max, rng);
        Simulation::new(&conf.simulation, market).unwrap()
    }

    fn conf() -> Config {
        let mut conf = Config::from_yaml("STEPS: 3\nSEED: 4\nRUNS: 2").unwrap();
        conf.synthetic = SyntheticConfig { consumers: 5, items: 30, list_length: 10 };
        conf
    }

    #[test]
    fn test_record_runs() {
        let conf = conf();
        let mut recorder = Recorder::new();
        for run in 0..conf.runs {
            let seed = conf.seed + run as u64;
            let mut rng: StdRng = SeedableRng::seed_from_u64(seed);
            let mut sim = simulation(&conf, &mut rng);
            recorder.start_run(seed);
            for _ in 0..conf.steps {
                sim.step(&mut rng).unwrap();
                recorder.record(&sim, run == 0).unwrap();
            }
            recorder.finish_run();
        }

        let results = recorder.results(&conf);
        assert_eq!(recorder.runs.len(), 2);
        assert_eq!(results["runs"][1]["seed"], 5);
        assert_eq!(results["meta"]["steps"], 3);

        let history = results["runs"][0]["history"].as_array().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[2]["model"]["tick"], 2);
        assert!(history[0]["consumers"].as_array().is_some());

        // Consumer detail only when asked for
        assert!(results["runs"][1]["history"][0].get("consumers").is_none());
    }

    #[test]
    fn test_save() {
        let conf = conf();
        let root = std::env::temp_dir().join(format!("trustrec-output-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);

        let mut recorder = Recorder::new();
        recorder.start_run(conf.seed);
        recorder.finish_run();
        let dir = recorder.save_to(&root, &conf).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(dir.join("output.json")).unwrap()).unwrap();
        assert_eq!(written["meta"]["seed"], 4);
        assert!(root.join("latest").join("output.json").exists());

        // Saving again replaces the link
        recorder.save_to(&root, &conf).unwrap();
        assert!(root.join("latest").join("output.json").exists());
        let _ = fs::remove_dir_all(&root);
    }
}
