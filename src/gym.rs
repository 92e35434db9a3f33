//! The generational loop: run every race, keep the best brains, breed the next population
//! from them.

use crate::{
    config::Config,
    network::NeuralNetwork,
    observe::Encoder,
    race::Race,
    store::NetworkStore,
    track::{Environment, TrackVariant},
};
use core::ops::ControlFlow;
use rand::RngCore;
use tracing::{debug, info, warn};

/// What hooks get to see after every generation
pub struct Stats<'a> {
    pub generation: u32,
    /// Top fitness of this generation
    pub generation_best: f64,
    pub best_score_ever: f64,
    /// Mutation rate used to breed the next generation
    pub epsilon: f64,
    pub max_speed_seen: f64,
    /// Top fitness of every race, in race order
    pub race_bests: &'a [f64],
    /// The best network seen so far
    pub fittest: &'a NeuralNetwork,
}

pub type Hook = Box<dyn FnMut(&Stats) -> ControlFlow<()>>;

/// Callbacks run after every generation, in order. The first to break stops training.
#[derive(Default)]
pub struct EvolutionHooks {
    hooks: Vec<Hook>,
}

impl EvolutionHooks {
    pub fn new(hooks: Vec<Hook>) -> Self {
        Self { hooks }
    }

    fn fire(&mut self, stats: &Stats) -> ControlFlow<()> {
        for hook in self.hooks.iter_mut() {
            if hook(stats).is_break() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Training,
    Finished,
}

pub struct Gym<R: RngCore> {
    races: Vec<Race>,
    /// Most fit first
    best_networks: Vec<NeuralNetwork>,
    best_score_ever: f64,
    score_history: Vec<f64>,
    epoch: u32,
    max_speed_seen: f64,
    finished: bool,
    config: Config,
    rng: R,
    hooks: EvolutionHooks,
    store: Option<Box<dyn NetworkStore>>,
    showcase: Option<Race>,
    /// Best fitness of any showcase replay that ran to the end
    showcase_best: Option<f64>,
}

impl<R: RngCore> Gym<R> {
    /// A gym of `config.gym.races` races, every agent driven by a fresh random network
    pub fn new(config: Config, mut rng: R) -> Self {
        assert!(config.gym.races > 0, "gym needs at least one race");
        assert!(
            config.gym.agents_per_race > 0,
            "races need at least one agent"
        );

        let (input, hidden, output) = Self::layers(&config);
        let environment = Environment::new(&config.track);
        let races = (0..config.gym.races)
            .map(|_| {
                let nets = (0..config.gym.agents_per_race)
                    .map(|_| NeuralNetwork::new(input, hidden, output, &mut rng))
                    .collect();
                Race::new(
                    environment.clone(),
                    nets,
                    config.physics.clone(),
                    config.race.clone(),
                )
            })
            .collect();

        Self {
            races,
            best_networks: Vec::new(),
            best_score_ever: f64::NEG_INFINITY,
            score_history: Vec::new(),
            epoch: 0,
            max_speed_seen: 1.,
            finished: false,
            config,
            rng,
            hooks: EvolutionHooks::default(),
            store: None,
            showcase: None,
            showcase_best: None,
        }
    }

    /// Pick up where a previous run left off: every race is seeded from the network stored
    /// under `config.gym.store_key`. Without a usable one, this is [Gym::new].
    pub fn resume(config: Config, rng: R, store: Box<dyn NetworkStore>) -> Self {
        let (input, hidden, output) = Self::layers(&config);
        let loaded = store.load(&config.gym.store_key).filter(|nn| {
            let fits = (nn.input_nodes(), nn.hidden_nodes(), nn.output_nodes())
                == (input, hidden, output);
            if !fits {
                warn!(
                    "stored network is {}-{}-{}, expected {input}-{hidden}-{output}; starting fresh",
                    nn.input_nodes(),
                    nn.hidden_nodes(),
                    nn.output_nodes()
                );
            }
            fits
        });

        let mut gym = Self::new(config, rng).with_store(store);
        if let Some(nn) = loaded {
            info!("resuming from stored network {:?}", gym.config.gym.store_key);
            let epsilon = gym.epsilon();
            gym.reseed(&nn, &nn, epsilon);
            gym.best_networks.push(nn);
        }
        gym
    }

    pub fn with_store(mut self, store: Box<dyn NetworkStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_hooks(mut self, hooks: EvolutionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    fn layers(config: &Config) -> (usize, usize, usize) {
        let input = Encoder::new(config.race.lookahead).len();
        let output = config.physics.action_space().len();
        let hidden = config.gym.hidden_nodes.unwrap_or((input + output) / 2);
        (input, hidden, output)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn races(&self) -> &[Race] {
        &self.races
    }

    pub fn best_networks(&self) -> &[NeuralNetwork] {
        &self.best_networks
    }

    pub fn best_score_ever(&self) -> f64 {
        self.best_score_ever
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn max_speed_seen(&self) -> f64 {
        self.max_speed_seen
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn store(&self) -> Option<&dyn NetworkStore> {
        self.store.as_deref()
    }

    /// Top fitness of every generation so far
    pub fn score_history(&self) -> &[f64] {
        &self.score_history
    }

    /// Running maximum of [Gym::score_history]
    pub fn best_history(&self) -> Vec<f64> {
        self.score_history
            .iter()
            .scan(f64::NEG_INFINITY, |best, &score| {
                *best = best.max(score);
                Some(*best)
            })
            .collect()
    }

    /// Mutation rate for the current epoch, annealed linearly from `epsilon_max` to
    /// `epsilon_min` over `epoch_limit` generations
    pub fn epsilon(&self) -> f64 {
        let gym = &self.config.gym;
        let t = self.epoch as f64 / gym.epoch_limit.max(1) as f64;
        (gym.epsilon_max - (gym.epsilon_max - gym.epsilon_min) * t).max(gym.epsilon_min)
    }

    /// Run one full generation and breed the next. Breaks if a hook asks training to stop.
    pub fn generation(&mut self) -> ControlFlow<()> {
        for race in self.races.iter_mut() {
            race.run_to_end();
        }

        let bests = self
            .races
            .iter()
            .enumerate()
            .map(|(r, race)| {
                let (agent, fitness) = race.best();
                (r, agent, fitness)
            })
            .collect::<Vec<_>>();
        let race_bests = bests.iter().map(|b| b.2).collect::<Vec<_>>();

        let mut ranked = bests;
        ranked.sort_by(|l, r| r.2.total_cmp(&l.2));
        let (r1, a1, top) = ranked[0];
        let elite1 = self.races[r1].networks()[a1].clone();
        let elite2 = ranked
            .get(1)
            .map(|&(r, a, _)| self.races[r].networks()[a].clone())
            .unwrap_or_else(|| elite1.clone());

        if top > self.best_score_ever {
            self.best_networks.insert(0, elite1.clone());
            self.best_networks.truncate(self.config.gym.best_networks_cap);
            if self.best_score_ever.is_finite() {
                info!(
                    "generation {}: new best {top:.2} (was {:.2})",
                    self.epoch, self.best_score_ever
                );
            } else {
                info!("generation {}: first best {top:.2}", self.epoch);
            }
            self.best_score_ever = top;
        }
        self.score_history.push(top);

        let epsilon = self.epsilon();
        self.reseed(&elite1, &elite2, epsilon);

        self.max_speed_seen = self
            .races
            .iter()
            .map(|race| race.max_speed_seen_global)
            .fold(self.max_speed_seen, f64::max);
        for race in self.races.iter_mut() {
            race.max_speed_seen_global = self.max_speed_seen;
        }

        debug!(
            generation = self.epoch,
            top,
            best = self.best_score_ever,
            epsilon,
            max_speed = self.max_speed_seen,
            "generation done"
        );
        self.epoch += 1;

        let stats = Stats {
            generation: self.epoch,
            generation_best: top,
            best_score_ever: self.best_score_ever,
            epsilon,
            max_speed_seen: self.max_speed_seen,
            race_bests: &race_bests,
            fittest: self.best_networks.first().unwrap_or(&elite1),
        };
        self.hooks.fire(&stats)
    }

    /// Reset every race and hand it a population bred from the two elites.
    ///
    /// The first half of the races exploits: both elites unchanged, then mutated copies of
    /// each in turn. The second half explores: one mutated copy of each elite, then fresh
    /// random networks.
    fn reseed(&mut self, elite1: &NeuralNetwork, elite2: &NeuralNetwork, epsilon: f64) {
        let (input, hidden, output) = Self::layers(&self.config);
        let per_race = self.config.gym.agents_per_race;
        let exploit = self.races.len().div_ceil(2);
        let rng = &mut self.rng;

        let mutated = |nn: &NeuralNetwork, rng: &mut R| {
            let mut nn = nn.clone();
            nn.mutate(epsilon, rng);
            nn
        };

        for (r, race) in self.races.iter_mut().enumerate() {
            race.reset(rng);
            let nets = (0..per_race)
                .map(|slot| match (r < exploit, slot) {
                    (true, 0) => elite1.clone(),
                    (true, 1) => elite2.clone(),
                    (true, s) if s % 2 == 0 => mutated(elite1, rng),
                    (true, _) => mutated(elite2, rng),
                    (false, 0) => mutated(elite1, rng),
                    (false, 1) => mutated(elite2, rng),
                    (false, _) => NeuralNetwork::new(input, hidden, output, rng),
                })
                .collect();
            race.set_networks(nets);
        }
    }

    /// Run up to `n` generations. Training finishes at the epoch limit, once the best score
    /// reaches the success threshold, or when a hook breaks; after that this does nothing.
    pub fn train_batch(&mut self, n: u32) -> Progress {
        if self.finished {
            return Progress::Finished;
        }

        for _ in 0..n {
            let flow = self.generation();
            let succeeded = self
                .config
                .gym
                .success_threshold
                .is_some_and(|t| self.best_score_ever >= t);

            if flow.is_break() || succeeded || self.epoch >= self.config.gym.epoch_limit {
                self.finish();
                return Progress::Finished;
            }
        }
        Progress::Training
    }

    fn finish(&mut self) {
        self.finished = true;
        info!(
            "training finished after {} generations, best {:.2}",
            self.epoch, self.best_score_ever
        );

        let champion = self
            .best_networks
            .first()
            .cloned()
            .unwrap_or_else(|| self.races[0].networks()[0].clone());

        if let Some(store) = self.store.as_mut() {
            if let Err(err) = store.save(&self.config.gym.store_key, &champion) {
                warn!("could not persist best network: {err}");
            }
        }

        let per_race = self.config.gym.agents_per_race;
        let nets = self
            .best_networks
            .iter()
            .cloned()
            .chain(std::iter::repeat(champion))
            .take(per_race)
            .collect();
        let mut showcase = self.races[0].clone();
        showcase.set_networks(nets);
        showcase.max_steps = self.config.gym.showcase_steps;
        showcase.reset(&mut self.rng);
        self.showcase = Some(showcase);
        self.showcase_best = None;
    }

    /// The race replaying the best networks once training is over
    pub fn showcase(&self) -> Option<&Race> {
        self.showcase.as_ref()
    }

    /// Best fitness over the showcase replays completed so far
    pub fn showcase_best(&self) -> Option<f64> {
        self.showcase_best
    }

    /// Tick the showcase race, restarting it whenever it ends. A replay's best fitness is
    /// recorded on its last tick.
    pub fn step_showcase(&mut self) {
        if let Some(race) = self.showcase.as_mut() {
            if race.is_finished() {
                race.reset(&mut self.rng);
            }
            race.run();
            if race.is_finished() {
                let (_, fitness) = race.best();
                self.showcase_best = Some(self.showcase_best.map_or(fitness, |b| b.max(fitness)));
            }
        }
    }

    /// Rebuild the track of every race, and of the showcase, and restart them
    pub fn regenerate_track(&mut self, variant: TrackVariant) {
        info!("regenerating track: {variant:?}");
        for race in self.races.iter_mut().chain(self.showcase.as_mut()) {
            race.regenerate_track(variant.clone(), &mut self.rng);
        }
        self.showcase_best = None;
        self.config.track.variant = variant;
    }
}
