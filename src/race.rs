//! One race: a population of agents, each driven by its own network, on a shared track.

use crate::{
    agent::{ActionSpace, Agent},
    config::{PhysicsConfig, RaceConfig},
    network::NeuralNetwork,
    observe::Encoder,
    track::{Environment, Powerup, TrackVariant},
    vector::Vector2,
};
use rand::{Rng, RngCore};
use serde::Serialize;

/// What a renderer needs to draw one agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentView {
    pub pos: Vector2,
    pub heading: f64,
    pub fitness: f64,
    pub alive: bool,
    pub boosting: bool,
    pub next_checkpoint: Vector2,
}

/// An owned, read-only picture of a race at one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceSnapshot {
    pub step: u32,
    pub checkpoints: Vec<Vector2>,
    pub powerups: Vec<Powerup>,
    pub agents: Vec<AgentView>,
    /// Last network input of every agent, empty until it has been encoded
    pub observations: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct Race {
    agents: Vec<Agent>,
    neural_nets: Vec<NeuralNetwork>,
    environment: Environment,
    observations: Vec<Vec<f64>>,
    encoder: Encoder,
    actions: ActionSpace,
    physics: PhysicsConfig,
    config: RaceConfig,
    pub step: u32,
    pub max_steps: u32,
    /// Speed that maps to 1 in observations; only ever grows
    pub max_speed_seen_global: f64,
}

impl Race {
    /// A race with one agent per network, all on the start pose.
    ///
    /// Panics when there are no networks, or when their shape doesn't fit the encoder and the
    /// action space the configs describe.
    pub fn new(
        environment: Environment,
        neural_nets: Vec<NeuralNetwork>,
        physics: PhysicsConfig,
        config: RaceConfig,
    ) -> Self {
        let encoder = Encoder::new(config.lookahead);
        let actions = physics.action_space();
        assert!(!neural_nets.is_empty(), "race needs at least one agent");
        Self::check_networks(&neural_nets, &encoder, &actions);

        let (pos, dir) = environment.start_pose();
        let agents = neural_nets
            .iter()
            .map(|_| Agent::new(pos, dir, physics.initial_throttle))
            .collect::<Vec<_>>();

        Self {
            observations: vec![Vec::new(); agents.len()],
            agents,
            neural_nets,
            environment,
            encoder,
            actions,
            max_steps: config.max_steps,
            physics,
            config,
            step: 0,
            max_speed_seen_global: 1.,
        }
    }

    fn check_networks(nets: &[NeuralNetwork], encoder: &Encoder, actions: &ActionSpace) {
        for net in nets {
            assert_eq!(
                net.input_nodes(),
                encoder.len(),
                "network input size must match the observation length"
            );
            assert_eq!(
                net.output_nodes(),
                actions.len(),
                "network output size must match the action space"
            );
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn networks(&self) -> &[NeuralNetwork] {
        &self.neural_nets
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.actions
    }

    /// Swap in a new population. Agents keep their state; call [Race::reset] to restart.
    pub fn set_networks(&mut self, neural_nets: Vec<NeuralNetwork>) {
        assert_eq!(
            neural_nets.len(),
            self.agents.len(),
            "race holds {} agents",
            self.agents.len()
        );
        Self::check_networks(&neural_nets, &self.encoder, &self.actions);
        self.neural_nets = neural_nets;
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.max_steps || self.agents.iter().all(|a| !a.alive)
    }

    /// Advance every living agent by one tick. A finished race doesn't change.
    pub fn run(&mut self) {
        if self.is_finished() {
            return;
        }

        let env = &mut self.environment;
        let num_checkpoints = env.num_checkpoints();
        for (i, agent) in self.agents.iter_mut().enumerate() {
            if !agent.alive {
                continue;
            }

            let obs = self.encoder.encode(env, agent, self.max_speed_seen_global);
            let action = self.actions.decode(self.neural_nets[i].predict(&obs));
            self.observations[i] = obs;
            agent.update(action, &self.physics);
            if !agent.alive {
                continue;
            }

            if agent.pos.dist(env.target(agent.reached_checkpoints)) < self.config.checkpoint_radius
            {
                agent.pass_checkpoint(num_checkpoints, self.config.lap_bonus);
            }
            agent.next_checkpoint_pos = env.target(agent.reached_checkpoints);

            if env.has_left_course(agent.pos, agent.reached_checkpoints) {
                agent.kill();
                continue;
            }

            if let Some(powerup) = env.available_powerup_near(agent.pos, self.config.pickup_radius)
            {
                agent.pick_up(powerup.kind);
                powerup.cooldown_ticks = self.config.powerup_cooldown;
            }
        }

        if self.config.collisions {
            self.collide();
        }
        self.environment.update_powerups();

        self.max_speed_seen_global = self
            .agents
            .iter()
            .map(|a| a.max_speed_seen)
            .fold(self.max_speed_seen_global, f64::max);
        self.step += 1;
    }

    pub fn run_to_end(&mut self) {
        while !self.is_finished() {
            self.run();
        }
    }

    /// Push apart living agents closer than the collision radius
    fn collide(&mut self) {
        let radius = self.config.collision_radius;
        let impulse = self.config.collision_impulse;
        for i in 0..self.agents.len() {
            for j in i + 1..self.agents.len() {
                let (l, r) = (&self.agents[i], &self.agents[j]);
                if !l.alive || !r.alive {
                    continue;
                }
                let d = l.pos.dist(r.pos);
                if d >= radius || d == 0. {
                    continue;
                }
                let push = (l.pos - r.pos).normalized() * impulse;
                self.agents[i].velocity += push;
                self.agents[j].velocity -= push;
            }
        }
    }

    /// Put every agent back on the start pose, scattered by `start_jitter` when it is set
    pub fn reset(&mut self, rng: &mut impl RngCore) {
        let (pos, dir) = self.environment.start_pose();
        let jitter = self.config.start_jitter;
        for agent in &mut self.agents {
            let offset = if jitter > 0. {
                Vector2::new(jitter * rng.random::<f64>().sqrt(), 0.)
                    .rotated(rng.random_range(0.0..360.))
            } else {
                Vector2::ZERO
            };
            agent.set_start(pos + offset, dir);
            agent.reset();
        }
        self.environment.reset_powerups();
        self.observations.iter_mut().for_each(Vec::clear);
        self.step = 0;
    }

    /// Rebuild the track and restart on it
    pub fn regenerate_track(&mut self, variant: TrackVariant, rng: &mut impl RngCore) {
        self.environment.regenerate(variant);
        self.reset(rng);
    }

    /// Index and fitness of the fittest agent; the first one wins ties
    pub fn best(&self) -> (usize, f64) {
        let mut best = (0, self.agents[0].fitness());
        for (i, agent) in self.agents.iter().enumerate().skip(1) {
            if agent.fitness() > best.1 {
                best = (i, agent.fitness());
            }
        }
        best
    }

    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            step: self.step,
            checkpoints: self.environment.checkpoints().to_vec(),
            powerups: self.environment.powerups().to_vec(),
            agents: self
                .agents
                .iter()
                .map(|a| AgentView {
                    pos: a.pos,
                    heading: a.direction.heading(),
                    fitness: a.fitness(),
                    alive: a.alive,
                    boosting: a.is_boosting,
                    next_checkpoint: a.next_checkpoint_pos,
                })
                .collect(),
            observations: self.observations.clone(),
        }
    }
}
