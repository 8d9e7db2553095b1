//! The microgrid community as a reinforcement-learning environment.

use tracing::{debug, info};

use crate::config::ScenarioConfig;
use crate::devices::Building;
use crate::sim::ambient::AmbientModel;
use crate::sim::reward::RewardKind;
use crate::sim::snapshot::{Snapshot, SnapshotPublisher};
use crate::sim::types::{
    Action, EnvError, StepError, StepInfo, StepOutcome, TransferMatrix, TransferMode,
};
use crate::sim::weather::WeatherSource;

/// Values contributed by the ambient to the observation vector.
pub const AMBIENT_OBSERVATION_LEN: usize = 3;
/// Values contributed by each building to the observation vector.
pub const BUILDING_OBSERVATION_LEN: usize = 3;

/// Orchestrates the ambient and all buildings.
///
/// Each [`GridEnvironment::step`] settles one hour:
/// 1. apply the requested transfer matrix (releases first, then credits)
/// 2. step every building against the ambient
/// 3. read the tick's grid cost, then step the ambient
/// 4. compute the reward and extend the purchase history
///
/// # Invariant
/// `total_power_bought().len() == hour() + 1`.
#[derive(Debug)]
pub struct GridEnvironment {
    config: ScenarioConfig,
    ambient: AmbientModel,
    buildings: Vec<Building>,
    total_power_bought: Vec<f64>,
    last_purchased_kwh: Vec<f64>,
    hour_limit: usize,
    publisher: Option<SnapshotPublisher>,
}

impl GridEnvironment {
    /// Builds an environment from a validated scenario, taking weather from
    /// the source the scenario names.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InvalidConfig`] with every violation, or
    /// [`EnvError::Weather`] if no weather year could be loaded.
    pub fn new(config: ScenarioConfig) -> Result<Self, EnvError> {
        let weather = AmbientModel::weather_from_config(&config.ambient, config.simulation.seed);
        Self::with_weather(config, weather)
    }

    /// Builds an environment with an explicit weather source.
    ///
    /// # Errors
    ///
    /// Same as [`GridEnvironment::new`].
    pub fn with_weather(
        config: ScenarioConfig,
        weather: Box<dyn WeatherSource>,
    ) -> Result<Self, EnvError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(EnvError::InvalidConfig(errors));
        }

        let hour_limit = config.simulation.horizon_hours();
        let ambient = AmbientModel::new(
            config.ambient.clone(),
            hour_limit,
            weather,
            config.simulation.seed,
        )?;
        let buildings = config.build_buildings();

        info!(
            buildings = buildings.len(),
            hour_limit,
            transfer_mode = %config.simulation.transfer_mode,
            reward = ?config.simulation.reward,
            year = ambient.year(),
            "environment created"
        );

        Ok(Self {
            last_purchased_kwh: vec![0.0; buildings.len()],
            config,
            ambient,
            buildings,
            total_power_bought: vec![0.0],
            hour_limit,
            publisher: None,
        })
    }

    /// Attaches a snapshot publisher; every subsequent step offers one snapshot.
    pub fn attach_publisher(&mut self, publisher: SnapshotPublisher) {
        self.publisher = Some(publisher);
    }

    /// Reseeds the ambient's random generator (price, weather year, missing wind).
    pub fn seed(&mut self, seed: u64) {
        self.ambient.reseed(seed);
    }

    /// Starts a new episode with fresh buildings and a new weather year.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::Weather`] if the weather year cannot be loaded.
    pub fn reset(&mut self) -> Result<Vec<f64>, EnvError> {
        self.ambient.reset()?;
        self.buildings = self.config.build_buildings();
        self.total_power_bought = vec![0.0];
        self.last_purchased_kwh = vec![0.0; self.buildings.len()];
        debug!(year = self.ambient.year(), "environment reset");
        Ok(self.observation())
    }

    /// Settles one hour.
    ///
    /// # Errors
    ///
    /// Returns a [`StepError`] when the action violates the contract or the
    /// episode is already over. The environment is left untouched in that case.
    pub fn step(&mut self, action: &Action) -> Result<StepOutcome, StepError> {
        if self.is_done() {
            return Err(StepError::EpisodeOver {
                hour: self.ambient.hour(),
            });
        }
        let n = self.buildings.len();
        let requests = action.to_requests(self.transfer_mode(), n)?;

        // Releases are computed against availability at the start of the
        // phase and only credited afterwards. Self-transfers are no-ops.
        let mut released = TransferMatrix::zeros(n);
        for (index, request) in requests.into_iter().enumerate() {
            let (source, destination) = (index / n, index % n);
            if source == destination {
                continue;
            }
            released.set(source, destination, self.buildings[source].relinquish(request));
        }
        for destination in 0..n {
            let incoming = released.column_sum(destination);
            self.buildings[destination].receive(incoming);
        }

        for building in &mut self.buildings {
            building.step(&mut self.ambient);
        }
        self.last_purchased_kwh = self
            .buildings
            .iter()
            .map(|b| b.last_tick().purchased_kwh)
            .collect();

        let power_bought = self.ambient.hourly_grid_purchase_cost();
        self.ambient.step();

        let reward = self.reward_kind().evaluate(power_bought, &self.total_power_bought);
        self.total_power_bought.push(power_bought);
        let done = self.is_done();

        self.publish(power_bought, &released);

        Ok(StepOutcome {
            observation: self.observation(),
            reward,
            done,
            info: StepInfo {
                hour: self.ambient.hour(),
                power_bought,
                purchased_kwh: self.last_purchased_kwh.clone(),
                released,
            },
        })
    }

    fn publish(&self, power_bought: f64, released: &TransferMatrix) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        publisher.publish(Snapshot {
            hour: self.ambient.hour(),
            grid_purchase: power_bought,
            year_offset: self.ambient.year_offset(),
            year: self.ambient.year(),
            inhabitants: self.buildings.iter().map(Building::inhabitants).collect(),
            buying: self.last_purchased_kwh.iter().map(|&kwh| kwh > 0.0).collect(),
            transfers: released.clone(),
        });
    }

    /// `[wind, irradiance, night] ++ [produced, consumption, stored]` per building.
    pub fn observation(&self) -> Vec<f64> {
        let mut observation = Vec::with_capacity(self.observation_len());
        observation.extend_from_slice(&self.ambient.get_state());
        for building in &self.buildings {
            observation.extend_from_slice(&building.observation());
        }
        observation
    }

    /// Length of the observation vector for this configuration.
    pub fn observation_len(&self) -> usize {
        AMBIENT_OBSERVATION_LEN + BUILDING_OBSERVATION_LEN * self.buildings.len()
    }

    /// Length of the flat action vector (buildings squared).
    pub fn action_len(&self) -> usize {
        self.buildings.len() * self.buildings.len()
    }

    pub fn transfer_mode(&self) -> TransferMode {
        self.config.simulation.transfer_mode
    }

    pub fn reward_kind(&self) -> RewardKind {
        self.config.simulation.reward
    }

    /// Whether the horizon has been reached.
    pub fn is_done(&self) -> bool {
        self.ambient.hour() >= self.hour_limit
    }

    pub fn hour(&self) -> usize {
        self.ambient.hour()
    }

    pub fn hour_limit(&self) -> usize {
        self.hour_limit
    }

    /// Grid cost per tick, starting with a zero entry for the reset state.
    pub fn total_power_bought(&self) -> &[f64] {
        &self.total_power_bought
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn ambient(&self) -> &AmbientModel {
        &self.ambient
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }
}
