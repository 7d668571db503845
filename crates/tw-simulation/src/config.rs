use serde::{Deserialize, Serialize};
use tw_core::component::{Action, FoodKind};
use tw_core::entity::EntityKind;
use tw_core::vector::MapSize;

use crate::error::{SimError, SimResult};

/// Configuration for a simulation run.
///
/// Durations inside [`RulesConfig`] are in world hours, rates are per world
/// hour, and distances are in map units. Physics runs in real seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Toroidal map dimensions.
    pub map: MapSize,
    /// Cell size shared by the terrain, soil and navigation grids.
    pub cell_size: f64,
    /// World hours that pass per real second.
    pub hours_per_second: f64,
    /// Longest real-time sub-step fed to the systems.
    pub max_step_seconds: f64,
    /// Real deltas above this are clamped before being split.
    pub max_real_delta_seconds: f64,
    /// Maximum notification log size (oldest dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
    /// Initial population used by [`spawn::populate`](crate::spawn::populate).
    pub population: PopulationConfig,
    /// Gameplay constants.
    pub rules: RulesConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            map: MapSize::default(),
            cell_size: 20.0,
            hours_per_second: 0.1,
            max_step_seconds: 1.0 / 30.0,
            max_real_delta_seconds: 0.25,
            max_events: 10_000,
            population: PopulationConfig::default(),
            rules: RulesConfig::default(),
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the map dimensions.
    pub fn with_map(mut self, map: MapSize) -> Self {
        self.map = map;
        self
    }

    /// Set how many world hours pass per real second.
    pub fn with_hours_per_second(mut self, hours: f64) -> Self {
        self.hours_per_second = hours;
        self
    }

    /// Set the longest sub-step.
    pub fn with_max_step_seconds(mut self, seconds: f64) -> Self {
        self.max_step_seconds = seconds;
        self
    }

    /// Set the maximum notification log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Set the initial population.
    pub fn with_population(mut self, population: PopulationConfig) -> Self {
        self.population = population;
        self
    }

    /// Replace the gameplay constants.
    pub fn with_rules(mut self, rules: RulesConfig) -> Self {
        self.rules = rules;
        self
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> SimResult<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!(
                    "{name} must be positive, got {v}"
                )))
            }
        };
        positive("map.width", self.map.width)?;
        positive("map.height", self.map.height)?;
        positive("cell_size", self.cell_size)?;
        positive("hours_per_second", self.hours_per_second)?;
        positive("max_step_seconds", self.max_step_seconds)?;
        positive("max_real_delta_seconds", self.max_real_delta_seconds)?;
        positive("rules.hours_per_year", self.rules.hours_per_year)?;
        positive("rules.arrow_speed", self.rules.arrow_speed)?;
        positive("rules.arrow_gravity", self.rules.arrow_gravity)?;
        if self.cell_size > self.map.width.min(self.map.height) {
            return Err(SimError::InvalidConfig(format!(
                "cell_size {} exceeds the map",
                self.cell_size
            )));
        }
        Ok(())
    }
}

/// Initial entity counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Humans, split between two founding tribes.
    pub humans: usize,
    /// Predators.
    pub predators: usize,
    /// Prey.
    pub prey: usize,
    /// Mature trees.
    pub trees: usize,
    /// Mature berry bushes.
    pub bushes: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            humans: 12,
            predators: 3,
            prey: 14,
            trees: 40,
            bushes: 30,
        }
    }
}

/// Gameplay constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    // Time
    /// World hours per year of age.
    pub hours_per_year: f64,
    /// Characters younger than this (years) are children.
    pub adult_age: f64,
    /// Characters older than this (years) count as elders in combat.
    pub elder_age: f64,

    // Hunger
    /// Hunger gained per hour by humans.
    pub human_hunger_rate: f64,
    /// Hunger gained per hour by animals.
    pub animal_hunger_rate: f64,
    /// Characters look for food above this hunger.
    pub hunger_eat_threshold: f64,
    /// Characters above this hunger will not procreate.
    pub hunger_critical: f64,
    /// Hitpoints lost per hour at maximum hunger.
    pub starvation_damage: f64,
    /// Hitpoints regained per hour while hunger is below `regen_hunger`.
    pub regen_rate: f64,
    /// Hunger below which characters regenerate.
    pub regen_hunger: f64,
    /// Hunger removed by a berry.
    pub berry_nutrition: f64,
    /// Hunger removed by a piece of meat.
    pub meat_nutrition: f64,
    /// Hunger removed per hour of grazing.
    pub graze_nutrition: f64,

    // Cooldowns (hours)
    /// Between two procreations.
    pub procreation_cooldown: f64,
    /// Between two melee blows.
    pub attack_cooldown: f64,
    /// Between two throws.
    pub throw_cooldown: f64,
    /// Between two gathered items.
    pub gather_cooldown: f64,
    /// Between two bites.
    pub feed_cooldown: f64,
    /// Between two units of labor (chopping, building, dismantling).
    pub work_cooldown: f64,
    /// Pregnancy length.
    pub gestation_hours: f64,

    // Reach
    /// Sight radius for AI queries.
    pub sight_radius: f64,
    /// Predators closer than this scare prey.
    pub danger_radius: f64,
    /// Defenders within this radius of a storage block theft.
    pub defend_radius: f64,
    /// Reach for gathering, eating, chopping and procreating.
    pub interact_range: f64,
    /// Reach for melee attacks.
    pub melee_range: f64,
    /// Reach for throwing.
    pub throw_range: f64,
    /// Reach for working on buildings.
    pub building_reach: f64,
    /// Distance at which a position target counts as reached.
    pub arrive_range: f64,

    // Movement
    /// Human acceleration (terminal speed is ten times this).
    pub human_acceleration: f64,
    /// Predator acceleration.
    pub predator_acceleration: f64,
    /// Prey acceleration.
    pub prey_acceleration: f64,
    /// Acceleration multiplier while fleeing.
    pub flee_multiplier: f64,
    /// How far wandering agents roam per decision.
    pub wander_radius: f64,

    // Combat
    /// Melee damage dealt by humans.
    pub human_damage: f64,
    /// Melee damage dealt by predators.
    pub predator_damage: f64,
    /// Base arrow damage.
    pub arrow_damage: f64,
    /// Chance that a defender facing its attacker parries.
    pub parry_chance: f64,
    /// Damage multiplier against victims busy with something other than fighting.
    pub vulnerable_multiplier: f64,
    /// Damage multiplier for female attackers.
    pub female_damage_multiplier: f64,
    /// Damage multiplier for child attackers.
    pub child_damage_multiplier: f64,
    /// Damage multiplier for elder attackers.
    pub elder_damage_multiplier: f64,
    /// Damage dealt to buildings per blow.
    pub siege_damage: f64,
    /// Slow debuff applied by an arrow hit, in hours.
    pub arrow_slow_hours: f64,

    // Arrows
    /// Horizontal arrow speed (units per second).
    pub arrow_speed: f64,
    /// Vertical deceleration (units per second squared).
    pub arrow_gravity: f64,
    /// How long an embedded arrow stays before removal.
    pub arrow_embed_hours: f64,
    /// Victims this close to the impact point are hit.
    pub arrow_hit_tolerance: f64,

    // Plants
    /// Hours for a tree sapling to mature on fully fertile soil.
    pub tree_growth_hours: f64,
    /// Hours for a bush sapling to mature on fully fertile soil.
    pub bush_growth_hours: f64,
    /// Hours between berries on a mature bush.
    pub berry_regrow_hours: f64,
    /// Hours between spreads of a mature tree.
    pub tree_spread_hours: f64,
    /// Hours between spreads of a mature bush.
    pub bush_spread_hours: f64,
    /// Maximum distance of a seedling from its parent.
    pub spread_radius: f64,
    /// Minimum distance between plants.
    pub plant_spacing: f64,
    /// No spreading beyond this many plants.
    pub max_plants: usize,
    /// Tree lifespan in hours.
    pub tree_max_age: f64,
    /// Bush lifespan in hours.
    pub bush_max_age: f64,
    /// Wood a fallen tree yields.
    pub tree_wood: u32,
    /// Chop progress per unit of labor.
    pub chop_per_hit: f64,
    /// Hours a stump lingers.
    pub stump_hours: f64,
    /// Hours a dying plant lingers.
    pub dying_hours: f64,
    /// Hours a human spends planting.
    pub planting_hours: f64,

    // Corpses
    /// Hours before a corpse decays.
    pub corpse_decay_hours: f64,
    /// Meat left by a dead human.
    pub human_meat: u32,
    /// Meat left by a dead predator.
    pub predator_meat: u32,
    /// Meat left by a dead prey.
    pub prey_meat: u32,

    // Storage and construction
    /// Items a character can carry.
    pub carry_capacity: usize,
    /// Humans deposit once they carry this many items.
    pub deposit_threshold: usize,
    /// Food items taken from storage per retrieval.
    pub retrieve_amount: usize,
    /// Dismantle progress per unit of labor.
    pub dismantle_per_hit: f64,
    /// Minimum distance between buildings.
    pub building_spacing: f64,
    /// Delay between a placement order and the blueprint appearing.
    pub placement_delay_hours: f64,

    // Temperature
    /// Ambient temperature at noon.
    pub day_temperature: f64,
    /// Ambient temperature at midnight.
    pub night_temperature: f64,
    /// Ambient temperature below which bodies cool.
    pub comfort_temperature: f64,
    /// Fraction of the gap to the target body temperature closed per hour.
    pub body_relax_rate: f64,
    /// Body temperature below which a human counts as cold.
    pub cold_threshold: f64,
    /// Body temperature below which a human takes damage.
    pub hypothermia_threshold: f64,
    /// Hitpoints lost per hour of hypothermia.
    pub hypothermia_damage: f64,
    /// Hunger rate multiplier while cold.
    pub cold_hunger_multiplier: f64,
    /// Ambient warmth added near a bonfire.
    pub bonfire_warmth: f64,
    /// Reach of a bonfire's warmth.
    pub bonfire_radius: f64,

    // Soil
    /// Fertility recovered per hour.
    pub soil_recovery: f64,
    /// Fertility removed by planting.
    pub planting_depletion: f64,
    /// Fertility removed per hour of grazing.
    pub grazing_depletion: f64,
    /// Minimum fertility for planting and grazing.
    pub fertile_threshold: f64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            hours_per_year: 24.0,
            adult_age: 16.0,
            elder_age: 50.0,

            human_hunger_rate: 4.0,
            animal_hunger_rate: 3.0,
            hunger_eat_threshold: 40.0,
            hunger_critical: 75.0,
            starvation_damage: 10.0,
            regen_rate: 5.0,
            regen_hunger: 30.0,
            berry_nutrition: 20.0,
            meat_nutrition: 35.0,
            graze_nutrition: 30.0,

            procreation_cooldown: 6.0,
            attack_cooldown: 0.1,
            throw_cooldown: 0.5,
            gather_cooldown: 0.1,
            feed_cooldown: 0.1,
            work_cooldown: 0.1,
            gestation_hours: 4.0,

            sight_radius: 300.0,
            danger_radius: 150.0,
            defend_radius: 200.0,
            interact_range: 45.0,
            melee_range: 45.0,
            throw_range: 250.0,
            building_reach: 75.0,
            arrive_range: 20.0,

            human_acceleration: 6.0,
            predator_acceleration: 7.0,
            prey_acceleration: 6.5,
            flee_multiplier: 1.3,
            wander_radius: 200.0,

            human_damage: 15.0,
            predator_damage: 20.0,
            arrow_damage: 20.0,
            parry_chance: 0.3,
            vulnerable_multiplier: 1.5,
            female_damage_multiplier: 0.8,
            child_damage_multiplier: 0.5,
            elder_damage_multiplier: 0.7,
            siege_damage: 10.0,
            arrow_slow_hours: 0.3,

            arrow_speed: 400.0,
            arrow_gravity: 200.0,
            arrow_embed_hours: 0.2,
            arrow_hit_tolerance: 10.0,

            tree_growth_hours: 24.0,
            bush_growth_hours: 12.0,
            berry_regrow_hours: 1.5,
            tree_spread_hours: 30.0,
            bush_spread_hours: 20.0,
            spread_radius: 120.0,
            plant_spacing: 40.0,
            max_plants: 400,
            tree_max_age: 480.0,
            bush_max_age: 240.0,
            tree_wood: 4,
            chop_per_hit: 0.25,
            stump_hours: 12.0,
            dying_hours: 2.0,
            planting_hours: 0.2,

            corpse_decay_hours: 24.0,
            human_meat: 3,
            predator_meat: 3,
            prey_meat: 4,

            carry_capacity: 10,
            deposit_threshold: 6,
            retrieve_amount: 3,
            dismantle_per_hit: 0.1,
            building_spacing: 120.0,
            placement_delay_hours: 0.1,

            day_temperature: 24.0,
            night_temperature: 6.0,
            comfort_temperature: 16.0,
            body_relax_rate: 0.5,
            cold_threshold: 35.5,
            hypothermia_threshold: 34.0,
            hypothermia_damage: 5.0,
            cold_hunger_multiplier: 1.5,
            bonfire_warmth: 15.0,
            bonfire_radius: 150.0,

            soil_recovery: 0.02,
            planting_depletion: 0.3,
            grazing_depletion: 0.1,
            fertile_threshold: 0.3,
        }
    }
}

impl RulesConfig {
    /// Center distance at which `action` can be carried out on its target.
    pub fn reach(&self, action: Action) -> f64 {
        match action {
            Action::Gathering | Action::Eating | Action::Procreating | Action::Chopping => {
                self.interact_range
            }
            Action::Attacking => self.melee_range,
            Action::Throwing => self.throw_range,
            Action::Depositing | Action::Retrieving | Action::Dismantling => self.building_reach,
            Action::Moving | Action::Planting => self.arrive_range,
            Action::Idle | Action::Fleeing => 0.0,
        }
    }

    /// Base acceleration for a moving character.
    pub fn acceleration(&self, kind: EntityKind) -> f64 {
        match kind {
            EntityKind::Human => self.human_acceleration,
            EntityKind::Predator => self.predator_acceleration,
            EntityKind::Prey => self.prey_acceleration,
            _ => 0.0,
        }
    }

    /// Meat a corpse of `kind` starts with.
    pub fn meat_for(&self, kind: EntityKind) -> u32 {
        match kind {
            EntityKind::Human => self.human_meat,
            EntityKind::Predator => self.predator_meat,
            EntityKind::Prey => self.prey_meat,
            _ => 0,
        }
    }

    /// Hunger removed by eating one item of `kind`.
    pub fn nutrition(&self, kind: FoodKind) -> f64 {
        match kind {
            FoodKind::Berry => self.berry_nutrition,
            FoodKind::Meat => self.meat_nutrition,
        }
    }

    /// Whether a character of `age` years is an adult.
    pub fn is_adult(&self, age: f64) -> bool {
        age >= self.adult_age
    }
}
