//! Fleet coordinator.
//!
//! Vessels are ECS entities; one schedule run acts every vessel for the
//! current day, and only then does the shared clock move. Once every vessel
//! sits in `Selling` or `Complete` the coordinator runs the single pooled
//! sale and releases the sellers.

use crate::vessel::Vessel;
use crate::{FleetConfig, SimError};
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use serde::{Deserialize, Serialize};
use sim_core::{
    validate_asteroid, Asteroid, AsteroidPool, EventCategory, EventLog, Luck, MissionPhase,
    MissionRecord, SimClock, SimRng, VesselId,
};
use sim_econ::{draw_sale_factors, get_prices_per_unit_mass, pooled_sale, PooledSale, PriceSource, PriceTable};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Resource, Debug, Default)]
pub struct FleetClock(pub SimClock);

/// The only state several vessels mutate. Claims resolve one at a time.
#[derive(Resource, Debug, Default)]
pub struct ClaimPool(pub AsteroidPool);

/// Invariant violations raised by vessels during a schedule run.
#[derive(Resource, Debug, Default)]
pub struct Faults(pub Vec<SimError>);

/// Requests a stop between two simulated days.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Act every vessel for today, in vessel-id order. Settled vessels only
/// draw their luck for the day.
fn advance_vessels(
    mut vessels: Query<&mut Vessel>,
    mut pool: ResMut<ClaimPool>,
    clock: Res<FleetClock>,
    mut faults: ResMut<Faults>,
) {
    let day = clock.0.today();
    let mut all: Vec<Mut<Vessel>> = vessels.iter_mut().collect();
    all.sort_by_key(|v| v.id());
    for mut v in all {
        if let Err(e) = v.advance_day(day, &mut pool.0) {
            error!(vessel = %v.id(), day, error = %e, "vessel invariant violated");
            faults.0.push(e);
        }
    }
}

/// Outcome of a fleet run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FleetReport {
    /// Simulated days that were fully processed.
    pub days: u32,
    /// True when the run ended on a stop request or the day limit.
    pub stopped: bool,
    pub sale: Option<PooledSale>,
    /// Prices the pooled sale was struck at.
    pub prices: Option<PriceTable>,
    pub missions: Vec<MissionRecord>,
    pub log: EventLog,
}

pub struct Fleet {
    world: World,
    schedule: Schedule,
    rng: SimRng,
    log: EventLog,
    sale: Option<PooledSale>,
    prices: Option<PriceTable>,
    stop: StopHandle,
    config: FleetConfig,
    days_run: u32,
}

impl Fleet {
    pub fn new(config: FleetConfig, asteroids: Vec<Asteroid>) -> Result<Self, SimError> {
        config.validate()?;
        for a in &asteroids {
            validate_asteroid(a)?;
        }
        let root = SimRng::new(config.rng_seed);
        let mut world = World::new();
        world.insert_resource(FleetClock::default());
        world.insert_resource(ClaimPool(AsteroidPool::new(asteroids)));
        world.insert_resource(Faults::default());
        for i in 0..config.vessels {
            world.spawn(Vessel::new(
                VesselId(i),
                config.ship.clone(),
                config.tuning.clone(),
                config.costs.ground_control_per_day,
                root.fork(u64::from(i) + 1),
                0,
            ));
        }

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems(advance_vessels);

        let mut log = EventLog::new();
        log.push(
            0,
            MissionPhase::Initialization,
            EventCategory::Phase,
            format!("fleet of {} vessels launched, seed {}", config.vessels, config.rng_seed),
        );
        info!(vessels = config.vessels, seed = config.rng_seed, "fleet created");
        Ok(Self {
            world,
            schedule,
            rng: root.fork(0),
            log,
            sale: None,
            prices: None,
            stop: StopHandle::default(),
            config,
            days_run: 0,
        })
    }

    pub fn today(&self) -> u32 {
        self.world.resource::<FleetClock>().0.today()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn sale(&self) -> Option<&PooledSale> {
        self.sale.as_ref()
    }

    pub fn available_asteroids(&self) -> usize {
        self.world.resource::<ClaimPool>().0.available_len()
    }

    /// Every vessel, in id order.
    pub fn vessels(&mut self) -> Vec<&Vessel> {
        let mut q = self.world.query::<&Vessel>();
        let mut all: Vec<&Vessel> = q.iter(&self.world).collect();
        all.sort_by_key(|v| v.id());
        all
    }

    pub fn vessel_phases(&mut self) -> Vec<(VesselId, MissionPhase)> {
        self.vessels().iter().map(|v| (v.id(), v.phase())).collect()
    }

    /// Process one full simulated day. Returns true once every vessel is complete.
    pub fn step_day(&mut self, prices: &mut dyn PriceSource) -> Result<bool, SimError> {
        let day = self.today();
        self.schedule.run(&mut self.world);
        let faults = std::mem::take(&mut self.world.resource_mut::<Faults>().0);
        if let Some(fault) = faults.into_iter().next() {
            return Err(fault);
        }
        self.days_run += 1;

        let phases = self.vessel_phases();
        if self.sale.is_none() && phases.iter().all(|(_, p)| p.is_settled()) {
            self.settle(day, prices)?;
        }
        let done = self.vessel_phases().iter().all(|(_, p)| p.is_terminal());
        if done {
            self.log.push(day, MissionPhase::Complete, EventCategory::Phase, "all vessels complete");
            info!(day, "fleet run complete");
        } else {
            self.world.resource_mut::<FleetClock>().0.advance();
        }
        Ok(done)
    }

    /// Run until every vessel completes, a stop is requested, or the day limit hits.
    pub fn run(&mut self, prices: &mut dyn PriceSource) -> Result<FleetReport, SimError> {
        let stopped = loop {
            if self.stop.is_stopped() {
                info!(day = self.today(), "stop requested");
                break true;
            }
            if self.days_run >= self.config.max_days {
                warn!(max_days = self.config.max_days, "day limit reached, stopping run");
                break true;
            }
            if self.step_day(prices)? {
                break false;
            }
        };
        if stopped {
            self.log.push(
                self.today(),
                MissionPhase::Complete,
                EventCategory::Phase,
                format!("run stopped after {} days", self.days_run),
            );
        }
        Ok(self.report(stopped))
    }

    pub fn report(&mut self, stopped: bool) -> FleetReport {
        let missions = self.vessels().into_iter().map(|v| v.record().clone()).collect();
        FleetReport {
            days: self.days_run,
            stopped,
            sale: self.sale.clone(),
            prices: self.prices.clone(),
            missions,
            log: self.log.clone(),
        }
    }

    fn settle(&mut self, day: u32, source: &mut dyn PriceSource) -> Result<(), SimError> {
        let date = self.config.date_of(day);
        let prices = get_prices_per_unit_mass(source, date);
        let (masses, lucks): (Vec<u64>, Vec<Luck>) = self
            .vessels()
            .iter()
            .map(|v| (v.cargo().total_kg(), v.luck()))
            .unzip();
        let luck = Luck::mean(lucks);
        let factors = draw_sale_factors(luck, &mut self.rng);
        let sale = pooled_sale(&masses, &prices, factors)?;
        info!(
            day,
            %date,
            mass_kg = sale.total_mass_kg,
            revenue = %sale.total_revenue,
            luck = luck.value(),
            market_impact = factors.market_impact,
            trade_barrier = factors.trade_barrier,
            "pooled sale"
        );
        self.log.push(
            day,
            MissionPhase::Selling,
            EventCategory::Sale,
            format!(
                "pooled sale of {} kg for {} (market impact {:.3}, trade barrier {:.3})",
                sale.total_mass_kg, sale.total_revenue, factors.market_impact, factors.trade_barrier
            ),
        );

        let mut q = self.world.query::<&mut Vessel>();
        for mut v in q.iter_mut(&mut self.world) {
            let share = sale.share_for(v.cargo().total_kg());
            v.release_from_sale(day, share);
        }
        self.sale = Some(sale);
        self.prices = Some(prices);
        Ok(())
    }
}
