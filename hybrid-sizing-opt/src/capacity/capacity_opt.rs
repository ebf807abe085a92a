use std::time::Instant;

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    variable,
};
use hybrid_model::{CapacityMix, HourlyBundle, Resource, Site};
use tracing::debug;

use crate::capacity::config::{ObjectiveWeights, SizingConfig, SolverBackend};
use crate::capacity::error::SizingResult;
use crate::general::profiles::validate_profile;

/// Result of one site solve
#[derive(Debug, Clone, PartialEq)]
pub enum SiteOutcome {
    Optimal(Box<OptimalSizing>),
    /// Infeasible, unbounded or failed solve; the site is skipped
    Infeasible { reason: String },
}

/// Capacities and hourly trajectories of an optimal solve
#[derive(Debug, Clone, PartialEq)]
pub struct OptimalSizing {
    pub capacity: CapacityMix,
    pub hourly: HourlyBundle,
    pub objective: f64,
    pub optimization_duration_ms: u128,
}

impl SiteOutcome {
    /// Chosen capacities, or the sentinel mix for an infeasible site
    pub fn capacity(&self) -> CapacityMix {
        match self {
            SiteOutcome::Optimal(sizing) => sizing.capacity,
            SiteOutcome::Infeasible { .. } => CapacityMix::infeasible(),
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, SiteOutcome::Infeasible { .. })
    }

    pub fn into_hourly(self) -> Option<HourlyBundle> {
        match self {
            SiteOutcome::Optimal(sizing) => Some(sizing.hourly),
            SiteOutcome::Infeasible { .. } => None,
        }
    }
}

struct CapacityVariables {
    pv: Variable,
    wind: Variable,
    storage: Variable,
}

/// One vector per decision family, indexed by hour
struct HourlyVariables {
    pv_dispatch: Vec<Variable>,
    wind_dispatch: Vec<Variable>,
    pv_reserve: Vec<Variable>,
    wind_reserve: Vec<Variable>,
    storage_charge: Vec<Variable>,
    storage_discharge: Vec<Variable>,
    storage_charge_reserve: Vec<Variable>,
    storage_discharge_reserve: Vec<Variable>,
    storage_energy: Vec<Variable>,
}

impl HourlyVariables {
    fn new(vars: &mut ProblemVariables, horizon: usize) -> Self {
        let mut hourly = || vars.add_vector(variable().min(0.0), horizon);
        Self {
            pv_dispatch: hourly(),
            wind_dispatch: hourly(),
            pv_reserve: hourly(),
            wind_reserve: hourly(),
            storage_charge: hourly(),
            storage_discharge: hourly(),
            storage_charge_reserve: hourly(),
            storage_discharge_reserve: hourly(),
            storage_energy: hourly(),
        }
    }
}

fn generate_objective(
    weights: &ObjectiveWeights,
    caps: &CapacityVariables,
    hourly: &HourlyVariables,
) -> Expression {
    let mut objective = Expression::default();

    objective += weights.pv * caps.pv;
    objective += weights.wind * caps.wind;
    objective += weights.storage * caps.storage;

    // Tie-breaker against needless cycling
    for (&charge, &discharge) in hourly.storage_charge.iter().zip(&hourly.storage_discharge) {
        objective += weights.throughput * charge + weights.throughput * discharge;
    }

    objective
}

/// Adds the constraints that are not time dependent
fn add_fixed_constraints<M>(
    mut model: M,
    config: &SizingConfig,
    site: &Site,
    caps: &CapacityVariables,
) -> M
where
    M: SolverModel,
{
    if config.enforce_potential_ceiling {
        let pv_ceiling = site.potential_mw(Resource::Solar);
        let wind_ceiling = site.potential_mw(Resource::Wind);
        model = model.with(constraint!(caps.pv <= pv_ceiling));
        model = model.with(constraint!(caps.wind <= wind_ceiling));
    }
    model
}

/// Adds the eight hourly constraint families
fn add_time_dependent_constraints<M>(
    mut model: M,
    config: &SizingConfig,
    pv_cf: &[f64],
    wind_cf: &[f64],
    caps: &CapacityVariables,
    hourly: &HourlyVariables,
) -> M
where
    M: SolverModel,
{
    let horizon = config.horizon_hours;
    let eta_in = config.charge_efficiency;
    let eta_out = config.discharge_efficiency;
    let eta_out_inv = config.inv_discharge_efficiency();
    let target_load = config.target_load;
    let reserve = config.reserve_requirement();
    let energy_ratio = config.storage_duration_hours;

    for t in 0..horizon {
        // Year wraps: hour 0 follows the last hour
        let prev = (t + horizon - 1) % horizon;

        // Generation headroom
        model = model.with(constraint!(
            hourly.pv_dispatch[t] + hourly.pv_reserve[t] <= caps.pv * pv_cf[t]
        ));
        model = model.with(constraint!(
            hourly.wind_dispatch[t] + hourly.wind_reserve[t] <= caps.wind * wind_cf[t]
        ));

        // Charge-side reserve is bounded by the current discharge
        model = model.with(constraint!(
            hourly.storage_charge_reserve[t] <= hourly.storage_discharge[t]
        ));

        // Storage power limits including reserves
        model = model.with(constraint!(
            hourly.storage_discharge_reserve[t] + hourly.storage_discharge[t]
                <= eta_out * caps.storage
        ));
        model = model.with(constraint!(
            hourly.storage_discharge_reserve[t] + hourly.storage_charge_reserve[t]
                <= eta_out * caps.storage
        ));

        // Firm energy balance
        model = model.with(constraint!(
            hourly.pv_dispatch[t] + hourly.wind_dispatch[t] + hourly.storage_discharge[t]
                == target_load + hourly.storage_charge[t]
        ));

        // Reserve margin
        model = model.with(constraint!(
            hourly.pv_reserve[t]
                + hourly.wind_reserve[t]
                + hourly.storage_discharge_reserve[t]
                + hourly.storage_charge_reserve[t]
                >= reserve
        ));

        // Energy capacity from the duration ratio
        model = model.with(constraint!(
            hourly.storage_energy[t] <= energy_ratio * caps.storage
        ));

        // Cyclic storage balance
        model = model.with(constraint!(
            hourly.storage_energy[t]
                == hourly.storage_energy[prev] + eta_in * hourly.storage_charge[t]
                    - eta_out_inv * hourly.storage_discharge[t]
        ));

        // Charge and discharge power
        model = model.with(constraint!(hourly.storage_charge[t] <= caps.storage));
        model = model.with(constraint!(
            eta_out_inv * hourly.storage_discharge[t] <= caps.storage
        ));
    }

    model
}

/// Formats the optimization solution into an [`OptimalSizing`]
fn format_solution_results(
    solution: &impl Solution,
    weights: &ObjectiveWeights,
    caps: &CapacityVariables,
    hourly: &HourlyVariables,
    optimization_duration: std::time::Duration,
) -> OptimalSizing {
    let values =
        |vars: &[Variable]| -> Vec<f64> { vars.iter().map(|&v| solution.value(v)).collect() };

    let capacity = CapacityMix {
        pv_capacity_mw: solution.value(caps.pv).max(0.0),
        wind_capacity_mw: solution.value(caps.wind).max(0.0),
        storage_power_mw: solution.value(caps.storage).max(0.0),
    };
    let bundle = HourlyBundle {
        storage_charge: values(&hourly.storage_charge),
        storage_discharge: values(&hourly.storage_discharge),
        storage_energy: values(&hourly.storage_energy),
        pv_dispatch: values(&hourly.pv_dispatch),
        wind_dispatch: values(&hourly.wind_dispatch),
    };

    let throughput: f64 = bundle
        .storage_charge
        .iter()
        .zip(&bundle.storage_discharge)
        .map(|(c, d)| c + d)
        .sum();
    let objective = weights.pv * capacity.pv_capacity_mw
        + weights.wind * capacity.wind_capacity_mw
        + weights.storage * capacity.storage_power_mw
        + weights.throughput * throughput;

    OptimalSizing {
        capacity,
        hourly: bundle,
        objective,
        optimization_duration_ms: optimization_duration.as_millis(),
    }
}

fn solve_model<M>(
    model: M,
    weights: &ObjectiveWeights,
    caps: &CapacityVariables,
    hourly: &HourlyVariables,
) -> SiteOutcome
where
    M: SolverModel<Error = ResolutionError>,
{
    let start_time = Instant::now();
    let opt_result = model.solve();
    let optimization_duration = start_time.elapsed();

    match opt_result {
        Ok(solution) => SiteOutcome::Optimal(Box::new(format_solution_results(
            &solution,
            weights,
            caps,
            hourly,
            optimization_duration,
        ))),
        Err(e) => SiteOutcome::Infeasible {
            reason: e.to_string(),
        },
    }
}

/// Sizes solar, wind and storage for one site.
///
/// Builds the hourly LP over `config.horizon_hours` and solves it with the
/// configured interior-point backend. Profiles longer than the horizon are cut,
/// shorter ones fail with [`SizingError::MalformedProfile`](crate::capacity::SizingError).
/// A solve that does not end optimal is returned as [`SiteOutcome::Infeasible`],
/// never as an error.
pub fn optimize(
    site: &Site,
    pv_cf: &[f64],
    wind_cf: &[f64],
    config: &SizingConfig,
) -> SizingResult<SiteOutcome> {
    config.validate()?;
    let horizon = config.horizon_hours;
    let pv_cf = validate_profile(&site.key, Resource::Solar, pv_cf, horizon)?;
    let wind_cf = validate_profile(&site.key, Resource::Wind, wind_cf, horizon)?;

    let mut vars = ProblemVariables::new();
    let caps = CapacityVariables {
        pv: vars.add(variable().min(0.0)),
        wind: vars.add(variable().min(0.0)),
        storage: vars.add(variable().min(0.0)),
    };
    let hourly = HourlyVariables::new(&mut vars, horizon);

    let weights = config.objective_weights();
    let objective = generate_objective(&weights, &caps, &hourly);
    let problem = vars.minimise(objective);

    let outcome = match config.backend {
        SolverBackend::HighsIpm => {
            let mut model = problem
                .using(good_lp::highs)
                .set_option("solver", "ipm")
                .set_option("run_crossover", "off");
            model = add_fixed_constraints(model, config, site, &caps);
            model = add_time_dependent_constraints(model, config, pv_cf, wind_cf, &caps, &hourly);
            solve_model(model, &weights, &caps, &hourly)
        }
        SolverBackend::Clarabel => {
            let mut model = problem.using(good_lp::clarabel);
            model = add_fixed_constraints(model, config, site, &caps);
            model = add_time_dependent_constraints(model, config, pv_cf, wind_cf, &caps, &hourly);
            solve_model(model, &weights, &caps, &hourly)
        }
    };

    match &outcome {
        SiteOutcome::Optimal(sizing) => debug!(
            site = %site.key,
            pv_mw = sizing.capacity.pv_capacity_mw,
            wind_mw = sizing.capacity.wind_capacity_mw,
            storage_mw = sizing.capacity.storage_power_mw,
            balance_residual = sizing.hourly.max_balance_residual(config.target_load),
            duration_ms = sizing.optimization_duration_ms as u64,
            "site solved"
        ),
        SiteOutcome::Infeasible { reason } => {
            debug!(site = %site.key, %reason, "site has no optimal solution")
        }
    }

    Ok(outcome)
}
