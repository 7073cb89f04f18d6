// src/solver/propagators.rs

//! Bounds propagation for precedence, makespan and cumulative resources.

use tracing::trace;

use crate::model::Problem;
use crate::solver::domains::{Domains, EmptyDomain};
use crate::types::VarId;

/// Why a propagation round failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Inconsistency {
    EmptyDomain(EmptyDomain),
    /// Compulsory parts exceed `capacity` of `resource` at `time`.
    Overload { resource: usize, time: i64 },
}

impl From<EmptyDomain> for Inconsistency {
    fn from(e: EmptyDomain) -> Self {
        Inconsistency::EmptyDomain(e)
    }
}

/// `Ok(true)` when at least one domain changed.
pub(crate) type PropagationResult = Result<bool, Inconsistency>;

/// `start(after) >= start(before) + dur(before)` in both directions.
pub(crate) fn propagate_precedences(
    problem: &Problem,
    vars: &[VarId],
    domains: &mut Domains,
) -> PropagationResult {
    let mut changed = false;
    for (before, after) in problem.graph().edges() {
        let duration = problem.tasks()[before].duration;

        let earliest = domains.bounds(vars[before]).lower + duration;
        changed |= domains.tighten_lower(vars[after], earliest)?;

        let latest = domains.bounds(vars[after]).upper - duration;
        changed |= domains.tighten_upper(vars[before], latest)?;
    }
    Ok(changed)
}

/// Every task must complete by `makespan`.
pub(crate) fn propagate_makespan_bound(
    problem: &Problem,
    vars: &[VarId],
    domains: &mut Domains,
    makespan: i64,
) -> PropagationResult {
    let mut changed = false;
    for (task, &var) in problem.tasks().iter().zip(vars) {
        changed |= domains.tighten_upper(var, makespan - task.duration)?;
    }
    Ok(changed)
}

/// A maximal interval `[start, end)` of constant, non-zero resource usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProfileRect {
    start: i64,
    end: i64,
    height: i64,
}

/// Compulsory part of a task with bounds `[lb, ub]`: `[ub, lb + dur)`.
fn compulsory_part(lower: i64, upper: i64, duration: i64) -> Option<(i64, i64)> {
    let end = lower + duration;
    (upper < end).then_some((upper, end))
}

/// Sweep the compulsory parts of all tasks demanding resource `r` into a
/// sorted list of usage rectangles. Work is proportional to the number of
/// tasks, never to the horizon.
fn build_profile(
    problem: &Problem,
    vars: &[VarId],
    domains: &Domains,
    r: usize,
) -> Vec<ProfileRect> {
    let mut points: Vec<(i64, i64)> = Vec::new();
    for (task, &var) in problem.tasks().iter().zip(vars) {
        let demand = task.demands[r];
        if demand == 0 {
            continue;
        }
        let b = domains.bounds(var);
        if let Some((start, end)) = compulsory_part(b.lower, b.upper, task.duration) {
            points.push((start, demand));
            points.push((end, -demand));
        }
    }
    points.sort_unstable();

    let mut profile = Vec::new();
    let mut height = 0;
    let mut i = 0;
    while i < points.len() {
        let time = points[i].0;
        while i < points.len() && points[i].0 == time {
            height += points[i].1;
            i += 1;
        }
        if height > 0 {
            if let Some(&(next, _)) = points.get(i) {
                profile.push(ProfileRect {
                    start: time,
                    end: next,
                    height,
                });
            }
        }
    }
    profile
}

/// Time-table reasoning over compulsory parts.
///
/// For each resource the compulsory parts are swept into a profile; an
/// overload fails, otherwise each task's lower bound is pushed past every
/// rectangle where it cannot fit next to the others.
pub(crate) fn propagate_time_table(
    problem: &Problem,
    vars: &[VarId],
    domains: &mut Domains,
) -> PropagationResult {
    let mut changed = false;

    for (r, resource) in problem.resources().iter().enumerate() {
        let profile = build_profile(problem, vars, domains, r);

        if let Some(rect) = profile.iter().find(|p| p.height > resource.capacity) {
            return Err(Inconsistency::Overload {
                resource: r,
                time: rect.start,
            });
        }

        for (task, &var) in problem.tasks().iter().zip(vars) {
            let demand = task.demands[r];
            if demand == 0 || task.duration == 0 || domains.is_fixed(var) {
                continue;
            }
            let b = domains.bounds(var);
            // Own part boundaries are sweep points, so it covers whole rectangles.
            let own = |p: &ProfileRect| match compulsory_part(b.lower, b.upper, task.duration) {
                Some((s, e)) if s <= p.start && p.end <= e => demand,
                _ => 0,
            };

            let mut start = b.lower;
            while start <= b.upper {
                let blocking = profile.iter().find(|p| {
                    p.start < start + task.duration
                        && start < p.end
                        && p.height - own(p) + demand > resource.capacity
                });
                match blocking {
                    Some(p) => start = p.end,
                    None => break,
                }
            }

            if start > b.lower {
                trace!(task = task.id, from = b.lower, to = start, "time-table raised lower bound");
                changed |= domains.tighten_lower(var, start)?;
            }
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin::from_columns;
    use crate::config::builtin_instance;
    use crate::types::Bounds;

    fn pair() -> (Problem, Domains, Vec<VarId>) {
        let problem = Problem::from_instance(&builtin_instance("pair").unwrap());
        let mut domains = Domains::new();
        let vars = problem
            .tasks()
            .iter()
            .map(|t| domains.new_var(0, problem.horizon() - t.duration))
            .collect();
        (problem, domains, vars)
    }

    #[test]
    fn precedence_pushes_successor() {
        let (problem, mut domains, vars) = pair();
        assert_eq!(propagate_precedences(&problem, &vars, &mut domains), Ok(true));
        // horizon 7: A in [0, 4], B in [0, 3] before propagation
        assert_eq!(domains.bounds(vars[1]), Bounds::new(3, 3));
        assert_eq!(domains.bounds(vars[0]), Bounds::new(0, 0));
    }

    #[test]
    fn makespan_bound_can_empty_a_domain() {
        let (problem, mut domains, vars) = pair();
        let res = propagate_makespan_bound(&problem, &vars, &mut domains, 3);
        assert!(matches!(res, Err(Inconsistency::EmptyDomain(_))));
    }

    #[test]
    fn overlapping_fixed_tasks_overload() {
        let (problem, mut domains, vars) = pair();
        domains.fix(vars[0], 0).unwrap();
        domains.fix(vars[1], 1).unwrap();
        let res = propagate_time_table(&problem, &vars, &mut domains);
        assert_eq!(res, Err(Inconsistency::Overload { resource: 0, time: 1 }));
    }

    #[test]
    fn time_table_skips_occupied_slots() {
        let (problem, mut domains, vars) = pair();
        domains.fix(vars[1], 0).unwrap();
        // A (duration 3) cannot overlap B in [0, 4).
        assert_eq!(propagate_time_table(&problem, &vars, &mut domains), Ok(true));
        assert_eq!(domains.bounds(vars[0]), Bounds::new(4, 4));
    }

    #[test]
    fn profile_merges_overlapping_compulsory_parts() {
        let problem = Problem::from_instance(
            &from_columns(
                "stacked",
                Some(10),
                &[("crew", 3)],
                &["A", "B"],
                &[4, 4],
                &[&[], &[]],
                &[&[1], &[2]],
            )
            .unwrap(),
        );
        let mut domains = Domains::new();
        let a = domains.new_var(0, 6);
        let b = domains.new_var(0, 6);
        domains.fix(a, 0).unwrap();
        domains.tighten_lower(b, 2).unwrap();
        domains.tighten_upper(b, 3).unwrap();

        // A occupies [0, 4), B certainly occupies [3, 6).
        let profile = build_profile(&problem, &[a, b], &domains, 0);
        assert_eq!(
            profile,
            vec![
                ProfileRect { start: 0, end: 3, height: 1 },
                ProfileRect { start: 3, end: 4, height: 3 },
                ProfileRect { start: 4, end: 6, height: 2 },
            ]
        );
    }

    #[test]
    fn time_table_cost_does_not_depend_on_horizon() {
        let horizon = 4_000_000_000_000;
        let problem = Problem::from_instance(
            &from_columns(
                "wide",
                Some(horizon),
                &[("machine", 1)],
                &["A", "B"],
                &[3, 4],
                &[&[], &[]],
                &[&[1], &[1]],
            )
            .unwrap(),
        );
        let mut domains = Domains::new();
        let vars: Vec<VarId> = problem
            .tasks()
            .iter()
            .map(|t| domains.new_var(0, problem.horizon() - t.duration))
            .collect();
        domains.fix(vars[1], horizon - 4).unwrap();

        assert_eq!(propagate_time_table(&problem, &vars, &mut domains), Ok(false));
        // A in [h-5, h-3] certainly runs at h-3, on top of B.
        domains.tighten_lower(vars[0], horizon - 5).unwrap();
        assert_eq!(
            propagate_time_table(&problem, &vars, &mut domains),
            Err(Inconsistency::Overload {
                resource: 0,
                time: horizon - 3
            })
        );
    }
}
