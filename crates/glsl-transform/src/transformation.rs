//! A `Transformation`'s ordered registry of phases, and the collector that
//! turns several registered transformations into one run order.

use crate::ast;
use crate::error::Result;
use crate::node::AstNode;
use crate::phase::Phase;
use crate::phase::PhaseEnv;
use crate::phase::PhaseShape;
use crate::phase::PhaseState;
use crate::root::Root;

/// One registered phase plus its scheduling coordinates.
struct PhaseEntry {
    phase: Box<dyn Phase>,
    index: u32,
    group: u32,
    state: PhaseState,
    /// Breaks ties within an equal `(index, group)` — insertion order.
    sequence: u64,
}

/// An ordered registry of phases. `index` controls run order; phases
/// sharing `(index, group)` are walk-fused into one traversal.
pub struct Transformation {
    entries: Vec<PhaseEntry>,
    next_index: u32,
    default_group: u32,
    next_sequence: u64,
    reset_hook: Option<Box<dyn FnMut()>>,
}

impl Default for Transformation {
    fn default() -> Self {
        Transformation::new()
    }
}

impl Transformation {
    /// An empty transformation; the first `addPhase` gets index 1.
    pub fn new() -> Self {
        Transformation {
            entries: Vec::new(),
            next_index: 1,
            default_group: 0,
            next_sequence: 0,
            reset_hook: None,
        }
    }

    /// Registers a callback invoked by `reset_state` on every run, for
    /// clearing accumulator-style inter-phase fields that live outside any
    /// single phase (e.g. a job-parameters list several phases append to).
    /// Phase-local state should instead be reset from within the phase's
    /// own `run`/`enter`, not through this hook.
    pub fn on_reset(&mut self, hook: impl FnMut() + 'static) -> &mut Self {
        self.reset_hook = Some(Box::new(hook));
        self
    }

    fn push(&mut self, index: u32, group: u32, phase: Box<dyn Phase>) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(PhaseEntry {
            phase,
            index,
            group,
            state: PhaseState::Created,
            sequence,
        });
    }

    /// Registers `phase` at the next monotonic index and this
    /// transformation's default group.
    pub fn add_phase(&mut self, phase: impl Phase + 'static) -> &mut Self {
        let index = self.next_index;
        self.next_index += 1;
        self.push(index, self.default_group, Box::new(phase));
        self
    }

    /// Registers `phase` at an explicit `index`, default group.
    pub fn add_phase_at(&mut self, index: u32, phase: impl Phase + 'static) -> &mut Self {
        self.next_index = self.next_index.max(index + 1);
        self.push(index, self.default_group, Box::new(phase));
        self
    }

    /// Registers `phase` at an explicit `(index, group)`.
    pub fn add_phase_in_group(&mut self, index: u32, group: u32, phase: impl Phase + 'static) -> &mut Self {
        self.next_index = self.next_index.max(index + 1);
        self.push(index, group, Box::new(phase));
        self
    }

    /// Registers `phase` re-using the previous entry's index (clamped to a
    /// minimum of 1), so it fuses into the same walk traversal.
    pub fn add_concurrent_phase(&mut self, phase: impl Phase + 'static) -> &mut Self {
        let index = self.next_index.saturating_sub(1).max(1);
        self.push(index, self.default_group, Box::new(phase));
        self
    }

    /// Imports `other`'s entries verbatim, interleaved with this
    /// transformation's own by `(index, group)` at run time.
    pub fn merge(&mut self, other: Transformation) -> &mut Self {
        for entry in other.entries {
            let sequence = self.next_sequence;
            self.next_sequence += 1;
            self.entries.push(PhaseEntry { sequence, ..entry });
        }
        self.next_index = self.next_index.max(other.next_index);
        self
    }

    /// Imports `other`'s entries with their indices shifted past this
    /// transformation's current tail, so `other`'s phases run strictly
    /// after this transformation's own.
    pub fn append(&mut self, other: Transformation) -> &mut Self {
        let shift = self.next_index - 1;
        for entry in other.entries {
            let sequence = self.next_sequence;
            self.next_sequence += 1;
            self.entries.push(PhaseEntry {
                index: entry.index + shift,
                sequence,
                ..entry
            });
        }
        self.next_index += other.next_index - 1;
        self
    }

    /// Invokes the `on_reset` hook, if any. Called by [`PhaseCollector::run`]
    /// before each run. Does not touch any phase's lifecycle state —
    /// `init` still runs at most once per bound collector, independent of
    /// how many runs follow.
    pub fn reset_state(&mut self) {
        if let Some(hook) = &mut self.reset_hook {
            hook();
        }
    }
}

/// Drives one or more registered [`Transformation`]s over a single AST run.
#[derive(Default)]
pub struct PhaseCollector {
    transformations: Vec<Transformation>,
}

impl PhaseCollector {
    /// An empty collector.
    pub fn new() -> Self {
        PhaseCollector::default()
    }

    /// Registers a transformation to be driven by every future `run`.
    pub fn register(&mut self, transformation: Transformation) {
        self.transformations.push(transformation);
    }

    /// How many transformations are registered.
    pub fn len(&self) -> usize {
        self.transformations.len()
    }

    /// Whether no transformations are registered.
    pub fn is_empty(&self) -> bool {
        self.transformations.is_empty()
    }

    /// Runs every registered transformation's phases, in the lexicographic
    /// order of `(index, group, insertion order)`, over `unit`. Walk phases
    /// sharing `(index, group)` are fused into one traversal.
    pub fn run(&mut self, root: &Root, unit: &ast::TranslationUnit) -> Result<()> {
        for t in &mut self.transformations {
            t.reset_state();
        }

        // Borrow entries mutably across all transformations, pre-sorted.
        let mut runs: Vec<(u32, u32, u64, usize, usize)> = Vec::new();
        for (ti, t) in self.transformations.iter().enumerate() {
            for (ei, entry) in t.entries.iter().enumerate() {
                runs.push((entry.index, entry.group, entry.sequence, ti, ei));
            }
        }
        runs.sort_by_key(|&(index, group, sequence, _, _)| (index, group, sequence));
        tracing::debug!(order = ?runs.iter().map(|r| (r.0, r.1)).collect::<Vec<_>>(), "resolved phase run order");

        let mut i = 0;
        while i < runs.len() {
            let (index, group, ..) = runs[i];
            let mut fused_run: Vec<(usize, usize)> = Vec::new();
            while i < runs.len() && runs[i].0 == index && runs[i].1 == group {
                fused_run.push((runs[i].3, runs[i].4));
                i += 1;
            }
            self.run_fused_group(root, unit, &fused_run)?;
        }
        Ok(())
    }

    fn run_fused_group(&mut self, root: &Root, unit: &ast::TranslationUnit, group: &[(usize, usize)]) -> Result<()> {
        // `init`, then activity check, for every entry in this fused group.
        let mut active_indices = Vec::new();
        for &(ti, ei) in group {
            let entry = &mut self.transformations[ti].entries[ei];
            if entry.state == PhaseState::Created {
                let mut init_env = PhaseEnv::new(root, unit, true);
                entry.phase.init(&mut init_env)?;
                entry.state = PhaseState::Initialized;
            }
            let probe_env = PhaseEnv::new(root, unit, true);
            let active = entry.phase.is_active(&probe_env);
            entry.state = if active { PhaseState::Active } else { PhaseState::Skipped };
            if active {
                active_indices.push((ti, ei));
            }
        }

        let walk_indices: Vec<(usize, usize)> = active_indices
            .iter()
            .copied()
            .filter(|&(ti, ei)| self.transformations[ti].entries[ei].phase.shape() == PhaseShape::Walk)
            .collect();
        let run_indices: Vec<(usize, usize)> = active_indices
            .iter()
            .copied()
            .filter(|&(ti, ei)| self.transformations[ti].entries[ei].phase.shape() == PhaseShape::Run)
            .collect();

        for &(ti, ei) in &run_indices {
            let mut env = PhaseEnv::new(root, unit, true);
            self.transformations[ti].entries[ei].phase.run(&mut env)?;
        }

        if !walk_indices.is_empty() {
            self.walk_fused(root, unit, &walk_indices)?;
        }

        for &(ti, ei) in group {
            let entry = &mut self.transformations[ti].entries[ei];
            if entry.state == PhaseState::Active {
                entry.state = PhaseState::Initialized;
            }
        }
        Ok(())
    }

    fn walk_fused(&mut self, root: &Root, unit: &ast::TranslationUnit, phases: &[(usize, usize)]) -> Result<()> {
        self.walk_node(root, unit, unit.syntax().clone(), phases)
    }

    fn walk_node(
        &mut self,
        root: &Root,
        unit: &ast::TranslationUnit,
        node: crate::node::Node,
        phases: &[(usize, usize)],
    ) -> Result<()> {
        for &(ti, ei) in phases {
            let mut env = PhaseEnv::new(root, unit, true);
            self.transformations[ti].entries[ei].phase.enter(&mut env, &node)?;
        }
        for child in node.children() {
            self.walk_node(root, unit, child, phases)?;
        }
        for &(ti, ei) in phases {
            let mut env = PhaseEnv::new(root, unit, true);
            self.transformations[ti].entries[ei].phase.exit(&mut env, &node)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Noop;
    impl Phase for Noop {
        fn shape(&self) -> PhaseShape {
            PhaseShape::Run
        }
    }

    #[test]
    fn add_phase_assigns_monotonic_indices() {
        let mut t = Transformation::new();
        t.add_phase(Noop).add_phase(Noop).add_concurrent_phase(Noop);
        assert_eq!(t.entries.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 2, 2]);
    }

    #[test]
    fn append_shifts_indices_past_tail() {
        let mut a = Transformation::new();
        a.add_phase(Noop).add_phase(Noop);
        let mut b = Transformation::new();
        b.add_phase(Noop);
        a.append(b);
        assert_eq!(a.entries.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn merge_imports_entries_verbatim() {
        let mut a = Transformation::new();
        a.add_phase(Noop);
        let mut b = Transformation::new();
        b.add_phase(Noop);
        a.merge(b);
        assert_eq!(a.entries.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 1]);
    }
}
