// Step graph and declarative transforms
//
// Every transform returns a new graph; nothing edits a graph in place. Connector wizards address
// the base graph by slot where they can, so a change in the base graph's length does not shift
// what they remove or replace.

use super::step::{Slot, StepDescriptor};

#[derive(Debug, Clone, Default)]
pub struct StepGraph {
    steps: Vec<StepDescriptor>,
}

impl StepGraph {
    pub fn new(steps: Vec<StepDescriptor>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.id).collect()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&StepDescriptor> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn position_of_slot(&self, slot: Slot) -> Option<usize> {
        self.steps.iter().position(|s| s.slot == slot)
    }

    /// Drop `count` steps starting at `from`; out-of-range parts are ignored.
    pub fn remove_range(&self, from: usize, count: usize) -> StepGraph {
        let from = from.min(self.steps.len());
        let to = from.saturating_add(count).min(self.steps.len());
        let mut steps = Vec::with_capacity(self.steps.len() - (to - from));
        steps.extend_from_slice(&self.steps[..from]);
        steps.extend_from_slice(&self.steps[to..]);
        StepGraph { steps }
    }

    /// Insert `new_steps` before `index` (clamped to the end).
    pub fn insert_at(&self, index: usize, new_steps: Vec<StepDescriptor>) -> StepGraph {
        let index = index.min(self.steps.len());
        let mut steps = Vec::with_capacity(self.steps.len() + new_steps.len());
        steps.extend_from_slice(&self.steps[..index]);
        steps.extend(new_steps);
        steps.extend_from_slice(&self.steps[index..]);
        StepGraph { steps }
    }

    /// Replace `count` steps at `index` with `new_steps`.
    pub fn replace_at(&self, index: usize, count: usize, new_steps: Vec<StepDescriptor>) -> StepGraph {
        self.remove_range(index, count).insert_at(index, new_steps)
    }

    /// Remove every step filling `slot`.
    pub fn remove_slot(&self, slot: Slot) -> StepGraph {
        StepGraph {
            steps: self.steps.iter().filter(|s| s.slot != slot).cloned().collect(),
        }
    }

    /// Replace the contiguous run of steps from slot `first` through slot
    /// `last` (inclusive) with `new_steps`. Unchanged when `first` is absent.
    pub fn replace_slots(&self, first: Slot, last: Slot, new_steps: Vec<StepDescriptor>) -> StepGraph {
        let Some(start) = self.position_of_slot(first) else {
            return self.clone();
        };
        let end = self.steps[start..]
            .iter()
            .rposition(|s| s.slot == last)
            .map(|i| start + i)
            .unwrap_or(start);
        self.replace_at(start, end - start + 1, new_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &'static str, slot: Slot) -> StepDescriptor {
        StepDescriptor::new(id, id, slot)
    }

    fn base() -> StepGraph {
        StepGraph::new(vec![
            step("a", Slot::System),
            step("b", Slot::Connector),
            step("c", Slot::Schema),
            step("d", Slot::Mapping),
            step("e", Slot::Summary),
        ])
    }

    #[test]
    fn remove_range_clamps_and_leaves_source_untouched() {
        let g = base();
        assert_eq!(g.remove_range(1, 2).ids(), vec!["a", "d", "e"]);
        assert_eq!(g.remove_range(4, 10).ids(), vec!["a", "b", "c", "d"]);
        assert_eq!(g.remove_range(9, 1).ids(), g.ids());
        assert_eq!(g.len(), 5);
    }

    #[test]
    fn insert_and_replace() {
        let g = base();
        let inserted = g.insert_at(1, vec![step("x", Slot::Bespoke), step("y", Slot::Bespoke)]);
        assert_eq!(inserted.ids(), vec!["a", "x", "y", "b", "c", "d", "e"]);

        let appended = g.insert_at(99, vec![step("z", Slot::Bespoke)]);
        assert_eq!(appended.ids().last(), Some(&"z"));

        let replaced = g.replace_at(0, 2, vec![step("x", Slot::Bespoke)]);
        assert_eq!(replaced.ids(), vec!["x", "c", "d", "e"]);
    }

    #[test]
    fn slot_transforms_survive_base_shape_changes() {
        let longer = base().insert_at(0, vec![step("pre", Slot::Bespoke)]);
        let g = longer
            .replace_slots(Slot::System, Slot::Connector, vec![step("conn", Slot::Bespoke)])
            .remove_slot(Slot::Schema);
        assert_eq!(g.ids(), vec!["pre", "conn", "d", "e"]);

        let missing = base().remove_slot(Slot::System);
        let unchanged = missing.replace_slots(Slot::System, Slot::Connector, vec![]);
        assert_eq!(unchanged.ids(), missing.ids());
    }
}
