//! Behavior trees.
//!
//! A tree is built from [`Node`]s and evaluated once per sub-step against a
//! [`BehaviorContext`]. Leaves read and write the entity's intent fields and
//! its [`Blackboard`]; anything written with `set_transient` is dropped after
//! the run so only durable memory survives to the next sub-step.

/// The prey tree.
pub mod prey;

use rand::rngs::StdRng;
use tw_core::blackboard::Blackboard;
use tw_core::entity::Entity;
use tw_core::world::World;

use crate::config::RulesConfig;

/// Result of evaluating a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The node did what it set out to do.
    Success,
    /// The node could not apply.
    Failure,
    /// The node is working and wants to be evaluated again.
    Running,
}

/// Everything a leaf may look at or change.
pub struct BehaviorContext<'a> {
    /// The agent, detached from the store.
    pub entity: &'a mut Entity,
    /// The agent's memory.
    pub blackboard: &'a mut Blackboard,
    /// The rest of the world.
    pub world: &'a World,
    /// Gameplay constants.
    pub rules: &'a RulesConfig,
    /// Sub-step length in world hours.
    pub hours: f64,
    /// Simulation RNG.
    pub rng: &'a mut StdRng,
}

/// A predicate leaf.
pub type ConditionFn = fn(&mut BehaviorContext<'_>) -> bool;

/// An action leaf.
pub type ActionFn = fn(&mut BehaviorContext<'_>) -> Status;

/// A behavior tree node.
pub enum Node {
    /// Runs children in order until one does not succeed.
    Sequence(Vec<Node>),
    /// Runs children in order until one does not fail.
    Selector(Vec<Node>),
    /// Succeeds when the predicate holds, fails otherwise.
    Condition(&'static str, ConditionFn),
    /// Runs an action.
    Action(&'static str, ActionFn),
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence(children) => f.debug_tuple("Sequence").field(children).finish(),
            Self::Selector(children) => f.debug_tuple("Selector").field(children).finish(),
            Self::Condition(name, _) => write!(f, "Condition({name})"),
            Self::Action(name, _) => write!(f, "Action({name})"),
        }
    }
}

impl Node {
    /// Evaluate this node and, for composites, its children.
    pub fn tick(&self, ctx: &mut BehaviorContext<'_>) -> Status {
        match self {
            Self::Sequence(children) => {
                for child in children {
                    let status = child.tick(ctx);
                    if status != Status::Success {
                        return status;
                    }
                }
                Status::Success
            }
            Self::Selector(children) => {
                for child in children {
                    let status = child.tick(ctx);
                    if status != Status::Failure {
                        return status;
                    }
                }
                Status::Failure
            }
            Self::Condition(_, check) => {
                if check(ctx) {
                    Status::Success
                } else {
                    Status::Failure
                }
            }
            Self::Action(_, act) => act(ctx),
        }
    }
}

/// A root node plus the blackboard handling around it.
#[derive(Debug)]
pub struct BehaviorTree {
    root: Node,
}

impl BehaviorTree {
    /// Wrap a root node.
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Run the tree once for `entity`.
    ///
    /// The entity's blackboard is created on first use and has its transient
    /// entries stripped before it is put back.
    pub fn run(
        &self,
        entity: &mut Entity,
        world: &World,
        rules: &RulesConfig,
        hours: f64,
        rng: &mut StdRng,
    ) -> Status {
        let mut blackboard = entity.behavior.take().unwrap_or_default();
        let status = {
            let mut ctx = BehaviorContext {
                entity: &mut *entity,
                blackboard: &mut blackboard,
                world,
                rules,
                hours,
                rng,
            };
            self.root.tick(&mut ctx)
        };
        blackboard.strip_transient();
        entity.behavior = Some(blackboard);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use tw_core::blackboard::BlackboardValue;
    use tw_core::component::Gender;
    use tw_core::vector::{MapSize, Vec2};

    use crate::factory;

    fn bump(ctx: &mut BehaviorContext<'_>) -> Status {
        let n = match ctx.blackboard.get("count") {
            Some(BlackboardValue::Number(n)) => n,
            _ => 0.0,
        };
        ctx.blackboard.set("count", BlackboardValue::Number(n + 1.0));
        Status::Success
    }

    fn mark(ctx: &mut BehaviorContext<'_>) -> Status {
        ctx.blackboard
            .set_transient("scratch", BlackboardValue::Flag(true));
        Status::Running
    }

    fn run(tree: &BehaviorTree) -> (Status, Entity) {
        let mut w = World::new(MapSize::new(200.0, 200.0).unwrap(), 20.0).unwrap();
        let id = factory::spawn_prey(&mut w, Vec2::ZERO, Gender::Male, 3.0);
        let mut e = w.entities.take(id).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let status = tree.run(&mut e, &w, &RulesConfig::default(), 0.01, &mut rng);
        (status, e)
    }

    fn count(e: &Entity) -> Option<BlackboardValue> {
        e.behavior.as_ref().and_then(|b| b.get("count"))
    }

    #[test]
    fn sequence_stops_at_first_failure() {
        let tree = BehaviorTree::new(Node::Sequence(vec![
            Node::Action("bump", bump),
            Node::Condition("never", |_| false),
            Node::Action("bump", bump),
        ]));
        let (status, e) = run(&tree);
        assert_eq!(status, Status::Failure);
        assert_eq!(count(&e), Some(BlackboardValue::Number(1.0)));
    }

    #[test]
    fn selector_stops_at_first_non_failure() {
        let tree = BehaviorTree::new(Node::Selector(vec![
            Node::Condition("never", |_| false),
            Node::Action("mark", mark),
            Node::Action("bump", bump),
        ]));
        let (status, e) = run(&tree);
        assert_eq!(status, Status::Running);
        assert_eq!(count(&e), None);
    }

    #[test]
    fn transient_entries_do_not_survive_a_run() {
        let tree = BehaviorTree::new(Node::Sequence(vec![
            Node::Action("bump", bump),
            Node::Action("mark", mark),
        ]));
        let (_, e) = run(&tree);
        let bb = e.behavior.as_ref().unwrap();
        assert!(bb.get("scratch").is_none());
        assert_eq!(bb.durable_len(), 1);
    }
}
