use fnv::FnvHashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use super::error::ModelError;
use super::item::ConsumerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Provider,
    Consumer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRef {
    Provider,
    Consumer(ConsumerId),
}

impl AgentRef {
    pub fn kind(&self) -> AgentKind {
        match self {
            AgentRef::Provider => AgentKind::Provider,
            AgentRef::Consumer(_) => AgentKind::Consumer,
        }
    }
}

// Whatever owns the agents runs
// one agent's turn when asked
pub trait Activate {
    fn activate(&mut self, agent: AgentRef, rng: &mut StdRng) -> Result<(), ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    Idle,
    TickInProgress,
}

// Activates every agent of one kind before moving on
// to the next, in the order the kinds were first added.
// Order within a kind is reshuffled every step.
#[derive(Debug)]
pub struct TypeOrderedScheduler {
    agents: Vec<AgentRef>,
    kinds: Vec<AgentKind>,
    by_kind: FnvHashMap<AgentKind, Vec<AgentRef>>,
    state: ScheduleState,
    pub steps: usize,
}

impl TypeOrderedScheduler {
    pub fn new() -> TypeOrderedScheduler {
        TypeOrderedScheduler {
            agents: Vec::new(),
            kinds: Vec::new(),
            by_kind: FnvHashMap::default(),
            state: ScheduleState::Idle,
            steps: 0,
        }
    }

    pub fn add(&mut self, agent: AgentRef) {
        let kind = agent.kind();
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self.agents.push(agent);
        self.by_kind.entry(kind).or_insert_with(Vec::new).push(agent);
    }

    // Removes every occurrence of the agent.
    // Only possible between steps, since `step`
    // holds the scheduler for the whole tick.
    pub fn remove(&mut self, agent: AgentRef) -> bool {
        debug_assert_eq!(self.state, ScheduleState::Idle);
        let before = self.agents.len();
        self.agents.retain(|a| *a != agent);
        if let Some(bucket) = self.by_kind.get_mut(&agent.kind()) {
            bucket.retain(|a| *a != agent);
        }
        self.agents.len() != before
    }

    pub fn step<A: Activate>(&mut self, world: &mut A, rng: &mut StdRng) -> Result<(), ModelError> {
        self.state = ScheduleState::TickInProgress;
        let result = self.step_kinds(world, rng);
        self.state = ScheduleState::Idle;
        result?;
        self.steps += 1;
        Ok(())
    }

    fn step_kinds<A: Activate>(&mut self, world: &mut A, rng: &mut StdRng) -> Result<(), ModelError> {
        for kind in &self.kinds {
            if let Some(bucket) = self.by_kind.get_mut(kind) {
                bucket.shuffle(rng);
                for agent in bucket.iter() {
                    world.activate(*agent, rng)?;
                }
            }
        }
        Ok(())
    }

    pub fn agents_of(&self, kind: AgentKind) -> &[AgentRef] {
        self.by_kind.get(&kind).map(|b| b.as_slice()).unwrap_or(&[])
    }

    pub fn count(&self, kind: AgentKind) -> usize {
        self.agents_of(kind).len()
    }

    pub fn contains(&self, agent: AgentRef) -> bool {
        self.agents_of(agent.kind()).contains(&agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    // Records the activation order
    struct Log {
        order: Vec<AgentRef>,
        fail_on: Option<AgentRef>,
    }

    impl Activate for Log {
        fn activate(&mut self, agent: AgentRef, _rng: &mut StdRng) -> Result<(), ModelError> {
            if self.fail_on == Some(agent) {
                return Err(ModelError::UnknownConsumer(0));
            }
            self.order.push(agent);
            Ok(())
        }
    }

    fn scheduler(n_consumers: ConsumerId) -> TypeOrderedScheduler {
        let mut schedule = TypeOrderedScheduler::new();
        schedule.add(AgentRef::Provider);
        for id in 0..n_consumers {
            schedule.add(AgentRef::Consumer(id));
        }
        schedule
    }

    #[test]
    fn test_provider_goes_first() {
        let mut schedule = scheduler(20);
        let mut rng: StdRng = SeedableRng::seed_from_u64(0);
        for step in 0..10 {
            let mut log = Log { order: Vec::new(), fail_on: None };
            schedule.step(&mut log, &mut rng).unwrap();
            assert_eq!(log.order.len(), 21);
            assert_eq!(log.order[0], AgentRef::Provider);
            assert!(log.order[1..].iter().all(|a| a.kind() == AgentKind::Consumer));
            assert_eq!(schedule.steps, step + 1);
            assert_eq!(schedule.state, ScheduleState::Idle);
        }
    }

    #[test]
    fn test_shuffles_within_kind() {
        let mut schedule = scheduler(20);
        let mut rng: StdRng = SeedableRng::seed_from_u64(1);
        let mut orders = Vec::new();
        for _ in 0..5 {
            let mut log = Log { order: Vec::new(), fail_on: None };
            schedule.step(&mut log, &mut rng).unwrap();
            orders.push(log.order);
        }
        // 20! orderings; five identical draws would be a broken shuffle
        assert!(orders.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_same_seed_same_order() {
        let run = || {
            let mut schedule = scheduler(10);
            let mut rng: StdRng = SeedableRng::seed_from_u64(42);
            let mut log = Log { order: Vec::new(), fail_on: None };
            for _ in 0..3 {
                schedule.step(&mut log, &mut rng).unwrap();
            }
            log.order
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_remove() {
        let mut schedule = scheduler(3);
        schedule.add(AgentRef::Consumer(1));
        assert!(schedule.remove(AgentRef::Consumer(1)));
        assert!(!schedule.contains(AgentRef::Consumer(1)));
        assert!(schedule.agents.iter().all(|a| *a != AgentRef::Consumer(1)));
        assert_eq!(schedule.count(AgentKind::Consumer), 2);
        assert!(!schedule.remove(AgentRef::Consumer(1)));

        let mut rng: StdRng = SeedableRng::seed_from_u64(0);
        let mut log = Log { order: Vec::new(), fail_on: None };
        schedule.step(&mut log, &mut rng).unwrap();
        assert!(!log.order.contains(&AgentRef::Consumer(1)));
    }

    #[test]
    #[should_panic]
    fn test_remove_mid_tick() {
        let mut schedule = scheduler(2);
        schedule.state = ScheduleState::TickInProgress;
        schedule.remove(AgentRef::Consumer(0));
    }

    #[test]
    fn test_failed_step_does_not_count() {
        let mut schedule = scheduler(3);
        let mut rng: StdRng = SeedableRng::seed_from_u64(0);
        let mut log = Log { order: Vec::new(), fail_on: Some(AgentRef::Consumer(2)) };
        assert!(schedule.step(&mut log, &mut rng).is_err());
        assert_eq!(schedule.steps, 0);
        assert_eq!(schedule.state, ScheduleState::Idle);
    }
}
