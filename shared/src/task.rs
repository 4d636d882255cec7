use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// What a task asks the scheduler to do with it after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStep {
    /// Run again next step
    Cont,
    /// Remove the task
    Done,
}

pub type TaskFn<C> = Box<dyn FnMut(&mut C, &mut TaskContext<'_, C>) -> TaskStep>;

/// Per-step view handed to a running task: the scheduler clock plus a
/// mutation surface that is safe while the step loop iterates. Adds land
/// in a pending list and join at the end of the step; removes take effect
/// before the named tasks next run.
pub struct TaskContext<'m, C> {
    pub now: f64,
    /// Seconds since this task first ran.
    pub elapsed: f64,
    /// Completed runs of this task before the current one.
    pub run_count: u64,
    ops: &'m mut TaskOps<C>,
}

impl<'m, C> TaskContext<'m, C> {
    pub fn add(
        &mut self,
        name: &str,
        sort: i32,
        func: impl FnMut(&mut C, &mut TaskContext<'_, C>) -> TaskStep + 'static,
    ) {
        self.ops.adds.push(NewTask {
            name: name.to_string(),
            sort,
            wake: None,
            func: Box::new(func),
        });
    }

    pub fn do_later(
        &mut self,
        delay: f64,
        name: &str,
        sort: i32,
        func: impl FnMut(&mut C, &mut TaskContext<'_, C>) -> TaskStep + 'static,
    ) {
        self.ops.adds.push(NewTask {
            name: name.to_string(),
            sort,
            wake: Some(self.now + delay),
            func: Box::new(func),
        });
    }

    /// Queues removal of every task with the name, including ones later in
    /// the current step.
    pub fn remove(&mut self, name: &str) {
        self.ops.removes.push(name.to_string());
    }
}

struct NewTask<C> {
    name: String,
    sort: i32,
    wake: Option<f64>,
    func: TaskFn<C>,
}

struct TaskOps<C> {
    adds: Vec<NewTask<C>>,
    removes: Vec<String>,
}

impl<C> Default for TaskOps<C> {
    fn default() -> Self {
        Self {
            adds: Vec::new(),
            removes: Vec::new(),
        }
    }
}

struct Task<C> {
    name: String,
    sort: i32,
    seq: u64,
    started: Option<f64>,
    run_count: u64,
    func: TaskFn<C>,
}

struct DoLater<C> {
    wake: f64,
    task: Task<C>,
}

impl<C> PartialEq for DoLater<C> {
    fn eq(&self, other: &Self) -> bool {
        self.task.seq == other.task.seq
    }
}

impl<C> Eq for DoLater<C> {}

impl<C> PartialOrd for DoLater<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for DoLater<C> {
    // Reversed so the BinaryHeap pops the earliest wake first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .wake
            .total_cmp(&self.wake)
            .then_with(|| other.task.seq.cmp(&self.task.seq))
    }
}

/// A single-threaded cooperative scheduler generic over a context type.
///
/// Time is injected: `step(ctx, now)` runs every due task once, in sort
/// order (stable within equal sorts). There is no internal clock, so tests
/// drive the scheduler with whatever timeline they need.
pub struct TaskManager<C> {
    tasks: Vec<Task<C>>,
    later: BinaryHeap<DoLater<C>>,
    seq: u64,
}

impl<C> Default for TaskManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TaskManager<C> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            later: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Adds a task that runs every step. Duplicate names are allowed; all
    /// of them run and `remove` takes all of them.
    pub fn add(
        &mut self,
        name: &str,
        sort: i32,
        func: impl FnMut(&mut C, &mut TaskContext<'_, C>) -> TaskStep + 'static,
    ) {
        let task = self.make_task(name, sort, Box::new(func));
        self.tasks.push(task);
    }

    /// Adds a task that first runs at the earliest step whose `now` is at
    /// least `delay` seconds past the current heap insertion time, given as
    /// `now`.
    pub fn do_later(
        &mut self,
        now: f64,
        delay: f64,
        name: &str,
        sort: i32,
        func: impl FnMut(&mut C, &mut TaskContext<'_, C>) -> TaskStep + 'static,
    ) {
        let task = self.make_task(name, sort, Box::new(func));
        self.later.push(DoLater {
            wake: now + delay,
            task,
        });
    }

    /// Removes every task with the name, waiting or active, and returns
    /// how many were removed. An unknown name removes nothing and returns
    /// zero.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.tasks.len() + self.later.len();
        self.tasks.retain(|t| t.name != name);
        self.later.retain(|l| l.task.name != name);
        before - self.tasks.len() - self.later.len()
    }

    pub fn has_task(&self, name: &str) -> bool {
        self.tasks.iter().any(|t| t.name == name)
            || self.later.iter().any(|l| l.task.name == name)
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len() + self.later.len()
    }

    /// Runs every due task once. Tasks added from inside a step join at
    /// the end of the step; removals from inside a step stop the named
    /// tasks before they next run.
    pub fn step(&mut self, ctx: &mut C, now: f64) {
        while self.later.peek().is_some_and(|top| top.wake <= now) {
            if let Some(entry) = self.later.pop() {
                self.tasks.push(entry.task);
            }
        }

        self.tasks
            .sort_by(|a, b| a.sort.cmp(&b.sort).then(a.seq.cmp(&b.seq)));

        let mut ops = TaskOps::default();
        let mut removed: HashSet<String> = HashSet::new();
        let mut survivors = Vec::with_capacity(self.tasks.len());
        for mut task in std::mem::take(&mut self.tasks) {
            if removed.contains(&task.name) {
                continue;
            }
            let started = *task.started.get_or_insert(now);
            let mut tc = TaskContext {
                now,
                elapsed: now - started,
                run_count: task.run_count,
                ops: &mut ops,
            };
            let step = (task.func)(ctx, &mut tc);
            task.run_count += 1;
            removed.extend(ops.removes.drain(..));
            if step == TaskStep::Cont && !removed.contains(&task.name) {
                survivors.push(task);
            }
        }
        self.tasks = survivors;

        for add in ops.adds {
            if removed.contains(&add.name) {
                continue;
            }
            let task = self.make_task(&add.name, add.sort, add.func);
            match add.wake {
                Some(wake) => self.later.push(DoLater { wake, task }),
                None => self.tasks.push(task),
            }
        }
        if !removed.is_empty() {
            self.later.retain(|l| !removed.contains(&l.task.name));
        }
    }

    fn make_task(&mut self, name: &str, sort: i32, func: TaskFn<C>) -> Task<C> {
        let seq = self.seq;
        self.seq += 1;
        Task {
            name: name.to_string(),
            sort,
            seq,
            started: None,
            run_count: 0,
            func,
        }
    }
}
