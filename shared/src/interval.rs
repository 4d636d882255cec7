/// A time-parameterized animation primitive, generic over the same context
/// type the task scheduler threads through.
///
/// `step` receives local time `t` measured from the interval's own start;
/// implementations clamp internally and guard their endpoints, so stepping
/// a finished interval again is a no-op.
pub trait Interval<C> {
    fn duration(&self) -> f64;
    fn step(&mut self, ctx: &mut C, t: f64);
}

/// Pure duration; occupies time in a sequence and does nothing.
pub struct WaitInterval {
    duration: f64,
}

impl WaitInterval {
    pub fn new(duration: f64) -> Self {
        Self { duration }
    }
}

impl<C> Interval<C> for WaitInterval {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn step(&mut self, _ctx: &mut C, _t: f64) {}
}

/// Zero-duration callback, fired once the first time it is stepped.
pub struct FuncInterval<C> {
    func: Option<Box<dyn FnOnce(&mut C)>>,
}

impl<C> FuncInterval<C> {
    pub fn new(func: impl FnOnce(&mut C) + 'static) -> Self {
        Self {
            func: Some(Box::new(func)),
        }
    }
}

impl<C> Interval<C> for FuncInterval<C> {
    fn duration(&self) -> f64 {
        0.0
    }

    fn step(&mut self, ctx: &mut C, t: f64) {
        if t >= 0.0 {
            if let Some(func) = self.func.take() {
                func(ctx);
            }
        }
    }
}

/// Calls a function with an eased parameter in [0, 1] over a duration.
/// Linear by default; the endpoint value 1.0 is delivered exactly once.
pub struct LerpFunctionInterval<C> {
    duration: f64,
    func: Box<dyn FnMut(&mut C, f64)>,
    finished: bool,
}

impl<C> LerpFunctionInterval<C> {
    pub fn new(duration: f64, func: impl FnMut(&mut C, f64) + 'static) -> Self {
        Self {
            duration,
            func: Box::new(func),
            finished: false,
        }
    }
}

impl<C> Interval<C> for LerpFunctionInterval<C> {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn step(&mut self, ctx: &mut C, t: f64) {
        if self.finished {
            return;
        }
        let s = if self.duration <= 0.0 {
            1.0
        } else {
            (t / self.duration).clamp(0.0, 1.0)
        };
        (self.func)(ctx, s);
        if s >= 1.0 {
            self.finished = true;
        }
    }
}

/// Children play back to back; total duration is the sum.
///
/// An update that crosses child boundaries finishes each crossed child at
/// its endpoint and steps the current child at the carried remainder, so
/// no time is lost at seams.
pub struct SequenceInterval<C> {
    children: Vec<Box<dyn Interval<C>>>,
    offsets: Vec<f64>,
    cursor: usize,
    total: f64,
}

impl<C> SequenceInterval<C> {
    pub fn new(children: Vec<Box<dyn Interval<C>>>) -> Self {
        let mut offsets = Vec::with_capacity(children.len());
        let mut total = 0.0;
        for child in &children {
            offsets.push(total);
            total += child.duration();
        }
        Self {
            children,
            offsets,
            cursor: 0,
            total,
        }
    }
}

impl<C> Interval<C> for SequenceInterval<C> {
    fn duration(&self) -> f64 {
        self.total
    }

    fn step(&mut self, ctx: &mut C, t: f64) {
        while self.cursor < self.children.len() {
            let start = self.offsets[self.cursor];
            let child = &mut self.children[self.cursor];
            let end = start + child.duration();
            if t < end {
                child.step(ctx, t - start);
                return;
            }
            child.step(ctx, child.duration());
            self.cursor += 1;
        }
    }
}

/// Children play simultaneously; total duration is the longest child's.
pub struct ParallelInterval<C> {
    children: Vec<Box<dyn Interval<C>>>,
    total: f64,
}

impl<C> ParallelInterval<C> {
    pub fn new(children: Vec<Box<dyn Interval<C>>>) -> Self {
        let total = children.iter().map(|c| c.duration()).fold(0.0, f64::max);
        Self { children, total }
    }
}

impl<C> Interval<C> for ParallelInterval<C> {
    fn duration(&self) -> f64 {
        self.total
    }

    fn step(&mut self, ctx: &mut C, t: f64) {
        for child in &mut self.children {
            child.step(ctx, t.min(child.duration()));
        }
    }
}

/// Drives a root interval from scheduler time: anchor it with `play`, then
/// feed `step(ctx, now)` from a task. Reports done once the root's full
/// duration has been delivered.
pub struct IntervalPlayer<C> {
    root: Box<dyn Interval<C>>,
    start: Option<f64>,
    done: bool,
}

impl<C> IntervalPlayer<C> {
    pub fn new(root: Box<dyn Interval<C>>) -> Self {
        Self {
            root,
            start: None,
            done: false,
        }
    }

    pub fn play(&mut self, now: f64) {
        self.start = Some(now);
        self.done = false;
    }

    pub fn is_playing(&self) -> bool {
        self.start.is_some() && !self.done
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn step(&mut self, ctx: &mut C, now: f64) {
        let Some(start) = self.start else {
            return;
        };
        if self.done {
            return;
        }
        let t = now - start;
        self.root.step(ctx, t);
        if t >= self.root.duration() {
            self.done = true;
        }
    }
}
