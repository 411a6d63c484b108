use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AverageMeter {
    pub val: f64,
    pub sum: f64,
    pub count: u64,
    pub avg: f64,
}

impl AverageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn update(&mut self, val: f64, n: u64) {
        self.val = val;
        self.sum += val * n as f64;
        self.count += n;
        if self.count > 0 {
            self.avg = self.sum / self.count as f64;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BestTracker {
    best: Option<(usize, f64)>,
}

impl BestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `metric` strictly improves on the best so far.
    pub fn update(&mut self, epoch: usize, metric: f64) -> bool {
        let improved = match self.best {
            None => !metric.is_nan(),
            Some((_, best)) => metric > best,
        };
        if improved {
            self.best = Some((epoch, metric));
        }
        improved
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best.map(|(e, _)| e)
    }

    pub fn best_metric(&self) -> Option<f64> {
        self.best.map(|(_, m)| m)
    }
}
