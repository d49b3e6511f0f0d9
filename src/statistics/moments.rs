//! Mergeable first and second moments
//!
//! Each block reduces its values to a [`BlockMoments`]; any two of them combine
//! without revisiting element data (Chan et al. pairwise update), so the global
//! mean and variance come out of a single pass in any block order.

/// Count, sum, sum of squares, running mean and centered second moment
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockMoments {
    pub count: u64,
    pub sum: f64,
    pub sum_sq: f64,
    /// Running mean, `0.0` while `count == 0`
    pub mean: f64,
    /// Sum of squared deviations from `mean`
    pub m2: f64,
}

impl BlockMoments {
    /// Welford accumulation over `values`
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut moments = Self::default();
        for x in values {
            moments.count += 1;
            moments.sum += x;
            moments.sum_sq += x * x;
            let delta = x - moments.mean;
            moments.mean += delta / moments.count as f64;
            moments.m2 += delta * (x - moments.mean);
        }
        moments
    }

    /// Pooled moments of the union of both samples
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        if self.count == 0 {
            return *other;
        }
        if other.count == 0 {
            return *self;
        }
        let count = self.count + other.count;
        let (na, nb, n) = (self.count as f64, other.count as f64, count as f64);
        let delta = other.mean - self.mean;
        Self {
            count,
            sum: self.sum + other.sum,
            sum_sq: self.sum_sq + other.sum_sq,
            mean: self.mean + delta * nb / n,
            m2: self.m2 + other.m2 + delta * delta * na * nb / n,
        }
    }

    /// Arithmetic mean, `NaN` for an empty sample
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.mean
        }
    }

    /// Population variance (ddof = 0), `NaN` for an empty sample
    #[must_use]
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.m2 / self.count as f64
        }
    }

    #[must_use]
    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }
}
