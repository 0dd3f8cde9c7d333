/// Running min/max/sum/count for one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accumulator {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: u64,
}

impl Accumulator {
    /// Starts an accumulator from its first observation.
    #[inline(always)]
    pub fn new(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            sum: value,
            count: 1,
        }
    }

    #[inline(always)]
    pub fn add(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.count += 1;
    }

    #[inline(always)]
    pub fn merge_with(&mut self, other: &Accumulator) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn merge(mut self, other: &Accumulator) -> Accumulator {
        self.merge_with(other);
        return self;
    }
}
