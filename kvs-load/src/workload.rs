//! YCSB-style operation stream.
//!
//! A [`Workload`] draws key indices from a Zipfian distribution and decides
//! read vs. write with a Bernoulli trial whose probability comes from the
//! [`WorkloadProfile`]. Each instance owns its RNG, so drivers never share
//! generator state.

use std::fmt;
use std::str::FromStr;

use rand::distr::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Zipf;

use crate::error::KvsError;
use crate::txn::Operation;

pub const DEFAULT_KEYSPACE: u64 = 100_000;
pub const DEFAULT_THETA: f64 = 0.99;
pub const DEFAULT_VALUE_SIZE: usize = 128;

/// Read/write mix, named after the YCSB core workloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadProfile {
    /// 50% read, 50% write
    YcsbA,
    /// 95% read, 5% write
    YcsbB,
    /// read only
    YcsbC,
}

impl WorkloadProfile {
    pub fn read_ratio(self) -> f64 {
        match self {
            WorkloadProfile::YcsbA => 0.5,
            WorkloadProfile::YcsbB => 0.95,
            WorkloadProfile::YcsbC => 1.0,
        }
    }
}

impl FromStr for WorkloadProfile {
    type Err = KvsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "YCSB-A" | "A" => Ok(WorkloadProfile::YcsbA),
            "YCSB-B" | "B" => Ok(WorkloadProfile::YcsbB),
            "YCSB-C" | "C" => Ok(WorkloadProfile::YcsbC),
            _ => Err(KvsError::UnknownProfile(s.into())),
        }
    }
}

impl fmt::Display for WorkloadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkloadProfile::YcsbA => "YCSB-A",
            WorkloadProfile::YcsbB => "YCSB-B",
            WorkloadProfile::YcsbC => "YCSB-C",
        };
        f.write_str(name)
    }
}

/// Everything needed to build an independent [`Workload`].
#[derive(Debug, Clone)]
pub struct WorkloadSpec {
    pub profile: WorkloadProfile,
    /// Zipfian skew. `0.0` is uniform.
    pub theta: f64,
    /// Number of distinct keys, `"0"` to `"keyspace - 1"`.
    pub keyspace: u64,
    /// Length of the payload written by each write operation.
    pub value_size: usize,
}

impl Default for WorkloadSpec {
    fn default() -> Self {
        Self {
            profile: WorkloadProfile::YcsbB,
            theta: DEFAULT_THETA,
            keyspace: DEFAULT_KEYSPACE,
            value_size: DEFAULT_VALUE_SIZE,
        }
    }
}

impl WorkloadSpec {
    pub fn validate(&self) -> Result<(), KvsError> {
        if !(0.0..=1.0).contains(&self.theta) {
            return Err(KvsError::InvalidConfig(format!(
                "theta must be within [0, 1], got {}",
                self.theta
            )));
        }
        if self.keyspace == 0 {
            return Err(KvsError::InvalidConfig(
                "keyspace must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Unbounded generator of [`Operation`]s.
pub struct Workload {
    keys: Zipf<f64>,
    mix: Bernoulli,
    rng: StdRng,
    value: String,
}

impl Workload {
    /// Builds a generator. With `seed` the stream is reproducible, otherwise
    /// the RNG is seeded from the OS.
    pub fn new(spec: &WorkloadSpec, seed: Option<u64>) -> Result<Self, KvsError> {
        spec.validate()?;
        let keys = Zipf::new(spec.keyspace as f64, spec.theta)
            .map_err(|e| KvsError::InvalidConfig(e.to_string()))?;
        let mix = Bernoulli::new(spec.profile.read_ratio())
            .map_err(|e| KvsError::InvalidConfig(e.to_string()))?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            keys,
            mix,
            rng,
            value: "x".repeat(spec.value_size),
        })
    }

    /// Draws a key index in `[0, keyspace)`. Index 0 is the hottest key.
    #[inline]
    pub fn next_key(&mut self) -> u64 {
        // Zipf ranks start at 1.
        self.keys.sample(&mut self.rng) as u64 - 1
    }

    pub fn next_op(&mut self) -> Operation {
        let key = self.next_key().to_string();
        if self.mix.sample(&mut self.rng) {
            Operation::read(key)
        } else {
            Operation::write(key, self.value.clone())
        }
    }
}

impl Iterator for Workload {
    type Item = Operation;

    fn next(&mut self) -> Option<Operation> {
        Some(self.next_op())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

#[cfg(test)]
mod test {
    use super::{Workload, WorkloadProfile, WorkloadSpec};
    use crate::error::KvsError;

    const SAMPLES: usize = 100_000;

    fn spec(profile: WorkloadProfile, theta: f64, keyspace: u64) -> WorkloadSpec {
        WorkloadSpec {
            profile,
            theta,
            keyspace,
            ..Default::default()
        }
    }

    #[test]
    fn parse_profile() {
        assert_eq!(
            "YCSB-A".parse::<WorkloadProfile>().unwrap(),
            WorkloadProfile::YcsbA
        );
        assert_eq!(
            "ycsb-c".parse::<WorkloadProfile>().unwrap(),
            WorkloadProfile::YcsbC
        );
        assert_eq!(WorkloadProfile::YcsbB.to_string(), "YCSB-B");
        let err = "YCSB-Z".parse::<WorkloadProfile>().unwrap_err();
        assert!(matches!(err, KvsError::UnknownProfile(name) if name == "YCSB-Z"));
    }

    #[test]
    fn reject_bad_spec() {
        let mut bad = WorkloadSpec::default();
        for theta in [-0.5, 1.5, 5.0, f64::NAN, f64::INFINITY] {
            bad.theta = theta;
            assert!(Workload::new(&bad, None).is_err(), "theta {theta}");
        }
        for theta in [0.0, 1.0] {
            assert!(spec(WorkloadProfile::YcsbB, theta, 10).validate().is_ok());
        }
        let mut bad = WorkloadSpec::default();
        bad.keyspace = 0;
        assert!(Workload::new(&bad, None).is_err());
    }

    #[test]
    fn ycsb_c_is_read_only() {
        let mut workload =
            Workload::new(&spec(WorkloadProfile::YcsbC, 0.99, 1000), None).unwrap();
        for _ in 0..SAMPLES {
            let op = workload.next_op();
            assert!(op.is_read);
            assert!(op.value.is_empty());
        }
    }

    #[test]
    fn ycsb_a_is_half_reads() {
        let mut workload =
            Workload::new(&spec(WorkloadProfile::YcsbA, 0.99, 1000), Some(7))
                .unwrap();
        let reads = (0..SAMPLES).filter(|_| workload.next_op().is_read).count();
        let ratio = reads as f64 / SAMPLES as f64;
        assert!((ratio - 0.5).abs() < 0.02, "read ratio {ratio}");
    }

    #[test]
    fn writes_carry_payload() {
        let mut workload =
            Workload::new(&spec(WorkloadProfile::YcsbA, 0.5, 10), Some(1)).unwrap();
        let write = workload.by_ref().find(|op| !op.is_read).unwrap();
        assert_eq!(write.value, "x".repeat(128));
    }

    #[test]
    fn keys_stay_in_keyspace() {
        let mut workload =
            Workload::new(&spec(WorkloadProfile::YcsbB, 0.99, 50), Some(3)).unwrap();
        for _ in 0..SAMPLES {
            assert!(workload.next_key() < 50);
        }
    }

    #[test]
    fn zero_theta_is_uniform() {
        let keyspace = 100;
        let mut workload =
            Workload::new(&spec(WorkloadProfile::YcsbC, 0.0, keyspace), Some(11))
                .unwrap();
        let mut hits = vec![0usize; keyspace as usize];
        for _ in 0..SAMPLES {
            hits[workload.next_key() as usize] += 1;
        }
        // expected 1000 per key, stddev ~31
        for (key, count) in hits.iter().enumerate() {
            assert!(
                (800..=1200).contains(count),
                "key {key} drawn {count} times"
            );
        }
    }

    #[test]
    fn high_theta_concentrates_on_hot_keys() {
        let keyspace = 100_000;
        let mut workload =
            Workload::new(&spec(WorkloadProfile::YcsbC, 0.99, keyspace), Some(5))
                .unwrap();
        let hot = keyspace / 100;
        let hot_hits = (0..SAMPLES)
            .filter(|_| workload.next_key() < hot)
            .count();
        let share = hot_hits as f64 / SAMPLES as f64;
        // uniform would give 1%, zipf(0.99) over 1e5 keys gives ~60%
        assert!(share > 0.5, "top 1% share {share}");
    }

    #[test]
    fn seeded_streams_repeat() {
        let spec = spec(WorkloadProfile::YcsbA, 0.99, 1000);
        let a: Vec<_> = Workload::new(&spec, Some(42)).unwrap().take(100).collect();
        let b: Vec<_> = Workload::new(&spec, Some(42)).unwrap().take(100).collect();
        assert_eq!(a, b);
    }
}
