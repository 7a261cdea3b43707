use crate::{config::Config, constants::*};
use rand::{RngCore, SeedableRng};
use std::{
    fs::File,
    io::{self, Read},
    time::{SystemTime, UNIX_EPOCH},
};

/// Random events whose probability is fixed by configuration rather than carried by a genome
#[derive(Debug, Clone, Copy)]
pub enum EvolutionEvent {
    Crossover,
    PerturbWeight,
    KeepDisabled,
    PickTied,
}

pub const fn percent(x: u64) -> u64 {
    x * (u64::MAX / 100)
}

/// Threshold comparable with `next_u64` for a probability `p`, clamped to [0, 1]
pub fn chance(p: f64) -> u64 {
    if p.is_nan() || p <= 0. {
        0
    } else if p >= 1. {
        u64::MAX
    } else {
        (p * u64::MAX as f64) as u64
    }
}

/// Number of times an event with `rate` fires. Every whole unit of rate is one more roll, the
/// k-th roll firing with probability `rate - k`.
pub fn rolls(rng: &mut impl RngCore, rate: f64) -> usize {
    let mut fired = 0;
    let mut p = rate;
    while p > 0. {
        if p >= 1. || chance(p) > rng.next_u64() {
            fired += 1;
        }
        p -= 1.;
    }
    fired
}

/// Uniform float in [0, 1)
#[inline]
pub fn unit(rng: &mut impl RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1. / (1u64 << 53) as f64)
}

pub trait Probabilities {
    type Update;
    fn probability(&self, evt: EvolutionEvent) -> u64;
    fn update(&mut self, stats: Self::Update);
}

pub trait Happens: RngCore + Probabilities {
    fn happens(&mut self, evt: EvolutionEvent) -> bool;
}

impl<T: RngCore + Probabilities> Happens for T {
    fn happens(&mut self, evt: EvolutionEvent) -> bool {
        self.probability(evt) > self.next_u64()
    }
}

#[derive(Debug, Clone)]
pub struct ProbStatic {
    crossover: u64,
    perturb_weight: u64,
    keep_disabled: u64,
    pick_tied: u64,
}

impl ProbStatic {
    pub fn with_overrides(mut self, updates: &[(EvolutionEvent, u64)]) -> Self {
        for update in updates {
            self.update(*update);
        }
        self
    }
}

impl Default for ProbStatic {
    fn default() -> Self {
        Self {
            crossover: chance(NEATPOOL_CROSSOVER_PROB),
            perturb_weight: chance(NEATPOOL_PERTURB_PROB),
            keep_disabled: chance(NEATPOOL_KEEP_DISABLED_PROB),
            pick_tied: chance(NEATPOOL_PICK_TIED_PROB),
        }
    }
}

impl From<&Config> for ProbStatic {
    fn from(config: &Config) -> Self {
        Self {
            crossover: chance(config.crossover_prob),
            perturb_weight: chance(config.perturb_prob),
            keep_disabled: chance(config.keep_disabled_prob),
            pick_tied: chance(config.pick_tied_prob),
        }
    }
}

impl Probabilities for ProbStatic {
    type Update = (EvolutionEvent, u64);
    fn probability(&self, evt: EvolutionEvent) -> u64 {
        match evt {
            EvolutionEvent::Crossover => self.crossover,
            EvolutionEvent::PerturbWeight => self.perturb_weight,
            EvolutionEvent::KeepDisabled => self.keep_disabled,
            EvolutionEvent::PickTied => self.pick_tied,
        }
    }

    fn update(&mut self, (evt, v): Self::Update) {
        match evt {
            EvolutionEvent::Crossover => self.crossover = v,
            EvolutionEvent::PerturbWeight => self.perturb_weight = v,
            EvolutionEvent::KeepDisabled => self.keep_disabled = v,
            EvolutionEvent::PickTied => self.pick_tied = v,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WyRng {
    state: u64,
}

impl WyRng {
    pub fn seeded(state: u64) -> Self {
        Self { state }
    }
}

impl RngCore for WyRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        const WY_CONST_0: u64 = 0x2d35_8dcc_aa6c_78a5;
        const WY_CONST_1: u64 = 0x8bb8_4b93_962e_acc9;
        self.state = self.state.wrapping_add(WY_CONST_0);
        let t = u128::from(self.state) * u128::from(self.state ^ WY_CONST_1);
        (t as u64) ^ (t >> 64) as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for WyRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::seeded(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::seeded(state)
    }
}

/// Binds a set of [Probabilities] to a source of randomness
pub struct ProbBinding<P: Probabilities, R: RngCore> {
    p: P,
    r: R,
}

impl<P: Probabilities, R: RngCore> ProbBinding<P, R> {
    pub fn new(p: P, r: R) -> Self {
        Self { p, r }
    }
}

impl<P: Probabilities, R: RngCore> Probabilities for ProbBinding<P, R> {
    type Update = P::Update;
    fn probability(&self, evt: EvolutionEvent) -> u64 {
        self.p.probability(evt)
    }

    fn update(&mut self, stats: Self::Update) {
        self.p.update(stats);
    }
}

impl<P: Probabilities, R: RngCore> RngCore for ProbBinding<P, R> {
    fn next_u32(&mut self) -> u32 {
        self.r.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.r.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.r.fill_bytes(dest)
    }
}

pub fn seed_urandom() -> io::Result<u64> {
    let mut file = File::open("/dev/urandom")?;
    let mut buffer = [0u8; 8];
    file.read_exact(&mut buffer)?;
    Ok(u64::from_le_bytes(buffer))
}

fn seed_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9e37_79b9_7f4a_7c15)
}

/// A [WyRng] seeded from /dev/urandom, or from the clock where that is unavailable
pub fn default_rng() -> WyRng {
    WyRng::seeded(seed_urandom().unwrap_or_else(|_| seed_clock()))
}

#[cfg(test)]
mod test {
    use super::*;
    use core::iter::once;
    use rand::rngs::StdRng;

    fn assert_within_deviation(
        evt: EvolutionEvent,
        chance: f64,
        range: f64,
        happens: &mut impl Happens,
    ) {
        let samples = 10_000.;
        let expected = chance * samples;
        let max_deviation = expected * range;
        for _ in 0..10 {
            let incidence = once(())
                .cycle()
                .take(samples as usize)
                .filter(|()| happens.happens(evt))
                .count() as f64;
            assert!(
                (expected - incidence).abs() < max_deviation,
                "{evt:?}: {incidence} != {expected} ± {max_deviation}"
            );
        }
    }

    #[test]
    fn test_deviation_std() {
        let mut p_bind = ProbBinding::new(ProbStatic::default(), StdRng::seed_from_u64(11));
        for (evt, chance) in [
            (EvolutionEvent::Crossover, NEATPOOL_CROSSOVER_PROB),
            (EvolutionEvent::PerturbWeight, NEATPOOL_PERTURB_PROB),
            (EvolutionEvent::KeepDisabled, NEATPOOL_KEEP_DISABLED_PROB),
            (EvolutionEvent::PickTied, NEATPOOL_PICK_TIED_PROB),
        ] {
            assert_within_deviation(evt, chance, 0.1, &mut p_bind);
        }
    }

    #[test]
    fn test_deviation_wyrand() {
        let mut p_bind = ProbBinding::new(ProbStatic::default(), WyRng::seeded(11));
        for (evt, chance) in [
            (EvolutionEvent::Crossover, NEATPOOL_CROSSOVER_PROB),
            (EvolutionEvent::PerturbWeight, NEATPOOL_PERTURB_PROB),
            (EvolutionEvent::KeepDisabled, NEATPOOL_KEEP_DISABLED_PROB),
            (EvolutionEvent::PickTied, NEATPOOL_PICK_TIED_PROB),
        ] {
            assert_within_deviation(evt, chance, 0.1, &mut p_bind);
        }
    }

    #[test]
    fn test_overrides() {
        let mut p_bind = ProbBinding::new(
            ProbStatic::default().with_overrides(&[
                (EvolutionEvent::Crossover, 0),
                (EvolutionEvent::PickTied, u64::MAX),
            ]),
            WyRng::seeded(3),
        );
        for _ in 0..1000 {
            assert!(!p_bind.happens(EvolutionEvent::Crossover));
        }
        assert_eq!(p_bind.probability(EvolutionEvent::PickTied), u64::MAX);
    }

    #[test]
    fn test_chance_bounds() {
        assert_eq!(chance(0.), 0);
        assert_eq!(chance(-1.), 0);
        assert_eq!(chance(f64::NAN), 0);
        assert_eq!(chance(1.), u64::MAX);
        assert_eq!(chance(3.5), u64::MAX);
        assert!(chance(0.5) > percent(49) && chance(0.5) < percent(51));
    }

    #[test]
    fn test_rolls() {
        let mut rng = WyRng::seeded(5);
        for _ in 0..1000 {
            assert_eq!(rolls(&mut rng, 0.), 0);
            assert_eq!(rolls(&mut rng, 2.), 2);
            assert!(rolls(&mut rng, 0.25) <= 1);
            let n = rolls(&mut rng, 1.5);
            assert!(n == 1 || n == 2);
        }

        let fired = (0..10_000).map(|_| rolls(&mut rng, 0.25)).sum::<usize>() as f64;
        assert!((fired - 2500.).abs() < 250., "{fired}");
    }

    #[test]
    fn test_unit_range() {
        let mut rng = WyRng::seeded(9);
        for _ in 0..10_000 {
            let v = unit(&mut rng);
            assert!((0. ..1.).contains(&v));
        }
    }

    #[test]
    fn test_wyrng_fill_bytes() {
        let mut l = WyRng::seeded(1);
        let mut r = WyRng::seeded(1);
        let mut buf = [0u8; 13];
        l.fill_bytes(&mut buf);
        assert_eq!(buf[..8], r.next_u64().to_le_bytes());
        assert_eq!(buf[8..], r.next_u64().to_le_bytes()[..5]);

        let mut empty: [u8; 0] = [];
        l.fill_bytes(&mut empty);
    }

    #[test]
    fn test_wyrng_seedable() {
        let mut l = WyRng::seed_from_u64(42);
        let mut r = WyRng::from_seed(42u64.to_le_bytes());
        for _ in 0..100 {
            assert_eq!(l.next_u64(), r.next_u64());
        }
    }
}
