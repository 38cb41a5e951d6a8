// Concurrent Prime Search
// Worker threads race candidate draws until enough probable primes are found

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use num_bigint::{BigUint, RandBigInt};
use rand::rngs::OsRng;
use tracing::{debug, warn};

use super::bigint::is_probable_prime;
use super::error::KeyError;

/// Miller-Rabin rounds per candidate unless configured otherwise.
pub const DEFAULT_WITNESSES: u32 = 10;

const MIN_SEARCH_BITS: u64 = 32;

/// Tuning knobs for [`search`].
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Worker threads drawing and testing candidates.
    pub workers: usize,
    /// Miller-Rabin rounds per candidate.
    pub witnesses: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            witnesses: DEFAULT_WITNESSES,
        }
    }
}

impl SearchConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_witnesses(mut self, witnesses: u32) -> Self {
        self.witnesses = witnesses;
        self
    }
}

fn default_workers() -> usize {
    thread::available_parallelism().map(usize::from).unwrap_or(4)
}

/// Shared state of one search run. Workers stop drawing candidates once
/// the flag is raised; an in-flight primality test finishes and its
/// result is discarded.
struct SearchState {
    stop: AtomicBool,
    found: Mutex<Vec<BigUint>>,
    trials: AtomicU64,
}

/// Find `count` distinct probable primes of exactly `bits` bits.
///
/// `bits` must be a positive multiple of 8, at least 32, and `count` at
/// least 1. Returns once enough primes are collected and every worker
/// has been joined.
pub fn search(bits: u64, count: usize, config: &SearchConfig) -> Result<Vec<BigUint>, KeyError> {
    if bits < MIN_SEARCH_BITS || bits % 8 != 0 {
        return Err(KeyError::InvalidParameter(format!(
            "bit length {} must be a multiple of 8, at least {}",
            bits, MIN_SEARCH_BITS
        )));
    }
    if count == 0 {
        return Err(KeyError::InvalidParameter(
            "prime count must be at least 1".to_string(),
        ));
    }
    if config.witnesses == 0 {
        return Err(KeyError::InvalidParameter(
            "witness count must be at least 1".to_string(),
        ));
    }

    Ok(collect(bits, count, config))
}

/// Single prime of exactly `bits` bits (any width from 2 up). Key
/// generation's split widths fall below the public contract, so this
/// entry skips the width check.
pub(crate) fn search_one(bits: u64, config: &SearchConfig) -> BigUint {
    let mut primes = collect(bits, 1, config);
    primes.pop().expect("count 1 search yields one prime")
}

fn collect(bits: u64, count: usize, config: &SearchConfig) -> Vec<BigUint> {
    let workers = config.workers.max(1);
    let state = Arc::new(SearchState {
        stop: AtomicBool::new(false),
        found: Mutex::new(Vec::with_capacity(count)),
        trials: AtomicU64::new(0),
    });

    let mut handles = Vec::with_capacity(workers);
    for index in 0..workers {
        let state = Arc::clone(&state);
        let iterations = config.witnesses;
        let spawned = thread::Builder::new()
            .name(format!("prime-search-{}", index))
            .spawn(move || search_worker(&state, bits, count, iterations));
        match spawned {
            Ok(handle) => handles.push(handle),
            Err(e) => warn!("could not spawn prime search worker {}: {}", index, e),
        }
    }

    if handles.is_empty() {
        // No thread could be spawned; search on the calling thread
        search_worker(&state, bits, count, config.witnesses);
    }

    for handle in handles {
        let _ = handle.join();
    }

    debug!(
        "prime search done: {} candidates tried for {} primes of {} bits",
        state.trials.load(Ordering::Relaxed),
        count,
        bits
    );

    let mut found = state.found.lock().unwrap();
    std::mem::take(&mut *found)
}

fn search_worker(state: &SearchState, bits: u64, count: usize, iterations: u32) {
    let mut rng = OsRng;

    while !state.stop.load(Ordering::Acquire) {
        // Pin the top bit so accepted primes have exactly `bits` bits,
        // and the low bit so no draw is wasted on an even number
        let mut candidate = rng.gen_biguint(bits);
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(0, true);
        state.trials.fetch_add(1, Ordering::Relaxed);

        if !is_probable_prime(&candidate, iterations) {
            continue;
        }

        let mut found = state.found.lock().unwrap();
        if found.len() >= count {
            break;
        }
        if found.contains(&candidate) {
            continue;
        }
        found.push(candidate);
        if found.len() == count {
            state.stop.store(true, Ordering::Release);
            break;
        }
    }
}
