//! # Batch multiplication
//!
//! Multiplies an ordered chain of matrices by splitting it in half, reducing both
//! halves concurrently and multiplying the two partial products. Matrix
//! multiplication is associative but not commutative, so the split only ever
//! regroups the chain, never reorders it.
//!
//! Work runs on a rayon pool: [`batch_multiply`] uses the global pool, while a
//! [`BatchMultiplier`] owns a dedicated pool of bounded size.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use log::{debug, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::Matrix;
use crate::error::{MatrixError, Result};

/// Chains of at most this many matrices are multiplied on the calling thread.
const MIN_SEQUENTIAL_THRESHOLD: usize = 2;

/// Cooperative cancellation flag shared between a caller and a running batch.
///
/// Cancellation is observed at each split of the chain and between the steps of a
/// sequential fold, so multiplies already in progress finish before the batch
/// returns [`MatrixError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Multiplies `matrices` left to right on the global rayon pool.
///
/// A chain of one matrix returns a copy of it; a chain of two is a single
/// [`Matrix::mul`].
///
/// # Errors
/// - [`MatrixError::EmptyBatch`] if `matrices` is empty.
/// - Any error from [`Matrix::mul`] on an incompatible adjacent pair.
pub fn batch_multiply(matrices: &[Matrix]) -> Result<Matrix> {
    reduce(matrices, MIN_SEQUENTIAL_THRESHOLD, None)
}

fn reduce(
    matrices: &[Matrix],
    sequential_threshold: usize,
    cancel: Option<&CancellationToken>,
) -> Result<Matrix> {
    check_cancelled(cancel, matrices.len())?;

    match matrices {
        [] => Err(MatrixError::EmptyBatch),
        [single] => Ok(single.clone()),
        [first, second, rest @ ..] if matrices.len() <= sequential_threshold => {
            let mut acc = first.mul(second)?;
            for (done, next) in rest.iter().enumerate() {
                check_cancelled(cancel, rest.len() - done)?;
                acc = acc.mul(next)?;
            }
            Ok(acc)
        }
        _ => {
            let (left, right) = matrices.split_at(matrices.len() / 2);
            debug!("splitting chain of {} into {} + {}", matrices.len(), left.len(), right.len());

            let (left, right) = rayon::join(
                || reduce(left, sequential_threshold, cancel),
                || reduce(right, sequential_threshold, cancel),
            );
            left?.mul(&right?)
        }
    }
}

fn check_cancelled(cancel: Option<&CancellationToken>, pending: usize) -> Result<()> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        warn!("batch multiplication cancelled with {} matrices pending", pending);
        return Err(MatrixError::Cancelled);
    }
    Ok(())
}

/// Batch multiplication on a dedicated, bounded thread pool.
///
/// Built through [`BatchMultiplierBuilder`].
pub struct BatchMultiplier {
    pool: ThreadPool,
    sequential_threshold: usize,
}

impl BatchMultiplier {
    pub fn builder() -> BatchMultiplierBuilder {
        BatchMultiplierBuilder::new()
    }

    /// Same contract as [`batch_multiply`], run on this multiplier's pool.
    pub fn multiply(&self, matrices: &[Matrix]) -> Result<Matrix> {
        self.pool
            .install(|| reduce(matrices, self.sequential_threshold, None))
    }

    /// Like [`BatchMultiplier::multiply`], but stops early with
    /// [`MatrixError::Cancelled`] once `token` is cancelled.
    pub fn multiply_with_cancel(&self, matrices: &[Matrix], token: &CancellationToken) -> Result<Matrix> {
        self.pool
            .install(|| reduce(matrices, self.sequential_threshold, Some(token)))
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn sequential_threshold(&self) -> usize {
        self.sequential_threshold
    }
}

/// Configures a [`BatchMultiplier`].
#[derive(Debug, Clone)]
pub struct BatchMultiplierBuilder {
    num_threads: usize,
    sequential_threshold: usize,
    thread_name_prefix: Option<String>,
}

impl Default for BatchMultiplierBuilder {
    fn default() -> Self {
        Self {
            num_threads: 0,
            sequential_threshold: MIN_SEQUENTIAL_THRESHOLD,
            thread_name_prefix: None,
        }
    }
}

impl BatchMultiplierBuilder {
    /// Creates a builder with default parameters.
    ///
    /// Default values:
    /// - `num_threads`: 0, letting rayon pick one thread per logical CPU
    /// - `sequential_threshold`: 2
    /// - `thread_name_prefix`: none
    pub fn new() -> Self {
        Self::default()
    }

    /// Upper bound on worker threads. `0` lets rayon decide.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Chains no longer than this are folded sequentially instead of split.
    ///
    /// Values below 2 are raised to 2.
    pub fn sequential_threshold(mut self, threshold: usize) -> Self {
        self.sequential_threshold = threshold.max(MIN_SEQUENTIAL_THRESHOLD);
        self
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> anyhow::Result<BatchMultiplier> {
        let mut builder = ThreadPoolBuilder::new().num_threads(self.num_threads);
        if let Some(prefix) = self.thread_name_prefix {
            builder = builder.thread_name(move |i| format!("{}-{}", prefix, i));
        }
        let pool = builder
            .build()
            .context("failed to build the batch multiplication thread pool")?;

        debug!(
            "built batch multiplier with {} threads, sequential threshold {}",
            pool.current_num_threads(),
            self.sequential_threshold
        );

        Ok(BatchMultiplier {
            pool,
            sequential_threshold: self.sequential_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::tests::int_rows;
    use crate::element::{VecNum, VecType};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::thread;
    use std::time::Duration;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// A chain of `len` matrices with random but compatible shapes.
    fn random_chain(rng: &mut StdRng, len: usize) -> Vec<Matrix> {
        let dims: Vec<usize> = (0..=len).map(|_| rng.random_range(1..5)).collect();
        dims.windows(2)
            .map(|w| {
                let data = (0..w[0] * w[1])
                    .map(|_| VecNum::Int(rng.random_range(-3..4)))
                    .collect();
                Matrix::from_flat(VecType::Int, data, w[0], w[1]).unwrap()
            })
            .collect()
    }

    fn sequential_product(chain: &[Matrix]) -> Matrix {
        let (first, rest) = chain.split_first().unwrap();
        rest.iter()
            .fold(first.clone(), |acc, m| acc.mul(m).unwrap())
    }

    #[test]
    fn test_matches_sequential_product() {
        init_logger();
        let mut rng = StdRng::seed_from_u64(42);
        for len in 1..=12 {
            let chain = random_chain(&mut rng, len);
            assert_eq!(
                batch_multiply(&chain).unwrap(),
                sequential_product(&chain),
                "chain of length {}",
                len
            );
        }
    }

    #[test]
    fn test_single_and_pair() {
        let a = int_rows(&[&[1, 1], &[0, 1]]);
        let b = int_rows(&[&[2, 0], &[1, 3]]);
        assert_eq!(batch_multiply(std::slice::from_ref(&a)).unwrap(), a);
        assert_eq!(
            batch_multiply(&[a.clone(), b.clone()]).unwrap(),
            a.mul(&b).unwrap()
        );
    }

    #[test]
    fn test_preserves_order() {
        let a = int_rows(&[&[1, 1], &[0, 1]]);
        let b = int_rows(&[&[1, 0], &[1, 1]]);
        let chain = vec![a.clone(), b.clone(), a.clone(), b.clone(), b.clone()];
        let reversed: Vec<Matrix> = chain.iter().rev().cloned().collect();

        let forward = batch_multiply(&chain).unwrap();
        assert_eq!(forward, sequential_product(&chain));
        assert_ne!(forward, batch_multiply(&reversed).unwrap());
    }

    #[test]
    fn test_fibonacci_power() {
        let q = int_rows(&[&[1, 1], &[1, 0]]);
        let chain = vec![q; 30];
        let power = batch_multiply(&chain).unwrap();
        // Q^n = [[F(n+1), F(n)], [F(n), F(n-1)]]
        assert_eq!(power, int_rows(&[&[1_346_269, 832_040], &[832_040, 514_229]]));
    }

    #[test]
    fn test_errors_propagate() {
        assert_eq!(batch_multiply(&[]), Err(MatrixError::EmptyBatch));

        let square = int_rows(&[&[1, 2], &[3, 4]]);
        let wide = int_rows(&[&[1, 2, 3]]);
        let chain = vec![square.clone(), square.clone(), square.clone(), wide, square];
        assert!(matches!(
            batch_multiply(&chain),
            Err(MatrixError::Dimension(_))
        ));

        let double = Matrix::identity(VecType::Double, 2).unwrap();
        let ints = int_rows(&[&[1, 0], &[0, 1]]);
        let chain = vec![ints.clone(), ints.clone(), double, ints];
        assert!(matches!(
            batch_multiply(&chain),
            Err(MatrixError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_dedicated_pool() {
        init_logger();
        let multiplier = BatchMultiplier::builder()
            .num_threads(2)
            .sequential_threshold(3)
            .thread_name_prefix("batch-test")
            .build()
            .unwrap();
        assert_eq!(multiplier.num_threads(), 2);
        assert_eq!(multiplier.sequential_threshold(), 3);

        let mut rng = StdRng::seed_from_u64(11);
        for len in 1..=10 {
            let chain = random_chain(&mut rng, len);
            assert_eq!(
                multiplier.multiply(&chain).unwrap(),
                sequential_product(&chain)
            );
        }
    }

    #[test]
    fn test_threshold_floor() {
        let multiplier = BatchMultiplierBuilder::new()
            .sequential_threshold(0)
            .num_threads(1)
            .build()
            .unwrap();
        assert_eq!(multiplier.sequential_threshold(), 2);
    }

    #[test]
    fn test_cancellation() {
        let multiplier = BatchMultiplier::builder().num_threads(2).build().unwrap();
        let chain = vec![int_rows(&[&[1, 1], &[0, 1]]); 8];

        let token = CancellationToken::new();
        let expected = multiplier.multiply(&chain).unwrap();
        assert_eq!(
            multiplier.multiply_with_cancel(&chain, &token).unwrap(),
            expected
        );

        token.clone().cancel();
        assert!(token.is_cancelled());
        assert_eq!(
            multiplier.multiply_with_cancel(&chain, &token),
            Err(MatrixError::Cancelled)
        );
    }

    #[test]
    fn test_cancel_while_running() {
        init_logger();
        let multiplier = BatchMultiplier::builder().num_threads(2).build().unwrap();
        let chain = vec![Matrix::identity(VecType::Double, 32).unwrap(); 1024];
        let token = CancellationToken::new();

        let result = thread::scope(|s| {
            let canceller = token.clone();
            s.spawn(move || {
                thread::sleep(Duration::from_millis(2));
                canceller.cancel();
            });
            multiplier.multiply_with_cancel(&chain, &token)
        });

        assert_eq!(result, Err(MatrixError::Cancelled));
    }

    #[test]
    fn test_cancel_during_sequential_fold() {
        // One split-free fold over the whole chain, so only the per-step check can fire.
        let multiplier = BatchMultiplier::builder()
            .num_threads(1)
            .sequential_threshold(usize::MAX)
            .build()
            .unwrap();
        let chain = vec![Matrix::identity(VecType::Double, 32).unwrap(); 1024];
        let token = CancellationToken::new();

        let result = thread::scope(|s| {
            let canceller = token.clone();
            s.spawn(move || {
                thread::sleep(Duration::from_millis(2));
                canceller.cancel();
            });
            multiplier.multiply_with_cancel(&chain, &token)
        });

        assert_eq!(result, Err(MatrixError::Cancelled));
    }
}
