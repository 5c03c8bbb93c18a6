use rand::Rng;
use std::cmp::Ordering;
use std::ops::AddAssign;

/// Safely compute `log(sum(exp(xs))`
///
/// # Panics
///
/// If `xs` is empty.
///
/// # Example
///
/// ```rust
/// # use gmm_em::misc::logsumexp;
/// let xs: Vec<f64> = vec![0.0; 4];
/// assert!((logsumexp(&xs) - 4.0_f64.ln()).abs() < 1E-12);
/// ```
pub fn logsumexp(xs: &[f64]) -> f64 {
    match xs {
        [] => panic!("Empty container"),
        [x] => *x,
        _ => {
            let maxval = xs
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, |acc, x| acc.max(x));

            // all -inf; avoid -inf - -inf = NaN
            if maxval == f64::NEG_INFINITY {
                return f64::NEG_INFINITY;
            }

            xs.iter().fold(0.0, |acc, x| acc + (x - maxval).exp()).ln()
                + maxval
        }
    }
}

/// Cumulative sum of `xs`
///
/// # Example
///
/// ```rust
/// # use gmm_em::misc::cumsum;
/// let xs: Vec<i32> = vec![1, 1, 2, 1];
/// assert_eq!(cumsum(&xs), vec![1, 2, 4, 5]);
/// ```
pub fn cumsum<T>(xs: &[T]) -> Vec<T>
where
    T: AddAssign + Copy + Default,
{
    xs.iter()
        .scan(T::default(), |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

#[inline]
fn binary_search(cws: &[f64], r: f64) -> usize {
    let mut left: usize = 0;
    let mut right: usize = cws.len();
    while left < right {
        let mid = (left + right) / 2;
        if cws[mid] < r {
            left = mid + 1;
        } else {
            right = mid;
        }
    }
    left
}

fn catflip(cws: &[f64], r: f64) -> Option<usize> {
    if cws.len() > 9 {
        let ix = binary_search(cws, r);
        if ix < cws.len() {
            Some(ix)
        } else {
            None
        }
    } else {
        cws.iter().position(|&w| w > r)
    }
}

/// Draw `n` indices in proportion to their `weights`
///
/// # Panics
///
/// If `weights` is empty or sums to zero.
///
/// # Example
///
/// ```rust
/// # use gmm_em::misc::pflip;
/// let ixs = pflip(&[0.0, 1.0, 0.0], 10, &mut rand::thread_rng());
/// assert!(ixs.iter().all(|&ix| ix == 1));
/// ```
pub fn pflip(weights: &[f64], n: usize, rng: &mut impl Rng) -> Vec<usize> {
    let cws: Vec<f64> = cumsum(weights);
    let scale: f64 = match cws.last() {
        Some(&s) if s > 0.0 => s,
        Some(_) => panic!("Weights sum to zero: {:?}", weights),
        None => panic!("Empty container"),
    };
    let u = rand::distributions::Uniform::new(0.0, 1.0);

    (0..n)
        .map(|_| {
            let r = rng.sample(u) * scale;
            match catflip(&cws, r) {
                Some(ix) => ix,
                None => panic!("Could not draw from {:?}", weights),
            }
        })
        .collect()
}

/// Indices of the largest element(s) in xs.
///
/// If there is more than one largest element, `argmax` returns the indices of
/// all replicates.
///
/// # Examples
///
/// ```rust
/// use gmm_em::misc::argmax;
///
/// let xs: Vec<u8> = vec![1, 2, 3, 4, 5, 4, 5];
/// let ys: Vec<u8> = vec![1, 2, 3, 4, 5, 4, 0];
///
/// assert_eq!(argmax(&xs), vec![4, 6]);
/// assert_eq!(argmax(&ys), vec![4]);
/// ```
pub fn argmax<T: PartialOrd>(xs: &[T]) -> Vec<usize> {
    if xs.is_empty() {
        vec![]
    } else if xs.len() == 1 {
        vec![0]
    } else {
        let mut maxval = &xs[0];
        let mut max_ixs: Vec<usize> = vec![0];
        for (i, x) in xs.iter().enumerate().skip(1) {
            match x.partial_cmp(maxval) {
                Some(Ordering::Greater) => {
                    maxval = x;
                    max_ixs = vec![i];
                }
                Some(Ordering::Equal) => max_ixs.push(i),
                _ => (),
            }
        }
        max_ixs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    const TOL: f64 = 1E-12;

    #[test]
    fn argmax_empty_is_empty() {
        let xs: Vec<f64> = vec![];
        assert_eq!(argmax(&xs), Vec::<usize>::new());
    }

    #[test]
    fn argmax_single_elem_is_0() {
        let xs: Vec<f64> = vec![1.0];
        assert_eq!(argmax(&xs), vec![0]);
    }

    #[test]
    fn argmax_repeated_max() {
        let xs: Vec<u8> = vec![1, 2, 3, 4, 5, 4, 5];
        assert_eq!(argmax(&xs), vec![4, 6]);
    }

    #[test]
    fn logsumexp_on_vector_of_zeros() {
        let xs: Vec<f64> = vec![0.0; 5];
        // should be about log(5)
        assert::close(logsumexp(&xs), 1.609_437_912_434_100_3, TOL);
    }

    #[test]
    fn logsumexp_on_random_values() {
        let xs: Vec<f64> = vec![
            0.304_153_86,
            -0.070_722_96,
            -1.042_870_19,
            0.278_554_07,
            -0.818_967_65,
        ];
        assert::close(logsumexp(&xs), 1.482_000_789_426_305_9, TOL);
    }

    #[test]
    fn logsumexp_returns_only_value_on_one_element_container() {
        let xs: Vec<f64> = vec![0.304_153_86];
        assert::close(logsumexp(&xs), 0.304_153_86, TOL);
    }

    #[test]
    fn logsumexp_of_all_neg_infinity_is_neg_infinity() {
        let xs = vec![f64::NEG_INFINITY; 3];
        assert_eq!(logsumexp(&xs), f64::NEG_INFINITY);
    }

    #[test]
    #[should_panic]
    fn logsumexp_should_panic_on_empty() {
        let xs: Vec<f64> = Vec::new();
        logsumexp(&xs);
    }

    #[test]
    fn cumsum_floats() {
        assert::close(cumsum(&[0.25, 0.25, 0.5]), vec![0.25, 0.5, 1.0], TOL);
    }

    #[test]
    fn bisection_and_standard_catflip_agree() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0x1234);
        let weights: Vec<f64> = (1..=20).map(f64::from).collect();
        let cws = cumsum(&weights);
        let u = rand::distributions::Uniform::new(0.0, *cws.last().unwrap());
        for _ in 0..1000 {
            let r = rng.sample(u);
            let ix1 = binary_search(&cws, r);
            let ix2 = cws.iter().position(|&w| w > r).unwrap();
            assert_eq!(ix1, ix2);
        }
    }

    #[test]
    fn pflip_frequencies_follow_weights() {
        let mut rng = Xoshiro256Plus::seed_from_u64(0xABCD);
        let ixs = pflip(&[0.2, 0.8], 10_000, &mut rng);
        let ones = ixs.iter().filter(|&&ix| ix == 1).count() as f64;
        assert::close(ones / 10_000.0, 0.8, 0.02);
    }

    #[test]
    #[should_panic]
    fn pflip_should_panic_on_empty() {
        pflip(&[], 1, &mut rand::thread_rng());
    }
}
