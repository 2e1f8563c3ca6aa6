//! Property-based tests for the cascada-core oversampling engine.
//!
//! Tests bypass identity, block-size invariance, numerical stability and
//! reset equivalence using proptest for randomized input generation.

use cascada_core::{IirOrder, OversampledProcessor, StageDesign};
use proptest::prelude::*;

const MAX_BLOCK: usize = 256;

/// Stage designs indexed 0..5 (FIR, IIR order 2/4/6/8).
fn design(variant: usize) -> StageDesign {
    match variant % 5 {
        0 => StageDesign::Fir,
        n => StageDesign::Iir {
            order: IirOrder::ALL[n - 1],
        },
    }
}

fn prepared(variant: usize) -> OversampledProcessor {
    let mut processor = OversampledProcessor::new(design(variant));
    processor.prepare(1, MAX_BLOCK);
    processor
}

/// Identity-callback processing of `signal` in chunks of `chunk` samples.
fn run_chunked(
    processor: &mut OversampledProcessor,
    factor: usize,
    signal: &[f32],
    chunk: usize,
) -> Vec<f32> {
    let mut out = vec![0.0_f32; signal.len()];
    for (x, y) in signal.chunks(chunk).zip(out.chunks_mut(chunk)) {
        let n = x.len();
        processor.process_block(factor, &[x], &mut [y], n, |_| {});
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Factor 1 and every unsupported factor call the callback on the
    /// unmodified input at the base rate.
    #[test]
    fn bypass_is_direct_call(
        factor in 0usize..40,
        gain in -2.0f32..2.0f32,
        variant in 0usize..5,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        prop_assume!(![2, 4, 8, 16].contains(&factor));
        let mut processor = prepared(variant);
        let mut output = [[0.0_f32; 32]];
        processor.process_block(factor, &[input], &mut output, 32, |block| {
            block.for_each_sample(|s| *s *= gain);
        });

        for (i, (&y, &x)) in output[0].iter().zip(&input).enumerate() {
            prop_assert_eq!(y, x * gain, "factor {} sample {}", factor, i);
        }
        prop_assert_eq!(processor.latency_samples(factor), 0);
    }

    /// Splitting a signal into smaller blocks does not change the output.
    #[test]
    fn block_split_invariant(
        factor in prop::sample::select(vec![2usize, 4, 8, 16]),
        variant in 0usize..5,
        chunk in 1usize..MAX_BLOCK,
        signal in prop::collection::vec(-1.0f32..=1.0f32, 1..MAX_BLOCK),
    ) {
        let mut whole = prepared(variant);
        let mut split = prepared(variant);

        let a = run_chunked(&mut whole, factor, &signal, MAX_BLOCK);
        let b = run_chunked(&mut split, factor, &signal, chunk);
        prop_assert_eq!(a, b, "{}x, {}, chunk {}", factor, design(variant), chunk);
    }

    /// Random bounded input through a saturating callback stays finite and
    /// bounded at every factor.
    #[test]
    fn output_finite_and_bounded(
        factor in prop::sample::select(vec![2usize, 4, 8, 16]),
        variant in 0usize..5,
        drive in 0.1f32..20.0f32,
        signal in prop::collection::vec(-1.0f32..=1.0f32, 64..MAX_BLOCK),
    ) {
        let mut processor = prepared(variant);
        let mut output = vec![0.0_f32; signal.len()];
        let n = signal.len();
        processor.process_block(factor, &[&signal[..]], &mut [&mut output[..]], n, |block| {
            block.for_each_sample(|s| *s = libm::tanhf(*s * drive));
        });

        for (i, &y) in output.iter().enumerate() {
            prop_assert!(
                y.is_finite() && y.abs() < 16.0,
                "{}x {} produced {} at sample {}",
                factor, design(variant), y, i
            );
        }
    }

    /// After `reset()`, a processor behaves exactly like a freshly prepared one.
    #[test]
    fn reset_equivalence(
        factor in prop::sample::select(vec![2usize, 4, 8, 16]),
        variant in 0usize..5,
        history in prop::array::uniform32(-1.0f32..=1.0f32),
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut used = prepared(variant);
        run_chunked(&mut used, factor, &history, 32);
        used.reset();
        let mut fresh = prepared(variant);

        let a = run_chunked(&mut used, factor, &input, 32);
        let b = run_chunked(&mut fresh, factor, &input, 32);
        prop_assert_eq!(a, b);
    }
}
