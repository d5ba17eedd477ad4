use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use ndarray::{Array2, Axis};
use pretty_assertions::assert_eq;
use rstest::*;

use genomeloader_core::SequenceProvider;
use genomeloader_core::models::{GenomeAssembly, Region, RegionSet};
use genomeloader_generators::jitter::centered_window;
use genomeloader_generators::{
    BatchInputs, BatchLabels, BedGraphConfig, BedGraphGenerator, GeneratorConfig, GeneratorError,
    JitterMode, MultiBedGenerator,
};
use genomeloader_intervals::CoverageTrack;

/// Signal whose value at each base is the base's coordinate.
struct CoordinateTrack;

impl SequenceProvider for CoordinateTrack {
    fn fetch(&self, _chrom: &str, start: i64, end: i64) -> Result<Array2<f32>> {
        let values: Vec<f32> = (start..end).map(|p| p as f32).collect();
        Ok(Array2::from_shape_vec((values.len(), 1), values)?)
    }

    fn n_features(&self) -> usize {
        1
    }
}

fn window_starts(inputs: &BatchInputs) -> Vec<i64> {
    let coordinates = &inputs.signals()[0];
    (0..inputs.len())
        .map(|i| coordinates[[i, 0, 0]] as i64)
        .collect()
}

fn overlaps_any(region: &Region, set: &RegionSet) -> bool {
    set.regions
        .iter()
        .any(|r| r.overlaps(&region.chr, region.start, region.end))
}

#[fixture]
fn toy_genome() -> GenomeAssembly {
    GenomeAssembly::try_from("../tests/data/genome/toy.fa").unwrap()
}

#[fixture]
fn peaks() -> RegionSet {
    RegionSet::try_from("../tests/data/regionset/peaks.bed").unwrap()
}

#[fixture]
fn blacklist() -> RegionSet {
    RegionSet::try_from("../tests/data/regionset/blacklist.bed").unwrap()
}

#[fixture]
fn single_peak() -> RegionSet {
    RegionSet::from(vec![Region::new("chr1", 1000, 1100)])
}

#[rstest]
fn test_end_to_end_single_peak(toy_genome: GenomeAssembly, single_peak: RegionSet) {
    let config = GeneratorConfig {
        batch_size: 1,
        seq_len: 1024,
        window_len: 200,
        negatives_ratio: 1,
        jitter_mode: JitterMode::None,
        seed: Some(42),
        ..Default::default()
    };
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(single_peak.clone())
        .config(config)
        .build()
        .unwrap();

    assert_eq!(generator.intervals().len(), 2);
    assert_eq!(generator.len(), 2);

    let rows = generator.intervals().regions.clone();
    for (index, row) in rows.iter().enumerate() {
        let batch = generator.get_batch(index).unwrap();
        assert_eq!(batch.inputs.genome().dim(), (1, 1024, 4));

        let Some(BatchLabels::Binary(labels)) = batch.labels else {
            panic!("binary labels expected");
        };
        assert_eq!(labels.dim(), (1, 1));
        // the negative can touch at most half of its window
        assert_eq!(labels[[0, 0]], row == &single_peak.regions[0]);
    }
}

#[rstest]
#[case(2)]
#[case(3)]
#[case(7)]
fn test_batches_reconstruct_table(
    toy_genome: GenomeAssembly,
    peaks: RegionSet,
    #[case] batch_size: usize,
) {
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(peaks)
        .signal(CoordinateTrack)
        .config(GeneratorConfig {
            batch_size,
            jitter_mode: JitterMode::None,
            seed: Some(1),
            ..Default::default()
        })
        .build()
        .unwrap();

    for _ in 0..3 {
        let table = generator.intervals().clone();
        assert_eq!(generator.len(), table.len().div_ceil(batch_size));

        let mut starts = Vec::new();
        for batch in generator.iter_batches() {
            starts.extend(window_starts(&batch.unwrap().inputs));
        }
        let expected: Vec<i64> = table
            .regions
            .iter()
            .map(|r| centered_window(r.mid_point_x2(), 1024).0)
            .collect();
        assert_eq!(starts, expected);

        generator.on_epoch_end().unwrap();
    }
}

#[rstest]
fn test_genome_windows_match_table_rows(peaks: RegionSet) {
    let reference = GenomeAssembly::try_from("../tests/data/genome/toy.fa").unwrap();
    let mut generator = MultiBedGenerator::builder(
        GenomeAssembly::try_from("../tests/data/genome/toy.fa").unwrap(),
    )
    .bed(peaks)
    .config(GeneratorConfig {
        batch_size: 3,
        jitter_mode: JitterMode::None,
        seed: Some(2),
        ..Default::default()
    })
    .build()
    .unwrap();

    let rows = generator.intervals().slice(0, 3).to_vec();
    let batch = generator.get_batch(0).unwrap();
    for (i, row) in rows.iter().enumerate() {
        let (start, end) = centered_window(row.mid_point_x2(), 1024);
        assert_eq!(
            batch.inputs.genome().index_axis(Axis(0), i),
            reference.fetch(&row.chr, start, end).unwrap()
        );
    }
}

#[rstest]
#[case(JitterMode::Sliding)]
#[case(JitterMode::Detection)]
fn test_jittered_windows_stay_within_bound(
    toy_genome: GenomeAssembly,
    peaks: RegionSet,
    #[case] jitter_mode: JitterMode,
) {
    let config = GeneratorConfig {
        batch_size: 8,
        output_seq_len: Some(300),
        jitter_mode,
        seed: Some(9),
        ..Default::default()
    };
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(peaks)
        .signal(CoordinateTrack)
        .config(config.clone())
        .build()
        .unwrap();

    for _ in 0..10 {
        let rows = generator.intervals().regions.clone();
        let batch = generator.get_batch(0).unwrap();
        for (row, start) in rows.iter().zip(window_starts(&batch.inputs)) {
            let bound = jitter_mode.shift_bound(row, config.window_len, 300);
            let mid_x2 = row.mid_point_x2();
            let lowest = centered_window(mid_x2 - 2 * bound, config.seq_len).0;
            let highest = centered_window(mid_x2 + 2 * bound, config.seq_len).0;
            assert!(
                (lowest..=highest).contains(&start),
                "{} window start {} outside [{}, {}]",
                row,
                start,
                lowest,
                highest
            );
        }
        generator.on_epoch_end().unwrap();
    }
}

#[rstest]
fn test_no_shuffle_keeps_first_table(toy_genome: GenomeAssembly, peaks: RegionSet) {
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(peaks)
        .config(GeneratorConfig {
            shuffle: false,
            seed: Some(5),
            ..Default::default()
        })
        .build()
        .unwrap();

    let first = generator.intervals().clone();
    assert_eq!(generator.epoch(), Some(0));
    for _ in 0..5 {
        generator.on_epoch_end().unwrap();
    }
    assert_eq!(generator.epoch(), Some(5));
    assert_eq!(generator.intervals(), &first);
}

#[rstest]
fn test_shuffle_changes_table(toy_genome: GenomeAssembly, peaks: RegionSet) {
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(peaks)
        .config(GeneratorConfig {
            seed: Some(5),
            ..Default::default()
        })
        .build()
        .unwrap();

    let first = generator.intervals().clone();
    generator.on_epoch_end().unwrap();
    assert_eq!(generator.intervals().len(), first.len());
    assert_ne!(generator.intervals(), &first);
}

#[rstest]
#[case(1100, true)]
#[case(1099, false)]
fn test_majority_coverage_label(
    toy_genome: GenomeAssembly,
    #[case] end: u32,
    #[case] expected: bool,
) {
    // a lone positive of `end - 1000` bases centered in a 200bp label window
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(RegionSet::from(vec![Region::new("chr1", 1000, end)]))
        .config(GeneratorConfig {
            negatives_ratio: 0,
            jitter_mode: JitterMode::None,
            window_len: 200,
            seed: Some(0),
            ..Default::default()
        })
        .build()
        .unwrap();

    let batch = generator.get_batch(0).unwrap();
    assert_eq!(
        batch.labels,
        Some(BatchLabels::Binary(Array2::from_elem((1, 1), expected)))
    );
}

#[rstest]
#[case("chr1\t1000\t1200\t0\n", true)]
#[case("chr1\t1000\t1200\t1\t960\t+\n", true)]
#[case("chr1\t1000\t1099\t2\t960\t+\n", false)]
fn test_bed_name_column_does_not_weight_labels(
    toy_genome: GenomeAssembly,
    #[case] contents: &str,
    #[case] expected: bool,
) {
    let tempdir = tempfile::tempdir().unwrap();
    let path = tempdir.path().join("named.bed");
    std::fs::write(&path, contents).unwrap();

    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(RegionSet::try_from(path.as_path()).unwrap())
        .config(GeneratorConfig {
            negatives_ratio: 0,
            jitter_mode: JitterMode::None,
            seed: Some(0),
            ..Default::default()
        })
        .build()
        .unwrap();

    let batch = generator.get_batch(0).unwrap();
    assert_eq!(
        batch.labels,
        Some(BatchLabels::Binary(Array2::from_elem((1, 1), expected)))
    );
}

#[rstest]
fn test_negatives_avoid_positives_and_blacklist(
    toy_genome: GenomeAssembly,
    peaks: RegionSet,
    blacklist: RegionSet,
) {
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(peaks.clone())
        .blacklist(blacklist.clone())
        .config(GeneratorConfig {
            seed: Some(11),
            ..Default::default()
        })
        .build()
        .unwrap();

    for _ in 0..25 {
        assert_eq!(generator.intervals().len(), 2 * peaks.len());
        let negatives = generator.sampler().pool().clone();
        assert_eq!(negatives.len(), peaks.len());
        for negative in &negatives.regions {
            assert!(!overlaps_any(negative, generator.sampler().base_exclusion()));
            assert!(!overlaps_any(negative, &blacklist));
            assert!(!overlaps_any(negative, &peaks));
        }
        generator.on_epoch_end().unwrap();
    }
}

#[rstest]
fn test_exhaustion_triggers_reset_without_error() {
    let genome = GenomeAssembly::from(HashMap::from([(
        "chr1".to_string(),
        b"ACGT".repeat(250),
    )]));
    let positive = RegionSet::from(vec![Region::new("chr1", 450, 550)]);
    let mut generator = MultiBedGenerator::builder(genome)
        .bed(positive.clone())
        .config(GeneratorConfig {
            batch_size: 2,
            jitter_mode: JitterMode::None,
            seed: Some(4),
            ..Default::default()
        })
        .build()
        .unwrap();

    for _ in 0..30 {
        generator.on_epoch_end().unwrap();
        let negatives = generator.sampler().pool();
        assert_eq!(negatives.len(), 1);
        assert!(!overlaps_any(&negatives.regions[0], &positive));
        assert_eq!(generator.get_batch(0).unwrap().len(), 2);
    }
    assert!(generator.sampler().resets() > 0);
}

#[rstest]
fn test_signals_are_wrapped_with_genome(toy_genome: GenomeAssembly, peaks: RegionSet) {
    let signal = RegionSet::try_from("../tests/data/regionset/signal.bedGraph").unwrap();
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(peaks)
        .signal(CoverageTrack::values(&signal).unwrap())
        .signal(CoordinateTrack)
        .config(GeneratorConfig {
            batch_size: 4,
            seed: Some(6),
            ..Default::default()
        })
        .build()
        .unwrap();

    let batch = generator.get_batch(0).unwrap();
    let BatchInputs::WithSignals(arrays) = &batch.inputs else {
        panic!("signal tracks are configured");
    };
    assert_eq!(arrays.len(), 3);
    assert_eq!(arrays[0].dim(), (4, 1024, 4));
    assert_eq!(arrays[1].dim(), (4, 1024, 1));
    assert_eq!(arrays[2].dim(), (4, 1024, 1));
}

#[rstest]
fn test_out_of_bounds_batch(toy_genome: GenomeAssembly, peaks: RegionSet) {
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(peaks)
        .config(GeneratorConfig {
            batch_size: 3,
            seed: Some(0),
            ..Default::default()
        })
        .build()
        .unwrap();

    assert_eq!(generator.len(), 3);
    assert!(matches!(
        generator.get_batch(3),
        Err(GeneratorError::IndexOutOfBounds { index: 3, len: 3 })
    ));
    // last batch is the remainder
    assert_eq!(generator.get_batch(2).unwrap().len(), 2);
}

#[rstest]
fn test_config_from_toml(toy_genome: GenomeAssembly, single_peak: RegionSet) {
    let tempdir = tempfile::tempdir().unwrap();
    let path = tempdir.path().join("generator.toml");
    std::fs::write(
        &path,
        "batch_size = 1\nseq_len = 512\nnegatives_ratio = 2\njitter_mode = \"none\"\nseed = 3\n",
    )
    .unwrap();

    let config = GeneratorConfig::try_from(path.as_path()).unwrap();
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(single_peak)
        .config(config)
        .build()
        .unwrap();

    assert_eq!(generator.len(), 3);
    assert_eq!(generator.get_batch(0).unwrap().inputs.genome().dim(), (1, 512, 4));
}

#[rstest]
fn test_bedgraph_generator_from_files(toy_genome: GenomeAssembly) {
    let path = Path::new("../tests/data/regionset/signal.bedGraph");
    let bedgraph = RegionSet::try_from(path).unwrap();
    let generator = BedGraphGenerator::new(
        bedgraph,
        toy_genome,
        vec![Box::new(CoordinateTrack) as Box<dyn SequenceProvider>],
        BedGraphConfig {
            batch_size: 4,
            seq_len: None,
            shuffle: false,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(generator.len(), 1);
    let batch = generator.get_batch(0).unwrap();
    assert_eq!(batch.inputs.genome().dim(), (4, 200, 4));
    assert_eq!(window_starts(&batch.inputs), vec![100, 300, 0, 400]);
    assert_eq!(
        batch.labels,
        Some(BatchLabels::Values(ndarray::arr1(&[0.5, 1.5, 2.0, 0.25])))
    );
}

#[fixture]
fn mixed_sign_bedgraph() -> RegionSet {
    RegionSet::from(vec![
        Region {
            chr: "chr1".to_string(),
            start: 100,
            end: 110,
            rest: Some("-2.5".to_string()),
        },
        Region {
            chr: "chr1".to_string(),
            start: 105,
            end: 120,
            rest: Some("0.75".to_string()),
        },
    ])
}

#[rstest]
fn test_bedgraph_negative_and_overlapping_values(
    toy_genome: GenomeAssembly,
    mixed_sign_bedgraph: RegionSet,
) {
    let generator = BedGraphGenerator::new(
        mixed_sign_bedgraph,
        toy_genome,
        vec![],
        BedGraphConfig {
            batch_size: 1,
            seq_len: Some(40),
            return_sequences: true,
            shuffle: false,
            ..Default::default()
        },
    )
    .unwrap();

    // first row chr1:100-110, window 85..125
    let Some(BatchLabels::Sequence(labels)) = generator.get_batch(0).unwrap().labels else {
        panic!("sequence labels expected");
    };
    assert_eq!(labels.dim(), (1, 40, 1));
    assert_eq!(labels[[0, 14, 0]], 0.0);
    assert_eq!(labels[[0, 15, 0]], -2.5);
    assert_eq!(labels[[0, 19, 0]], -2.5);
    assert_eq!(labels[[0, 20, 0]], 0.75);
    assert_eq!(labels[[0, 34, 0]], 0.75);
    assert_eq!(labels[[0, 35, 0]], 0.0);
}

#[rstest]
fn test_negative_signal_track(toy_genome: GenomeAssembly, mixed_sign_bedgraph: RegionSet) {
    let mut generator = MultiBedGenerator::builder(toy_genome)
        .bed(RegionSet::from(vec![Region::new("chr1", 100, 110)]))
        .signal(CoverageTrack::values(&mixed_sign_bedgraph).unwrap())
        .config(GeneratorConfig {
            negatives_ratio: 0,
            jitter_mode: JitterMode::None,
            seed: Some(0),
            ..Default::default()
        })
        .build()
        .unwrap();

    // window -407..617 puts chr1:100 at row 507
    let batch = generator.get_batch(0).unwrap();
    let signal = &batch.inputs.signals()[0];
    assert_eq!(signal[[0, 506, 0]], 0.0);
    assert_eq!(signal[[0, 507, 0]], -2.5);
    assert_eq!(signal[[0, 512, 0]], 0.75);
    assert_eq!(signal.sum(), 5.0 * -2.5 + 15.0 * 0.75);
}
