use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use kira_karyotype::config::ExperimentConfig;
use kira_karyotype::dataset::{PairedDataset, PairedItem, Target};
use kira_karyotype::error::DataError;
use kira_karyotype::index::ImageRecord;
use kira_karyotype::pairing::PairedSample;
use kira_karyotype::sampling::{
    BalancedSampler, BatchLoader, ClassWeightTable, collate, drawn_histogram, mix_seed,
};
use ndarray::Array3;
use tempfile::TempDir;

fn item(h: usize, w: usize, label: usize) -> PairedItem {
    PairedItem {
        original: Array3::from_elem((3, h, w), label as f32),
        highpass: Array3::from_elem((3, h, w), -(label as f32)),
        target: Target::one_hot(label, 4).unwrap(),
        names: (format!("o{}.png", label), format!("h{}.png", label)),
    }
}

#[test]
fn weights_are_inverse_class_frequency() {
    let table = ClassWeightTable::from_counts(&[4, 0, 1], 100.0);
    assert_eq!(table.weight(0), Some(25.0));
    assert_eq!(table.weight(1), None);
    assert_eq!(table.weight(2), Some(100.0));
    assert_eq!(table.weight(9), None);

    assert_eq!(table.sample_weights(&[2, 0]).unwrap(), vec![100.0, 25.0]);
    assert!(matches!(
        table.sample_weights(&[1]),
        Err(DataError::InvalidLabel(_))
    ));
}

#[test]
fn balanced_draw_converges_to_uniform_classes() {
    let mut labels = vec![0usize; 900];
    labels.extend(std::iter::repeat(1).take(90));
    labels.extend(std::iter::repeat(2).take(10));

    let table = ClassWeightTable::from_labels(&labels, 3, 100.0).unwrap();
    let weights = table.sample_weights(&labels).unwrap();
    let sampler = BalancedSampler::new(&weights, 30_000, 7).unwrap();

    let drawn = sampler.draw(0);
    assert_eq!(drawn.len(), 30_000);
    let hist = drawn_histogram(&drawn, &labels, 3).unwrap();
    for count in hist {
        assert!((9_000..=11_000).contains(&count), "class drawn {count} times");
    }
}

#[test]
fn draws_are_reproducible_per_epoch() {
    let sampler = BalancedSampler::new(&[1.0, 2.0, 3.0, 4.0], 64, 11).unwrap();
    assert_eq!(sampler.draw(3), sampler.draw(3));
    assert_ne!(sampler.draw(3), sampler.draw(4));
    assert_ne!(mix_seed(11, 0, 1), mix_seed(11, 0, 2));
}

#[test]
fn empty_or_zero_weights_are_rejected() {
    assert!(BalancedSampler::new(&[], 10, 0).is_err());
    assert!(BalancedSampler::new(&[0.0, 0.0], 10, 0).is_err());
}

#[test]
fn histogram_checks_indices() {
    let err = drawn_histogram(&[0, 5], &[1, 1], 2).unwrap_err();
    assert!(matches!(err, DataError::OutOfRange { index: 5, len: 2 }));
}

#[test]
fn collate_stacks_items_nchw() {
    let batch = collate(vec![item(4, 5, 1), item(4, 5, 3)]).unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.original.shape(), &[2, 3, 4, 5]);
    assert_eq!(batch.original[[1, 2, 3, 4]], 3.0);
    assert_eq!(batch.highpass[[0, 0, 0, 0]], -1.0);
    assert_eq!(batch.targets[1].class(), Some(3));
    assert_eq!(batch.names[0].0, "o1.png");
}

#[test]
fn collate_rejects_empty_and_ragged_batches() {
    assert!(matches!(collate(Vec::new()), Err(DataError::ShapeMismatch(_))));
    assert!(matches!(
        collate(vec![item(4, 5, 0), item(5, 4, 1)]),
        Err(DataError::ShapeMismatch(_))
    ));
}

fn write_png(path: &Path, shade: u8) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(6, 6, Rgb([shade, shade, shade]))
        .save(path)
        .unwrap();
}

#[test]
fn loader_walks_order_in_fixed_batches() {
    let tmp = TempDir::new().unwrap();
    let mut config = ExperimentConfig::default();
    config.cls_num = 2;
    config.aug_params.onlyresize.output_shape = [8, 8];

    let pairs: Vec<PairedSample> = (0..5)
        .map(|i| {
            let o = tmp.path().join(format!("o{}.png", i));
            let h = tmp.path().join(format!("h{}.png", i));
            write_png(&o, 10 * i as u8);
            write_png(&h, 200 - 10 * i as u8);
            PairedSample {
                original: ImageRecord {
                    path: o,
                    sample_id: format!("o{}", i),
                    label: Some(i % 2),
                },
                highpass: ImageRecord {
                    path: h,
                    sample_id: format!("h{}", i),
                    label: Some(i % 2),
                },
                label: Some(i % 2),
            }
        })
        .collect();
    let ds = PairedDataset::new(pairs, &config, Some(&config.aug_params.onlyresize), false)
        .unwrap();

    assert!(BatchLoader::new(&ds, 0, 0, 1).is_err());

    let loader = BatchLoader::new(&ds, 2, 0, 1).unwrap();
    let order = vec![4, 0, 1, 3, 2];
    assert_eq!(loader.num_batches(order.len()), 3);

    let batches: Vec<_> = loader
        .batches(&order, 0)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(batches[0].names[0].0, "o4.png");
    assert_eq!(batches[2].original.shape(), &[1, 3, 8, 8]);
    assert_eq!(batches[1].targets[1].class(), Some(1));
}
