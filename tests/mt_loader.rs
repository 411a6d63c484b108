#[cfg(feature = "mt")]
mod mt_tests {
    use std::fs;

    use image::{Rgb, RgbImage};
    use kira_karyotype::config::ExperimentConfig;
    use kira_karyotype::dataset::PairedDataset;
    use kira_karyotype::index::ImageRecord;
    use kira_karyotype::pairing::PairedSample;
    use kira_karyotype::sampling::BatchLoader;
    use tempfile::TempDir;

    fn record(path: std::path::PathBuf, label: usize) -> ImageRecord {
        let sample_id = path.file_stem().unwrap().to_string_lossy().to_string();
        ImageRecord {
            path,
            sample_id,
            label: Some(label),
        }
    }

    #[test]
    fn parallel_loading_matches_sequential() {
        let tmp = TempDir::new().unwrap();
        let mut config = ExperimentConfig::default();
        config.cls_num = 3;
        config.aug_params.augmentation.output_shape = [10, 10];

        let mut pairs = Vec::new();
        for i in 0..9u32 {
            let o = tmp.path().join(format!("o{}.png", i));
            let h = tmp.path().join(format!("h{}.png", i));
            let img = RgbImage::from_fn(9, 5, |x, y| Rgb([(x * 25) as u8, (y * 40) as u8, i as u8]));
            img.save(&o).unwrap();
            img.save(&h).unwrap();
            let label = (i % 3) as usize;
            pairs.push(PairedSample {
                original: record(o, label),
                highpass: record(h, label),
                label: Some(label),
            });
        }
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 18);

        let ds = PairedDataset::new(
            pairs,
            &config,
            Some(&config.aug_params.augmentation),
            false,
        )
        .unwrap();
        let order: Vec<usize> = (0..9).rev().collect();

        let seq = BatchLoader::new(&ds, 4, 42, 1).unwrap();
        let par = BatchLoader::new(&ds, 4, 42, 3).unwrap();
        let a: Vec<_> = seq.batches(&order, 2).map(|b| b.unwrap()).collect();
        let b: Vec<_> = par.batches(&order, 2).map(|b| b.unwrap()).collect();

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.original, y.original);
            assert_eq!(x.highpass, y.highpass);
            assert_eq!(x.names, y.names);
        }
    }
}
