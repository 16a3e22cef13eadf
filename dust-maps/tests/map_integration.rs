use approx::assert_abs_diff_eq;
use dust_maps::pixel::healpix::{npix, pix2ang_nest};
use dust_maps::{
    DatasetVariant, DustError, DustMap3D, HealpixDataset, HealpixExtinctionMap, MapConfig,
    MapState, PixelCatalog, PixelInfo,
};
use tempfile::TempDir;

const N_BINS: usize = 31;
const N_SAMPLES: usize = 4;

fn grid() -> Vec<f64> {
    (0..N_BINS).map(|i| 4.0 + 0.5 * i as f64).collect()
}

/// Extinction of entry `e` at bin `j`: monotone in distance, distinct per entry.
fn best_fit_value(entry: usize, bin: usize) -> f64 {
    0.01 * (entry + 1) as f64 * (bin as f64).sqrt()
}

fn sample_value(entry: usize, sample: usize, bin: usize) -> f64 {
    best_fit_value(entry, bin) * (1.0 + 0.1 * (sample + 1) as f64)
}

/// Nside-4 refinement of base pixel 0, nside 2 refinement of base pixel 1,
/// base pixels 2..11 at nside 1.
fn mixed_catalog() -> PixelCatalog {
    let mut entries: Vec<PixelInfo> = (0..16).map(|p| PixelInfo::new(p, 4)).collect();
    entries.extend((4..8).map(|p| PixelInfo::new(p, 2)));
    entries.extend((2..12).map(|p| PixelInfo::new(p, 1)));
    PixelCatalog::new(entries).unwrap()
}

fn mixed_dataset() -> HealpixDataset {
    let catalog = mixed_catalog();
    let n = catalog.len();
    let best_fit: Vec<f64> = (0..n)
        .flat_map(|e| (0..N_BINS).map(move |j| best_fit_value(e, j)))
        .collect();
    let samples: Vec<f64> = (0..n)
        .flat_map(|e| {
            (0..N_SAMPLES).flat_map(move |s| (0..N_BINS).map(move |j| sample_value(e, s, j)))
        })
        .collect();
    HealpixDataset::from_parts(catalog, grid(), best_fit, Some((N_SAMPLES, samples))).unwrap()
}

fn install(variant: DatasetVariant) -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let path = variant.path_in(root.path(), true);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    mixed_dataset().save(&path).unwrap();
    root
}

#[test]
fn test_open_variant_and_evaluate_on_grid() {
    let root = install(DatasetVariant::Green17);
    let map =
        HealpixExtinctionMap::open_in(DatasetVariant::Green17, root.path(), &MapConfig::default())
            .unwrap();
    assert_eq!(map.distmods().len(), N_BINS);

    for entry in [0usize, 7, 16, 19, 20, 29] {
        let info = map.catalog().entries()[entry];
        let (l, b) = pix2ang_nest(info.nside, info.healpix_index);
        assert_eq!(map.resolve_index(l, b).unwrap(), entry);
        for bin in [0usize, 12, 30] {
            let distance = 10f64.powf((map.distmods()[bin] - 10.0) / 5.0);
            assert_abs_diff_eq!(
                map.evaluate(l, b, distance).unwrap(),
                best_fit_value(entry, bin),
                epsilon = 1e-9
            );
        }
    }
}

#[test]
fn test_higher_order_splines_reproduce_grid() {
    let root = install(DatasetVariant::Green15);
    for order in 1..=5 {
        let config = MapConfig::default().with_interp_order(order);
        let map = HealpixExtinctionMap::open_in(DatasetVariant::Green15, root.path(), &config)
            .unwrap();
        let (l, b) = pix2ang_nest(1, 5);
        let entry = map.resolve_index(l, b).unwrap();
        let distances: Vec<f64> = grid()
            .iter()
            .map(|dm| 10f64.powf((dm - 10.0) / 5.0))
            .collect();
        let values = map.evaluate_along(l, b, &distances).unwrap();
        for (bin, value) in values.iter().enumerate() {
            assert_abs_diff_eq!(*value, best_fit_value(entry, bin), epsilon = 1e-8);
        }
    }
}

#[test]
fn test_samples_through_container() {
    let root = install(DatasetVariant::Green19);
    // Green19's registered grid has 120 bins, this fixture has 31
    let err = HealpixExtinctionMap::open_in(DatasetVariant::Green19, root.path(), &MapConfig::default())
        .unwrap_err();
    assert!(err.is_integrity_error());

    let path = DatasetVariant::Green19.path_in(root.path(), true);
    let config = MapConfig::default().with_samples(true);
    let mut map = HealpixExtinctionMap::open_path(&path, &config, None).unwrap();
    let (l, b) = pix2ang_nest(4, 9);
    let before = map.evaluate(l, b, 1.0).unwrap();

    map.use_sample(3).unwrap();
    assert_eq!(map.state(), MapState::UsingSample(3));
    let after = map.evaluate(l, b, 1.0).unwrap();
    assert_abs_diff_eq!(after, before * 1.4, epsilon = 1e-12);

    assert!(matches!(
        map.use_sample(N_SAMPLES),
        Err(DustError::SampleIndexOutOfRange { .. })
    ));
    assert_eq!(map.state(), MapState::UsingSample(3));
}

#[test]
fn test_samples_not_loaded_by_default() {
    let root = install(DatasetVariant::Green17);
    let mut map =
        HealpixExtinctionMap::open_in(DatasetVariant::Green17, root.path(), &MapConfig::default())
            .unwrap();
    assert!(matches!(map.use_sample(0), Err(DustError::SamplesUnavailable)));
    assert_eq!(map.state(), MapState::UsingBestFit);
}

#[test]
fn test_samples_requested_from_container_without_them() {
    let root = tempfile::tempdir().unwrap();
    let path = DatasetVariant::Green17.path_in(root.path(), true);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let catalog = PixelCatalog::new((0..12).map(|p| PixelInfo::new(p, 1)).collect()).unwrap();
    let best_fit: Vec<f64> = (0..12)
        .flat_map(|e| (0..N_BINS).map(move |j| best_fit_value(e, j)))
        .collect();
    HealpixDataset::from_parts(catalog, grid(), best_fit, None)
        .unwrap()
        .save(&path)
        .unwrap();

    let config = MapConfig::default().with_samples(true);
    assert!(matches!(
        HealpixExtinctionMap::open_in(DatasetVariant::Green17, root.path(), &config),
        Err(DustError::SamplesUnavailable)
    ));
    assert!(
        HealpixExtinctionMap::open_in(DatasetVariant::Green17, root.path(), &MapConfig::default())
            .is_ok()
    );
}

#[test]
fn test_combined_variant_rejects_samples() {
    let root = install(DatasetVariant::Combined15);
    let config = MapConfig::default().with_samples(true);
    assert!(matches!(
        HealpixExtinctionMap::open_in(DatasetVariant::Combined15, root.path(), &config),
        Err(DustError::SamplesUnavailable)
    ));
}

#[test]
fn test_missing_dataset_is_recoverable() {
    let root = tempfile::tempdir().unwrap();
    let err =
        HealpixExtinctionMap::open_in(DatasetVariant::Green17, root.path(), &MapConfig::default())
            .unwrap_err();
    assert!(err.is_recoverable());
}

#[test]
fn test_batch_over_whole_sky() {
    let root = install(DatasetVariant::Green17);
    let map =
        HealpixExtinctionMap::open_in(DatasetVariant::Green17, root.path(), &MapConfig::default())
            .unwrap();
    let mut lons = Vec::new();
    let mut lats = Vec::new();
    for i in 0..36 {
        for j in 0..17 {
            lons.push(i as f64 * 10.0 + 3.0);
            lats.push(-80.0 + j as f64 * 10.0);
        }
    }
    let batch = map.evaluate_batch(&lons, &lats, &[2.0]).unwrap();
    assert!(batch.iter().all(|v| v.is_finite()));
    for k in (0..lons.len()).step_by(37) {
        assert_eq!(batch[k], map.evaluate(lons[k], lats[k], 2.0).unwrap());
    }
}

#[test]
fn test_disk_and_raster() {
    let root = install(DatasetVariant::Green17);
    let config = MapConfig::default().with_filter("E(B-V)");
    let map = HealpixExtinctionMap::open_in(DatasetVariant::Green17, root.path(), &config).unwrap();

    let (l, b) = pix2ang_nest(4, 5);
    let disk = map.query_disk(l, b, 1.0, 60.0).unwrap();
    assert!(!disk.is_empty());
    let areas: Vec<f64> = [1u32, 2, 4]
        .iter()
        .map(|&n| dust_maps::pixel::healpix::pixel_area(n))
        .collect();
    assert!(disk
        .pixel_area
        .iter()
        .all(|a| areas.iter().any(|x| (x - a).abs() < 1e-15)));

    let raster = map.rasterize(1.0).unwrap();
    assert_eq!(raster.nside, 4);
    assert_eq!(raster.values.len() as u64, npix(4));
    assert_eq!(raster.coverage(), 1.0);
    let entry = map.resolve_index(l, b).unwrap();
    assert_abs_diff_eq!(
        raster.value_at(l, b),
        best_fit_value(entry, 12) * map.scale_factor(),
        epsilon = 1e-12
    );
}

#[test]
fn test_concurrent_readers_share_cache() {
    let root = install(DatasetVariant::Green17);
    let map =
        HealpixExtinctionMap::open_in(DatasetVariant::Green17, root.path(), &MapConfig::default())
            .unwrap();
    let map: &dyn DustMap3D = &map;
    let results: Vec<Vec<f64>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    (0..30)
                        .map(|k| map.evaluate(k as f64 * 12.0, 15.0, 3.0).unwrap())
                        .collect::<Vec<f64>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for other in &results[1..] {
        assert_eq!(other, &results[0]);
    }
}
