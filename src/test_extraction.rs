// End-to-end extraction scenarios on synthetic calibration streams:
// pedestal (mean 2, std 5), flat-field charge (mean 77, std 10) and
// peak time (mean 18, std 5) for a two-gain camera.

#[cfg(test)]
mod tests {
    use crate::engine::{extract, ExtractionConfig};
    use crate::error::{ConfigurationError, ExtractionError};
    use crate::extractor::{
        ExtractorKind, PlainExtractor, SigmaClippingConfig, SigmaClippingExtractor,
    };
    use crate::series::SampleSeries;
    use crate::simulate::GaussianSeriesParams;
    use crate::statistics::StatisticsRecord;
    use nalgebra::DMatrix;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    const CHUNK_SIZE: usize = 2500;
    const PIXELS: usize = 40;

    fn gaussian_series(
        samples: usize,
        mean: f64,
        std_dev: f64,
        column: &str,
        seed: u64,
    ) -> SampleSeries {
        let params = GaussianSeriesParams {
            samples,
            channels: 2,
            pixels: PIXELS,
            mean,
            std_dev,
            ..Default::default()
        };
        params
            .generate(column, &mut StdRng::seed_from_u64(seed))
            .unwrap()
    }

    fn sigma_clipping() -> SigmaClippingExtractor {
        SigmaClippingExtractor::new(SigmaClippingConfig::default()).unwrap()
    }

    fn assert_all_close(values: &DMatrix<f64>, expected: f64, tolerance: f64) {
        for v in values.iter() {
            assert!(
                (v - expected).abs() <= tolerance,
                "value {} not within {} of {}",
                v,
                tolerance,
                expected
            );
        }
    }

    fn assert_recovers(record: &StatisticsRecord, mean: f64, std_dev: f64) {
        assert_all_close(&record.mean, mean, 1.5);
        assert_all_close(&record.median, mean, 1.5);
        assert_all_close(&record.std, std_dev, 1.5);
    }

    #[test]
    fn test_extractors_recover_gaussian_parameters() {
        let pedestal = gaussian_series(5000, 2.0, 5.0, "image", 11);
        let charge = gaussian_series(5000, 77.0, 10.0, "image", 12);
        let peak_time = gaussian_series(5000, 18.0, 5.0, "peak_time", 13);

        let ped_stats =
            extract(&pedestal, "image", CHUNK_SIZE, None, &sigma_clipping()).unwrap();
        let charge_stats =
            extract(&charge, "image", CHUNK_SIZE, None, &sigma_clipping()).unwrap();
        let time_stats =
            extract(&peak_time, "peak_time", CHUNK_SIZE, None, &PlainExtractor).unwrap();

        for (stats, series, mean, std_dev) in [
            (&ped_stats, &pedestal, 2.0, 5.0),
            (&charge_stats, &charge, 77.0, 10.0),
            (&time_stats, &peak_time, 18.0, 5.0),
        ] {
            assert_eq!(stats.len(), 2);
            let first = stats.get(&series.timestamps()[0]).unwrap();
            let second = stats.get(&series.timestamps()[CHUNK_SIZE]).unwrap();
            assert_eq!(first.shape(), (2, PIXELS));
            assert_recovers(first, mean, std_dev);
            assert_recovers(second, mean, std_dev);
        }
    }

    #[test]
    fn test_trailing_partial_chunk_dropped() {
        let charge = gaussian_series(5500, 77.0, 10.0, "image", 21);
        let stats = extract(&charge, "image", CHUNK_SIZE, None, &sigma_clipping()).unwrap();
        assert_eq!(stats.len(), 2);
        let keys: Vec<_> = stats.timestamps().copied().collect();
        assert_eq!(
            keys,
            vec![charge.timestamps()[0], charge.timestamps()[CHUNK_SIZE]]
        );
    }

    #[test]
    fn test_chunk_shift() {
        let charge = gaussian_series(5500, 77.0, 10.0, "image", 22);

        let shifted =
            extract(&charge, "image", CHUNK_SIZE, Some(3000), &sigma_clipping()).unwrap();
        assert_eq!(shifted.len(), 2);
        let last = shifted.get(&charge.timestamps()[3000]).unwrap();
        assert_eq!(last.extraction_stop, charge.timestamps()[5499]);

        assert_eq!(
            extract(&charge, "image", CHUNK_SIZE, Some(2000), &sigma_clipping()),
            Err(ExtractionError::Configuration(
                ConfigurationError::ChunkShiftTooSmall {
                    chunk_shift: 2000,
                    chunk_size: CHUNK_SIZE
                }
            ))
        );
    }

    #[test]
    fn test_selection_shorter_than_chunk() {
        let charge = gaussian_series(5500, 77.0, 10.0, "image", 23);
        let selection = charge.slice(1000..1500);
        assert_eq!(
            extract(&selection, "image", CHUNK_SIZE, None, &sigma_clipping()),
            Err(ExtractionError::Configuration(
                ConfigurationError::ChunkSizeExceedsSamples {
                    chunk_size: CHUNK_SIZE,
                    available: 500
                }
            ))
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let pedestal = gaussian_series(600, 2.0, 5.0, "image", 31);
        let mut config = ExtractionConfig::new(150);
        config.chunk_shift = Some(200);
        let first = config.extract(&pedestal).unwrap();
        let second = config.extract(&pedestal).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fully_masked_cell_only_invalidates_that_cell() {
        let pedestal = gaussian_series(400, 2.0, 5.0, "image", 41);
        let mut masks = vec![DMatrix::from_element(2, PIXELS, true); 400];
        // pixel 7 of the low-gain channel is dead for the whole first chunk
        for mask in &mut masks[..200] {
            mask[(1, 7)] = false;
        }
        let pedestal = pedestal.with_mask("image", masks).unwrap();

        for kind in [
            ExtractorKind::Plain,
            ExtractorKind::SigmaClipping(SigmaClippingConfig::default()),
        ] {
            let config = ExtractionConfig {
                extractor: kind,
                ..ExtractionConfig::new(200)
            };
            let stats = config.extract(&pedestal).unwrap();
            let (_, first) = stats.first().unwrap();
            assert_eq!(first.invalid_cells(), vec![(1, 7)]);
            assert!(first.mean[(1, 7)].is_nan());
            assert!(first.median[(1, 7)].is_nan());
            assert!(first.std[(1, 7)].is_nan());
            assert!(first.mean[(0, 7)].is_finite());

            let second = stats.get(&pedestal.timestamps()[200]).unwrap();
            assert!(second.invalid_cells().is_empty());
            assert!(second.is_valid(1, 7));
        }
    }

    #[test]
    fn test_sigma_clipping_rejects_injected_outliers() {
        let samples = 1000;
        let params = GaussianSeriesParams {
            samples,
            channels: 1,
            pixels: 4,
            mean: 77.0,
            std_dev: 10.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(51);
        let mut values = params.generate_values(&mut rng).unwrap();
        // a flickering pixel: every 20th sample reads a huge charge
        for (i, value) in values.iter_mut().enumerate() {
            if i % 20 == 0 {
                value[(0, 2)] = 5000.0 + rng.gen_range(0.0..10.0);
            }
        }
        let series = SampleSeries::new(params.timestamps().unwrap())
            .unwrap()
            .with_column("image", values)
            .unwrap();

        let plain = extract(&series, "image", samples, None, &PlainExtractor).unwrap();
        let clipped = extract(&series, "image", samples, None, &sigma_clipping()).unwrap();
        let (_, plain) = plain.first().unwrap();
        let (_, clipped) = clipped.first().unwrap();

        assert!(plain.mean[(0, 2)] > 200.0);
        assert!((clipped.mean[(0, 2)] - 77.0).abs() < 1.5);
        let survivors = clipped.n_samples[(0, 2)];
        assert!(survivors <= samples - samples / 20 && survivors > samples - samples / 20 - 5);
        // the neighbouring pixels are untouched by the flicker
        assert!((clipped.mean[(0, 1)] - 77.0).abs() < 1.5);
        assert!(clipped.n_samples[(0, 1)] > samples - 10);
    }
}
