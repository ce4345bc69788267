//! Detector-level checks of installed weighting potentials.

use std::io::Write;
use std::sync::Arc;

use approx::assert_abs_diff_eq;
use pixsim_core::{PixelIndex, Point3, Vector2};
use pixsim_detector::{Detector, DetectorModel, FieldKind};
use pixsim_field::{check_detector_match, pad_potential_function, FieldCache, FieldType};

fn timepix_like() -> Arc<DetectorModel> {
    Arc::new(
        DetectorModel::builder("timepix")
            .number_of_pixels(16, 16)
            .pixel_size(Vector2::new(0.055, 0.055))
            .implant_size(Vector2::new(0.05, 0.05))
            .sensor_thickness(0.2)
            .build()
            .unwrap(),
    )
}

#[test]
fn pad_potential_end_to_end() {
    let model = timepix_like();
    let domain = model.thickness_domain();
    let mut det = Detector::new("dut", Arc::clone(&model));
    det.set_weighting_potential_function(
        pad_potential_function(model.implant_size(), domain),
        domain,
        FieldType::Custom,
    );

    let pixel = PixelIndex::new(0, 0);
    let readout = det.weighting_potential(Point3::new(0.0, 0.0, domain.max), pixel).unwrap();
    let back = det.weighting_potential(Point3::new(0.0, 0.0, domain.min), pixel).unwrap();
    assert_abs_diff_eq!(readout, 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(back, 0.0, epsilon = 1e-3);

    let mid = (domain.min + domain.max) / 2.0;
    let centre = det.weighting_potential(Point3::new(0.0, 0.0, mid), pixel).unwrap();
    let lateral = det
        .weighting_potential(Point3::new(2.0 * 0.055, 0.0, mid), pixel)
        .unwrap();
    assert!(lateral.abs() < centre.abs(), "{lateral} vs {centre}");
}

#[test]
fn mismatched_grid_warns_but_remains_queryable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.init");
    let mut f = std::fs::File::create(&path).unwrap();
    // 80 um is not a multiple of the 55 um pitch.
    writeln!(f, "mismatch\n0 0\n0 0 1\n0 0 0\n200 80 55\n0 0 0 0\n1 1 2 0").unwrap();
    writeln!(f, "1 1 1 0.25\n1 1 2 0.75").unwrap();
    drop(f);

    let model = timepix_like();
    let cache = FieldCache::default();
    let data = cache.weighting_potentials().get_by_file_name(&path).unwrap();
    let mismatches = check_detector_match(data.size(), model.thickness_domain(), model.pixel_size());
    assert_eq!(mismatches.len(), 1);

    let size = data.size();
    let scale = [size[0] / model.pixel_size().x, size[1] / model.pixel_size().y];
    let mut det = Detector::new("dut", Arc::clone(&model));
    det.set_weighting_potential_grid(data, scale, [0.0, 0.0], model.thickness_domain());

    let pixel = PixelIndex::new(2, 2);
    let c = model.pixel_center(pixel);
    let top = det.weighting_potential(Point3::new(c.x, c.y, 0.09), pixel).unwrap();
    let bottom = det.weighting_potential(Point3::new(c.x, c.y, -0.09), pixel).unwrap();
    assert_eq!(top, 0.75);
    assert_eq!(bottom, 0.25);
    assert!(det.has_field(FieldKind::WeightingPotential));
}

#[test]
fn two_detectors_share_one_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.init");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "shared\n0 0\n0 0 1\n0 0 0\n200 55 55\n0 0 0 0\n1 1 1 0\n1 1 1 1.0").unwrap();
    drop(f);

    let model = timepix_like();
    let cache = FieldCache::default();
    let mut detectors = vec![
        Detector::new("plane0", Arc::clone(&model)),
        Detector::new("plane1", Arc::clone(&model)),
    ];
    let mut tables = Vec::new();
    for det in &mut detectors {
        let data = cache.weighting_potentials().get_by_file_name(&path).unwrap();
        tables.push(Arc::clone(&data));
        det.set_weighting_potential_grid(data, [1.0, 1.0], [0.0, 0.0], model.thickness_domain());
    }
    assert!(Arc::ptr_eq(&tables[0], &tables[1]));
    assert_eq!(cache.weighting_potentials().len(), 1);
}
