use ht301::{
    calibration::SensorMode, process_frame, Error, FrameGeometry, FrameProcessor, RawFrame,
    Settings, LUT_SIZE,
};

const GEOMETRY: FrameGeometry = FrameGeometry::HT301;

/// Device-side values written into a synthetic trailer.
#[derive(Clone)]
struct Device {
    constants: [f32; 5],
    core_raw: u16,
    fpa_raw: u16,
    /// fix offset, reflected, air, humidity, emissivity
    environment: [f32; 5],
    distance: u16,
    /// (word, value) pairs of row 0
    stats: Vec<(usize, u16)>,
}

impl Default for Device {
    fn default() -> Self {
        Device {
            constants: [1., 2., 0., 0., 1.],
            core_raw: 0,
            fpa_raw: 7800,
            environment: [0., 20., 20., 0.5, 1.],
            distance: 0,
            stats: vec![(4, 10), (2, 7), (3, 8), (7, 200), (5, 30), (6, 40), (12, 100), (13, 0), (14, 250), (15, 251)],
        }
    }
}

fn put(buf: &mut [u8], at: usize, bytes: &[u8]) {
    buf[at..at + bytes.len()].copy_from_slice(bytes);
}

impl Device {
    fn frame_with(&self, geometry: FrameGeometry) -> RawFrame {
        let row = geometry.row_bytes();
        let mut bytes = vec![0u8; 2 * geometry.samples()];
        for (i, b) in bytes[..2 * geometry.width * geometry.height]
            .chunks_mut(2)
            .enumerate()
        {
            b.copy_from_slice(&((i % 300) as u16).to_le_bytes());
        }

        let trailer = &mut bytes[2 * geometry.width * geometry.height..];
        put(trailer, 2, &self.fpa_raw.to_le_bytes());
        for &(word, v) in &self.stats {
            put(trailer, 2 * word, &v.to_le_bytes());
        }
        if row >= 276 {
            put(trailer, 3 * row + 2, &self.core_raw.to_le_bytes());
            for (i, a) in self.constants.iter().enumerate() {
                put(trailer, 3 * row + 6 + 4 * i, &a.to_le_bytes());
            }
            for (i, v) in self.environment.iter().enumerate() {
                put(trailer, 3 * row + 254 + 4 * i, &v.to_le_bytes());
            }
            put(trailer, 3 * row + 274, &self.distance.to_le_bytes());
        }

        RawFrame::from_le_bytes(&bytes, geometry).unwrap()
    }

    fn frame(&self) -> RawFrame {
        self.frame_with(GEOMETRY)
    }
}

/// Expected entry for the default device: radiance is
/// `250 - code`, the atmosphere is transparent and the
/// surface a blackbody.
fn expected(code: u16, air: f64) -> f64 {
    let object = (250. - code as f64).sqrt() - 1.;
    object - 0.01125 * (object - air)
}

#[test]
fn end_to_end_summary() {
    let processed = process_frame(&Device::default().frame(), &Settings::default()).unwrap();
    let summary = &processed.summary;

    assert_eq!(processed.lut.len(), LUT_SIZE);
    assert_eq!(processed.context.curve.index_shift, 249);
    assert!((processed.context.atmosphere.transmittance - 1.).abs() < 1e-12);

    assert!((summary.max.temperature - expected(10, 20.)).abs() < 1e-6);
    assert_eq!(summary.max.point.map(|p| (p.x, p.y)), Some((7, 8)));
    assert!((summary.min.temperature - expected(200, 20.)).abs() < 1e-6);
    assert_eq!(summary.min.point.map(|p| (p.x, p.y)), Some((30, 40)));
    assert!((summary.center.temperature - expected(100, 20.)).abs() < 1e-6);
    assert_eq!(summary.center.point.map(|p| (p.x, p.y)), Some((192, 144)));

    assert!((summary.probes[0].temperature - expected(0, 20.)).abs() < 1e-6);
    assert!((summary.probes[1].temperature - expected(250, 20.)).abs() < 1e-6);
    // outside the calibration domain, but a valid index
    assert!(summary.probes[2].temperature.is_nan());
    assert_eq!(summary.errors().count(), 0);

    assert_eq!(processed.lut.domain_errors().count(), LUT_SIZE - 251);
}

#[test]
fn curve_a_uses_the_raw_core_code() {
    let device = Device {
        core_raw: 2,
        ..Default::default()
    };
    let processed = process_frame(&device.frame(), &Settings::default()).unwrap();

    // curve_a(2) = 1 * 4 + 2 * 2 shifts the domain edge by 8
    assert!(!processed.lut[258].is_nan());
    assert!(processed.lut[259].is_nan());
}

#[test]
fn external_environment_overrides_device() {
    let frame = Device::default().frame();
    let mut settings = Settings::default();
    settings.environment.air_temp = 30.;
    settings.environment.emissivity = 1.;
    settings.environment.distance = 0.;

    let device = process_frame(&frame, &settings).unwrap();
    assert_eq!(device.environment.air_temp, 20.);

    settings.read_params_from_device = false;
    let external = process_frame(&frame, &settings).unwrap();
    assert_eq!(external.environment, settings.environment);
    assert!((external.summary.max.temperature - expected(10, 30.)).abs() < 1e-5);
    assert_ne!(device.lut, external.lut);
}

#[test]
fn high_sensor_mode_has_no_shift() {
    let settings = Settings {
        sensor_mode: SensorMode::High,
        ..Default::default()
    };
    let processed = process_frame(&Device::default().frame(), &settings).unwrap();
    assert_eq!(processed.context.curve.index_shift, 0);
    assert!(!processed.lut[1].is_nan());
    assert!(processed.lut[2].is_nan());
}

#[test]
fn out_of_range_center_only_spoils_center() {
    let mut device = Device::default();
    device.stats.push((12, 20000));
    let processed = process_frame(&device.frame(), &Settings::default()).unwrap();

    let errors: Vec<_> = processed.summary.errors().cloned().collect();
    assert_eq!(
        errors,
        vec![Error::IndexOutOfRange {
            field: "center",
            code: 20000
        }]
    );
    assert!(processed.summary.center.temperature.is_nan());
    assert!((processed.summary.max.temperature - expected(10, 20.)).abs() < 1e-6);
    assert!((processed.summary.min.temperature - expected(200, 20.)).abs() < 1e-6);
}

#[test]
fn malformed_frame_keeps_previous_result() {
    let mut processor = FrameProcessor::new(Settings::default());
    let first = processor
        .push(&Device::default().frame())
        .unwrap()
        .summary
        .clone();

    let narrow = FrameGeometry {
        width: 100,
        height: 10,
    };
    let err = processor
        .push(&Device::default().frame_with(narrow))
        .unwrap_err();
    assert!(matches!(err, Error::MalformedMetadata(_)));
    let latest = &processor.latest().unwrap().summary;
    assert_eq!(latest.max.temperature, first.max.temperature);
    assert_eq!(latest.center.raw, first.center.raw);
}

#[test]
fn image_temperatures() {
    let frame = Device::default().frame();
    let processed = process_frame(&frame, &Settings::default()).unwrap();
    let temps = processed.temperatures(&frame);

    assert_eq!(temps.dim(), (288, 384));
    // pixel (0, 10) holds code 10
    assert_eq!(temps[(0, 10)].to_bits(), processed.lut[10].to_bits());
    assert!(temps[(0, 299)].is_nan());
}
