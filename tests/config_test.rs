use flow_export::{ExportSettings, Resolution, config::FILTER_NAMES};

mod common;
use tempfile::tempdir;

#[test]
fn defaults_match_the_renderer_defaults() {
    let settings = ExportSettings::default();

    assert_eq!(settings.resolution, None);
    assert_eq!((settings.aa_min, settings.aa_max), (0, 2));
    assert_eq!(settings.filter, "gaussian");
    assert_eq!(settings.default_diffuse, [0.7, 0.7, 0.7]);
    assert!(settings.validate().is_ok());
}

#[test]
fn partial_files_keep_the_other_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(
        &path,
        "filter = \"mitchell\"\naa_max = 3\n\n[resolution]\nwidth = 1280\nheight = 720\n",
    )
    .unwrap();

    let settings = ExportSettings::load_from_file(&path).unwrap();

    assert_eq!(settings.filter, "mitchell");
    assert_eq!(settings.aa_min, 0);
    assert_eq!(settings.aa_max, 3);
    assert_eq!(settings.resolution, Some(Resolution::new(1280, 720)));
    assert_eq!(settings.default_diffuse, [0.7, 0.7, 0.7]);
}

#[test]
fn unknown_filters_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_filter.toml");
    std::fs::write(&path, "filter = \"bilinear\"\n").unwrap();

    let err = ExportSettings::load_from_file(&path).unwrap_err();

    assert!(err.to_string().contains("bilinear"));
}

#[test]
fn every_renderer_filter_is_accepted() {
    for filter in FILTER_NAMES {
        let settings = ExportSettings {
            filter: filter.to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok(), "{}", filter);
    }
}

#[test]
fn empty_anti_aliasing_ranges_are_rejected() {
    let settings = ExportSettings {
        aa_min: 2,
        aa_max: 1,
        ..Default::default()
    };

    assert!(settings.validate().is_err());
}

#[test]
fn empty_resolutions_are_rejected() {
    let settings = ExportSettings {
        resolution: Some(Resolution::new(0, 480)),
        ..Default::default()
    };

    assert!(settings.validate().is_err());
}

#[test]
fn missing_files_are_reported_with_their_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("does_not_exist.toml");

    let err = ExportSettings::load_from_file(&path).unwrap_err();

    assert!(err.to_string().contains("does_not_exist.toml"));
}

#[test]
fn resolution_falls_back_from_settings_to_host_to_default() {
    let host = Some(Resolution::new(1920, 1080));
    let explicit = ExportSettings {
        resolution: Some(Resolution::new(100, 50)),
        ..Default::default()
    };

    assert_eq!(explicit.effective_resolution(host), Resolution::new(100, 50));
    assert_eq!(
        ExportSettings::default().effective_resolution(host),
        Resolution::new(1920, 1080)
    );
    assert_eq!(
        ExportSettings::default().effective_resolution(None),
        Resolution::new(640, 480)
    );
}

#[test]
fn aspect_ratio_is_width_over_height() {
    assert_eq!(Resolution::new(200, 100).aspect_ratio(), 2.0);
    assert_eq!(Resolution::new(200, 0).aspect_ratio(), 1.0);
}
